//! UI-agnostic application state types
//!
//! This module contains data structures that are shared between the terminal
//! front-end and anything else driving the core, and don't depend on any
//! specific UI framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::generation::GenerationResult;

/// Lifecycle state of one panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    /// A request is in flight; further triggers are dropped until it resolves
    pub busy: bool,
    pub last_result: Option<GenerationResult>,
    pub last_error: Option<ErrorKind>,
}

impl PanelState {
    pub fn is_idle(&self) -> bool {
        !self.busy
    }
}

/// A chat message in a panel's transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
    /// An uploaded file, recorded by name only
    Document,
}
