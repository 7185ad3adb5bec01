use std::path::PathBuf;

use chrono::Utc;

use crate::ids;
use crate::state::{ChatMessage, ChatRole};

const DOCUMENT_PREFIX: &str = "Uploaded: ";

/// Ordered, append-only message log owned by one chat panel
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the user's text. Blank input is ignored.
    pub fn append_user(&mut self, content: &str) -> Option<&ChatMessage> {
        if content.trim().is_empty() {
            return None;
        }
        Some(self.push(ChatRole::User, content.to_string()))
    }

    /// Record an uploaded document by display name; the file itself is never read
    pub fn append_document(&mut self, name: &str) -> &ChatMessage {
        self.push(ChatRole::Document, format!("{DOCUMENT_PREFIX}{name}"))
    }

    pub fn append_ai(&mut self, content: &str) -> &ChatMessage {
        self.push(ChatRole::Ai, content.to_string())
    }

    fn push(&mut self, role: ChatRole, content: String) -> &ChatMessage {
        self.messages.push(ChatMessage {
            id: ids::next_id().to_string(),
            role,
            content,
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn latest_ai(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == ChatRole::Ai)
    }

    /// Name of the most recently uploaded document, if any
    pub fn latest_document(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Document)
            .map(|m| m.content.strip_prefix(DOCUMENT_PREFIX).unwrap_or(&m.content))
    }

    /// Content of an AI message eligible for the story buffer.
    /// User and document messages cannot be promoted.
    pub fn promote(&self, id: &str) -> Option<&str> {
        self.find(id)
            .filter(|m| m.role == ChatRole::Ai)
            .map(|m| m.content.as_str())
    }
}

/// First path in a pasted drag-and-drop payload.
///
/// Terminals paste dropped files as shell-quoted paths separated by spaces;
/// only the first one is kept.
pub fn first_dropped_path(pasted: &str) -> Option<PathBuf> {
    let mut token = String::new();
    let mut quote: Option<char> = None;
    let mut chars = pasted.trim().chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => token.push(c),
            None => match c {
                '\'' | '"' => quote = Some(c),
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        token.push(escaped);
                    }
                }
                c if c.is_whitespace() => {
                    if !token.is_empty() {
                        break;
                    }
                }
                c => token.push(c),
            },
        }
    }

    if token.is_empty() {
        return None;
    }
    let token = token.strip_prefix("file://").map(str::to_string).unwrap_or(token);
    Some(PathBuf::from(token))
}

/// Display name of the first dropped file
pub fn dropped_file_name(pasted: &str) -> Option<String> {
    first_dropped_path(pasted)?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
