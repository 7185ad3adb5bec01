pub mod artifact;
pub mod config;
pub mod controller;
pub mod drafts;
pub mod error;
pub mod generation;
pub mod ids;
pub mod markup;
pub mod notify;
pub mod state;
pub mod story;
pub mod transcript;

// Re-export main types for convenience
pub use artifact::{ArtifactKind, PanelId};
pub use config::Config;
pub use controller::{Completion, GenerationController, SubmitOutcome};
pub use drafts::{DraftEntry, DraftStore, KeyValueStore, MemoryStore, SqliteStore};
pub use error::{ErrorKind, GenerationError, StorageError};
pub use generation::{
    DemoBackend, GenerationBackend, GenerationRequest, GenerationResult, HttpBackend, Parameters,
};
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use state::{ChatMessage, ChatRole, PanelState};
pub use story::{DirectorySink, ExportSink, StoryView};
pub use transcript::ChatTranscript;
