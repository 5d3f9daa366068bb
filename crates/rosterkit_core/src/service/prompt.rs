//! Text prompt collaborator contract.
//!
//! # Responsibility
//! - Describe the external capability that asks the user for a name and
//!   yields a confirmed or cancelled string.
//!
//! # Invariants
//! - Whitespace trimming and empty-input no-op policy live in the
//!   controller, not in prompt implementations.

/// Parameters for one prompt presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Dialog title, e.g. "New Item".
    pub title: String,
    /// Hint shown in the empty input field.
    pub placeholder: String,
    /// Pre-filled value for rename flows.
    pub initial: Option<String>,
}

impl PromptRequest {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            placeholder: placeholder.into(),
            initial: None,
        }
    }

    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }
}

/// Result of one prompt presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Confirmed(String),
    Cancelled,
}

/// External capability presenting a text prompt and blocking the owner
/// context until the user confirms or cancels.
pub trait TextPrompt {
    fn prompt(&mut self, request: &PromptRequest) -> PromptOutcome;
}
