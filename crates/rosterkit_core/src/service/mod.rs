//! Use-case orchestration for the observed list.
//!
//! # Responsibility
//! - Wire prompt-driven commands to the store/observe/diff/apply cycle.
//! - Keep UI hosts decoupled from storage and diffing details.

pub mod list_controller;
pub mod prompt;

pub use list_controller::{ControlError, ListController};
pub use prompt::{PromptOutcome, PromptRequest, TextPrompt};
