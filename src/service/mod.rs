//! Remote question-generation boundary.
//!
//! This module provides:
//! * [`QuestionService`] — async trait implemented by all service backends.
//! * [`ApiQuestionService`] — HTTP client for the interview backend.
//! * [`Prompt`] — the next question plus an optional code starter.
//! * [`ServiceError`] — error variants for service operations.

pub mod client;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiQuestionService, Prompt, QuestionService, ServiceError};

#[cfg(test)]
pub use client::MockQuestionService;
