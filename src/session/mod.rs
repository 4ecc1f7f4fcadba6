//! Interview session orchestration.
//!
//! This module provides:
//! * [`SessionController`] — the turn-taking state machine.
//! * [`SessionEvent`] — everything that can happen to a running session.
//! * [`InterviewerState`] / [`SessionState`] / [`SharedSession`] — the
//!   machine's state and the shared view a front-end renders from.
//! * [`CodeState`] — code surface text plus the candidate-edit flag.
//! * [`Turn`] / [`compose_answer`] — one exchange and its outgoing payload.
//! * [`LivenessStatus`] — the camera sensor's report, display only.

pub mod controller;
pub mod liveness;
pub mod state;
pub mod turn;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::{
    SessionController, SessionEvent, CAPTURE_UNSUPPORTED_NOTICE, SESSION_MISSING_NOTICE,
    VALIDATION_WARNING,
};
pub use liveness::{LivenessStatus, Severity};
pub use state::{new_shared_session, CodeState, InterviewerState, SessionState, SharedSession};
pub use turn::{compose_answer, Turn, CODE_MARKER};
