//! Session state machine values and shared application state.
//!
//! [`InterviewerState`] drives the controller's state machine.  A front-end
//! reads it via [`SharedSession`] to render the appropriate view.
//!
//! [`SessionState`] is the single source of truth for everything a
//! front-end needs: current interviewer phase, the question being asked,
//! the code surface, the latest camera status, and any notice to display.
//!
//! [`SharedSession`] is a type alias for `Arc<Mutex<SessionState>>` — cheap
//! to clone and safe to share across tasks.

use std::sync::{Arc, Mutex};

use super::liveness::LivenessStatus;

// ---------------------------------------------------------------------------
// InterviewerState
// ---------------------------------------------------------------------------

/// States of the interview turn loop.
///
/// The state machine transitions are:
///
/// ```text
/// Waiting ──session mount──▶ Analyzing
/// Analyzing ──question received──▶ Speaking
///           ──service failure───▶ Listening
/// Speaking ──playback ended / failed──▶ Listening
/// Listening ──submit──▶ Analyzing
/// any state ──end session──▶ (controller exits; not a state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewerState {
    /// Initial value before the first question arrives.
    Waiting,

    /// A question is being read aloud; capture is disabled.
    Speaking,

    /// Capture is active; the candidate may answer and/or edit code.
    Listening,

    /// A submission is in flight to the question service; capture and
    /// playback are both disabled.
    Analyzing,
}

impl InterviewerState {
    /// Returns `true` when the candidate may submit an answer.
    ///
    /// ```
    /// use mock_interview::session::InterviewerState;
    ///
    /// assert!(InterviewerState::Listening.accepts_submission());
    /// assert!(!InterviewerState::Speaking.accepts_submission());
    /// assert!(!InterviewerState::Analyzing.accepts_submission());
    /// assert!(!InterviewerState::Waiting.accepts_submission());
    /// ```
    pub fn accepts_submission(&self) -> bool {
        matches!(self, InterviewerState::Listening)
    }

    /// A short human-readable label suitable for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            InterviewerState::Waiting => "Waiting",
            InterviewerState::Speaking => "Speaking",
            InterviewerState::Listening => "Listening",
            InterviewerState::Analyzing => "Analyzing",
        }
    }
}

impl Default for InterviewerState {
    fn default() -> Self {
        InterviewerState::Waiting
    }
}

// ---------------------------------------------------------------------------
// CodeState
// ---------------------------------------------------------------------------

/// The code surface's text plus the candidate-edit flag.
///
/// `dirty` is set only by candidate edits; installing an AI-provided
/// starter replaces the content and clears the flag, so unedited starter
/// code is never submitted as if the candidate wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeState {
    /// Current editor contents.
    pub content: String,
    /// `true` once the candidate has edited the contents.
    pub dirty: bool,
}

impl CodeState {
    /// Create a clean code surface showing `placeholder`.
    pub fn new(placeholder: &str) -> Self {
        Self {
            content: placeholder.to_string(),
            dirty: false,
        }
    }

    /// Record a candidate edit.
    pub fn record_edit(&mut self, content: String) {
        self.content = content;
        self.dirty = true;
    }

    /// Install AI-provided starter code, clearing the edit flag.
    pub fn install_starter(&mut self, code: String) {
        self.content = code;
        self.dirty = false;
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Shared session state — the single source of truth for a front-end.
///
/// Held behind [`SharedSession`] (`Arc<Mutex<SessionState>>`).  The session
/// controller mutates it; a front-end reads it to render.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current phase of the interview turn loop.
    pub interviewer: InterviewerState,

    /// The question currently being asked (placeholder before the first
    /// one arrives).
    pub question: String,

    /// The code surface.
    pub code: CodeState,

    /// Whether the code editor is shown.
    pub editor_visible: bool,

    /// Latest camera/attentiveness report.  Display only; the controller
    /// never reacts to it.
    pub liveness: LivenessStatus,

    /// Transient user-facing notice (validation warning, service error).
    pub notice: Option<String>,

    /// Set when the session cannot continue (missing session id); the
    /// caller should restart the signup flow.
    pub fatal: Option<String>,

    /// Number of completed question/answer exchanges.
    pub turn_index: u64,
}

impl SessionState {
    /// Create the pre-first-question state.
    pub fn new(code_placeholder: &str) -> Self {
        Self {
            interviewer: InterviewerState::Waiting,
            question: "Looking for a response...".into(),
            code: CodeState::new(code_placeholder),
            editor_visible: false,
            liveness: LivenessStatus::default(),
            notice: None,
            fatal: None,
            turn_index: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SharedSession
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedSession`] in the pre-first-question state.
pub fn new_shared_session(code_placeholder: &str) -> SharedSession {
    Arc::new(Mutex::new(SessionState::new(code_placeholder)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- InterviewerState --------------------------------------------------

    #[test]
    fn only_listening_accepts_submission() {
        assert!(InterviewerState::Listening.accepts_submission());
        assert!(!InterviewerState::Waiting.accepts_submission());
        assert!(!InterviewerState::Speaking.accepts_submission());
        assert!(!InterviewerState::Analyzing.accepts_submission());
    }

    #[test]
    fn labels_cover_every_state() {
        assert_eq!(InterviewerState::Waiting.label(), "Waiting");
        assert_eq!(InterviewerState::Speaking.label(), "Speaking");
        assert_eq!(InterviewerState::Listening.label(), "Listening");
        assert_eq!(InterviewerState::Analyzing.label(), "Analyzing");
    }

    #[test]
    fn default_state_is_waiting() {
        assert_eq!(InterviewerState::default(), InterviewerState::Waiting);
    }

    // ---- CodeState ---------------------------------------------------------

    #[test]
    fn new_code_state_is_clean() {
        let code = CodeState::new("// Write your code here...");
        assert_eq!(code.content, "// Write your code here...");
        assert!(!code.dirty);
    }

    #[test]
    fn candidate_edit_sets_dirty() {
        let mut code = CodeState::new("");
        code.record_edit("def f(): pass".into());
        assert_eq!(code.content, "def f(): pass");
        assert!(code.dirty);
    }

    #[test]
    fn installing_starter_clears_dirty() {
        let mut code = CodeState::new("");
        code.record_edit("my attempt".into());
        code.install_starter("def starter(): ...".into());
        assert_eq!(code.content, "def starter(): ...");
        assert!(!code.dirty);
    }

    #[test]
    fn edit_after_starter_sets_dirty_again() {
        let mut code = CodeState::new("");
        code.install_starter("def starter(): ...".into());
        code.record_edit("def starter(): return 1".into());
        assert!(code.dirty);
    }

    // ---- SessionState / SharedSession --------------------------------------

    #[test]
    fn new_session_state_defaults() {
        let state = SessionState::new("// placeholder");
        assert_eq!(state.interviewer, InterviewerState::Waiting);
        assert_eq!(state.question, "Looking for a response...");
        assert!(!state.editor_visible);
        assert!(state.notice.is_none());
        assert!(state.fatal.is_none());
        assert_eq!(state.turn_index, 0);
        assert!(!state.code.dirty);
    }

    #[test]
    fn shared_session_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedSession>();
    }

    #[test]
    fn shared_session_can_be_cloned_and_mutated() {
        let state = new_shared_session("");
        let state2 = Arc::clone(&state);

        state.lock().unwrap().interviewer = InterviewerState::Listening;
        assert_eq!(
            state2.lock().unwrap().interviewer,
            InterviewerState::Listening
        );
    }
}
