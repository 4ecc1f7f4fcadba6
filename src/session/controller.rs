//! Session controller — the turn-taking state machine of the interview.
//!
//! [`SessionController`] owns the [`InterviewerState`] and sequences every
//! side effect: when to listen, when to speak, when to call the question
//! service, and when to tear the session down.  It responds to
//! [`SessionEvent`]s received over a `tokio::sync::mpsc` channel; there is
//! no server driving this machine.
//!
//! # Turn flow
//!
//! ```text
//! SessionEvent::Start
//!   └─▶ service request (empty answer)            [Analyzing]
//!         ├─ Ok  → store question/starter, speak  [Speaking]
//!         └─ Err → surface error, allow retry     [Listening]
//!
//! SessionEvent::PlaybackFinished / PlaybackFailed
//!   └─▶ enable capture                            [Listening]
//!
//! SessionEvent::Submit
//!   ├─ nothing to send → validation notice        [Listening, unchanged]
//!   └─▶ snapshot transcript (+ dirty code), clear buffer,
//!       service request                           [Analyzing]
//!
//! SessionEvent::End
//!   └─▶ stop capture, cancel playback, best-effort end notice, exit
//! ```
//!
//! Every service call is tagged with the turn index in effect when it was
//! issued; a response whose tag no longer matches is discarded, so a late
//! reply (after a duplicate submit or after session end) can never corrupt
//! state.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::capture::CaptureSource;
use crate::playback::PlaybackSink;
use crate::service::{Prompt, QuestionService, ServiceError};

use super::liveness::LivenessStatus;
use super::state::{InterviewerState, SharedSession};
use super::turn::{compose_answer, Turn};

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Shown when the candidate submits with no speech and no edited code.
pub const VALIDATION_WARNING: &str = "Please say something or write code before submitting.";

/// Shown in place of the capture control when recognition is unavailable.
pub const CAPTURE_UNSUPPORTED_NOTICE: &str =
    "Speech capture is not supported in this environment; answering by voice is disabled.";

/// Recorded as fatal when no session identifier is present.
pub const SESSION_MISSING_NOTICE: &str = "Session ID missing. Start a new interview.";

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Everything that can happen to a running session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Session mount: issue the first service request with an empty answer.
    Start,
    /// A service round trip finished.  `turn` is the index in effect when
    /// the request was issued (see the stale-response guard).
    ServiceResponse {
        turn: u64,
        result: Result<Prompt, ServiceError>,
    },
    /// The playback sink finished delivering the current question.
    PlaybackFinished,
    /// The playback sink failed mid-utterance.  Treated like
    /// [`PlaybackFinished`](Self::PlaybackFinished) so the turn loop cannot
    /// stall in Speaking.
    PlaybackFailed { message: String },
    /// The candidate submitted the current answer.
    Submit,
    /// The candidate edited the code surface.
    CodeEdited { content: String },
    /// The candidate toggled the code editor.
    ToggleEditor,
    /// The candidate cleared the captured transcript.
    ResetTranscript,
    /// Status report from the camera sensor (display only).
    Liveness(LivenessStatus),
    /// The candidate ended the session.
    End,
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// The turn-taking orchestrator.
///
/// Create with [`SessionController::new`], then call [`run`](Self::run)
/// inside a tokio task.  All sequencing is single-threaded: events are
/// applied strictly in arrival order and every side effect reports back as
/// another event.
pub struct SessionController {
    /// Opaque token from the external signup step; cleared on termination.
    session_id: String,
    /// Completed exchanges so far; tags outgoing requests.
    turn_index: u64,
    state: SharedSession,
    capture: CaptureSource,
    playback: PlaybackSink,
    service: Arc<dyn QuestionService>,
    /// Clone handed to spawned service calls so their results come back
    /// through the same event loop.
    events_tx: mpsc::Sender<SessionEvent>,
    /// The exchange in progress, if a question has been delivered.
    current_turn: Option<Turn>,
}

impl SessionController {
    /// Create a new controller.
    ///
    /// # Arguments
    ///
    /// * `session_id` — token created by the external signup/start step.
    /// * `state`      — shared session state (also read by the front-end).
    /// * `capture`    — voice-to-text source.
    /// * `playback`   — text-to-speech sink.
    /// * `service`    — question-generation boundary.
    /// * `events_tx`  — sender side of the channel `run` will consume.
    pub fn new(
        session_id: String,
        state: SharedSession,
        capture: CaptureSource,
        playback: PlaybackSink,
        service: Arc<dyn QuestionService>,
        events_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            session_id,
            turn_index: 0,
            state,
            capture,
            playback,
            service,
            events_tx,
            current_turn: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the controller until the session ends or `events_rx` closes.
    ///
    /// This is an `async fn` and should be spawned as a tokio task.  Once it
    /// returns, no event can mutate session state any more; a service
    /// response still in flight finds its channel closed and is dropped.
    pub async fn run(mut self, mut events_rx: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events_rx.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        log::info!("session: controller shut down");
    }

    // -----------------------------------------------------------------------
    // Event dispatch
    // -----------------------------------------------------------------------

    /// Apply one event.  Returns `false` when the session is over and the
    /// loop must stop.
    fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Start => self.on_start(),
            SessionEvent::ServiceResponse { turn, result } => {
                self.on_service_response(turn, result);
                true
            }
            SessionEvent::PlaybackFinished => {
                self.on_playback_done(None);
                true
            }
            SessionEvent::PlaybackFailed { message } => {
                self.on_playback_done(Some(message));
                true
            }
            SessionEvent::Submit => self.on_submit(),
            SessionEvent::CodeEdited { content } => {
                self.state.lock().unwrap().code.record_edit(content);
                true
            }
            SessionEvent::ToggleEditor => {
                let mut st = self.state.lock().unwrap();
                st.editor_visible = !st.editor_visible;
                true
            }
            SessionEvent::ResetTranscript => {
                if let Err(e) = self.capture.reset() {
                    log::warn!("session: transcript reset failed: {e}");
                }
                true
            }
            SessionEvent::Liveness(status) => {
                self.state.lock().unwrap().liveness = status;
                true
            }
            SessionEvent::End => {
                self.on_end();
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    /// Session mount: request the first question with the empty answer as
    /// the session-start signal.
    fn on_start(&mut self) -> bool {
        log::info!("session: interview starting");
        self.issue_request(String::new())
    }

    /// Apply a service response, unless it is stale.
    fn on_service_response(&mut self, turn: u64, result: Result<Prompt, ServiceError>) {
        if turn != self.turn_index {
            log::debug!(
                "session: stale response for turn {turn} discarded (current turn {})",
                self.turn_index
            );
            return;
        }

        match result {
            Ok(prompt) => {
                self.turn_index += 1;
                self.current_turn = Some(Turn::new(prompt.question.clone()));

                {
                    let mut st = self.state.lock().unwrap();
                    st.turn_index = self.turn_index;
                    st.question = prompt.question.clone();
                    st.notice = None;
                    if let Some(code) = prompt.code {
                        st.code.install_starter(code);
                        st.editor_visible = true;
                    }
                }

                self.set_interviewer(InterviewerState::Speaking);
                if let Err(e) = self.playback.speak(&prompt.question) {
                    // No lifecycle event will follow, so advance here; the
                    // question text is already on screen.
                    log::warn!("session: spoken delivery unavailable: {e}");
                    self.set_notice(format!("Spoken delivery unavailable: {e}"));
                    self.enter_listening();
                }
            }
            Err(e) => {
                log::warn!("session: question request failed: {e}");
                self.set_notice(format!("Error: {e}"));
                self.enter_listening();
            }
        }
    }

    /// The question finished (or failed) out loud: start listening.
    fn on_playback_done(&mut self, failure: Option<String>) {
        let speaking = {
            let st = self.state.lock().unwrap();
            st.interviewer == InterviewerState::Speaking
        };
        if !speaking {
            log::debug!("session: playback event outside Speaking ignored");
            return;
        }

        if let Some(message) = failure {
            log::warn!("session: speech synthesis failed: {message}");
            self.set_notice(format!("Spoken delivery failed: {message}"));
        }

        self.enter_listening();
    }

    /// Candidate submission: validate, snapshot, and send.
    fn on_submit(&mut self) -> bool {
        let accepts = {
            let st = self.state.lock().unwrap();
            st.interviewer.accepts_submission()
        };
        if !accepts {
            log::debug!("session: submit ignored outside Listening");
            return true;
        }

        let (code, dirty) = {
            let st = self.state.lock().unwrap();
            (st.code.content.clone(), st.code.dirty)
        };

        if !self.capture.has_speech() && !dirty {
            log::warn!("session: submission rejected, nothing to send");
            self.set_notice(VALIDATION_WARNING);
            return true;
        }

        let transcript = self.capture.take_transcript();
        let answer = compose_answer(&transcript, &code, dirty);

        if let Some(turn) = self.current_turn.take() {
            let question = turn.question().to_string();
            let elapsed = turn.finalize().as_secs_f32();
            log::info!("session: answered {:?} in {:.1}s", question, elapsed);
        }

        self.capture.stop();
        self.issue_request(answer)
    }

    /// Candidate ended the session: tear everything down.
    fn on_end(&mut self) {
        log::info!("session: ended by candidate");

        self.capture.stop();
        self.playback.cancel();

        // Clear the token before notifying; the notice is fire-and-forget
        // and must not block teardown.
        let session_id = std::mem::take(&mut self.session_id);
        if !session_id.is_empty() {
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                if let Err(e) = service.end_session(&session_id).await {
                    log::warn!("session: end notification failed: {e}");
                }
            });
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Spawn a service call tagged with the current turn index.
    ///
    /// Returns `false` when no session identifier is present, which is
    /// fatal: the caller should stop the loop and let the user restart the
    /// signup flow.
    fn issue_request(&mut self, answer: String) -> bool {
        if self.session_id.is_empty() {
            log::error!("session: no session id; cannot reach the question service");
            let mut st = self.state.lock().unwrap();
            st.fatal = Some(SESSION_MISSING_NOTICE.into());
            return false;
        }

        self.set_interviewer(InterviewerState::Analyzing);

        let service = Arc::clone(&self.service);
        let session_id = self.session_id.clone();
        let turn = self.turn_index;
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = service.next_question(&session_id, &answer).await;
            // The loop may have exited meanwhile; a dropped receiver is the
            // stale-response guard doing its job.
            let _ = events_tx
                .send(SessionEvent::ServiceResponse { turn, result })
                .await;
        });
        true
    }

    /// Enter Listening and enable capture (or surface why it cannot be).
    fn enter_listening(&mut self) {
        self.set_interviewer(InterviewerState::Listening);

        if !self.capture.is_supported() {
            self.set_notice(CAPTURE_UNSUPPORTED_NOTICE);
            return;
        }
        if let Err(e) = self.capture.start() {
            log::warn!("session: could not start capture: {e}");
            self.set_notice(format!("Capture failed to start: {e}"));
        }
    }

    fn set_interviewer(&self, state: InterviewerState) {
        let mut st = self.state.lock().unwrap();
        log::debug!("session: {} → {}", st.interviewer.label(), state.label());
        st.interviewer = state;
    }

    fn set_notice(&self, message: impl Into<String>) {
        let mut st = self.state.lock().unwrap();
        st.notice = Some(message.into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
