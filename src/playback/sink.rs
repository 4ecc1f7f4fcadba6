//! Text-to-speech playback behind a backend trait.
//!
//! [`PlaybackSink`] speaks one line at a time.  A new [`speak`] call cancels
//! the previous utterance before the new one begins, and a generation
//! counter makes any late lifecycle event from a cancelled utterance a
//! no-op, so two spoken streams can never overlap and a cancelled call can
//! never deliver a terminal event.
//!
//! The active [`Utterance`] is owned by the sink until its `Finished` /
//! `Failed` event arrives; nothing else may reclaim it earlier.
//!
//! [`speak`]: PlaybackSink::speak

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// Lifecycle of the most recent utterance, observed by the session
/// controller to detect "question fully delivered".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No utterance has been accepted yet (or the sink was cancelled).
    Idle,
    /// An utterance is being spoken.
    Speaking,
    /// The last utterance completed normally.
    Ended,
    /// The last utterance failed mid-synthesis.
    Error,
}

impl PlaybackState {
    /// Returns `true` for the two terminal outcomes of a `speak` call.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Ended | PlaybackState::Error)
    }

    /// A short human-readable label for status display.
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Speaking => "Speaking",
            PlaybackState::Ended => "Ended",
            PlaybackState::Error => "Error",
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// One line of text to speak, tagged with the generation that identifies it
/// for the lifetime of the call.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// The text to speak.
    pub text: String,
    /// Preferred-voice substring hint, if configured.
    pub voice_hint: Option<String>,
    /// Generation this utterance belongs to; echoed in backend events.
    pub generation: u64,
}

// ---------------------------------------------------------------------------
// SynthEvent / PlaybackUpdate
// ---------------------------------------------------------------------------

/// Lifecycle events reported by a [`SpeechBackend`].
///
/// Backends echo the generation of the utterance the event belongs to;
/// the sink discards events whose generation is no longer current.
#[derive(Debug, Clone)]
pub enum SynthEvent {
    /// Synthesis of the utterance has begun.
    Started { generation: u64 },
    /// The utterance completed normally.
    Finished { generation: u64 },
    /// Synthesis failed mid-utterance.
    Failed { generation: u64, message: String },
    /// The backend's voice list became (or changed while) available.
    VoicesChanged,
}

/// State change forwarded to the sink's observer (the session wiring).
#[derive(Debug, Clone)]
pub struct PlaybackUpdate {
    /// Generation of the utterance this update belongs to.
    pub generation: u64,
    /// New playback state.
    pub state: PlaybackState,
    /// Failure description when `state` is [`PlaybackState::Error`].
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while controlling the speech backend.
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    /// Speech synthesis is not available in this environment.
    #[error("speech synthesis is not supported in this environment")]
    Unsupported,

    /// The backend rejected the utterance.
    #[error("speech backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// SpeechBackend trait
// ---------------------------------------------------------------------------

/// Platform speech-synthesis capability.
///
/// The backend is handed its event sender at construction time and must
/// echo each utterance's generation in the events it emits.
pub trait SpeechBackend: Send + 'static {
    /// Whether the capability exists at all.
    fn is_supported(&self) -> bool;

    /// Whether the voice list is loaded.  When `false`, the sink parks the
    /// utterance and speaks it on the next [`SynthEvent::VoicesChanged`].
    fn voices_ready(&self) -> bool;

    /// Begin synthesising `utterance`.
    fn speak(&mut self, utterance: &Utterance) -> Result<(), PlaybackError>;

    /// Abort the current utterance, if any.  Must return promptly.
    fn cancel(&mut self);
}

// ---------------------------------------------------------------------------
// PlaybackSink
// ---------------------------------------------------------------------------

struct SinkInner {
    backend: Box<dyn SpeechBackend>,
    state: PlaybackState,
    /// Active utterance, pinned here until its terminal event arrives.
    active: Option<Utterance>,
    /// Utterance parked until the backend's voices are ready.  `take()`n
    /// exactly once, so a voice list loading twice cannot speak it twice.
    pending: Option<Utterance>,
    generation: u64,
    voice_hint: Option<String>,
}

/// One-utterance-at-a-time speech output.
///
/// Construct with [`PlaybackSink::new`], passing the backend, the receiver
/// of the backend's [`SynthEvent`]s, and a sender for state updates.  The
/// sink is `Clone`-free by design; the session controller is its only
/// driver.
pub struct PlaybackSink {
    inner: Arc<Mutex<SinkInner>>,
    supported: bool,
}

impl PlaybackSink {
    /// Wrap `backend` and spawn the event pump.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        backend: impl SpeechBackend,
        synth_rx: mpsc::Receiver<SynthEvent>,
        updates_tx: mpsc::Sender<PlaybackUpdate>,
        voice_hint: Option<String>,
    ) -> Self {
        let supported = backend.is_supported();
        if !supported {
            log::warn!("playback: speech synthesis unsupported, control disabled");
        }

        let inner = Arc::new(Mutex::new(SinkInner {
            backend: Box::new(backend),
            state: PlaybackState::Idle,
            active: None,
            pending: None,
            generation: 0,
            voice_hint,
        }));

        spawn_pump(Arc::clone(&inner), synth_rx, updates_tx);

        Self { inner, supported }
    }

    /// Whether speech synthesis is available at all.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.inner.lock().unwrap().state
    }

    /// Speak `text`, cancelling any utterance still in flight.
    ///
    /// Cancellation completes before this method returns, so two utterances
    /// can never overlap.  When the backend's voices are not loaded yet the
    /// utterance is deferred until they are, exactly once.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Unsupported`] when the capability is absent, or the
    /// backend's own error when it rejects the utterance; in both cases no
    /// lifecycle event will follow and the caller must advance on its own.
    pub fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        if !self.supported {
            return Err(PlaybackError::Unsupported);
        }

        let mut inner = self.inner.lock().unwrap();

        // Cancel first; the generation bump makes any late event from the
        // previous utterance a no-op.
        inner.backend.cancel();
        inner.generation += 1;
        inner.active = None;
        inner.pending = None;

        let utterance = Utterance {
            text: text.to_string(),
            voice_hint: inner.voice_hint.clone(),
            generation: inner.generation,
        };

        if inner.backend.voices_ready() {
            if let Err(e) = inner.backend.speak(&utterance) {
                inner.state = PlaybackState::Error;
                return Err(e);
            }
            inner.active = Some(utterance);
        } else {
            log::debug!("playback: voices not ready, utterance deferred");
            inner.pending = Some(utterance);
        }
        Ok(())
    }

    /// Abort the current utterance and suppress its terminal event.
    ///
    /// Safe to call at any time, including when nothing is playing.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.backend.cancel();
        inner.generation += 1;
        inner.active = None;
        inner.pending = None;
        inner.state = PlaybackState::Idle;
    }
}

// ---------------------------------------------------------------------------
// Event pump
// ---------------------------------------------------------------------------

/// Apply backend events to the sink state and forward accepted updates.
///
/// Events whose generation is not the sink's current one are dropped, as is
/// any second terminal event for an utterance that already completed.
fn spawn_pump(
    inner: Arc<Mutex<SinkInner>>,
    mut synth_rx: mpsc::Receiver<SynthEvent>,
    updates_tx: mpsc::Sender<PlaybackUpdate>,
) {
    tokio::spawn(async move {
        while let Some(event) = synth_rx.recv().await {
            let update = apply_event(&inner, event);
            if let Some(update) = update {
                if updates_tx.send(update).await.is_err() {
                    break;
                }
            }
        }
        log::debug!("playback: synth channel closed, pump exiting");
    });
}

fn apply_event(inner: &Arc<Mutex<SinkInner>>, event: SynthEvent) -> Option<PlaybackUpdate> {
    let mut g = inner.lock().unwrap();
    match event {
        SynthEvent::Started { generation } => {
            if generation != g.generation {
                log::debug!("playback: stale Started (gen {generation}) dropped");
                return None;
            }
            g.state = PlaybackState::Speaking;
            Some(PlaybackUpdate {
                generation,
                state: PlaybackState::Speaking,
                message: None,
            })
        }
        SynthEvent::Finished { generation } => {
            if generation != g.generation || g.active.is_none() {
                log::debug!("playback: stale Finished (gen {generation}) dropped");
                return None;
            }
            g.active = None;
            g.state = PlaybackState::Ended;
            Some(PlaybackUpdate {
                generation,
                state: PlaybackState::Ended,
                message: None,
            })
        }
        SynthEvent::Failed {
            generation,
            message,
        } => {
            if generation != g.generation || g.active.is_none() {
                log::debug!("playback: stale Failed (gen {generation}) dropped");
                return None;
            }
            g.active = None;
            g.state = PlaybackState::Error;
            Some(PlaybackUpdate {
                generation,
                state: PlaybackState::Error,
                message: Some(message),
            })
        }
        SynthEvent::VoicesChanged => {
            let utterance = g.pending.take()?;
            match g.backend.speak(&utterance) {
                Ok(()) => {
                    g.active = Some(utterance);
                    None
                }
                Err(e) => {
                    let generation = utterance.generation;
                    g.state = PlaybackState::Error;
                    Some(PlaybackUpdate {
                        generation,
                        state: PlaybackState::Error,
                        message: Some(e.to_string()),
                    })
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockSpeechBackend  (test-only)
// ---------------------------------------------------------------------------

/// A test double that records spoken utterances and cancel calls.
///
/// The voices-ready flag is shared so tests can flip it after the backend
/// has been moved into a sink.
#[cfg(test)]
pub struct MockSpeechBackend {
    supported: bool,
    fail_speak: bool,
    voices_ready: Arc<std::sync::atomic::AtomicBool>,
    pub spoken: Arc<Mutex<Vec<(u64, String)>>>,
    pub cancels: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl MockSpeechBackend {
    pub fn new() -> Self {
        Self {
            supported: true,
            fail_speak: false,
            voices_ready: Arc::new(std::sync::atomic::AtomicBool::new(true)),
            spoken: Arc::new(Mutex::new(Vec::new())),
            cancels: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn voices_not_ready() -> Self {
        let backend = Self::new();
        backend
            .voices_ready
            .store(false, std::sync::atomic::Ordering::SeqCst);
        backend
    }

    pub fn failing() -> Self {
        Self {
            fail_speak: true,
            ..Self::new()
        }
    }

    /// Handles the test keeps after the backend is moved into a sink.
    pub fn handles(
        &self,
    ) -> (
        Arc<Mutex<Vec<(u64, String)>>>,
        Arc<std::sync::atomic::AtomicUsize>,
        Arc<std::sync::atomic::AtomicBool>,
    ) {
        (
            Arc::clone(&self.spoken),
            Arc::clone(&self.cancels),
            Arc::clone(&self.voices_ready),
        )
    }
}

#[cfg(test)]
impl SpeechBackend for MockSpeechBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn voices_ready(&self) -> bool {
        self.voices_ready.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), PlaybackError> {
        if self.fail_speak {
            return Err(PlaybackError::Backend("synthesis refused".into()));
        }
        self.spoken
            .lock()
            .unwrap()
            .push((utterance.generation, utterance.text.clone()));
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancels
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct Harness {
        sink: PlaybackSink,
        synth_tx: mpsc::Sender<SynthEvent>,
        updates_rx: mpsc::Receiver<PlaybackUpdate>,
    }

    fn harness(backend: MockSpeechBackend) -> Harness {
        let (synth_tx, synth_rx) = mpsc::channel(16);
        let (updates_tx, updates_rx) = mpsc::channel(16);
        let sink = PlaybackSink::new(backend, synth_rx, updates_tx, Some("Google".into()));
        Harness {
            sink,
            synth_tx,
            updates_rx,
        }
    }

    async fn recv_update(rx: &mut mpsc::Receiver<PlaybackUpdate>) -> Option<PlaybackUpdate> {
        tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn speak_reports_speaking_then_ended() {
        let backend = MockSpeechBackend::new();
        let (spoken, _, _) = backend.handles();
        let mut h = harness(backend);

        h.sink.speak("Tell me about yourself").unwrap();
        assert_eq!(spoken.lock().unwrap().len(), 1);

        h.synth_tx
            .send(SynthEvent::Started { generation: 1 })
            .await
            .unwrap();
        h.synth_tx
            .send(SynthEvent::Finished { generation: 1 })
            .await
            .unwrap();

        let first = recv_update(&mut h.updates_rx).await.expect("speaking");
        assert_eq!(first.state, PlaybackState::Speaking);
        let second = recv_update(&mut h.updates_rx).await.expect("ended");
        assert_eq!(second.state, PlaybackState::Ended);
        assert_eq!(h.sink.state(), PlaybackState::Ended);
    }

    #[tokio::test]
    async fn second_speak_cancels_first_and_suppresses_its_events() {
        let backend = MockSpeechBackend::new();
        let (spoken, cancels, _) = backend.handles();
        let mut h = harness(backend);

        h.sink.speak("first question").unwrap();
        h.sink.speak("second question").unwrap();

        // Each speak cancels whatever was playing before it.
        assert_eq!(cancels.load(Ordering::SeqCst), 2);
        assert_eq!(spoken.lock().unwrap().len(), 2);

        // Terminal events from the first utterance must be no-ops.
        h.synth_tx
            .send(SynthEvent::Finished { generation: 1 })
            .await
            .unwrap();
        assert!(recv_update(&mut h.updates_rx).await.is_none());
        assert_ne!(h.sink.state(), PlaybackState::Ended);

        // The second utterance still completes normally.
        h.synth_tx
            .send(SynthEvent::Started { generation: 2 })
            .await
            .unwrap();
        h.synth_tx
            .send(SynthEvent::Finished { generation: 2 })
            .await
            .unwrap();
        let first = recv_update(&mut h.updates_rx).await.expect("speaking");
        assert_eq!(first.generation, 2);
        let second = recv_update(&mut h.updates_rx).await.expect("ended");
        assert_eq!(second.state, PlaybackState::Ended);
    }

    #[tokio::test]
    async fn utterance_is_deferred_until_voices_load_exactly_once() {
        let backend = MockSpeechBackend::voices_not_ready();
        let (spoken, _, voices_ready) = backend.handles();
        let mut h = harness(backend);

        h.sink.speak("deferred question").unwrap();
        assert!(spoken.lock().unwrap().is_empty());

        voices_ready.store(true, Ordering::SeqCst);
        h.synth_tx.send(SynthEvent::VoicesChanged).await.unwrap();
        // A second voices event must not replay the utterance.
        h.synth_tx.send(SynthEvent::VoicesChanged).await.unwrap();

        h.synth_tx
            .send(SynthEvent::Started { generation: 1 })
            .await
            .unwrap();
        let update = recv_update(&mut h.updates_rx).await.expect("speaking");
        assert_eq!(update.state, PlaybackState::Speaking);

        assert_eq!(spoken.lock().unwrap().len(), 1);
        assert_eq!(spoken.lock().unwrap()[0].1, "deferred question");
    }

    #[tokio::test]
    async fn failed_utterance_reports_error_once() {
        let backend = MockSpeechBackend::new();
        let mut h = harness(backend);

        h.sink.speak("question").unwrap();
        h.synth_tx
            .send(SynthEvent::Started { generation: 1 })
            .await
            .unwrap();
        h.synth_tx
            .send(SynthEvent::Failed {
                generation: 1,
                message: "voice vanished".into(),
            })
            .await
            .unwrap();
        // A late duplicate terminal must be dropped.
        h.synth_tx
            .send(SynthEvent::Finished { generation: 1 })
            .await
            .unwrap();

        let first = recv_update(&mut h.updates_rx).await.expect("speaking");
        assert_eq!(first.state, PlaybackState::Speaking);
        let second = recv_update(&mut h.updates_rx).await.expect("error");
        assert_eq!(second.state, PlaybackState::Error);
        assert_eq!(second.message.as_deref(), Some("voice vanished"));
        assert!(recv_update(&mut h.updates_rx).await.is_none());
        assert_eq!(h.sink.state(), PlaybackState::Error);
    }

    #[tokio::test]
    async fn cancel_suppresses_terminal_and_resets_state() {
        let backend = MockSpeechBackend::new();
        let (_, cancels, _) = backend.handles();
        let mut h = harness(backend);

        h.sink.speak("question").unwrap();
        h.sink.cancel();
        assert_eq!(cancels.load(Ordering::SeqCst), 2);
        assert_eq!(h.sink.state(), PlaybackState::Idle);

        h.synth_tx
            .send(SynthEvent::Finished { generation: 1 })
            .await
            .unwrap();
        assert!(recv_update(&mut h.updates_rx).await.is_none());
        assert_eq!(h.sink.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn unsupported_sink_rejects_speak() {
        let backend = MockSpeechBackend::unsupported();
        let h = harness(backend);

        assert!(!h.sink.is_supported());
        let err = h.sink.speak("question").unwrap_err();
        assert!(matches!(err, PlaybackError::Unsupported));
    }

    #[tokio::test]
    async fn backend_rejection_surfaces_as_error() {
        let backend = MockSpeechBackend::failing();
        let h = harness(backend);

        let err = h.sink.speak("question").unwrap_err();
        assert!(matches!(err, PlaybackError::Backend(_)));
        assert_eq!(h.sink.state(), PlaybackState::Error);
    }

    #[test]
    fn playback_state_helpers() {
        assert!(PlaybackState::Ended.is_terminal());
        assert!(PlaybackState::Error.is_terminal());
        assert!(!PlaybackState::Idle.is_terminal());
        assert!(!PlaybackState::Speaking.is_terminal());
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
        assert_eq!(PlaybackState::Speaking.label(), "Speaking");
    }
}
