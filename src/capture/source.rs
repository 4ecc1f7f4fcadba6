//! Continuous voice-to-text capture behind a backend trait.
//!
//! [`CaptureSource`] wraps a [`CaptureBackend`] (the platform speech
//! recogniser) as start/stop plus a stream of transcript fragments.  Only
//! `final` fragments are appended to the transcript buffer; interim
//! fragments are kept for live display and never persisted.
//!
//! Whether the capability exists at all is queried **once** at construction;
//! an unsupported backend degrades every call to a logged no-op instead of
//! an error the caller has to handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use super::buffer::{new_shared_transcript, SharedTranscript};

// ---------------------------------------------------------------------------
// CaptureEvent
// ---------------------------------------------------------------------------

/// A single event delivered by the capture backend.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A recognised piece of speech.
    ///
    /// `is_final` distinguishes finalized fragments (appended to the
    /// transcript) from interim ones (display only).
    Fragment { text: String, is_final: bool },
    /// A recoverable recogniser error.
    Error { message: String },
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while controlling the capture backend.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// Speech recognition is not available in this environment.
    #[error("speech capture is not supported in this environment")]
    Unsupported,

    /// The backend failed to start or stop.
    #[error("capture backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// CaptureBackend trait
// ---------------------------------------------------------------------------

/// Platform speech-recognition capability.
///
/// Implementations deliver [`CaptureEvent`]s on the sender passed to
/// [`start`](Self::start) and must tolerate repeated `start`/`stop` cycles.
/// Fragment delivery after `stop` is permitted (the source gates on its own
/// running flag), but implementations should cease promptly.
pub trait CaptureBackend: Send + 'static {
    /// Whether the capability exists at all.  Queried once at construction
    /// of the owning [`CaptureSource`].
    fn is_supported(&self) -> bool;

    /// Begin delivering events on `tx`.
    fn start(&mut self, tx: mpsc::Sender<CaptureEvent>) -> Result<(), CaptureError>;

    /// Stop delivering events.  Safe to call when not started.
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// CaptureSource
// ---------------------------------------------------------------------------

/// Voice-to-text capture source owning the transcript buffer.
///
/// A pump task (spawned at construction) moves backend events into the
/// buffer while capture is running.  The session controller enables and
/// disables capture around its Listening state and drains the buffer at
/// submission via [`take_transcript`](Self::take_transcript).
pub struct CaptureSource {
    backend: Box<dyn CaptureBackend>,
    buffer: SharedTranscript,
    events_tx: mpsc::Sender<CaptureEvent>,
    /// Shared with the pump so fragments arriving after `stop` are dropped
    /// rather than appended to the next turn's transcript.
    running: Arc<AtomicBool>,
    supported: bool,
}

impl CaptureSource {
    /// Wrap `backend` and spawn the event pump.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(backend: impl CaptureBackend) -> Self {
        let supported = backend.is_supported();
        let buffer = new_shared_transcript();
        let running = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::channel::<CaptureEvent>(64);

        spawn_pump(Arc::clone(&buffer), Arc::clone(&running), events_rx);

        if !supported {
            log::warn!("capture: speech recognition unsupported, control disabled");
        }

        Self {
            backend: Box::new(backend),
            buffer,
            events_tx,
            running,
            supported,
        }
    }

    /// Whether speech capture is available at all (queried at construction).
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Whether capture is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Begin capturing.
    ///
    /// No-op when already running or when the capability is unsupported;
    /// neither case is an error.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if !self.supported {
            log::debug!("capture: start ignored (unsupported)");
            return Ok(());
        }
        if self.is_running() {
            return Ok(());
        }

        self.backend.start(self.events_tx.clone())?;
        self.running.store(true, Ordering::SeqCst);
        log::debug!("capture: started");
        Ok(())
    }

    /// Stop capturing.  Safe to call when not running.
    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.backend.stop();
            log::debug!("capture: stopped");
        }
    }

    /// Clear the transcript buffer.
    ///
    /// When capture is active the backend is stopped and restarted so the
    /// recogniser does not retain partially buffered speech from before the
    /// reset.
    pub fn reset(&mut self) -> Result<(), CaptureError> {
        self.buffer.lock().unwrap().clear();

        if self.is_running() {
            self.backend.stop();
            if let Err(e) = self.backend.start(self.events_tx.clone()) {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }
        Ok(())
    }

    /// The finalized transcript accumulated so far.
    pub fn transcript(&self) -> String {
        self.buffer.lock().unwrap().text()
    }

    /// The latest interim fragment, for live display.
    pub fn interim(&self) -> String {
        self.buffer.lock().unwrap().interim().to_string()
    }

    /// Returns `true` when at least one finalized fragment has been captured.
    pub fn has_speech(&self) -> bool {
        !self.buffer.lock().unwrap().is_empty()
    }

    /// Return the finalized transcript and clear the buffer.
    pub fn take_transcript(&self) -> String {
        self.buffer.lock().unwrap().take()
    }
}

// ---------------------------------------------------------------------------
// Event pump
// ---------------------------------------------------------------------------

/// Move backend events into the shared buffer while capture is running.
fn spawn_pump(
    buffer: SharedTranscript,
    running: Arc<AtomicBool>,
    mut events_rx: mpsc::Receiver<CaptureEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                CaptureEvent::Fragment { text, is_final } => {
                    // Fragments delivered after stop belong to no turn.
                    if !running.load(Ordering::SeqCst) {
                        continue;
                    }
                    let mut buf = buffer.lock().unwrap();
                    if is_final {
                        buf.push_final(&text);
                    } else {
                        buf.set_interim(&text);
                    }
                }
                CaptureEvent::Error { message } => {
                    // Recogniser errors are non-fatal; the candidate can
                    // keep speaking or retry.
                    log::warn!("capture: recogniser error: {message}");
                }
            }
        }
        log::debug!("capture: event channel closed, pump exiting");
    });
}

// ---------------------------------------------------------------------------
// MockCaptureBackend  (test-only)
// ---------------------------------------------------------------------------

/// A test double that records start/stop calls and hands the test its event
/// sender so fragments can be injected manually.
#[cfg(test)]
pub struct MockCaptureBackend {
    supported: bool,
    pub starts: Arc<std::sync::atomic::AtomicUsize>,
    pub stops: Arc<std::sync::atomic::AtomicUsize>,
    pub last_tx: Arc<std::sync::Mutex<Option<mpsc::Sender<CaptureEvent>>>>,
}

#[cfg(test)]
impl MockCaptureBackend {
    pub fn new() -> Self {
        Self {
            supported: true,
            starts: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            stops: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            last_tx: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Handles the test keeps after the backend is moved into a source.
    pub fn handles(
        &self,
    ) -> (
        Arc<std::sync::atomic::AtomicUsize>,
        Arc<std::sync::atomic::AtomicUsize>,
        Arc<std::sync::Mutex<Option<mpsc::Sender<CaptureEvent>>>>,
    ) {
        (
            Arc::clone(&self.starts),
            Arc::clone(&self.stops),
            Arc::clone(&self.last_tx),
        )
    }
}

#[cfg(test)]
impl CaptureBackend for MockCaptureBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&mut self, tx: mpsc::Sender<CaptureEvent>) -> Result<(), CaptureError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.last_tx.lock().unwrap() = Some(tx);
        Ok(())
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
