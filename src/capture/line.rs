//! Line-feed capture backend for the terminal front-end.
//!
//! [`LineCapture`] replays lines from a channel (stdin in `main`) as
//! finalized transcript fragments while capture is started.  Lines arriving
//! while stopped are discarded, matching a recogniser that hears nothing
//! when the microphone is off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::source::{CaptureBackend, CaptureError, CaptureEvent};

// ---------------------------------------------------------------------------
// LineCapture
// ---------------------------------------------------------------------------

/// Capture backend fed by a channel of text lines.
///
/// The forwarding task is spawned on the first [`start`](CaptureBackend::start)
/// and lives for the lifetime of the feed; `start`/`stop` toggle a flag the
/// task consults per line, so repeated cycles are cheap.
pub struct LineCapture {
    feed: Option<mpsc::Receiver<String>>,
    forwarding: Arc<AtomicBool>,
    supported: bool,
}

impl LineCapture {
    /// Create a backend that forwards lines from `feed`.
    pub fn new(feed: mpsc::Receiver<String>) -> Self {
        Self {
            feed: Some(feed),
            forwarding: Arc::new(AtomicBool::new(false)),
            supported: true,
        }
    }

    /// Create a backend that reports the capability as absent.
    ///
    /// Used to exercise the degraded "capture unsupported" path without a
    /// platform that actually lacks the capability.
    pub fn unsupported() -> Self {
        Self {
            feed: None,
            forwarding: Arc::new(AtomicBool::new(false)),
            supported: false,
        }
    }
}

impl CaptureBackend for LineCapture {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&mut self, tx: mpsc::Sender<CaptureEvent>) -> Result<(), CaptureError> {
        if !self.supported {
            return Err(CaptureError::Unsupported);
        }

        self.forwarding.store(true, Ordering::SeqCst);

        // First start: move the feed into the forwarding task.  Later
        // starts only flip the flag back on.
        if let Some(mut feed) = self.feed.take() {
            let forwarding = Arc::clone(&self.forwarding);
            tokio::spawn(async move {
                while let Some(line) = feed.recv().await {
                    if !forwarding.load(Ordering::SeqCst) {
                        continue;
                    }
                    let event = CaptureEvent::Fragment {
                        text: line,
                        is_final: true,
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                log::debug!("capture: line feed closed");
            });
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.forwarding.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn recv_fragment(rx: &mut mpsc::Receiver<CaptureEvent>) -> Option<(String, bool)> {
        match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            Ok(Some(CaptureEvent::Fragment { text, is_final })) => Some((text, is_final)),
            _ => None,
        }
    }

    #[tokio::test]
    async fn forwards_lines_as_final_fragments() {
        let (feed_tx, feed_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = mpsc::channel(8);

        let mut backend = LineCapture::new(feed_rx);
        backend.start(events_tx).unwrap();

        feed_tx.send("I used recursion".to_string()).await.unwrap();

        let (text, is_final) = recv_fragment(&mut events_rx).await.expect("fragment");
        assert_eq!(text, "I used recursion");
        assert!(is_final);
    }

    #[tokio::test]
    async fn lines_while_stopped_are_discarded() {
        let (feed_tx, feed_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = mpsc::channel(8);

        let mut backend = LineCapture::new(feed_rx);
        backend.start(events_tx.clone()).unwrap();
        backend.stop();

        feed_tx.send("unheard".to_string()).await.unwrap();
        assert!(recv_fragment(&mut events_rx).await.is_none());

        // Restart: new lines flow again, the discarded one stays gone.
        backend.start(events_tx).expect("restart after stop");
        feed_tx.send("heard".to_string()).await.unwrap();
        let (text, _) = recv_fragment(&mut events_rx).await.expect("fragment");
        assert_eq!(text, "heard");
    }

    #[tokio::test]
    async fn unsupported_backend_refuses_to_start() {
        let (events_tx, _events_rx) = mpsc::channel(8);
        let mut backend = LineCapture::unsupported();

        assert!(!backend.is_supported());
        let err = backend.start(events_tx).unwrap_err();
        assert!(matches!(err, CaptureError::Unsupported));
    }
}
