//! Console speech backend for the terminal front-end.
//!
//! [`ConsoleVoice`] "speaks" by printing the interviewer's line to stdout
//! and immediately reporting the `Started`/`Finished` lifecycle, so the
//! session loop advances exactly as it would with a real synthesiser.

use tokio::sync::mpsc;

use super::sink::{PlaybackError, SpeechBackend, SynthEvent, Utterance};

// ---------------------------------------------------------------------------
// ConsoleVoice
// ---------------------------------------------------------------------------

/// Speech backend that prints instead of synthesising audio.
pub struct ConsoleVoice {
    events_tx: mpsc::Sender<SynthEvent>,
}

impl ConsoleVoice {
    /// Create a backend reporting lifecycle events on `events_tx`.
    pub fn new(events_tx: mpsc::Sender<SynthEvent>) -> Self {
        Self { events_tx }
    }

    fn emit(&self, event: SynthEvent) -> Result<(), PlaybackError> {
        self.events_tx
            .try_send(event)
            .map_err(|e| PlaybackError::Backend(format!("event channel: {e}")))
    }
}

impl SpeechBackend for ConsoleVoice {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices_ready(&self) -> bool {
        // Printing needs no voice list.
        true
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), PlaybackError> {
        println!();
        println!("interviewer> {}", utterance.text);

        let generation = utterance.generation;
        self.emit(SynthEvent::Started { generation })?;
        self.emit(SynthEvent::Finished { generation })?;
        Ok(())
    }

    fn cancel(&mut self) {
        // Printed text cannot be unprinted; lifecycle suppression is the
        // sink's job.
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
