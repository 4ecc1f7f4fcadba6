//! Voice-to-text capture for the mock-interview client.
//!
//! This module provides:
//! * [`CaptureSource`] — start/stop wrapper owning the transcript buffer.
//! * [`CaptureBackend`] — trait implemented by platform recognisers.
//! * [`LineCapture`] — terminal backend that replays fed lines as speech.
//! * [`TranscriptBuffer`] / [`SharedTranscript`] — finalized-fragment store.
//! * [`CaptureEvent`] / [`CaptureError`] — backend event and error types.

pub mod buffer;
pub mod line;
pub mod source;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use buffer::{new_shared_transcript, SharedTranscript, TranscriptBuffer};
pub use line::LineCapture;
pub use source::{CaptureBackend, CaptureError, CaptureEvent, CaptureSource};

#[cfg(test)]
pub use source::MockCaptureBackend;
