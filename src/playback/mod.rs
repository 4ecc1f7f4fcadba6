//! Text-to-speech playback for the mock-interview client.
//!
//! This module provides:
//! * [`PlaybackSink`] — one-utterance-at-a-time speech output with
//!   cancellation and stale-event suppression.
//! * [`SpeechBackend`] — trait implemented by platform synthesisers.
//! * [`ConsoleVoice`] — terminal backend that prints the spoken line.
//! * [`PlaybackState`] / [`PlaybackUpdate`] — lifecycle observed by the
//!   session controller.
//! * [`Utterance`] / [`SynthEvent`] / [`PlaybackError`] — backend types.

pub mod console;
pub mod sink;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use console::ConsoleVoice;
pub use sink::{
    PlaybackError, PlaybackSink, PlaybackState, PlaybackUpdate, SpeechBackend, SynthEvent,
    Utterance,
};

#[cfg(test)]
pub use sink::MockSpeechBackend;
