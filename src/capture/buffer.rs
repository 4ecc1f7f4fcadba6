//! Transcript accumulation buffer for one interview turn.
//!
//! [`TranscriptBuffer`] collects **finalized** speech fragments as they are
//! recognised.  Interim fragments are kept separately for live display and
//! are never merged into the finalized transcript, so a fragment that is
//! first reported interim and later finalized appears exactly once.
//!
//! # Example
//!
//! ```rust
//! use mock_interview::capture::TranscriptBuffer;
//!
//! let mut buf = TranscriptBuffer::new();
//! buf.set_interim("I used");
//! buf.push_final("I used recursion");
//! assert_eq!(buf.text(), "I used recursion");
//! assert_eq!(buf.take(), "I used recursion");
//! assert!(buf.is_empty());
//! ```

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// TranscriptBuffer
// ---------------------------------------------------------------------------

/// Accumulated speech fragments for the current turn.
///
/// Mutated only by the capture pump; read and cleared by the session
/// controller when the candidate submits an answer.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    /// Finalized fragments in arrival order.
    chunks: Vec<String>,
    /// Most recent interim (not yet finalized) fragment, for live display.
    interim: String,
}

impl TranscriptBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized fragment.
    ///
    /// Whitespace-only fragments are discarded.  A pending interim fragment
    /// is dropped since its finalized form has now arrived.
    pub fn push_final(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.chunks.push(trimmed.to_string());
        self.interim.clear();
    }

    /// Replace the interim fragment shown during live display.
    pub fn set_interim(&mut self, text: &str) {
        self.interim = text.trim().to_string();
    }

    /// The finalized transcript, fragments joined with single spaces.
    ///
    /// Interim text is never included.
    pub fn text(&self) -> String {
        self.chunks.join(" ")
    }

    /// The current interim fragment (empty when none).
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Returns `true` when no finalized fragment has been captured yet.
    ///
    /// An interim fragment alone does not count as captured speech.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return the finalized transcript and clear the buffer.
    pub fn take(&mut self) -> String {
        let text = self.text();
        self.clear();
        text
    }

    /// Discard all finalized and interim fragments.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.interim.clear();
    }
}

// ---------------------------------------------------------------------------
// SharedTranscript
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`TranscriptBuffer`].
///
/// Cheap to clone (`Arc` clone).  Lock for short critical sections only;
/// do **not** hold the lock across `.await` points.
pub type SharedTranscript = Arc<Mutex<TranscriptBuffer>>;

/// Construct a new empty [`SharedTranscript`].
pub fn new_shared_transcript() -> SharedTranscript {
    Arc::new(Mutex::new(TranscriptBuffer::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
