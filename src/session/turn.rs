//! One question/answer exchange and the outgoing answer composition.

use std::time::Instant;

// ---------------------------------------------------------------------------
// Answer composition
// ---------------------------------------------------------------------------

/// Marker line that introduces a code block in the outgoing answer.
pub const CODE_MARKER: &str = "[CODE_SUBMISSION]";

/// Compose the outgoing answer payload from the captured transcript and the
/// code surface.
///
/// The code block is appended only when the candidate actually edited the
/// code (`dirty`) and it is non-empty; unedited starter code is never
/// submitted.  Pure and deterministic so the wire payload is testable in
/// isolation.
///
/// ```
/// use mock_interview::session::compose_answer;
///
/// assert_eq!(compose_answer("I used recursion", "", false), "I used recursion");
/// assert_eq!(
///     compose_answer("", "def f(): pass", true),
///     "\n\n[CODE_SUBMISSION]\ndef f(): pass"
/// );
/// ```
pub fn compose_answer(transcript: &str, code: &str, dirty: bool) -> String {
    let mut answer = transcript.to_string();
    if dirty && !code.is_empty() {
        answer.push_str("\n\n");
        answer.push_str(CODE_MARKER);
        answer.push('\n');
        answer.push_str(code);
    }
    answer
}

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// One in-progress exchange, created when a question is received and
/// consumed when the answer is submitted.
#[derive(Debug)]
pub struct Turn {
    question: String,
    started_at: Instant,
}

impl Turn {
    /// Begin a turn for `question`.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            started_at: Instant::now(),
        }
    }

    /// The question being answered.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Consume the turn at submission, yielding how long it took.
    pub fn finalize(self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- compose_answer ----------------------------------------------------

    #[test]
    fn transcript_only_passes_through() {
        assert_eq!(
            compose_answer("I used recursion", "", false),
            "I used recursion"
        );
    }

    #[test]
    fn clean_code_is_not_submitted() {
        // Starter code the candidate never touched must stay out of the
        // payload even though the editor holds text.
        assert_eq!(
            compose_answer("my answer", "// Write your code here...", false),
            "my answer"
        );
    }

    #[test]
    fn dirty_code_is_appended_after_the_marker() {
        let answer = compose_answer("see the code", "def f(): pass", true);
        assert_eq!(answer, "see the code\n\n[CODE_SUBMISSION]\ndef f(): pass");
    }

    #[test]
    fn code_only_answer_keeps_the_marker() {
        let answer = compose_answer("", "def f(): pass", true);
        assert!(answer.contains(CODE_MARKER));
        assert!(answer.ends_with("def f(): pass"));
    }

    #[test]
    fn dirty_flag_with_empty_code_adds_nothing() {
        assert_eq!(compose_answer("spoken only", "", true), "spoken only");
    }

    #[test]
    fn empty_inputs_compose_to_empty() {
        assert_eq!(compose_answer("", "", false), "");
    }

    #[test]
    fn composition_is_deterministic() {
        let a = compose_answer("same", "code", true);
        let b = compose_answer("same", "code", true);
        assert_eq!(a, b);
    }

    // ---- Turn --------------------------------------------------------------

    #[test]
    fn turn_keeps_its_question() {
        let turn = Turn::new("Tell me about yourself");
        assert_eq!(turn.question(), "Tell me about yourself");
    }

    #[test]
    fn finalize_yields_elapsed_time() {
        let turn = Turn::new("q");
        let elapsed = turn.finalize();
        assert!(elapsed.as_secs() < 60);
    }
}
