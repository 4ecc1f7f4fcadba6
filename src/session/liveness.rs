//! Camera/attentiveness status as reported by the external sensor.
//!
//! The sensor owns its image analysis; this client only displays the
//! tri-state report it produces and never reacts to it programmatically.

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How urgently the report should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

// ---------------------------------------------------------------------------
// LivenessStatus
// ---------------------------------------------------------------------------

/// One report from the camera sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessStatus {
    /// Whether the candidate is visibly present and attentive.
    pub ok: bool,
    /// Human-readable description of the current assessment.
    pub message: String,
    /// Display severity.
    pub severity: Severity,
}

impl LivenessStatus {
    /// Build a report.
    pub fn new(ok: bool, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            ok,
            message: message.into(),
            severity,
        }
    }
}

impl Default for LivenessStatus {
    /// The pre-first-report placeholder shown while the sensor warms up.
    fn default() -> Self {
        Self::new(false, "Analysing your stream", Severity::Info)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_warmup_placeholder() {
        let status = LivenessStatus::default();
        assert!(!status.ok);
        assert_eq!(status.message, "Analysing your stream");
        assert_eq!(status.severity, Severity::Info);
    }

    #[test]
    fn constructor_preserves_fields() {
        let status = LivenessStatus::new(true, "Looking good", Severity::Info);
        assert!(status.ok);
        assert_eq!(status.message, "Looking good");
    }
}
