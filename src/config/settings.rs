//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Settings for the remote question-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the interview backend (no trailing slash).
    pub base_url: String,
    /// Maximum seconds to wait for a question before timing out.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for continuous speech capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Recognition language as a BCP-47 tag (e.g. `"en-US"`).
    pub language: String,
    /// Keep capturing across pauses instead of stopping after one phrase.
    pub continuous: bool,
    /// Deliver interim (not yet finalized) fragments for live display.
    pub interim_results: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: "en-US".into(),
            continuous: true,
            interim_results: true,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for spoken question delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Substring used to pick a preferred voice from the backend's voice
    /// list (e.g. `"Google"`); the backend falls back to its first voice.
    pub voice_hint: String,
    /// Voice language filter (e.g. `"en"`).
    pub language: String,
    /// Speech rate multiplier (1.0 = normal).
    pub rate: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            voice_hint: "Google".into(),
            language: "en".into(),
            rate: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for the interview session itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Placeholder shown in the code editor before any starter arrives.
    pub starter_code: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starter_code: "// Write your code here...".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use mock_interview::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Question service settings.
    pub service: ServiceConfig,
    /// Speech capture settings.
    pub capture: CaptureConfig,
    /// Speech playback settings.
    pub playback: PlaybackConfig,
    /// Interview session settings.
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.service.base_url, loaded.service.base_url);
        assert_eq!(original.service.timeout_secs, loaded.service.timeout_secs);
        assert_eq!(original.capture.language, loaded.capture.language);
        assert_eq!(original.capture.continuous, loaded.capture.continuous);
        assert_eq!(
            original.capture.interim_results,
            loaded.capture.interim_results
        );
        assert_eq!(original.playback.voice_hint, loaded.playback.voice_hint);
        assert_eq!(original.playback.language, loaded.playback.language);
        assert_eq!(original.playback.rate, loaded.playback.rate);
        assert_eq!(original.session.starter_code, loaded.session.starter_code);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.service.base_url, default.service.base_url);
        assert_eq!(config.capture.language, default.capture.language);
        assert_eq!(config.session.starter_code, default.session.starter_code);
    }

    /// Verify default values.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.service.base_url, "http://localhost:8080");
        assert_eq!(cfg.service.timeout_secs, 30);
        assert_eq!(cfg.capture.language, "en-US");
        assert!(cfg.capture.continuous);
        assert!(cfg.capture.interim_results);
        assert_eq!(cfg.playback.voice_hint, "Google");
        assert_eq!(cfg.session.starter_code, "// Write your code here...");
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.service.base_url = "https://interview.example.com".into();
        cfg.service.timeout_secs = 60;
        cfg.capture.language = "en-GB".into();
        cfg.capture.continuous = false;
        cfg.playback.voice_hint = "Microsoft".into();
        cfg.playback.rate = 1.25;
        cfg.session.starter_code = "# your solution".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.service.base_url, "https://interview.example.com");
        assert_eq!(loaded.service.timeout_secs, 60);
        assert_eq!(loaded.capture.language, "en-GB");
        assert!(!loaded.capture.continuous);
        assert_eq!(loaded.playback.voice_hint, "Microsoft");
        assert_eq!(loaded.playback.rate, 1.25);
        assert_eq!(loaded.session.starter_code, "# your solution");
    }
}
