use serde::{Deserialize, Serialize};

use crate::playback_settings::{DEFAULT_MAX_GAP, MAX_REPEAT, MIN_GAP, MIN_REPEAT};

/// Upper bound accepted for `max_gap`, matching the relaxed player.
pub const MAX_GAP_LIMIT: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cdn_host: String,
    pub audio_quality: String,
    pub reciter: String,
    pub text_api_base: String,
    pub verse_text_path: Option<String>,
    pub default_repeat: u32,
    pub default_gap: f64,
    pub max_gap: f64,
    pub show_text: bool,
    pub fetch_timeout_secs: u64,
    pub log_file: Option<String>,
}

impl Settings {
    /// Pull numeric fields back into their valid ranges.
    pub fn clamp(&mut self) {
        if !self.max_gap.is_finite() {
            self.max_gap = DEFAULT_MAX_GAP;
        }
        self.max_gap = self.max_gap.clamp(MIN_GAP, MAX_GAP_LIMIT);
        if !self.default_gap.is_finite() {
            self.default_gap = MIN_GAP;
        }
        self.default_gap = self.default_gap.clamp(MIN_GAP, self.max_gap);
        self.default_repeat = self.default_repeat.clamp(MIN_REPEAT, MAX_REPEAT);
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = Self::default().fetch_timeout_secs;
        }
        if self.cdn_host.trim().is_empty() {
            self.cdn_host = Self::default().cdn_host;
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cdn_host: "cdn.islamic.network".to_string(),
            audio_quality: "192".to_string(),
            reciter: "ar.abdurrahmaansudais".to_string(),
            text_api_base: "https://api.alquran.cloud/v1".to_string(),
            verse_text_path: None,
            default_repeat: 1,
            default_gap: 2.0,
            max_gap: DEFAULT_MAX_GAP,
            show_text: true,
            fetch_timeout_secs: 10,
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.cdn_host, "cdn.islamic.network");
        assert_eq!(settings.audio_quality, "192");
        assert_eq!(settings.reciter, "ar.abdurrahmaansudais");
        assert_eq!(settings.default_repeat, 1);
        assert_eq!(settings.default_gap, 2.0);
        assert_eq!(settings.max_gap, 30.0);
        assert!(settings.show_text);
        assert_eq!(settings.verse_text_path, None);
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let serialized = serde_json::to_string(&settings).unwrap();
        let deserialized: Settings = serde_json::from_str(&serialized).unwrap();
        assert_eq!(settings, deserialized);
    }

    #[test]
    fn test_settings_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"reciter": "ar.alafasy"}"#).unwrap();
        assert_eq!(settings.reciter, "ar.alafasy");
        assert_eq!(settings.audio_quality, "192");
        assert_eq!(settings.max_gap, 30.0);
    }

    #[test]
    fn test_settings_clamp() {
        let mut settings = Settings {
            default_repeat: 0,
            default_gap: 45.0,
            max_gap: 5000.0,
            fetch_timeout_secs: 0,
            cdn_host: "  ".to_string(),
            ..Settings::default()
        };
        settings.clamp();
        assert_eq!(settings.default_repeat, 1);
        assert_eq!(settings.max_gap, 1000.0);
        assert_eq!(settings.default_gap, 45.0);
        assert_eq!(settings.fetch_timeout_secs, 10);
        assert_eq!(settings.cdn_host, "cdn.islamic.network");

        let mut settings = Settings {
            default_repeat: 500,
            default_gap: 45.0,
            ..Settings::default()
        };
        settings.clamp();
        assert_eq!(settings.default_repeat, 100);
        assert_eq!(settings.default_gap, 30.0);
    }

    #[test]
    fn test_settings_clamp_non_finite() {
        let mut settings = Settings {
            default_gap: f64::NAN,
            max_gap: f64::INFINITY,
            ..Settings::default()
        };
        settings.clamp();
        assert_eq!(settings.max_gap, 30.0);
        assert_eq!(settings.default_gap, 0.0);
    }
}
