//! Tracker configuration loaded from JSON.
use serde::{Deserialize, Serialize};

use crate::layout::ScreenLayout;
use crate::recognizer::MatchMode;

/// Runtime configuration; every field has a default so partial files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Integer factor the raw capture is shrunk by before recognition.
    #[serde(default = "TrackerConfig::default_scale")]
    pub scale: u32,
    /// Ignore template background pixels while matching.
    #[serde(default)]
    pub masked: bool,
    #[serde(default)]
    pub layout: ScreenLayout,
}

impl TrackerConfig {
    const fn default_scale() -> u32 {
        1
    }

    /// Parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub const fn match_mode(&self) -> MatchMode {
        if self.masked {
            MatchMode::Masked
        } else {
            MatchMode::Plain
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scale: Self::default_scale(),
            masked: false,
            layout: ScreenLayout::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = TrackerConfig::from_json("{}").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.match_mode(), MatchMode::Plain);
    }

    #[test]
    fn scale_and_mask_override() {
        let config = TrackerConfig::from_json(r#"{"scale": 3, "masked": true}"#).unwrap();
        assert_eq!(config.scale, 3);
        assert_eq!(config.match_mode(), MatchMode::Masked);
    }
}
