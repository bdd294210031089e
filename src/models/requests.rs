//! Request DTOs for the snapshot API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::error::Result;
use crate::tasks::{PollSettings, RefreshInterval};

/// Request body for PUT /settings
///
/// Both fields are optional; omitted ones keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsRequest {
    /// Turn automatic polling on or off
    #[serde(default)]
    pub auto_refresh: Option<bool>,
    /// New refresh interval in seconds (5, 15, 30 or 60)
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl SettingsRequest {
    /// Applies the request on top of the current settings.
    ///
    /// Fails without changing anything if the interval is not one of the
    /// allowed choices.
    pub fn apply(&self, current: PollSettings) -> Result<PollSettings> {
        let interval = match self.interval_secs {
            Some(secs) => RefreshInterval::try_from(secs)?,
            None => current.interval,
        };
        Ok(PollSettings {
            auto_refresh: self.auto_refresh.unwrap_or(current.auto_refresh),
            interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_settings_request_deserialize() {
        let json = r#"{"auto_refresh": false}"#;
        let req: SettingsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.auto_refresh, Some(false));
        assert!(req.interval_secs.is_none());
    }

    #[test]
    fn test_apply_partial_update() {
        let req = SettingsRequest {
            auto_refresh: None,
            interval_secs: Some(60),
        };
        let settings = req.apply(PollSettings::default()).unwrap();
        assert!(settings.auto_refresh);
        assert_eq!(settings.interval, RefreshInterval::Sixty);
    }

    #[test]
    fn test_apply_rejects_unknown_interval() {
        let req = SettingsRequest {
            auto_refresh: Some(false),
            interval_secs: Some(20),
        };
        let result = req.apply(PollSettings::default());
        assert!(matches!(result, Err(EngineError::InvalidRequest(_))));
    }
}
