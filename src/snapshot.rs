// Save-for-later / share snapshots of the full booking state

use crate::config::BookingConfig;
use crate::store::BookingState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Snapshot {id} expired at {expired_at}")]
    Expired {
        id: String,
        expired_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub state: BookingState,
    pub share_url: String,
    pub expires_at: DateTime<Utc>,
}

impl BookingSnapshot {
    // Read-only capture of `state`; ids are time based
    pub fn capture(state: &BookingState, config: &BookingConfig, now: DateTime<Utc>) -> Self {
        let id = format!("booking-{}", now.timestamp_millis());
        Self {
            share_url: config.share_url(&id),
            id,
            created_at: now,
            state: state.clone(),
            expires_at: now + Duration::days(config.snapshot_ttl_days),
        }
    }

    // Informational only; loading a snapshot never checks this
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // Clipboard text
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::BookingStep;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn sample_state() -> BookingState {
        let mut state = BookingState::default();
        state.selected_category = Some("sunrise".to_string());
        state.selected_ride = Some("sunrise-big-five".to_string());
        state.addons = vec!["x".to_string()];
        state.total_price = 308.0;
        state.estimated_duration = "4h".to_string();
        state.current_step = BookingStep::Party;
        state.completed_steps.insert(BookingStep::Category);
        state.completed_steps.insert(BookingStep::Datetime);
        state
    }

    #[test]
    fn test_capture_stamps_id_urls_and_expiry() {
        let config = BookingConfig {
            share_base_url: "https://savanna.example".to_string(),
            ..Default::default()
        };
        let now = at(8);
        let snapshot = BookingSnapshot::capture(&sample_state(), &config, now);

        assert_eq!(snapshot.id, format!("booking-{}", now.timestamp_millis()));
        assert_eq!(
            snapshot.share_url,
            format!("https://savanna.example/booking/{}", snapshot.id)
        );
        assert_eq!(snapshot.created_at, now);
        assert_eq!(snapshot.expires_at - snapshot.created_at, Duration::days(7));
        assert_eq!(snapshot.state, sample_state());
    }

    #[test]
    fn test_expiry_is_informational() {
        let snapshot = BookingSnapshot::capture(&sample_state(), &BookingConfig::default(), at(8));
        assert!(!snapshot.is_expired_at(at(9)));
        assert!(snapshot.is_expired_at(snapshot.expires_at));
    }

    #[test]
    fn test_clipboard_text_uses_camel_case_wire_names() {
        let snapshot = BookingSnapshot::capture(&sample_state(), &BookingConfig::default(), at(8));
        let text = snapshot.to_json_pretty().unwrap();

        assert!(text.contains("\"shareUrl\""));
        assert!(text.contains("\"selectedRide\": \"sunrise-big-five\""));
        assert!(text.contains("\"currentStep\": \"party\""));
        assert!(!text.contains("startingPoint"));

        let parsed = BookingSnapshot::from_json(&text).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_malformed_text_is_rejected() {
        let result = BookingSnapshot::from_json("{\"id\": \"booking-1\"}");
        assert!(matches!(result, Err(SnapshotError::ParseError(_))));
    }
}
