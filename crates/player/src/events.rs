//! Events the controller hands to its hosting surface.

use narrator_core::PlaybackStatus;
use serde::{Deserialize, Serialize};

/// One observable change in the player, drained via [`crate::Player::pump`].
///
/// Serializes with a `type` tag so a frontend can dispatch on it
/// without knowing the Rust enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// The playback status changed.
    StatusChanged { status: PlaybackStatus },
    /// Whole-document extraction progress, 0..=100.
    Progress { percent: u8 },
    /// A background operation failed.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = PlayerEvent::StatusChanged {
            status: PlaybackStatus::Playing,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "status_changed", "status": "Playing"})
        );

        let event = PlayerEvent::Progress { percent: 40 };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "progress", "percent": 40})
        );

        let event = PlayerEvent::Error {
            message: "synthesis failed".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "error", "message": "synthesis failed"})
        );
    }

    #[test]
    fn test_events_round_trip() {
        let event = PlayerEvent::StatusChanged {
            status: PlaybackStatus::Paused,
        };
        let text = serde_json::to_string(&event).unwrap();
        let back: PlayerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }
}
