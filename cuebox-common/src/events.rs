//! Event types for the cuebox event system
//!
//! The playback manager broadcasts these over a `tokio::sync::broadcast`
//! channel so front ends can observe session lifecycle without polling.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Non-looping track list played through to the end
    Completed,
    /// Stop requested by the manager (user cancellation or replacement)
    Cancelled,
    /// Session aborted itself (missing directory/file, engine failure)
    Failed,
}

/// Playback event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaybackEvent {
    /// A playback session was spawned for a (group, track list) pair
    SessionStarted {
        session_id: Uuid,
        group: String,
        track_list: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track began playing
    TrackStarted {
        session_id: Uuid,
        file: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track played to its natural end
    TrackFinished {
        session_id: Uuid,
        file: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session tore down; `reason` distinguishes completion,
    /// cancellation, and failure (manager state does not)
    SessionEnded {
        session_id: Uuid,
        track_list: String,
        reason: EndReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The global volume changed
    VolumeChanged {
        volume: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlaybackEvent {
    /// Event type name as serialized in the `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            PlaybackEvent::SessionStarted { .. } => "SessionStarted",
            PlaybackEvent::TrackStarted { .. } => "TrackStarted",
            PlaybackEvent::TrackFinished { .. } => "TrackFinished",
            PlaybackEvent::SessionEnded { .. } => "SessionEnded",
            PlaybackEvent::VolumeChanged { .. } => "VolumeChanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tag() {
        let event = PlaybackEvent::VolumeChanged {
            volume: 40,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "VolumeChanged");
        assert_eq!(json["volume"], 40);
    }

    #[test]
    fn test_end_reason_serialization() {
        let event = PlaybackEvent::SessionEnded {
            session_id: Uuid::new_v4(),
            track_list: "ambient".to_string(),
            reason: EndReason::Cancelled,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reason"], "cancelled");
    }

    #[test]
    fn test_event_type_names() {
        let event = PlaybackEvent::TrackStarted {
            session_id: Uuid::new_v4(),
            file: "a.mp3".to_string(),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.event_type(), "TrackStarted");
    }
}
