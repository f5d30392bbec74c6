use serde::{
    Serialize,
    Deserialize
};
use serenity::model::id::UserId as DiscordUserId;
use std::time::Duration;

/// An opaque playable track reference, as produced by the player backend.
///
/// The queue never inspects the encoded data, it only carries it back to the
/// player. The metadata block is optional since some backends resolve it
/// lazily.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Track {
    pub track: String,
    pub info: Option<TrackInfo>
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub is_seekable: bool,
    pub author: String,
    pub length: u64,
    pub is_stream: bool,
    pub position: u64,
    pub title: String,
    pub uri: String
}

/// Identity of the member who requested a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequester {
    pub id: DiscordUserId,
    pub name: Option<String>
}

impl From<DiscordUserId> for TrackRequester {
    fn from(id: DiscordUserId) -> TrackRequester {
        TrackRequester { id, name: None }
    }
}

impl From<(DiscordUserId, String)> for TrackRequester {
    fn from(data: (DiscordUserId, String)) -> TrackRequester {
        TrackRequester { id: data.0, name: Some(data.1) }
    }
}

/// A single queue entry. Created when a play command resolves a track and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicItem {
    pub track: Track,
    pub start_time: Option<Duration>,
    pub play_length: Option<Duration>,
    pub requested_by: TrackRequester
}

impl MusicItem {
    pub fn new(track: Track, requested_by: impl Into<TrackRequester>) -> Self {
        Self {
            track,
            start_time: None,
            play_length: None,
            requested_by: requested_by.into()
        }
    }

    /// An entry that plays a clipped section of the track instead of the
    /// whole of it.
    pub fn partial(track: Track, start_time: Duration, play_length: Duration, requested_by: impl Into<TrackRequester>) -> Self {
        Self {
            track,
            start_time: Some(start_time),
            play_length: Some(play_length),
            requested_by: requested_by.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_deserializes_from_player_payload() {
        let raw = r#"{
            "track": "QAAAjQIAJFJpY2sgQXN0bGV5",
            "info": {
                "identifier": "dQw4w9WgXcQ",
                "isSeekable": true,
                "author": "Rick Astley",
                "length": 212000,
                "isStream": false,
                "position": 0,
                "title": "Never Gonna Give You Up",
                "uri": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
            }
        }"#;

        let track: Track = serde_json::from_str(raw).unwrap();
        let info = track.info.unwrap();

        assert_eq!(track.track, "QAAAjQIAJFJpY2sgQXN0bGV5");
        assert_eq!(info.title, "Never Gonna Give You Up");
        assert_eq!(info.length, 212000);
        assert!(info.is_seekable);
    }

    #[test]
    fn partial_item_keeps_clip_bounds() {
        let item = MusicItem::partial(
            Track::default(),
            Duration::from_secs(30),
            Duration::from_secs(10),
            DiscordUserId::new(1),
        );

        assert_eq!(item.start_time, Some(Duration::from_secs(30)));
        assert_eq!(item.play_length, Some(Duration::from_secs(10)));
        assert_eq!(item.requested_by.name, None);
    }
}
