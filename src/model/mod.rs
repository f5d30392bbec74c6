pub mod track;

use std::fmt;
use std::time::Duration;

pub use track::{MusicItem, Track, TrackInfo, TrackRequester};

/// Governs what happens to items handed out by the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatMode {
    //dequeued items are discarded
    None,
    //the head item repeats until the mode changes
    Single,
    //dequeued items cycle back to the tail
    All,
}

impl Default for RepeatMode {
    fn default() -> Self {
        RepeatMode::None
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RepeatMode::None => write!(f, "None"),
            RepeatMode::Single => write!(f, "Single"),
            RepeatMode::All => write!(f, "All"),
        }
    }
}

/// Seek target for the currently playing track.
///
/// The relative variants exist because `Duration` carries no sign, so a
/// rewind cannot be expressed as a negative offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seek {
    Absolute(Duration),
    Forward(Duration),
    Backward(Duration),
}
