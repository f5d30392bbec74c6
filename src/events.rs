use async_trait::async_trait;
use serenity::model::id::GuildId as DiscordGuildId;
use std::sync::Weak;
use tracing::error;

use crate::{data::GuildMusicData, model::MusicItem};

/// Callbacks a player backend fires at the library.
///
/// A handle implementing this is given to [`PlayerConnector::connect`] and
/// kept by the connection for its lifetime.
///
/// [`PlayerConnector::connect`]: crate::player::PlayerConnector::connect
#[async_trait]
pub trait ConnectionEvents: Send + Sync + 'static {
    /// The current track played to its end.
    async fn playback_finished(&self);
    /// The current track failed mid-playback.
    async fn playback_error(&self, error: String);
}

/// Callbacks the library fires at the embedding bot.
///
/// All methods default to doing nothing, implement the ones you care about.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// A track raised a playback error. The command layer usually reports
    /// this to the guild's command channel.
    async fn track_exception(&self, _guild: DiscordGuildId, _item: Option<MusicItem>, _error: String) {}
}

pub(crate) struct NullEventHandler;

#[async_trait]
impl EventHandler for NullEventHandler {}

/// Glue between a player connection and its guild's queue controller.
///
/// Holds the controller weakly so a destroyed guild dataset does not stay
/// alive through the connection's event handle.
pub(crate) struct PlaybackHandler {
    data: Weak<GuildMusicData>,
}

impl PlaybackHandler {
    pub(crate) fn new(data: Weak<GuildMusicData>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ConnectionEvents for PlaybackHandler {
    async fn playback_finished(&self) {
        let data = match self.data.upgrade() {
            Some(data) => data,
            None => return,
        };

        if let Err(why) = data.playback_finished().await {
            error!("Failed to advance playback on guild {}: {}", data.guild(), why);
        }
    }

    async fn playback_error(&self, error: String) {
        if let Some(data) = self.data.upgrade() {
            data.handle_playback_error(error).await;
        }
    }
}
