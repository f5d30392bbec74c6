use dashmap::DashMap;
use serenity::model::id::GuildId as DiscordGuildId;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use typemap_rev::TypeMap;

use crate::{
    builder::MusicServiceBuilder,
    data::GuildMusicData,
    events::EventHandler,
    model::Track,
    player::PlayerConnector,
    rng::{random_sort, RandomSource},
};

/// Tracks music playback state across guilds.
///
/// Guild datasets are created lazily on first use and live for the process
/// lifetime. Nothing here is persisted.
#[non_exhaustive]
pub struct MusicService {
    pub(crate) connector: Arc<dyn PlayerConnector>,
    pub(crate) rng: Arc<dyn RandomSource>,
    pub(crate) event_handler: Arc<dyn EventHandler>,
    data: DashMap<DiscordGuildId, Arc<GuildMusicData>>,
    pub shared_data: Arc<RwLock<TypeMap>>,
}

impl MusicService {
    pub fn builder(connector: impl PlayerConnector) -> MusicServiceBuilder {
        MusicServiceBuilder::new(connector)
    }

    pub(crate) fn new(builder: MusicServiceBuilder) -> Arc<Self> {
        Arc::new(Self {
            connector: builder.connector,
            rng: builder.rng,
            event_handler: builder.event_handler,
            data: DashMap::new(),
            shared_data: Arc::new(RwLock::new(builder.data)),
        })
    }

    /// Gets or creates the dataset for a guild.
    ///
    /// Creation goes through the map's entry API, so two concurrent callers
    /// for the same guild always end up with the same instance.
    pub fn get_or_create(&self, guild: DiscordGuildId) -> Arc<GuildMusicData> {
        self.data
            .entry(guild)
            .or_insert_with(|| {
                info!("Creating music dataset for guild {}", guild);

                GuildMusicData::new(
                    guild,
                    Arc::clone(&self.rng),
                    Arc::clone(&self.connector),
                    Arc::clone(&self.event_handler),
                )
            })
            .clone()
    }

    /// Dataset for a guild, if one was created already.
    pub fn get(&self, guild: DiscordGuildId) -> Option<Arc<GuildMusicData>> {
        self.data.get(&guild).map(|entry| Arc::clone(entry.value()))
    }

    /// Randomly reorders a loaded track list, e.g. a playlist about to be
    /// enqueued.
    pub fn shuffle_tracks(&self, mut tracks: Vec<Track>) -> Vec<Track> {
        random_sort(&mut tracks, &*self.rng);
        tracks
    }
}

impl typemap_rev::TypeMapKey for MusicService {
    type Value = Arc<MusicService>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testing::MockConnector;
    use crate::rng::testing::ScriptedRandom;
    use pretty_assertions::assert_eq;

    fn service() -> Arc<MusicService> {
        let connector = MockConnector::new();
        MusicService::builder(connector).build()
    }

    #[test]
    fn get_or_create_returns_one_instance_per_guild() {
        let service = service();

        let first = service.get_or_create(DiscordGuildId::new(1));
        let second = service.get_or_create(DiscordGuildId::new(1));
        let other = service.get_or_create(DiscordGuildId::new(2));

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn get_does_not_create() {
        let service = service();

        assert!(service.get(DiscordGuildId::new(1)).is_none());
        service.get_or_create(DiscordGuildId::new(1));
        assert!(service.get(DiscordGuildId::new(1)).is_some());
    }

    #[test]
    fn shuffle_tracks_follows_the_random_source() {
        let connector = MockConnector::new();
        let mut builder = MusicService::builder(connector);
        builder.set_rng(ScriptedRandom::new(vec![3, 1, 2]));
        let service = builder.build();

        let tracks = vec![
            Track { track: "a".into(), info: None },
            Track { track: "b".into(), info: None },
            Track { track: "c".into(), info: None },
        ];

        let shuffled = service.shuffle_tracks(tracks);
        let names: Vec<_> = shuffled.into_iter().map(|t| t.track).collect();

        assert_eq!(names, vec!["b", "c", "a"]);
    }
}
