use async_trait::async_trait;
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId
};
use std::{sync::Arc, time::Duration};

use crate::{
    error::JukelinkResult,
    events::ConnectionEvents,
    model::Track,
    types::SharedConnection,
};

/// Capability used to establish voice connections.
///
/// Implemented by whatever audio backend the bot uses (a Lavalink node, a
/// songbird driver, ...). The library never opens connections itself.
#[async_trait]
pub trait PlayerConnector: Send + Sync + 'static {
    /// Connects to the given voice channel.
    ///
    /// The supplied `events` handle must be invoked by the backend whenever a
    /// track finishes or fails, this is what drives queue advancement.
    async fn connect(
        &self,
        guild: DiscordGuildId,
        channel: DiscordChannelId,
        events: Arc<dyn ConnectionEvents>,
    ) -> JukelinkResult<SharedConnection>;
}

#[async_trait]
impl<T: PlayerConnector + ?Sized> PlayerConnector for Arc<T> {
    async fn connect(
        &self,
        guild: DiscordGuildId,
        channel: DiscordChannelId,
        events: Arc<dyn ConnectionEvents>,
    ) -> JukelinkResult<SharedConnection> {
        (**self).connect(guild, channel, events).await
    }
}

/// An established per-guild voice connection.
///
/// All playback operations are treated as fire-and-forget by the queue
/// controller, only `position` is queried for its value.
#[async_trait]
pub trait PlayerConnection: Send + Sync + 'static {
    fn is_connected(&self) -> bool;

    /// Voice channel this connection is bound to.
    fn channel(&self) -> DiscordChannelId;

    /// Playback position of the current track as last reported by the
    /// backend.
    fn position(&self) -> Duration;

    async fn disconnect(&self) -> JukelinkResult<()>;

    async fn play(&self, track: &Track) -> JukelinkResult<()>;

    /// Plays a clipped section of a track. A `length` of `None` plays from
    /// `start` to the end.
    async fn play_partial(&self, track: &Track, start: Duration, length: Option<Duration>) -> JukelinkResult<()>;

    async fn stop(&self) -> JukelinkResult<()>;

    async fn pause(&self) -> JukelinkResult<()>;

    async fn resume(&self) -> JukelinkResult<()>;

    async fn set_volume(&self, volume: u16) -> JukelinkResult<()>;

    async fn seek(&self, position: Duration) -> JukelinkResult<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Records every operation forwarded to it.
    pub(crate) struct MockConnection {
        pub(crate) connected: AtomicBool,
        pub(crate) channel: DiscordChannelId,
        pub(crate) position: Duration,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl MockConnection {
        fn new(channel: DiscordChannelId) -> Self {
            Self {
                connected: AtomicBool::new(true),
                channel,
                position: Duration::from_secs(10),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().push(call);
        }
    }

    #[async_trait]
    impl PlayerConnection for MockConnection {
        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn channel(&self) -> DiscordChannelId {
            self.channel
        }

        fn position(&self) -> Duration {
            self.position
        }

        async fn disconnect(&self) -> JukelinkResult<()> {
            self.connected.store(false, Ordering::SeqCst);
            self.record("disconnect".into());
            Ok(())
        }

        async fn play(&self, track: &Track) -> JukelinkResult<()> {
            self.record(format!("play:{}", track.track));
            Ok(())
        }

        async fn play_partial(&self, track: &Track, start: Duration, length: Option<Duration>) -> JukelinkResult<()> {
            self.record(format!(
                "play_partial:{}:{}:{}",
                track.track,
                start.as_millis(),
                length.map(|l| l.as_millis().to_string()).unwrap_or_else(|| "end".into()),
            ));
            Ok(())
        }

        async fn stop(&self) -> JukelinkResult<()> {
            self.record("stop".into());
            Ok(())
        }

        async fn pause(&self) -> JukelinkResult<()> {
            self.record("pause".into());
            Ok(())
        }

        async fn resume(&self) -> JukelinkResult<()> {
            self.record("resume".into());
            Ok(())
        }

        async fn set_volume(&self, volume: u16) -> JukelinkResult<()> {
            self.record(format!("set_volume:{}", volume));
            Ok(())
        }

        async fn seek(&self, position: Duration) -> JukelinkResult<()> {
            self.record(format!("seek:{}", position.as_millis()));
            Ok(())
        }
    }

    pub(crate) struct MockConnector {
        pub(crate) connection: Mutex<Option<Arc<MockConnection>>>,
        pub(crate) events: Mutex<Option<Arc<dyn ConnectionEvents>>>,
        pub(crate) connects: AtomicUsize,
    }

    impl MockConnector {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                connection: Mutex::new(None),
                events: Mutex::new(None),
                connects: AtomicUsize::new(0),
            })
        }

        pub(crate) fn connection(&self) -> Arc<MockConnection> {
            self.connection.lock().clone().expect("no connection was created")
        }
    }

    #[async_trait]
    impl PlayerConnector for MockConnector {
        async fn connect(
            &self,
            _guild: DiscordGuildId,
            channel: DiscordChannelId,
            events: Arc<dyn ConnectionEvents>,
        ) -> JukelinkResult<SharedConnection> {
            self.connects.fetch_add(1, Ordering::SeqCst);

            let connection = Arc::new(MockConnection::new(channel));
            *self.connection.lock() = Some(Arc::clone(&connection));
            *self.events.lock() = Some(events);

            Ok(connection)
        }
    }
}
