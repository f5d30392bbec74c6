use parking_lot::{Mutex, RwLock};
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU16, Ordering},
        Arc, Weak,
    },
    time::Duration,
};
use tracing::{debug, error, info};

use crate::{
    error::JukelinkResult,
    events::{ConnectionEvents, EventHandler, PlaybackHandler},
    model::{MusicItem, RepeatMode, Seek},
    player::PlayerConnector,
    rng::{random_sort, RandomSource},
    types::SharedConnection,
};

const DEFAULT_VOLUME: u16 = 100;

/// Pause between a finish notification and the next dequeue, so a burst of
/// notifications cannot pile up on the queue lock.
const FINISH_DEBOUNCE: Duration = Duration::from_millis(500);

/// The queue and the flags that are read next to it live under one lock.
struct QueueState {
    items: Vec<MusicItem>,
    repeat_mode: RepeatMode,
    shuffled: bool,
}

/// Per-guild music playback state.
///
/// Owns the playback queue, the repeat/shuffle settings and the lifecycle of
/// the guild's player connection. One instance exists per guild, created by
/// [`MusicService::get_or_create`].
///
/// Every operation that touches a missing connection is a no-op rather than
/// an error, the command layer checks voice state before calling in.
///
/// [`MusicService::get_or_create`]: crate::service::MusicService::get_or_create
pub struct GuildMusicData {
    guild: DiscordGuildId,
    // handed to player event glue, so callbacks find their way back here
    self_ref: Weak<GuildMusicData>,
    rng: Arc<dyn RandomSource>,
    connector: Arc<dyn PlayerConnector>,
    event_handler: Arc<dyn EventHandler>,
    // lock order: queue before now_playing, never the other way around
    queue: Mutex<QueueState>,
    now_playing: RwLock<Option<MusicItem>>,
    is_playing: AtomicBool,
    volume: AtomicU16,
    player: RwLock<Option<SharedConnection>>,
    command_channel: RwLock<Option<DiscordChannelId>>,
}

impl GuildMusicData {
    pub(crate) fn new(
        guild: DiscordGuildId,
        rng: Arc<dyn RandomSource>,
        connector: Arc<dyn PlayerConnector>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            guild,
            self_ref: self_ref.clone(),
            rng,
            connector,
            event_handler,
            queue: Mutex::new(QueueState {
                items: Vec::new(),
                repeat_mode: RepeatMode::None,
                shuffled: false,
            }),
            now_playing: RwLock::new(None),
            is_playing: AtomicBool::new(false),
            volume: AtomicU16::new(DEFAULT_VOLUME),
            player: RwLock::new(None),
            command_channel: RwLock::new(None),
        })
    }

    pub fn guild(&self) -> DiscordGuildId {
        self.guild
    }

    /// Voice channel of the active connection, if any.
    pub fn channel(&self) -> Option<DiscordChannelId> {
        self.current_connection().map(|connection| connection.channel())
    }

    /// Text channel used by the command layer for notifications.
    pub fn command_channel(&self) -> Option<DiscordChannelId> {
        *self.command_channel.read()
    }

    pub fn set_command_channel(&self, channel: DiscordChannelId) {
        *self.command_channel.write() = Some(channel);
    }

    pub fn now_playing(&self) -> Option<MusicItem> {
        self.now_playing.read().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Relaxed)
    }

    pub fn volume(&self) -> u16 {
        self.volume.load(Ordering::Relaxed)
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.queue.lock().repeat_mode
    }

    pub fn is_shuffled(&self) -> bool {
        self.queue.lock().shuffled
    }

    /// Snapshot of the queued items in play order.
    pub fn queue(&self) -> Vec<MusicItem> {
        self.queue.lock().items.clone()
    }

    pub fn queue_length(&self) -> usize {
        self.queue.lock().items.len()
    }

    /// Connects a player to the given voice channel. Does nothing if a live
    /// connection already exists. A volume changed while disconnected is
    /// applied to the new connection.
    pub async fn create_player(&self, channel: DiscordChannelId) -> JukelinkResult<()> {
        if self.current_connection().is_some() {
            return Ok(());
        }

        let events: Arc<dyn ConnectionEvents> = Arc::new(PlaybackHandler::new(self.self_ref.clone()));
        let connection = self.connector.connect(self.guild, channel, events).await?;

        let volume = self.volume();
        if volume != DEFAULT_VOLUME {
            connection.set_volume(volume).await?;
        }

        *self.player.write() = Some(connection);
        info!("Created player for guild {}", self.guild);

        Ok(())
    }

    /// Disconnects and drops the player connection. The handle is never
    /// reused, a later `create_player` makes a fresh one.
    pub async fn destroy_player(&self) -> JukelinkResult<()> {
        let connection = self.player.write().take();

        if let Some(connection) = connection {
            if connection.is_connected() {
                connection.disconnect().await?;
            }
            info!("Destroyed player for guild {}", self.guild);
        }

        Ok(())
    }

    /// Begins playback if something is queued and nothing is playing yet.
    pub async fn play(&self) -> JukelinkResult<()> {
        if self.current_connection().is_none() {
            return Ok(());
        }

        if self.now_playing.read().is_none() {
            self.play_handler().await?;
        }

        Ok(())
    }

    /// Stops playback and clears the current track. Queue contents are left
    /// alone, use `empty_queue` for those.
    pub async fn stop(&self) -> JukelinkResult<()> {
        let connection = match self.current_connection() {
            Some(connection) => connection,
            None => return Ok(()),
        };

        *self.now_playing.write() = None;
        connection.stop().await
    }

    pub async fn pause(&self) -> JukelinkResult<()> {
        let connection = match self.current_connection() {
            Some(connection) => connection,
            None => return Ok(()),
        };

        self.is_playing.store(false, Ordering::Relaxed);
        connection.pause().await
    }

    pub async fn resume(&self) -> JukelinkResult<()> {
        let connection = match self.current_connection() {
            Some(connection) => connection,
            None => return Ok(()),
        };

        self.is_playing.store(true, Ordering::Relaxed);
        connection.resume().await
    }

    /// Sets the playback volume. The value is stored even with no connection
    /// around, so it takes effect on the next `create_player`.
    pub async fn set_volume(&self, volume: u16) -> JukelinkResult<()> {
        self.volume.store(volume, Ordering::Relaxed);

        if let Some(connection) = self.current_connection() {
            connection.set_volume(volume).await?;
        }

        Ok(())
    }

    /// Restarts the current track by reinserting it at the queue head and
    /// stopping the player, the finish notification then replays it.
    pub async fn restart(&self) -> JukelinkResult<()> {
        let connection = match self.current_connection() {
            Some(connection) => connection,
            None => return Ok(()),
        };

        let item = self.now_playing.read().clone();
        if let Some(item) = item {
            {
                self.queue.lock().items.insert(0, item);
            }
            connection.stop().await?;
        }

        Ok(())
    }

    /// Seeks within the current track. Relative targets are resolved against
    /// the player-reported position, rewinding saturates at zero.
    pub async fn seek(&self, target: Seek) -> JukelinkResult<()> {
        let connection = match self.current_connection() {
            Some(connection) => connection,
            None => return Ok(()),
        };

        if self.now_playing.read().is_none() {
            return Ok(());
        }

        let position = match target {
            Seek::Absolute(position) => position,
            Seek::Forward(offset) => connection.position() + offset,
            Seek::Backward(offset) => connection.position().checked_sub(offset).unwrap_or_default(),
        };

        connection.seek(position).await
    }

    /// Position in the current track, absent when nothing is playing or no
    /// connection exists.
    pub fn current_position(&self) -> Option<Duration> {
        if self.now_playing.read().is_none() {
            return None;
        }

        self.current_connection().map(|connection| connection.position())
    }

    /// Clears the queue, returning the number of removed items.
    pub fn empty_queue(&self) -> usize {
        let mut state = self.queue.lock();
        let count = state.items.len();
        state.items.clear();
        count
    }

    /// Marks the queue as shuffled and reorders it. Calling this while
    /// already shuffled reorders again, the flag just stays set.
    pub fn shuffle(&self) {
        let mut state = self.queue.lock();
        state.shuffled = true;
        random_sort(&mut state.items, &*self.rng);
    }

    /// Reorders the queue without touching the shuffle flag.
    pub fn reshuffle(&self) {
        let mut state = self.queue.lock();
        random_sort(&mut state.items, &*self.rng);
    }

    /// Clears the shuffle flag. Existing order is kept as-is.
    pub fn stop_shuffle(&self) {
        self.queue.lock().shuffled = false;
    }

    /// Changes the repeat mode.
    ///
    /// Entering `Single` while a track plays splices that track onto the
    /// queue head so `dequeue` keeps returning it; leaving `Single` removes
    /// that head entry again. The two always pair up exactly once per
    /// transition, no matter how many dequeues happened in between.
    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        let mut state = self.queue.lock();
        let previous = state.repeat_mode;
        state.repeat_mode = mode;

        let now_playing = self.now_playing.read().clone();
        if let Some(item) = now_playing {
            if mode == RepeatMode::Single && previous != RepeatMode::Single {
                state.items.insert(0, item);
            } else if mode != RepeatMode::Single && previous == RepeatMode::Single {
                // the queue may have been emptied while in single mode
                if !state.items.is_empty() {
                    state.items.remove(0);
                }
            }
        }
    }

    /// Adds an item to the queue.
    ///
    /// With repeat-all and exactly one queued item the new item goes to the
    /// head, keeping the lone looping track cycling correctly. Otherwise
    /// items append in order, or land at a random index while shuffled.
    pub fn enqueue(&self, item: MusicItem) {
        let mut state = self.queue.lock();

        if state.repeat_mode == RepeatMode::All && state.items.len() == 1 {
            state.items.insert(0, item);
        } else if !state.shuffled || state.items.is_empty() {
            state.items.push(item);
        } else {
            let index = self.rng.next_range(0, state.items.len());
            state.items.insert(index, item);
        }
    }

    /// Takes the next item to play, `None` when the queue is empty.
    ///
    /// Repeat `None` pops the head, `Single` peeks it without removal, `All`
    /// rotates it to the tail.
    pub fn dequeue(&self) -> Option<MusicItem> {
        let mut state = self.queue.lock();

        if state.items.is_empty() {
            return None;
        }

        match state.repeat_mode {
            RepeatMode::None => Some(state.items.remove(0)),
            RepeatMode::Single => Some(state.items[0].clone()),
            RepeatMode::All => {
                let item = state.items.remove(0);
                state.items.push(item.clone());
                Some(item)
            }
        }
    }

    /// Removes the item at `index`, `None` when out of range. Never affects
    /// the currently playing track.
    pub fn remove(&self, index: usize) -> Option<MusicItem> {
        let mut state = self.queue.lock();

        if index >= state.items.len() {
            return None;
        }

        Some(state.items.remove(index))
    }

    /// Finish notification from the player. Debounces, then advances the
    /// queue.
    pub(crate) async fn playback_finished(&self) -> JukelinkResult<()> {
        tokio::time::sleep(FINISH_DEBOUNCE).await;

        self.is_playing.store(false, Ordering::Relaxed);
        self.play_handler().await
    }

    pub(crate) async fn handle_playback_error(&self, error: String) {
        error!("Playback error on guild {}: {}", self.guild, error);

        let item = self.now_playing.read().clone();
        self.event_handler.track_exception(self.guild, item, error).await;
    }

    /// Dequeues the next item and hands it to the player. An empty queue
    /// clears the current track and leaves the connection idle.
    pub(crate) async fn play_handler(&self) -> JukelinkResult<()> {
        let item = match self.dequeue() {
            Some(item) => item,
            None => {
                debug!("Queue empty for guild {}, playback stops", self.guild);
                *self.now_playing.write() = None;
                return Ok(());
            }
        };

        *self.now_playing.write() = Some(item.clone());
        self.is_playing.store(true, Ordering::Relaxed);

        let connection = match self.current_connection() {
            Some(connection) => connection,
            None => return Ok(()),
        };

        if item.start_time.is_some() || item.play_length.is_some() {
            connection
                .play_partial(&item.track, item.start_time.unwrap_or_default(), item.play_length)
                .await
        } else {
            connection.play(&item.track).await
        }
    }

    fn current_connection(&self) -> Option<SharedConnection> {
        let guard = self.player.read();
        guard.as_ref().filter(|connection| connection.is_connected()).cloned()
    }
}
