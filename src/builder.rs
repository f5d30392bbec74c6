use std::sync::Arc;
use typemap_rev::TypeMap;

use crate::{
    events::{EventHandler, NullEventHandler},
    player::PlayerConnector,
    rng::{RandomSource, SecureRandom},
    service::MusicService,
};

/// Builder for [`MusicService`].
///
/// Only the player connector is required. The random source defaults to
/// [`SecureRandom`] and the event handler to one that ignores everything.
pub struct MusicServiceBuilder {
    pub connector: Arc<dyn PlayerConnector>,
    pub rng: Arc<dyn RandomSource>,
    pub event_handler: Arc<dyn EventHandler>,
    pub data: TypeMap,
}

impl MusicServiceBuilder {
    pub fn new(connector: impl PlayerConnector) -> Self {
        Self {
            connector: Arc::new(connector),
            rng: Arc::new(SecureRandom),
            event_handler: Arc::new(NullEventHandler),
            data: TypeMap::new(),
        }
    }

    pub fn set_rng(&mut self, rng: impl RandomSource) -> &mut Self {
        self.rng = Arc::new(rng);
        self
    }

    pub fn set_event_handler(&mut self, handler: impl EventHandler) -> &mut Self {
        self.event_handler = Arc::new(handler);
        self
    }

    pub fn data_ref(&self) -> &TypeMap {
        &self.data
    }

    pub fn build(self) -> Arc<MusicService> {
        MusicService::new(self)
    }
}
