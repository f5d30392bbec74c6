use std::sync::Arc;
use crate::player::PlayerConnection;

pub type SharedConnection = Arc<dyn PlayerConnection>;
