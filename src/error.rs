use std::{
    error::Error,
    fmt::{
        Display,
        Formatter,
        Result,
    },
};

pub type JukelinkResult<T> = ::std::result::Result<T, JukelinkError>;

#[derive(Debug)]
pub enum JukelinkError {
    ConnectionFailed(String),
    PlayerUnavailable,
    Playback(String),
}

impl Error for JukelinkError {}

impl Display for JukelinkError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            JukelinkError::ConnectionFailed(why) => write!(f, "Failed to establish the voice connection: {}", why),
            JukelinkError::PlayerUnavailable => write!(f, "The player connection is no longer available."),
            JukelinkError::Playback(why) => write!(f, "The player rejected the playback operation: {}", why),
        }
    }
}
