pub mod types;
pub mod error;
pub mod model;
pub mod player;
pub mod events;
pub mod rng;
pub mod data;
pub mod service;
pub mod builder;
