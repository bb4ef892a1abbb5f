pub mod config;
pub mod data;
pub mod feed;

pub use config::{ConfigError, FeedConfig};
pub use data::Event;
pub use feed::LogFeed;
