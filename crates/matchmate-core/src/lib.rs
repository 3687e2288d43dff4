pub mod config;
pub mod convert;
pub mod feed;
pub mod repository;

pub use config::Config;
pub use feed::{FeedModel, FeedState};
pub use repository::{BatchOutcome, ProfileRepository};

#[cfg(test)]
mod testing;
