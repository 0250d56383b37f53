//! World-level owner of an Anvil world on disk.
//!
//! # Invariants
//! - One provider owns one world directory and its open regions.
//! - Chunks are only touched through `&mut self`; exports see snapshots.
//! - A chunk that fails to decode is reported and treated as absent.

mod config;
mod error;
pub mod level_dat;
mod provider;

pub use config::ProviderConfig;
pub use error::ProviderError;
pub use level_dat::LevelInfo;
pub use provider::{AnvilProvider, WORLD_HEIGHT};
