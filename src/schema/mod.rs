//! Schema module - Configuration, game vocabulary and run history types.

mod config;
mod game;
mod history;

pub use config::*;
pub use game::*;
pub use history::*;
