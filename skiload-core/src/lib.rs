mod config;
mod constants;
mod counters;
mod data;
mod phase;
mod stats;

pub use config::*;
pub use constants::*;
pub use counters::*;
pub use data::*;
pub use phase::*;
pub use stats::*;
