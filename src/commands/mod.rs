pub mod config;
pub mod recording;

pub use config::*;
pub use recording::*;
