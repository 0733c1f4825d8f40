pub mod bus;
pub mod config;

pub use bus::{BusError, BusResult};
pub use config::ConfigError;
