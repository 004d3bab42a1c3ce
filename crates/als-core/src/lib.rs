pub mod config;
pub mod error;
pub mod logging;

pub use config::ServerConfig;
pub use error::AlsError;
pub use logging::{LoggerConfig, parse_log_level};
