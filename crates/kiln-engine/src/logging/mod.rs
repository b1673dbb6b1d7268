//! Logging setup.
//!
//! The engine logs through the `log` facade; `env_logger` is installed once by
//! the binary before the window opens.

mod init;

pub use init::{init_logging, LoggingConfig};
