//! Logging utilities.
//!
//! Centralizes logger initialization. Library code only ever talks to the
//! `log` facade; `env_logger` is installed here for binaries and the desktop
//! entry point.

mod init;

pub use init::{LoggingConfig, init_logging};
