//! Shared utilities for the token sidechain node.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
