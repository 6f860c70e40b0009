//! `tickwork-core`: configuration and the top-level error type shared by
//! every tickwork crate.

pub mod config;
pub mod error;

pub use config::TickworkConfig;
pub use error::{Result, TickworkError};
