//! # Core Runtime
//!
//! Foundational runtime infrastructure for the favorites core:
//! - Logging and tracing setup
//! - Configuration of host collaborators
//! - Event bus for favorite and reconciliation events

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
