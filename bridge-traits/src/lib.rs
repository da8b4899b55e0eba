//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the favorites core and the
//! host application. Each trait represents a capability the core requires but
//! that lives outside it: talking to the music server, knowing whether the
//! session is online, scheduling downloads, and telling the time.
//!
//! ## Traits
//!
//! ### Remote collaborators
//! - [`RemoteStarService`](star::RemoteStarService) - Star/unstar songs, albums and artists on the server
//! - [`AlbumDownloader`](download::AlbumDownloader) - Bulk download of a starred album's tracks
//!
//! ### Platform Integration
//! - [`NetworkMonitor`](network::NetworkMonitor) - Online/offline detection
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let star_service = builder.star_service
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "RemoteStarService".to_string(),
//!         message: "Inject the music server client before bootstrapping.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform-specific errors to `BridgeError`
//! and include enough context (ids, endpoint) to diagnose failures from logs.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across Tokio tasks behind an `Arc`.

pub mod download;
pub mod error;
pub mod network;
pub mod platform;
pub mod star;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use download::AlbumDownloader;
pub use network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus};
pub use star::{RemoteStarService, StarRequest};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
