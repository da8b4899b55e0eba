//! Thread-safety marker traits shared by every bridge contract.
//!
//! Native hosts share bridge implementations freely across Tokio tasks, so
//! each bridge trait is bounded by [`PlatformSendSync`] rather than spelling
//! out `Send + Sync` at every definition.

/// Marker trait equivalent to `Send + Sync`.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync {}

/// Marker trait equivalent to `Send`.
pub trait PlatformSend: Send {}

impl<T> PlatformSend for T where T: Send {}
