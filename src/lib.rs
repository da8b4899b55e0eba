//! Offline-first favorites core.
//!
//! Host applications depend on `favorites-workspace` and enable the
//! documented features instead of wiring `core-service`, `core-sync` and the
//! bridge crates individually.

pub use core_service::*;
