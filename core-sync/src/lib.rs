//! # Favorites Sync Module
//!
//! Offline-first star/unstar synchronization.
//!
//! ## Overview
//!
//! - **Favorite Controller** (`controller`): flips the favorite flag of a
//!   song, album or artist immediately, then either calls the music server
//!   (online) or queues a [`StarIntent`](core_library::StarIntent) for later
//!   (offline or on remote failure).
//! - **Startup Reconciler** (`reconciler`): once per session, drains the
//!   queue with last-write-wins deduplication and replays the surviving
//!   intents against the server.

pub mod controller;
pub mod error;
pub mod reconciler;

pub use controller::{FavoriteConfig, FavoriteController, FavoriteOutcome, PendingFavorite};
pub use error::{Result, SyncError};
pub use reconciler::{
    select_survivors, ReconcileReport, ReconcilerConfig, StartupReconciler, SurvivorSelection,
};
