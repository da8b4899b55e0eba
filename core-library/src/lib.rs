//! # Library Module
//!
//! Owns the favorites domain model and the durable queue of pending
//! star/unstar intents.
//!
//! ## Overview
//!
//! This module manages:
//! - Domain types for favoritable entities (songs, albums, artists)
//! - SQLite connection pooling and schema migrations
//! - The star intent repository (the local intent store)

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{FavoriteTarget, IntentKey, StarIntent, StarIntentId, TargetKind, TargetRef};
pub use repositories::{SqliteStarIntentRepository, StarIntentRepository};
