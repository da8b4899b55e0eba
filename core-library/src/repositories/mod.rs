//! # Repository Pattern Implementation
//!
//! Repository traits and their SQLite implementations.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//!
//! ## Available Repositories
//!
//! - `StarIntentRepository` - Durable queue of pending star/unstar intents

pub mod star_intent;

pub use star_intent::{SqliteStarIntentRepository, StarIntentRepository};
