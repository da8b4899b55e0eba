//! Domain models for favorites
//!
//! This module contains the favoritable entity types seen by the UI layer and
//! the persisted [`StarIntent`] record that backs the offline queue.

use bridge_traits::star::StarRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LibraryError;

// =============================================================================
// Target Kinds
// =============================================================================

/// Kind of entity that can be favorited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Song,
    Album,
    Artist,
}

impl TargetKind {
    /// Convert kind to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Album => "album",
            Self::Artist => "artist",
        }
    }
}

impl FromStr for TargetKind {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "song" => Ok(Self::Song),
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            _ => Err(LibraryError::InvalidInput {
                field: "target_kind".to_string(),
                message: format!("unknown target kind '{}'", s),
            }),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a concrete favoritable entity.
///
/// The variant decides which identifier slot of the remote star request is
/// populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TargetRef {
    Song(String),
    Album(String),
    Artist(String),
}

impl TargetRef {
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Self {
        let id = id.into();
        match kind {
            TargetKind::Song => Self::Song(id),
            TargetKind::Album => Self::Album(id),
            TargetKind::Artist => Self::Artist(id),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Song(_) => TargetKind::Song,
            Self::Album(_) => TargetKind::Album,
            Self::Artist(_) => TargetKind::Artist,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Song(id) | Self::Album(id) | Self::Artist(id) => id,
        }
    }

    /// Build the remote request with exactly one identifier populated.
    pub fn to_star_request(&self) -> StarRequest {
        match self {
            Self::Song(id) => StarRequest::song(id.as_str()),
            Self::Album(id) => StarRequest::album(id.as_str()),
            Self::Artist(id) => StarRequest::artist(id.as_str()),
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

// =============================================================================
// Favorite Target
// =============================================================================

/// A song, album or artist as loaded by a screen.
///
/// `starred_at` is the favorite flag: `Some` means favorited, and the value is
/// when it was marked. The favorites controller mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteTarget {
    pub kind: TargetKind,
    /// Missing or blank for synthetic entities (e.g. local-only mixes)
    pub id: Option<String>,
    pub starred_at: Option<DateTime<Utc>>,
}

impl FavoriteTarget {
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
            starred_at: None,
        }
    }

    pub fn song(id: impl Into<String>) -> Self {
        Self::new(TargetKind::Song, id)
    }

    pub fn album(id: impl Into<String>) -> Self {
        Self::new(TargetKind::Album, id)
    }

    pub fn artist(id: impl Into<String>) -> Self {
        Self::new(TargetKind::Artist, id)
    }

    /// Entity with no server identity
    pub fn synthetic(kind: TargetKind) -> Self {
        Self {
            kind,
            id: None,
            starred_at: None,
        }
    }

    pub fn with_starred_at(mut self, starred_at: DateTime<Utc>) -> Self {
        self.starred_at = Some(starred_at);
        self
    }

    pub fn is_starred(&self) -> bool {
        self.starred_at.is_some()
    }

    /// Server reference, or `None` when the id is missing or blank.
    pub fn target_ref(&self) -> Option<TargetRef> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| TargetRef::new(self.kind, id))
    }
}

// =============================================================================
// Star Intents
// =============================================================================

/// Unique identifier for a persisted star intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StarIntentId(pub Uuid);

impl StarIntentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for StarIntentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StarIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conflict identity of an intent: two intents with the same key compete and
/// only the most recently issued one is replayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntentKey {
    pub target_kind: TargetKind,
    pub target_id: String,
}

/// A pending or already-issued favorite action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarIntent {
    pub id: StarIntentId,
    pub target_kind: TargetKind,
    pub target_id: String,
    /// `true` applies a star, `false` removes it
    pub desired_starred: bool,
    /// Unix timestamp in milliseconds
    pub issued_at: i64,
}

impl StarIntent {
    pub fn new(target: &TargetRef, desired_starred: bool, issued_at: i64) -> Self {
        Self {
            id: StarIntentId::new(),
            target_kind: target.kind(),
            target_id: target.id().to_string(),
            desired_starred,
            issued_at,
        }
    }

    pub fn star(target: &TargetRef, issued_at: i64) -> Self {
        Self::new(target, true, issued_at)
    }

    pub fn unstar(target: &TargetRef, issued_at: i64) -> Self {
        Self::new(target, false, issued_at)
    }

    pub fn key(&self) -> IntentKey {
        IntentKey {
            target_kind: self.target_kind,
            target_id: self.target_id.clone(),
        }
    }

    pub fn target_ref(&self) -> TargetRef {
        TargetRef::new(self.target_kind, self.target_id.as_str())
    }

    /// Validate intent data
    pub fn validate(&self) -> Result<(), String> {
        if self.target_id.trim().is_empty() {
            return Err("Star intent target id cannot be empty".to_string());
        }

        if self.issued_at < 0 {
            return Err(format!(
                "Star intent issued_at {} cannot be negative",
                self.issued_at
            ));
        }

        Ok(())
    }
}
