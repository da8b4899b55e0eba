//! Remote Star Service Abstraction
//!
//! The music server owns the authoritative favorite state. This module defines
//! the host-provided client the core uses to mark or unmark a song, album or
//! artist. Transport (REST, JSON, auth) is entirely the implementation's
//! concern.
//!
//! ## Request shape
//!
//! A [`StarRequest`] carries three optional identifiers mirroring the server
//! API (`id`, `albumId`, `artistId`). Exactly one of them is populated per
//! call; the populated field selects the kind of entity being starred.
//!
//! ```ignore
//! use bridge_traits::star::{RemoteStarService, StarRequest};
//!
//! async fn like_album(service: &dyn RemoteStarService) -> bridge_traits::error::Result<()> {
//!     service.star(StarRequest::album("al-42")).await
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};

/// Identifier set sent with a star/unstar call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StarRequest {
    pub song_id: Option<String>,
    pub album_id: Option<String>,
    pub artist_id: Option<String>,
}

impl StarRequest {
    pub fn song(id: impl Into<String>) -> Self {
        Self {
            song_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn album(id: impl Into<String>) -> Self {
        Self {
            album_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn artist(id: impl Into<String>) -> Self {
        Self {
            artist_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Ensure exactly one identifier is populated.
    pub fn validate(&self) -> Result<()> {
        let populated = [&self.song_id, &self.album_id, &self.artist_id]
            .iter()
            .filter(|id| id.is_some())
            .count();

        if populated == 1 {
            Ok(())
        } else {
            Err(BridgeError::OperationFailed(format!(
                "star request must carry exactly one id, got {}",
                populated
            )))
        }
    }
}

impl fmt::Display for StarRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.song_id, &self.album_id, &self.artist_id) {
            (Some(id), None, None) => write!(f, "song:{}", id),
            (None, Some(id), None) => write!(f, "album:{}", id),
            (None, None, Some(id)) => write!(f, "artist:{}", id),
            _ => write!(f, "invalid-star-request"),
        }
    }
}

/// Remote star service trait
///
/// Implementations resolve `Ok(())` once the server acknowledged the change
/// and `Err(_)` for any failure (offline, rejected, timed out). The core never
/// surfaces these errors to the user; it folds them into the pending intent
/// queue.
#[async_trait::async_trait]
pub trait RemoteStarService: PlatformSendSync {
    /// Mark the entity as favorite on the server
    async fn star(&self, request: StarRequest) -> Result<()>;

    /// Remove the favorite mark on the server
    async fn unstar(&self, request: StarRequest) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_populate_one_field() {
        let song = StarRequest::song("S1");
        assert_eq!(song.song_id.as_deref(), Some("S1"));
        assert!(song.album_id.is_none());
        assert!(song.artist_id.is_none());
        assert!(song.validate().is_ok());

        assert!(StarRequest::album("A1").validate().is_ok());
        assert!(StarRequest::artist("AR1").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_and_ambiguous() {
        assert!(StarRequest::default().validate().is_err());

        let ambiguous = StarRequest {
            song_id: Some("S1".to_string()),
            album_id: Some("A1".to_string()),
            artist_id: None,
        };
        assert!(ambiguous.validate().is_err());
        assert_eq!(ambiguous.to_string(), "invalid-star-request");
    }

    #[test]
    fn test_display() {
        assert_eq!(StarRequest::song("S1").to_string(), "song:S1");
        assert_eq!(StarRequest::album("A1").to_string(), "album:A1");
        assert_eq!(StarRequest::artist("AR1").to_string(), "artist:AR1");
    }
}
