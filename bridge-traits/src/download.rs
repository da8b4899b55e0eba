//! Album Download Abstraction
//!
//! When a user favorites an album while online and the host has enabled
//! starred-album sync, the core asks the host to fetch and download every
//! track of that album. Track listing, storage layout and progress reporting
//! all belong to the host's download subsystem.

use crate::{error::Result, platform::PlatformSendSync};

/// Host download subsystem entry point used after a successful album star.
#[async_trait::async_trait]
pub trait AlbumDownloader: PlatformSendSync {
    /// Schedule a download of all tracks on `album_id`.
    ///
    /// Implementations should return once the request is accepted, not once
    /// the files are on disk.
    async fn download_album(&self, album_id: &str) -> Result<()>;
}
