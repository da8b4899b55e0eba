//! # Favorite Controller
//!
//! One controller serves every favoritable kind. The [`TargetRef`] variant of
//! the target decides which identifier the music server receives.
//!
//! ## Flow
//!
//! ```text
//! set_favorite(&mut target)
//!   ├─ flip target.starred_at           (synchronous, always)
//!   └─ spawn ─┬─ offline ──────────────> queue intent        => Queued
//!             └─ online ─> star/unstar ─┬─ Ok  ──> [album download] => Applied
//!                                       └─ Err ──> queue intent     => QueuedAfterFailure
//! ```
//!
//! Every toggle gets an `issued_at` strictly greater than the previous one
//! issued by the same controller, so two toggles within one clock tick still
//! replay in call order.
//!
//! Remote failures never reach the caller. Only a persistence failure while
//! queueing surfaces, and only to callers that await the [`PendingFavorite`].

use crate::error::{Result, SyncError};
use bridge_traits::{AlbumDownloader, Clock, NetworkMonitor, RemoteStarService};
use core_library::{FavoriteTarget, StarIntent, StarIntentRepository, TargetKind, TargetRef};
use core_runtime::events::{CoreEvent, EventBus, FavoriteEvent};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Controller settings injected at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FavoriteConfig {
    /// Download every track of an album once starring it succeeds online
    pub sync_starred_albums: bool,
}

/// How a favorite toggle was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    /// The server accepted the star/unstar.
    Applied,
    /// Offline; an intent was queued for the next startup.
    Queued,
    /// Online but the server call failed; an intent was queued.
    QueuedAfterFailure,
    /// The target has no server identity; only the local flag changed.
    Skipped,
}

enum PendingState {
    Ready(Result<FavoriteOutcome>),
    Running(JoinHandle<Result<FavoriteOutcome>>),
}

/// Handle to the background half of a favorite toggle.
///
/// Dropping it does not cancel the work.
pub struct PendingFavorite {
    desired_starred: bool,
    state: PendingState,
}

impl PendingFavorite {
    fn ready(desired_starred: bool, outcome: Result<FavoriteOutcome>) -> Self {
        Self {
            desired_starred,
            state: PendingState::Ready(outcome),
        }
    }

    fn running(desired_starred: bool, handle: JoinHandle<Result<FavoriteOutcome>>) -> Self {
        Self {
            desired_starred,
            state: PendingState::Running(handle),
        }
    }

    /// `true` for a favorite, `false` for an unfavorite
    pub fn desired_starred(&self) -> bool {
        self.desired_starred
    }

    /// Wait for the remote call or the queue write to settle.
    pub async fn outcome(self) -> Result<FavoriteOutcome> {
        match self.state {
            PendingState::Ready(outcome) => outcome,
            PendingState::Running(handle) => handle
                .await
                .map_err(|e| SyncError::TaskFailed(e.to_string()))?,
        }
    }
}

impl std::fmt::Debug for PendingFavorite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFavorite")
            .field("desired_starred", &self.desired_starred)
            .field("settled", &matches!(self.state, PendingState::Ready(_)))
            .finish()
    }
}

/// Marks and unmarks favorites with offline fallback.
#[derive(Clone)]
pub struct FavoriteController {
    store: Arc<dyn StarIntentRepository>,
    remote: Arc<dyn RemoteStarService>,
    network: Arc<dyn NetworkMonitor>,
    clock: Arc<dyn Clock>,
    album_downloader: Option<Arc<dyn AlbumDownloader>>,
    events: Option<EventBus>,
    config: FavoriteConfig,
    /// Last `issued_at` handed out, shared by clones
    last_issued: Arc<AtomicI64>,
}

impl FavoriteController {
    pub fn new(
        store: Arc<dyn StarIntentRepository>,
        remote: Arc<dyn RemoteStarService>,
        network: Arc<dyn NetworkMonitor>,
        clock: Arc<dyn Clock>,
        config: FavoriteConfig,
    ) -> Self {
        Self {
            store,
            remote,
            network,
            clock,
            album_downloader: None,
            events: None,
            config,
            last_issued: Arc::new(AtomicI64::new(i64::MIN)),
        }
    }

    pub fn with_album_downloader(mut self, downloader: Arc<dyn AlbumDownloader>) -> Self {
        self.album_downloader = Some(downloader);
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> FavoriteConfig {
        self.config
    }

    /// Toggle the favorite state of `target`.
    ///
    /// `target.starred_at` is updated before this returns: cleared when the
    /// target was favorited, set to the clock's `now` otherwise. Delivery to
    /// the server (or to the offline queue) continues on a Tokio task, so
    /// this must be called from within a Tokio runtime.
    pub fn set_favorite(&self, target: &mut FavoriteTarget) -> PendingFavorite {
        let now = self.clock.now();
        let desired_starred = !target.is_starred();

        target.starred_at = if desired_starred { Some(now) } else { None };

        self.emit(FavoriteEvent::Changed {
            target_kind: target.kind.to_string(),
            target_id: target.id.clone(),
            starred: desired_starred,
        });

        let Some(target_ref) = target.target_ref() else {
            debug!(kind = %target.kind, "Favorite target has no server id; not synced");
            return PendingFavorite::ready(desired_starred, Ok(FavoriteOutcome::Skipped));
        };

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(favorite = %target_ref, error = %e, "No Tokio runtime for favorite sync");
                return PendingFavorite::ready(
                    desired_starred,
                    Err(SyncError::TaskFailed(e.to_string())),
                );
            }
        };

        let controller = self.clone();
        let issued_at = self.next_issued_at(now.timestamp_millis());
        let task = handle.spawn(async move {
            controller
                .deliver(target_ref, desired_starred, issued_at)
                .await
        });

        PendingFavorite::running(desired_starred, task)
    }

    /// `now_ms`, bumped past the previous toggle when the clock has not moved.
    fn next_issued_at(&self, now_ms: i64) -> i64 {
        let mut issued_at = now_ms;
        let _ = self
            .last_issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued_at = now_ms.max(last.saturating_add(1));
                Some(issued_at)
            });
        issued_at
    }

    #[instrument(skip(self, target), fields(favorite = %target))]
    async fn deliver(
        &self,
        target: TargetRef,
        desired_starred: bool,
        issued_at: i64,
    ) -> Result<FavoriteOutcome> {
        if !self.network.is_connected().await {
            self.enqueue(&target, desired_starred, issued_at).await?;
            return Ok(FavoriteOutcome::Queued);
        }

        let request = target.to_star_request();
        let result = if desired_starred {
            self.remote.star(request).await
        } else {
            self.remote.unstar(request).await
        };

        if let Err(e) = result {
            warn!(error = %e, desired_starred, "Remote favorite failed; queueing for retry");
            self.emit(FavoriteEvent::RemoteFailed {
                target_kind: target.kind().to_string(),
                target_id: target.id().to_string(),
                message: e.to_string(),
            });
            self.enqueue(&target, desired_starred, issued_at).await?;
            return Ok(FavoriteOutcome::QueuedAfterFailure);
        }

        info!(desired_starred, "Favorite applied on server");
        self.emit(FavoriteEvent::Applied {
            target_kind: target.kind().to_string(),
            target_id: target.id().to_string(),
            starred: desired_starred,
        });

        if desired_starred && target.kind() == TargetKind::Album {
            self.download_album(target.id()).await;
        }

        Ok(FavoriteOutcome::Applied)
    }

    async fn enqueue(&self, target: &TargetRef, desired_starred: bool, issued_at: i64) -> Result<()> {
        let intent = StarIntent::new(target, desired_starred, issued_at);
        if let Err(e) = self.store.upsert(&intent).await {
            error!(error = %e, desired_starred, issued_at, "Failed to queue favorite; change is lost");
            return Err(e.into());
        }

        debug!(intent_id = %intent.id, "Favorite queued");
        self.emit(FavoriteEvent::Queued {
            target_kind: intent.target_kind.to_string(),
            target_id: intent.target_id.clone(),
            desired_starred,
            issued_at,
        });

        Ok(())
    }

    async fn download_album(&self, album_id: &str) {
        if !self.config.sync_starred_albums {
            return;
        }

        let Some(downloader) = self.album_downloader.as_ref() else {
            debug!(album_id, "Starred-album sync enabled without a downloader");
            return;
        };

        match downloader.download_album(album_id).await {
            Ok(()) => debug!(album_id, "Starred album download requested"),
            Err(e) => warn!(album_id, error = %e, "Starred album download failed"),
        }
    }

    fn emit(&self, event: FavoriteEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine
            let _ = events.emit(CoreEvent::Favorite(event));
        }
    }
}
