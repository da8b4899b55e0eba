//! Core service façade and bootstrap.
//!
//! Wires the host-provided bridges from a [`CoreConfig`] into the favorites
//! engine: opens the intent store, builds the favorite controller, and runs
//! the startup reconciliation for this session. Desktop apps typically enable
//! the `desktop-shims` feature so a [`DesktopNetworkMonitor`] is used when no
//! monitor is injected.
//!
//! ```ignore
//! use core_service::{CoreConfig, CoreService, FavoriteTarget};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path(data_dir.join("favorites.db"))
//!     .star_service(Arc::new(server_client))
//!     .build()?;
//!
//! let core = CoreService::bootstrap(config).await?;
//! let mut album = FavoriteTarget::album("al-42");
//! let pending = core.set_favorite(&mut album);
//! assert!(album.is_starred());
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_library::{FavoriteTarget, StarIntent, TargetKind, TargetRef};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use core_runtime::events::{CoreEvent, EventBus, FavoriteEvent, ReconcileEvent};
pub use core_sync::{FavoriteOutcome, PendingFavorite, ReconcileReport};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::DesktopNetworkMonitor;

use core_library::{create_pool, DatabaseConfig, SqliteStarIntentRepository, StarIntentRepository};
use core_runtime::logging::strip_path;
use core_sync::{FavoriteConfig, FavoriteController, ReconcilerConfig, StartupReconciler};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Database path that selects a private in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

struct ServiceInner {
    config: CoreConfig,
    store: Arc<dyn StarIntentRepository>,
    controller: FavoriteController,
    reconciler: StartupReconciler,
    events: EventBus,
    last_report: Mutex<Option<ReconcileReport>>,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Open the store and reconcile queued intents with a fresh event bus.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        Self::bootstrap_with_event_bus(config, EventBus::default()).await
    }

    /// Like [`bootstrap`](Self::bootstrap), publishing into `events` so the
    /// host sees reconciliation events emitted during startup.
    ///
    /// Reconciliation failures are logged; only configuration and store
    /// initialization errors abort bootstrap.
    pub async fn bootstrap_with_event_bus(config: CoreConfig, events: EventBus) -> Result<Self> {
        config.validate()?;

        let path = config.database_path.to_string_lossy().into_owned();
        info!(database = %strip_path(&path), "Bootstrapping favorites core");

        let db_config = if path == IN_MEMORY_DATABASE {
            DatabaseConfig::in_memory()
        } else {
            DatabaseConfig::new(&config.database_path)
        };
        let pool = create_pool(db_config).await?;
        let store: Arc<dyn StarIntentRepository> = Arc::new(SqliteStarIntentRepository::new(pool));

        let mut controller = FavoriteController::new(
            Arc::clone(&store),
            Arc::clone(&config.star_service),
            Arc::clone(&config.network_monitor),
            Arc::clone(&config.clock),
            FavoriteConfig {
                sync_starred_albums: config.features.sync_starred_albums,
            },
        )
        .with_event_bus(events.clone());
        if let Some(downloader) = &config.album_downloader {
            controller = controller.with_album_downloader(Arc::clone(downloader));
        }

        let reconciler = StartupReconciler::new(
            Arc::clone(&store),
            Arc::clone(&config.star_service),
            ReconcilerConfig {
                max_concurrent: config.reconcile_max_concurrent,
            },
        )
        .with_event_bus(events.clone());

        let service = Self {
            inner: Arc::new(ServiceInner {
                config,
                store,
                controller,
                reconciler,
                events,
                last_report: Mutex::new(None),
            }),
        };

        service.reconcile_on_startup().await;

        Ok(service)
    }

    async fn reconcile_on_startup(&self) {
        match self.inner.reconciler.run().await {
            Ok(report) => {
                if let Ok(mut last) = self.inner.last_report.lock() {
                    *last = Some(report);
                }
            }
            Err(e) => warn!(error = %e, "Startup reconciliation failed"),
        }
    }

    /// Toggle a favorite. See [`FavoriteController::set_favorite`].
    pub fn set_favorite(&self, target: &mut FavoriteTarget) -> PendingFavorite {
        self.inner.controller.set_favorite(target)
    }

    /// Intents still persisted, in store order.
    pub async fn pending_intents(&self) -> Result<Vec<StarIntent>> {
        Ok(self.inner.store.list().await?)
    }

    /// Report of this session's startup reconciliation, if it completed.
    pub fn last_reconcile_report(&self) -> Option<ReconcileReport> {
        self.inner.last_report.lock().ok().and_then(|last| *last)
    }

    /// Event bus carrying favorite and reconciliation events.
    pub fn events(&self) -> EventBus {
        self.inner.events.clone()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::network::{NetworkChangeStream, NetworkInfo};
    use bridge_traits::{BridgeError, ManualClock, NetworkMonitor, RemoteStarService, StarRequest};
    use mockall::mock;

    mock! {
        pub StarService {}

        #[async_trait]
        impl RemoteStarService for StarService {
            async fn star(&self, request: StarRequest) -> BridgeResult<()>;
            async fn unstar(&self, request: StarRequest) -> BridgeResult<()>;
        }
    }

    struct Offline;

    #[async_trait]
    impl NetworkMonitor for Offline {
        async fn get_network_info(&self) -> BridgeResult<NetworkInfo> {
            Ok(NetworkInfo::disconnected())
        }

        async fn subscribe_changes(&self) -> BridgeResult<Box<dyn NetworkChangeStream>> {
            Err(BridgeError::NotAvailable("subscribe_changes".to_string()))
        }
    }

    fn config(remote: MockStarService) -> CoreConfig {
        CoreConfig::builder()
            .database_path(IN_MEMORY_DATABASE)
            .star_service(Arc::new(remote))
            .network_monitor(Arc::new(Offline))
            .clock(Arc::new(ManualClock::new(2_000)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_reconciles_empty_store() {
        let core = CoreService::bootstrap(config(MockStarService::new()))
            .await
            .unwrap();

        assert_eq!(core.last_reconcile_report(), Some(ReconcileReport::default()));
        assert!(core.pending_intents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_favorite_is_pending() {
        let core = CoreService::bootstrap(config(MockStarService::new()))
            .await
            .unwrap();

        let mut song = FavoriteTarget::song("S1");
        let outcome = core.set_favorite(&mut song).outcome().await.unwrap();

        assert_eq!(outcome, FavoriteOutcome::Queued);
        let pending = core.pending_intents().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].issued_at, 2_000);
    }

    #[tokio::test]
    async fn test_runtime_capability_error_maps_to_core_error() {
        let err: CoreError = core_runtime::Error::CapabilityMissing {
            capability: "RemoteStarService".to_string(),
            message: "missing".to_string(),
        }
        .into();

        assert!(matches!(err, CoreError::CapabilityMissing { .. }));
    }
}
