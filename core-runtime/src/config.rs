//! # Core Configuration Module
//!
//! Provides configuration management for the favorites core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all host-provided collaborators and settings. It
//! enforces fail-fast validation so that a missing collaborator is reported at
//! startup instead of surfacing as a silently dropped favorite later.
//!
//! ## Required Dependencies
//!
//! - `RemoteStarService` - The music server client used for star/unstar
//! - `NetworkMonitor` - Online/offline detection (desktop default available)
//!
//! ## Optional Dependencies
//!
//! - `Clock` - Defaults to `SystemClock`
//! - `AlbumDownloader` - Required only when starred-album sync is enabled
//!
//! When the `desktop-shims` feature is enabled, `DesktopNetworkMonitor` is
//! injected automatically if no monitor is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/favorites.db")
//!     .star_service(Arc::new(MyServerClient::new()))
//!     .network_monitor(Arc::new(MyNetworkMonitor))
//!     .album_downloader(Arc::new(MyDownloads))
//!     .sync_starred_albums(true)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AlbumDownloader, Clock, NetworkMonitor, RemoteStarService, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

/// Default number of reconciliation replays allowed in flight at once.
pub const DEFAULT_RECONCILE_CONCURRENCY: usize = 4;

/// Upper bound accepted for [`CoreConfig::reconcile_max_concurrent`].
pub const MAX_RECONCILE_CONCURRENCY: usize = 64;

/// Core configuration for the favorites core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database holding pending star intents
    pub database_path: PathBuf,

    /// Music server client (required)
    pub star_service: Arc<dyn RemoteStarService>,

    /// Connectivity monitor (required, desktop default available)
    pub network_monitor: Arc<dyn NetworkMonitor>,

    /// Time source for `starred_at` / `issued_at`
    pub clock: Arc<dyn Clock>,

    /// Download subsystem used after starring an album (optional)
    pub album_downloader: Option<Arc<dyn AlbumDownloader>>,

    /// Feature flags
    pub features: FeatureFlags,

    /// Maximum concurrent replays during startup reconciliation
    pub reconcile_max_concurrent: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("star_service", &"RemoteStarService { ... }")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "album_downloader",
                &self
                    .album_downloader
                    .as_ref()
                    .map(|_| "AlbumDownloader { ... }"),
            )
            .field("features", &self.features)
            .field("reconcile_max_concurrent", &self.reconcile_max_concurrent)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Download every track of an album after it is starred online
    /// (requires AlbumDownloader)
    pub sync_starred_albums: bool,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Reconcile concurrency is within `1..=MAX_RECONCILE_CONCURRENCY`
    /// - Feature flags are consistent with available bridges
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.reconcile_max_concurrent == 0 {
            return Err(Error::Config(
                "Reconcile concurrency must be at least 1".to_string(),
            ));
        }

        if self.reconcile_max_concurrent > MAX_RECONCILE_CONCURRENCY {
            return Err(Error::Config(format!(
                "Reconcile concurrency exceeds maximum of {}",
                MAX_RECONCILE_CONCURRENCY
            )));
        }

        if self.features.sync_starred_albums && self.album_downloader.is_none() {
            return Err(Error::Config(
                "Starred-album sync enabled but no AlbumDownloader provided. \
                 Disable the feature or inject an AlbumDownloader implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn star_service_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "RemoteStarService".to_string(),
        message: "RemoteStarService implementation is required to deliver favorites. \
                 Inject the host's music server client with .star_service()."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn network_monitor_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NetworkMonitor".to_string(),
        message: "NetworkMonitor implementation is required to decide between online and \
                 offline favorites. Desktop: enable the 'desktop-shims' feature to use \
                 DesktopNetworkMonitor. Mobile: inject the platform connectivity monitor."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    use bridge_desktop::DesktopNetworkMonitor;

    let monitor: Arc<dyn NetworkMonitor> = Arc::new(DesktopNetworkMonitor::new());
    Ok(monitor)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Err(network_monitor_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    star_service: Option<Arc<dyn RemoteStarService>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    clock: Option<Arc<dyn Clock>>,
    album_downloader: Option<Arc<dyn AlbumDownloader>>,
    features: FeatureFlags,
    reconcile_max_concurrent: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the path to the SQLite database file.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the music server client.
    pub fn star_service(mut self, service: Arc<dyn RemoteStarService>) -> Self {
        self.star_service = Some(service);
        self
    }

    /// Sets the connectivity monitor.
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the download subsystem used for starred albums.
    pub fn album_downloader(mut self, downloader: Arc<dyn AlbumDownloader>) -> Self {
        self.album_downloader = Some(downloader);
        self
    }

    /// Enables or disables downloading albums after they are starred.
    pub fn sync_starred_albums(mut self, enabled: bool) -> Self {
        self.features.sync_starred_albums = enabled;
        self
    }

    /// Replaces all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Sets how many reconciliation replays may run concurrently.
    pub fn reconcile_max_concurrent(mut self, limit: usize) -> Self {
        self.reconcile_max_concurrent = Some(limit);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing (RemoteStarService, NetworkMonitor)
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let star_service = self.star_service.ok_or_else(star_service_missing_error)?;

        let network_monitor = match self.network_monitor {
            Some(monitor) => monitor,
            None => provide_default_network_monitor()?,
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let config = CoreConfig {
            database_path,
            star_service,
            network_monitor,
            clock,
            album_downloader: self.album_downloader,
            features: self.features,
            reconcile_max_concurrent: self
                .reconcile_max_concurrent
                .unwrap_or(DEFAULT_RECONCILE_CONCURRENCY),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::network::{NetworkChangeStream, NetworkInfo};
    use bridge_traits::{BridgeError, StarRequest};

    struct NoopStarService;

    #[async_trait]
    impl RemoteStarService for NoopStarService {
        async fn star(&self, _request: StarRequest) -> BridgeResult<()> {
            Ok(())
        }

        async fn unstar(&self, _request: StarRequest) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct OfflineMonitor;

    #[async_trait]
    impl NetworkMonitor for OfflineMonitor {
        async fn get_network_info(&self) -> BridgeResult<NetworkInfo> {
            Ok(NetworkInfo::disconnected())
        }

        async fn subscribe_changes(&self) -> BridgeResult<Box<dyn NetworkChangeStream>> {
            Err(BridgeError::NotAvailable("subscribe_changes".to_string()))
        }
    }

    struct NoopDownloader;

    #[async_trait]
    impl AlbumDownloader for NoopDownloader {
        async fn download_album(&self, _album_id: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn base_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .database_path("/tmp/favorites.db")
            .star_service(Arc::new(NoopStarService))
            .network_monitor(Arc::new(OfflineMonitor))
    }

    #[test]
    fn test_builder_requires_database_path() {
        let result = CoreConfig::builder()
            .star_service(Arc::new(NoopStarService))
            .network_monitor(Arc::new(OfflineMonitor))
            .build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("Database path is required")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_requires_star_service() {
        let result = CoreConfig::builder()
            .database_path("/tmp/favorites.db")
            .network_monitor(Arc::new(OfflineMonitor))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "RemoteStarService")
            }
            other => panic!("expected missing capability, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_network_monitor_without_shims() {
        let result = CoreConfig::builder()
            .database_path("/tmp/favorites.db")
            .star_service(Arc::new(NoopStarService))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "NetworkMonitor"
        ));
    }

    #[test]
    fn test_defaults_applied() {
        let config = base_builder().build().unwrap();

        assert_eq!(config.reconcile_max_concurrent, DEFAULT_RECONCILE_CONCURRENCY);
        assert!(!config.features.sync_starred_albums);
        assert!(config.album_downloader.is_none());
        assert!(config.clock.unix_timestamp() > 0);
    }

    #[test]
    fn test_album_sync_requires_downloader() {
        let result = base_builder().sync_starred_albums(true).build();
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("AlbumDownloader")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }

        let config = base_builder()
            .sync_starred_albums(true)
            .album_downloader(Arc::new(NoopDownloader))
            .build()
            .unwrap();
        assert!(config.features.sync_starred_albums);
    }

    #[test]
    fn test_reconcile_concurrency_bounds() {
        assert!(base_builder().reconcile_max_concurrent(0).build().is_err());
        assert!(base_builder()
            .reconcile_max_concurrent(MAX_RECONCILE_CONCURRENCY + 1)
            .build()
            .is_err());
        assert_eq!(
            base_builder()
                .reconcile_max_concurrent(1)
                .build()
                .unwrap()
                .reconcile_max_concurrent,
            1
        );
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = base_builder().build().unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("RemoteStarService { ... }"));
        assert!(rendered.contains("favorites.db"));
    }
}
