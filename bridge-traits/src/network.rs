//! Network Monitoring Abstraction
//!
//! Answers the one question the favorites engine asks before talking to the
//! music server: is the session online right now?

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

impl NetworkStatus {
    /// Whether remote calls should be attempted in this state.
    ///
    /// `Indeterminate` is treated as offline so that actions are queued
    /// instead of being lost to a call that cannot complete.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Network information
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    /// Whether the connection is metered (has data limits/costs)
    pub is_metered: bool,
}

impl NetworkInfo {
    pub fn connected() -> Self {
        Self {
            status: NetworkStatus::Connected,
            is_metered: false,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: NetworkStatus::Disconnected,
            is_metered: false,
        }
    }
}

/// Network monitor trait
///
/// The favorites controller consults [`NetworkMonitor::is_connected`] to pick
/// between the online path (remote star/unstar call) and the offline path
/// (persist a pending intent).
///
/// # Platform Support
///
/// - **Desktop**: TCP reachability probe against the music server
/// - **Mobile**: host connectivity APIs injected by the app shell
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::NetworkMonitor;
///
/// async fn should_replay(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.is_connected().await
/// }
/// ```
#[async_trait::async_trait]
pub trait NetworkMonitor: PlatformSendSync {
    /// Get current network information
    async fn get_network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently connected. Errors count as offline.
    async fn is_connected(&self) -> bool {
        self.get_network_info()
            .await
            .map(|info| info.status.is_online())
            .unwrap_or(false)
    }

    /// Subscribe to network status changes
    ///
    /// Returns a stream of network info updates. Implementations should
    /// emit an event whenever network status changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network status changes
#[async_trait::async_trait]
pub trait NetworkChangeStream: PlatformSend {
    /// Get the next network info update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    struct FailingMonitor;

    #[async_trait::async_trait]
    impl NetworkMonitor for FailingMonitor {
        async fn get_network_info(&self) -> Result<NetworkInfo> {
            Err(BridgeError::NotAvailable("network".to_string()))
        }

        async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
            Err(BridgeError::NotAvailable("network".to_string()))
        }
    }

    #[test]
    fn test_network_info() {
        let info = NetworkInfo::connected();
        assert_eq!(info.status, NetworkStatus::Connected);
        assert!(!info.is_metered);
        assert_eq!(NetworkInfo::disconnected().status, NetworkStatus::Disconnected);
    }

    #[test]
    fn test_indeterminate_is_offline() {
        assert!(NetworkStatus::Connected.is_online());
        assert!(!NetworkStatus::Disconnected.is_online());
        assert!(!NetworkStatus::Indeterminate.is_online());
    }

    #[tokio::test]
    async fn test_monitor_error_counts_as_offline() {
        assert!(!FailingMonitor.is_connected().await);
    }
}
