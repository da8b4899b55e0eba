//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const DEFAULT_PROBE_ADDRESS: &str = "8.8.8.8:53";
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Desktop network monitor implementation
///
/// Reachability is decided by opening a TCP connection to a probe address.
/// Pointing the probe at the music server makes "online" mean "the server is
/// reachable", which is what the favorites controller actually cares about.
#[derive(Clone)]
pub struct DesktopNetworkMonitor {
    probe_address: String,
    probe_timeout: Duration,
    poll_interval: Duration,
    last_status: Arc<Mutex<Option<NetworkStatus>>>,
}

impl DesktopNetworkMonitor {
    pub fn new() -> Self {
        Self {
            probe_address: DEFAULT_PROBE_ADDRESS.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_status: Arc::new(Mutex::new(None)),
        }
    }

    /// `host:port` to probe (e.g. the music server's address)
    pub fn with_probe_address(mut self, address: impl Into<String>) -> Self {
        self.probe_address = address.into();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// How often [`NetworkChangeStream::next`] re-probes
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Last status observed by a probe, if any probe ran yet
    pub async fn last_status(&self) -> Option<NetworkStatus> {
        *self.last_status.lock().await
    }

    async fn check_connectivity(&self) -> NetworkStatus {
        match tokio::time::timeout(
            self.probe_timeout,
            tokio::net::TcpStream::connect(self.probe_address.as_str()),
        )
        .await
        {
            Ok(Ok(_)) => NetworkStatus::Connected,
            Ok(Err(_)) | Err(_) => NetworkStatus::Disconnected,
        }
    }
}

impl Default for DesktopNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    async fn get_network_info(&self) -> Result<NetworkInfo> {
        let status = self.check_connectivity().await;

        let mut last = self.last_status.lock().await;
        if *last != Some(status) {
            debug!(status = ?status, probe = %self.probe_address, "Network status changed");
        }
        *last = Some(status);

        // Desktop connections are assumed unmetered
        Ok(NetworkInfo {
            status,
            is_metered: false,
        })
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(DesktopNetworkChangeStream {
            monitor: self.clone(),
            last_status: None,
        }))
    }
}

/// Network change stream that polls for changes
struct DesktopNetworkChangeStream {
    monitor: DesktopNetworkMonitor,
    last_status: Option<NetworkStatus>,
}

#[async_trait]
impl NetworkChangeStream for DesktopNetworkChangeStream {
    async fn next(&mut self) -> Option<NetworkInfo> {
        loop {
            if let Ok(info) = self.monitor.get_network_info().await {
                if self.last_status != Some(info.status) {
                    self.last_status = Some(info.status);
                    return Some(info);
                }
            }

            tokio::time::sleep(self.monitor.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_reachable_probe_is_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let monitor = DesktopNetworkMonitor::new().with_probe_address(addr.to_string());

        assert!(monitor.is_connected().await);
        assert_eq!(monitor.last_status().await, Some(NetworkStatus::Connected));
    }

    #[tokio::test]
    async fn test_unreachable_probe_is_disconnected() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let monitor = DesktopNetworkMonitor::new()
            .with_probe_address(addr.to_string())
            .with_probe_timeout(Duration::from_millis(500));

        let info = monitor.get_network_info().await.unwrap();
        assert_eq!(info.status, NetworkStatus::Disconnected);
        assert!(!monitor.is_connected().await);
    }

    #[tokio::test]
    async fn test_change_stream_reports_initial_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let monitor = DesktopNetworkMonitor::new()
            .with_probe_address(listener.local_addr().unwrap().to_string())
            .with_poll_interval(Duration::from_millis(10));

        let mut stream = monitor.subscribe_changes().await.unwrap();
        let info = stream.next().await.unwrap();
        assert_eq!(info.status, NetworkStatus::Connected);
    }
}
