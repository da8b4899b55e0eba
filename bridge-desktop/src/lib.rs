//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! Only connectivity detection has a desktop default. The music server client
//! and download subsystem are always supplied by the host application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::DesktopNetworkMonitor;
//! use bridge_traits::NetworkMonitor;
//!
//! #[tokio::main]
//! async fn main() {
//!     let monitor = DesktopNetworkMonitor::new().with_probe_address("music.example.org:443");
//!     println!("online: {}", monitor.is_connected().await);
//! }
//! ```

mod network;

pub use network::DesktopNetworkMonitor;
