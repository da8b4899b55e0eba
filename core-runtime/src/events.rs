//! # Event Bus System
//!
//! Broadcasts favorite and reconciliation events to interested listeners
//! (UI layers, diagnostics) using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps the per-domain enums
//!   [`FavoriteEvent`] and [`ReconcileEvent`]
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Receiver wrapper with optional filtering
//!
//! ```text
//! ┌──────────────────┐  emit   ┌──────────┐  subscribe  ┌────────────┐
//! │FavoriteController├────────>│          ├────────────>│ Subscriber │
//! └──────────────────┘         │ EventBus │             └────────────┘
//! ┌──────────────────┐  emit   │          │  subscribe  ┌────────────┐
//! │StartupReconciler ├────────>│          ├────────────>│ Subscriber │
//! └──────────────────┘         └──────────┘             └────────────┘
//! ```
//!
//! Emitting with no subscribers is not an error for publishers; they ignore
//! the `SendError` returned by [`EventBus::emit`].
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, FavoriteEvent};
//!
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Favorite(FavoriteEvent::Changed {
//!     target_kind: "song".to_string(),
//!     target_id: Some("S1".to_string()),
//!     starred: true,
//! }))
//! .ok();
//!
//! assert!(rx.try_recv().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep
//!   receiving.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Favorite toggles issued through the controller
    Favorite(FavoriteEvent),
    /// Startup replay of queued intents
    Reconcile(ReconcileEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Favorite(e) => e.description(),
            CoreEvent::Reconcile(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Favorite(FavoriteEvent::RemoteFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Reconcile(ReconcileEvent::ReplayFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Reconcile(ReconcileEvent::Completed { failed, .. }) if *failed > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Reconcile(ReconcileEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Favorite(FavoriteEvent::Queued { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Favorite Events
// ============================================================================

/// Events emitted while toggling a favorite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum FavoriteEvent {
    /// The in-memory flag was flipped (before any remote work).
    Changed {
        target_kind: String,
        /// `None` for entities without a server identity
        target_id: Option<String>,
        starred: bool,
    },
    /// The server confirmed the star/unstar.
    Applied {
        target_kind: String,
        target_id: String,
        starred: bool,
    },
    /// The remote call failed while online.
    RemoteFailed {
        target_kind: String,
        target_id: String,
        message: String,
    },
    /// An intent was persisted for replay on the next startup.
    Queued {
        target_kind: String,
        target_id: String,
        desired_starred: bool,
        /// Unix timestamp in milliseconds
        issued_at: i64,
    },
}

impl FavoriteEvent {
    pub fn description(&self) -> &str {
        match self {
            FavoriteEvent::Changed { .. } => "Favorite flag changed",
            FavoriteEvent::Applied { .. } => "Favorite applied on server",
            FavoriteEvent::RemoteFailed { .. } => "Favorite remote call failed",
            FavoriteEvent::Queued { .. } => "Favorite queued for replay",
        }
    }
}

// ============================================================================
// Reconcile Events
// ============================================================================

/// Events emitted by the startup reconciler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ReconcileEvent {
    /// Reconciliation began with `pending` persisted intents.
    Started { pending: usize },
    /// A surviving intent could not be replayed.
    ReplayFailed {
        target_kind: String,
        target_id: String,
        message: String,
    },
    /// Reconciliation finished.
    Completed {
        total: usize,
        superseded: usize,
        replayed: usize,
        succeeded: usize,
        failed: usize,
    },
}

impl ReconcileEvent {
    pub fn description(&self) -> &str {
        match self {
            ReconcileEvent::Started { .. } => "Reconciliation started",
            ReconcileEvent::ReplayFailed { .. } => "Intent replay failed",
            ReconcileEvent::Completed { .. } => "Reconciliation completed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to core events.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber before it lags.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let reconcile_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Reconcile(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`/`try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching events are currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
