//! # Startup Reconciler
//!
//! Drains the local intent queue once per session.
//!
//! 1. Intents are grouped by [`IntentKey`] (kind + id).
//! 2. The newest intent of each group survives; the rest are deleted before
//!    anything is sent, so superseded toggles never reach the server.
//! 3. Survivors are replayed concurrently, at most
//!    [`ReconcilerConfig::max_concurrent`] at a time.
//!
//! A survivor whose replay fails is deleted and not retried. A survivor whose
//! replay succeeds stays in the queue and is replayed again next session.

use crate::error::{Result, SyncError};
use bridge_traits::RemoteStarService;
use core_library::{IntentKey, StarIntent, StarIntentRepository};
use core_runtime::events::{CoreEvent, EventBus, ReconcileEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Reconciler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Maximum replays in flight at once
    pub max_concurrent: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Intents found in the store
    pub total: usize,
    /// Older intents deleted without being sent
    pub superseded: usize,
    /// Survivors sent to the server
    pub replayed: usize,
    /// Survivors the server accepted; they stay queued for the next session
    pub succeeded: usize,
    /// Survivors whose replay failed (and were deleted)
    pub failed: usize,
}

/// Result of last-write-wins deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurvivorSelection {
    /// One intent per identity, in order of first appearance
    pub survivors: Vec<StarIntent>,
    /// Every other intent
    pub superseded: Vec<StarIntent>,
}

/// Pick the newest intent per identity.
///
/// `intents` must be in store order. On equal `issued_at` the intent that
/// appears later in the store wins.
pub fn select_survivors(intents: Vec<StarIntent>) -> SurvivorSelection {
    let mut selection = SurvivorSelection::default();
    let mut slots: HashMap<IntentKey, usize> = HashMap::new();

    for intent in intents {
        match slots.get(&intent.key()) {
            Some(&slot) => {
                let current = &mut selection.survivors[slot];
                if intent.issued_at >= current.issued_at {
                    let older = std::mem::replace(current, intent);
                    selection.superseded.push(older);
                } else {
                    selection.superseded.push(intent);
                }
            }
            None => {
                slots.insert(intent.key(), selection.survivors.len());
                selection.survivors.push(intent);
            }
        }
    }

    selection
}

/// Replays queued favorites at session start.
pub struct StartupReconciler {
    store: Arc<dyn StarIntentRepository>,
    remote: Arc<dyn RemoteStarService>,
    events: Option<EventBus>,
    config: ReconcilerConfig,
    started: AtomicBool,
}

impl StartupReconciler {
    pub fn new(
        store: Arc<dyn StarIntentRepository>,
        remote: Arc<dyn RemoteStarService>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            remote,
            events: None,
            config,
            started: AtomicBool::new(false),
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Whether [`run`](Self::run) has been called on this instance.
    pub fn has_run(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Reconcile the intent queue against the server.
    ///
    /// # Errors
    ///
    /// - [`SyncError::AlreadyReconciled`] on any call after the first
    /// - [`SyncError::Library`] if the store cannot be read or written
    ///
    /// Remote failures are not errors; they are counted in the report.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<ReconcileReport> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SyncError::AlreadyReconciled);
        }

        let intents = self.store.list().await?;
        let mut report = ReconcileReport {
            total: intents.len(),
            ..Default::default()
        };

        info!(pending = report.total, "Starting intent reconciliation");
        self.emit(ReconcileEvent::Started {
            pending: report.total,
        });

        let SurvivorSelection {
            survivors,
            superseded,
        } = select_survivors(intents);

        for intent in &superseded {
            debug!(intent_id = %intent.id, favorite = %intent.target_ref(), "Dropping superseded intent");
            self.store.delete(intent).await?;
        }
        report.superseded = superseded.len();

        let mut first_error = None;
        for result in self.replay_all(survivors).await {
            report.replayed += 1;
            match result {
                Ok(true) => report.succeeded += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    report.failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        info!(
            total = report.total,
            superseded = report.superseded,
            succeeded = report.succeeded,
            failed = report.failed,
            "Intent reconciliation finished"
        );
        self.emit(ReconcileEvent::Completed {
            total: report.total,
            superseded: report.superseded,
            replayed: report.replayed,
            succeeded: report.succeeded,
            failed: report.failed,
        });

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Replay every survivor; `Ok(true)` per accepted replay.
    async fn replay_all(&self, survivors: Vec<StarIntent>) -> Vec<Result<bool>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(survivors.len());

        for intent in survivors {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    handles.push(Err(SyncError::TaskFailed(e.to_string())));
                    continue;
                }
            };

            let store = Arc::clone(&self.store);
            let remote = Arc::clone(&self.remote);
            let events = self.events.clone();

            handles.push(Ok(tokio::spawn(async move {
                let result = replay(store.as_ref(), remote.as_ref(), events.as_ref(), &intent).await;
                drop(permit);
                result
            })));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = match handle {
                Ok(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        error!(error = %e, "Replay task panicked");
                        Err(SyncError::TaskFailed(e.to_string()))
                    }
                },
                Err(e) => Err(e),
            };
            results.push(result);
        }

        results
    }

    fn emit(&self, event: ReconcileEvent) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Reconcile(event));
        }
    }
}

async fn replay(
    store: &dyn StarIntentRepository,
    remote: &dyn RemoteStarService,
    events: Option<&EventBus>,
    intent: &StarIntent,
) -> Result<bool> {
    let target = intent.target_ref();
    let request = target.to_star_request();

    let result = if intent.desired_starred {
        remote.star(request).await
    } else {
        remote.unstar(request).await
    };

    match result {
        Ok(()) => {
            debug!(intent_id = %intent.id, favorite = %target, "Intent replayed");
            Ok(true)
        }
        Err(e) => {
            warn!(intent_id = %intent.id, favorite = %target, error = %e, "Replay failed; abandoning intent");
            if let Some(events) = events {
                let _ = events.emit(CoreEvent::Reconcile(ReconcileEvent::ReplayFailed {
                    target_kind: intent.target_kind.to_string(),
                    target_id: intent.target_id.clone(),
                    message: e.to_string(),
                }));
            }
            store.delete(intent).await?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::TargetRef;

    fn song(id: &str) -> TargetRef {
        TargetRef::Song(id.to_string())
    }

    #[test]
    fn test_newest_intent_survives() {
        let old = StarIntent::star(&song("S1"), 100);
        let new = StarIntent::unstar(&song("S1"), 200);

        let selection = select_survivors(vec![old.clone(), new.clone()]);
        assert_eq!(selection.survivors, vec![new.clone()]);
        assert_eq!(selection.superseded, vec![old.clone()]);

        // store order must not matter when timestamps differ
        let selection = select_survivors(vec![new.clone(), old.clone()]);
        assert_eq!(selection.survivors, vec![new]);
        assert_eq!(selection.superseded, vec![old]);
    }

    #[test]
    fn test_tie_goes_to_later_store_entry() {
        let first = StarIntent::star(&song("S1"), 100);
        let second = StarIntent::unstar(&song("S1"), 100);

        let selection = select_survivors(vec![first.clone(), second.clone()]);
        assert_eq!(selection.survivors, vec![second]);
        assert_eq!(selection.superseded, vec![first]);
    }

    #[test]
    fn test_identity_includes_kind() {
        let song_intent = StarIntent::star(&song("X"), 1);
        let album_intent = StarIntent::star(&TargetRef::Album("X".to_string()), 2);

        let selection = select_survivors(vec![song_intent, album_intent]);
        assert_eq!(selection.survivors.len(), 2);
        assert!(selection.superseded.is_empty());
    }

    #[test]
    fn test_one_survivor_per_identity() {
        let mut intents = Vec::new();
        for (i, id) in ["A", "B", "A", "C", "B", "A"].iter().enumerate() {
            intents.push(StarIntent::new(&song(id), i % 2 == 0, i as i64));
        }

        let selection = select_survivors(intents);
        let ids: Vec<_> = selection
            .survivors
            .iter()
            .map(|s| (s.target_id.as_str(), s.issued_at))
            .collect();

        assert_eq!(ids, vec![("A", 5), ("B", 4), ("C", 3)]);
        assert_eq!(selection.superseded.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(select_survivors(Vec::new()), SurvivorSelection::default());
    }
}
