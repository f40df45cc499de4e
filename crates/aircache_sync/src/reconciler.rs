//! Server-wins reconciliation of the local passenger table.
//!
//! A pass fetches the full remote snapshot and makes the local table equal
//! to it: remote records are inserted or overwritten, and local records the
//! remote no longer has are deleted (their bookings go with them).
//! Bookings themselves are not reconciled.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::{emit, RecordKey, SyncEvent};
use crate::identity::IdentityMap;
use aircache_remote::{RemoteError, RemoteGateway};
use aircache_store::{Passenger, PassengerId, RecordStore, StoreError};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// The current state of the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    /// No pass has run, or the last one was cancelled.
    Idle,
    /// Fetching the remote snapshot.
    Fetching,
    /// Applying the snapshot to the local store.
    Applying,
    /// The last pass completed.
    Reconciled,
    /// The last pass failed.
    Error,
}

impl ReconcileState {
    /// Returns true while a pass is running.
    pub fn is_active(&self) -> bool {
        matches!(self, ReconcileState::Fetching | ReconcileState::Applying)
    }
}

/// Cumulative statistics over all passes.
#[derive(Debug, Clone, Default)]
pub struct ReconcileStats {
    /// Passes that completed.
    pub passes_completed: u64,
    /// Passes that failed or were cancelled.
    pub passes_failed: u64,
    /// Passes rejected because another was running.
    pub passes_rejected: u64,
    /// Records inserted or overwritten.
    pub records_upserted: u64,
    /// Records deleted.
    pub records_deleted: u64,
    /// Completion time of the last successful pass.
    pub last_reconciled: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// A record that a pass could not apply.
#[derive(Debug)]
pub enum ReconcileIssue {
    /// A remote record carried no identity and was skipped.
    MissingIdentity {
        /// Position in the remote listing.
        index: usize,
    },
    /// The local store rejected a write for this record.
    Store {
        /// The record concerned.
        id: PassengerId,
        /// The store's error.
        error: StoreError,
    },
}

impl fmt::Display for ReconcileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileIssue::MissingIdentity { index } => {
                write!(f, "remote record {index} has no identity")
            }
            ReconcileIssue::Store { id, error } => write!(f, "passenger {id}: {error}"),
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcileReport {
    /// Records inserted or overwritten.
    pub upserted: usize,
    /// Local records deleted.
    pub deleted: usize,
    /// Records that could not be applied; a later pass retries them.
    pub errors: Vec<ReconcileIssue>,
    /// The local passenger list after the pass, newest first.
    pub passengers: Vec<Passenger>,
    /// Duration of the pass.
    pub duration: Duration,
}

impl ReconcileReport {
    /// Returns true if the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.upserted == 0 && self.deleted == 0
    }
}

/// Clears the in-flight flag when a pass ends, however it ends.
///
/// A pass dropped mid-flight also leaves the state `Idle` rather than
/// stuck in `Fetching` or `Applying`.
struct InFlightGuard<'a, S: RecordStore, G: RemoteGateway>(&'a ReconcilerInner<S, G>);

impl<S: RecordStore, G: RemoteGateway> Drop for InFlightGuard<'_, S, G> {
    fn drop(&mut self) {
        {
            let mut state = self.0.state.write();
            if state.is_active() {
                *state = ReconcileState::Idle;
            }
        }
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}

struct ReconcilerInner<S: RecordStore, G: RemoteGateway> {
    store: Arc<S>,
    gateway: Arc<G>,
    strict_envelope: bool,
    events: broadcast::Sender<SyncEvent>,
    identities: Arc<IdentityMap>,
    in_flight: AtomicBool,
    cancelled: AtomicBool,
    state: RwLock<ReconcileState>,
    stats: RwLock<ReconcileStats>,
}

/// Makes the local passenger table match the remote snapshot.
///
/// At most one pass runs at a time; a concurrent call is rejected with
/// [`SyncError::ReconcileInProgress`].
pub struct Reconciler<S: RecordStore, G: RemoteGateway> {
    inner: Arc<ReconcilerInner<S, G>>,
}

impl<S: RecordStore, G: RemoteGateway> Clone for Reconciler<S, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, G> Reconciler<S, G>
where
    S: RecordStore + 'static,
    G: RemoteGateway + 'static,
{
    /// Creates a reconciler publishing to `events`.
    pub fn new(
        store: Arc<S>,
        gateway: Arc<G>,
        config: &SyncConfig,
        events: broadcast::Sender<SyncEvent>,
    ) -> Self {
        Self::from_parts(store, gateway, config, events, Arc::default())
    }

    pub(crate) fn from_parts(
        store: Arc<S>,
        gateway: Arc<G>,
        config: &SyncConfig,
        events: broadcast::Sender<SyncEvent>,
        identities: Arc<IdentityMap>,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                store,
                gateway,
                strict_envelope: config.strict_envelope,
                events,
                identities,
                in_flight: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                state: RwLock::new(ReconcileState::Idle),
                stats: RwLock::new(ReconcileStats::default()),
            }),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> ReconcileState {
        *self.inner.state.read()
    }

    /// Gets the cumulative stats.
    pub fn stats(&self) -> ReconcileStats {
        self.inner.stats.read().clone()
    }

    /// Returns true while a pass is running.
    pub fn is_running(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Requests cancellation of the running pass.
    ///
    /// The pass stops before its next store operation. Changes already
    /// applied are kept.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Runs one reconciliation pass.
    ///
    /// A remote failure aborts the pass before any local change. Per-record
    /// store failures are collected in [`ReconcileReport::errors`] and the
    /// pass continues.
    pub async fn reconcile(&self) -> SyncResult<ReconcileReport> {
        let inner: &ReconcilerInner<S, G> = &self.inner;
        if inner
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("reconciliation already running, rejecting");
            inner.stats.write().passes_rejected += 1;
            return Err(SyncError::ReconcileInProgress);
        }
        let _guard = InFlightGuard(inner);
        inner.cancelled.store(false, Ordering::SeqCst);

        let start = Instant::now();
        match inner.run().await {
            Ok(mut report) => {
                report.duration = start.elapsed();
                inner.set_state(ReconcileState::Reconciled);
                {
                    let mut stats = inner.stats.write();
                    stats.passes_completed += 1;
                    stats.records_upserted += report.upserted as u64;
                    stats.records_deleted += report.deleted as u64;
                    stats.last_reconciled = Some(Instant::now());
                    stats.last_error = None;
                }
                info!(
                    upserted = report.upserted,
                    deleted = report.deleted,
                    errors = report.errors.len(),
                    duration = ?report.duration,
                    "reconciliation complete"
                );
                emit(
                    &inner.events,
                    SyncEvent::Reconciled {
                        upserted: report.upserted,
                        deleted: report.deleted,
                    },
                );
                Ok(report)
            }
            Err(e) => {
                let state = match e {
                    SyncError::Cancelled => ReconcileState::Idle,
                    _ => ReconcileState::Error,
                };
                inner.set_state(state);
                {
                    let mut stats = inner.stats.write();
                    stats.passes_failed += 1;
                    stats.last_error = Some(e.to_string());
                }
                warn!(error = %e, "reconciliation failed");
                Err(e)
            }
        }
    }

    /// Runs a pass every `interval` until the returned task is aborted.
    ///
    /// Ticks that fall while a pass is still running are skipped.
    pub fn spawn_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let reconciler = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match reconciler.reconcile().await {
                    Ok(_) => {}
                    Err(SyncError::ReconcileInProgress) => {
                        debug!("periodic reconciliation skipped, pass in flight");
                    }
                    // Already logged by `reconcile`.
                    Err(_) => {}
                }
            }
        })
    }
}

impl<S: RecordStore, G: RemoteGateway> ReconcilerInner<S, G> {
    fn set_state(&self, state: ReconcileState) {
        *self.state.write() = state;
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn run(&self) -> SyncResult<ReconcileReport> {
        self.set_state(ReconcileState::Fetching);
        let listing = self.gateway.list_passengers().await?;
        if listing.data_missing {
            if self.strict_envelope {
                return Err(SyncError::Remote(RemoteError::MalformedResponse(
                    "passenger listing has no `data` field".into(),
                )));
            }
            warn!("remote snapshot has no `data` field, every local passenger will be removed");
        }
        self.check_cancelled()?;

        self.set_state(ReconcileState::Applying);
        let mut local: BTreeMap<PassengerId, Passenger> = self
            .store
            .list_passengers()?
            .into_iter()
            .filter_map(|p| p.id.map(|id| (id, p)))
            .collect();

        let mut report = ReconcileReport {
            upserted: 0,
            deleted: 0,
            errors: Vec::new(),
            passengers: Vec::new(),
            duration: Duration::ZERO,
        };

        let mut remote_ids = HashSet::with_capacity(listing.items.len());
        for (index, remote) in listing.items.into_iter().enumerate() {
            let Some(id) = remote.id else {
                warn!(index, "skipping remote passenger without identity");
                report.errors.push(ReconcileIssue::MissingIdentity { index });
                continue;
            };
            remote_ids.insert(id);
            // Local and remote identity agree from here on.
            self.identities.forget(RecordKey::Passenger(id));

            if local.get(&id) == Some(&remote) {
                continue;
            }
            self.check_cancelled()?;
            let result = if local.contains_key(&id) {
                self.store.update_passenger(&remote).map(drop)
            } else {
                self.store.insert_passenger_with_id(&remote)
            };
            match result {
                Ok(()) => {
                    debug!(passenger = %id, "upserted from remote");
                    report.upserted += 1;
                    local.insert(id, remote);
                }
                Err(error) => {
                    warn!(passenger = %id, %error, "failed to apply remote passenger");
                    report.errors.push(ReconcileIssue::Store { id, error });
                }
            }
        }

        for id in local.keys().filter(|id| !remote_ids.contains(id)) {
            self.check_cancelled()?;
            match self.store.delete_passenger(*id) {
                Ok(removed) => {
                    self.identities.forget(RecordKey::Passenger(*id));
                    debug!(passenger = %id, "deleted, absent from remote");
                    report.deleted += removed;
                }
                Err(error) => {
                    warn!(passenger = %id, %error, "failed to delete passenger");
                    report.errors.push(ReconcileIssue::Store { id: *id, error });
                }
            }
        }

        report.passengers = self.store.list_passengers()?;
        Ok(report)
    }
}
