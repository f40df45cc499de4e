//! Local-first writes with best-effort remote propagation.
//!
//! Every mutation is applied to the local store first and returned to the
//! caller at once. The matching remote mutation is queued on the lane of
//! the passenger it belongs to and sent by that lane's worker task. Writes
//! on one lane reach the remote in submission order; lanes run
//! concurrently.

use crate::config::{RetryConfig, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::events::{emit, RecordKey, SyncEvent, SyncWarning, WriteOp};
use crate::identity::IdentityMap;
use aircache_remote::{RemoteError, RemoteGateway, RemoteResult};
use aircache_store::{
    Booking, BookingId, Passenger, PassengerId, RecordKind, RecordStore, StoreError,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot, Notify};
use tracing::{debug, warn};

/// A remote mutation waiting to be sent.
#[derive(Debug, Clone)]
enum RemoteMutation {
    CreatePassenger(Passenger),
    UpdatePassenger(Passenger),
    DeletePassenger(PassengerId),
    CreateBooking(Booking),
    UpdateBooking(Booking),
    DeleteBooking(BookingId),
}

impl RemoteMutation {
    fn op(&self) -> WriteOp {
        match self {
            RemoteMutation::CreatePassenger(_) | RemoteMutation::CreateBooking(_) => {
                WriteOp::Create
            }
            RemoteMutation::UpdatePassenger(_) | RemoteMutation::UpdateBooking(_) => {
                WriteOp::Update
            }
            RemoteMutation::DeletePassenger(_) | RemoteMutation::DeleteBooking(_) => {
                WriteOp::Delete
            }
        }
    }

    /// Rewrites local identities into the ones the remote knows.
    fn to_remote(&self, identities: &IdentityMap) -> RemoteResult<RemoteMutation> {
        Ok(match self {
            RemoteMutation::CreatePassenger(p) => RemoteMutation::CreatePassenger(p.clone()),
            RemoteMutation::UpdatePassenger(p) => RemoteMutation::UpdatePassenger(Passenger {
                id: p.id.map(|id| identities.passenger(id)).transpose()?,
                ..p.clone()
            }),
            RemoteMutation::DeletePassenger(id) => {
                RemoteMutation::DeletePassenger(identities.passenger(*id)?)
            }
            RemoteMutation::CreateBooking(b) => RemoteMutation::CreateBooking(Booking {
                passenger_id: identities.passenger(b.passenger_id)?,
                ..b.clone()
            }),
            RemoteMutation::UpdateBooking(b) => RemoteMutation::UpdateBooking(Booking {
                id: b.id.map(|id| identities.booking(id)).transpose()?,
                passenger_id: identities.passenger(b.passenger_id)?,
                ..b.clone()
            }),
            RemoteMutation::DeleteBooking(id) => {
                RemoteMutation::DeleteBooking(identities.booking(*id)?)
            }
        })
    }

    /// Sends the mutation. Creates return the identity the remote issued.
    async fn send<G: RemoteGateway + ?Sized>(&self, gateway: &G) -> RemoteResult<Option<i64>> {
        match self {
            RemoteMutation::CreatePassenger(p) => gateway
                .create_passenger(p)
                .await
                .map(|created| created.id.map(PassengerId::get)),
            RemoteMutation::UpdatePassenger(p) => gateway.update_passenger(p).await.map(|_| None),
            RemoteMutation::DeletePassenger(id) => {
                gateway.delete_passenger(*id).await.map(|()| None)
            }
            RemoteMutation::CreateBooking(b) => gateway
                .create_booking(b)
                .await
                .map(|created| created.id.map(BookingId::get)),
            RemoteMutation::UpdateBooking(b) => gateway.update_booking(b).await.map(|_| None),
            RemoteMutation::DeleteBooking(id) => gateway.delete_booking(*id).await.map(|()| None),
        }
    }
}

/// Outcome of a background remote write.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    /// The remote accepted the mutation.
    Applied,
    /// The remote write gave up; a [`SyncWarning`] was published.
    Failed(RemoteError),
    /// The write was cancelled before it finished.
    Cancelled,
}

impl RemoteOutcome {
    /// Returns true if the remote accepted the mutation.
    pub fn is_applied(&self) -> bool {
        matches!(self, RemoteOutcome::Applied)
    }
}

/// Cancellation and completion flags shared by a write and its handle.
#[derive(Debug, Default)]
struct WriteControl {
    cancelled: AtomicBool,
    finished: AtomicBool,
    wake: Notify,
}

/// Handle to a background remote write.
///
/// Dropping the handle leaves the write queued.
#[derive(Debug)]
pub struct RemoteWrite {
    result: oneshot::Receiver<RemoteResult<()>>,
    control: Arc<WriteControl>,
}

impl RemoteWrite {
    /// Waits for the remote write to finish.
    pub async fn outcome(self) -> RemoteOutcome {
        match self.result.await {
            Ok(Ok(())) => RemoteOutcome::Applied,
            Ok(Err(e)) => RemoteOutcome::Failed(e),
            Err(_) => RemoteOutcome::Cancelled,
        }
    }

    /// Cancels the remote write. The local change is kept.
    ///
    /// A queued write is dropped from its lane; a write in flight is
    /// abandoned. Later writes on the same lane still wait for any write
    /// ahead of this one.
    pub fn cancel(&self) {
        self.control.cancelled.store(true, Ordering::SeqCst);
        self.control.wake.notify_one();
    }

    /// Returns true once the lane has finished with this write.
    pub fn is_finished(&self) -> bool {
        self.control.finished.load(Ordering::SeqCst)
    }
}

/// Result of a local write.
#[derive(Debug)]
pub struct WriteReceipt<Id> {
    /// Identity of the written record.
    pub id: Id,
    /// The background remote write.
    pub remote: RemoteWrite,
}

/// A remote write waiting on its lane.
struct Job {
    record: RecordKey,
    mutation: RemoteMutation,
    control: Arc<WriteControl>,
    reply: oneshot::Sender<RemoteResult<()>>,
}

struct CoordinatorInner<S: RecordStore, G: RemoteGateway> {
    store: Arc<S>,
    gateway: Arc<G>,
    retry: RetryConfig,
    events: broadcast::Sender<SyncEvent>,
    identities: Arc<IdentityMap>,
    /// Queued writes per lane. A lane is present while its worker runs.
    lanes: Mutex<HashMap<RecordKey, VecDeque<Job>>>,
}

/// Removes a lane whose worker stopped without draining it.
struct LaneGuard<'a, S: RecordStore, G: RemoteGateway> {
    inner: &'a CoordinatorInner<S, G>,
    lane: RecordKey,
    armed: bool,
}

impl<S: RecordStore, G: RemoteGateway> Drop for LaneGuard<'_, S, G> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.lanes.lock().remove(&self.lane);
        }
    }
}

/// Applies writes locally and propagates them to the remote in the
/// background.
///
/// Write methods need a Tokio runtime for the background work. Called
/// outside one they fail with [`SyncError::NoRuntime`] before touching the
/// local store.
pub struct WriteCoordinator<S: RecordStore, G: RemoteGateway> {
    inner: Arc<CoordinatorInner<S, G>>,
}

impl<S: RecordStore, G: RemoteGateway> Clone for WriteCoordinator<S, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, G> WriteCoordinator<S, G>
where
    S: RecordStore + 'static,
    G: RemoteGateway + 'static,
{
    /// Creates a coordinator publishing to `events`.
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
            inner: Arc::new(CoordinatorInner {
                store,
                gateway,
                retry: config.retry.clone(),
                events,
                identities,
                lanes: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a passenger (no identity) or replaces one (identity set).
    ///
    /// An update of an unknown passenger fails with `NotFound` and makes
    /// no remote call.
    pub fn create_or_update(&self, passenger: Passenger) -> SyncResult<WriteReceipt<PassengerId>> {
        let runtime = current_runtime()?;
        let store = &self.inner.store;
        let (id, mutation) = match passenger.id {
            None => {
                let id = store.insert_passenger(&passenger)?;
                self.inner.identities.begin_create(RecordKey::Passenger(id));
                let created = Passenger {
                    id: Some(id),
                    ..passenger
                };
                (id, RemoteMutation::CreatePassenger(created))
            }
            Some(id) => {
                if store.update_passenger(&passenger)? == 0 {
                    return Err(not_found(RecordKind::Passenger, id.get()));
                }
                (id, RemoteMutation::UpdatePassenger(passenger))
            }
        };
        debug!(passenger = %id, op = %mutation.op(), "local passenger write");
        let key = RecordKey::Passenger(id);
        let remote = self.submit(&runtime, key, key, mutation);
        Ok(WriteReceipt { id, remote })
    }

    /// Deletes a passenger and its bookings.
    ///
    /// The remote delete is issued even when the passenger was not cached.
    pub fn delete(&self, id: PassengerId) -> SyncResult<WriteReceipt<PassengerId>> {
        let runtime = current_runtime()?;
        let deleted = self.inner.store.delete_passenger(id)?;
        debug!(passenger = %id, deleted, "local passenger delete");
        let key = RecordKey::Passenger(id);
        let remote = self.submit(&runtime, key, key, RemoteMutation::DeletePassenger(id));
        Ok(WriteReceipt { id, remote })
    }

    /// Creates a booking (no identity) or replaces one (identity set).
    ///
    /// The owning passenger must exist locally. Booking writes share the
    /// lane of their passenger, so they reach the remote after it.
    pub fn create_or_update_booking(&self, booking: Booking) -> SyncResult<WriteReceipt<BookingId>> {
        let runtime = current_runtime()?;
        let store = &self.inner.store;
        let lane = RecordKey::Passenger(booking.passenger_id);
        let (id, mutation) = match booking.id {
            None => {
                let id = store.insert_booking(&booking)?;
                self.inner.identities.begin_create(RecordKey::Booking(id));
                let created = Booking {
                    id: Some(id),
                    ..booking
                };
                (id, RemoteMutation::CreateBooking(created))
            }
            Some(id) => {
                if store.update_booking(&booking)? == 0 {
                    return Err(not_found(RecordKind::Booking, id.get()));
                }
                (id, RemoteMutation::UpdateBooking(booking))
            }
        };
        debug!(booking = %id, op = %mutation.op(), "local booking write");
        let remote = self.submit(&runtime, lane, RecordKey::Booking(id), mutation);
        Ok(WriteReceipt { id, remote })
    }

    /// Deletes a booking.
    pub fn delete_booking(&self, id: BookingId) -> SyncResult<WriteReceipt<BookingId>> {
        let runtime = current_runtime()?;
        let store = &self.inner.store;
        let lane = match store.get_booking(id) {
            Ok(booking) => RecordKey::Passenger(booking.passenger_id),
            Err(StoreError::NotFound { .. }) => RecordKey::Booking(id),
            Err(e) => return Err(e.into()),
        };
        let deleted = store.delete_booking(id)?;
        debug!(booking = %id, deleted, "local booking delete");
        let remote = self.submit(
            &runtime,
            lane,
            RecordKey::Booking(id),
            RemoteMutation::DeleteBooking(id),
        );
        Ok(WriteReceipt { id, remote })
    }

    /// Returns the number of lanes with remote writes queued or in flight.
    pub fn pending_records(&self) -> usize {
        self.inner.lanes.lock().len()
    }

    /// Queues `mutation` behind earlier writes on `lane`, starting a worker
    /// if the lane is idle.
    fn submit(
        &self,
        runtime: &Handle,
        lane: RecordKey,
        record: RecordKey,
        mutation: RemoteMutation,
    ) -> RemoteWrite {
        let (reply, result) = oneshot::channel();
        let control = Arc::new(WriteControl::default());
        let job = Job {
            record,
            mutation,
            control: Arc::clone(&control),
            reply,
        };

        let idle = {
            let mut lanes = self.inner.lanes.lock();
            match lanes.get_mut(&lane) {
                Some(queue) => {
                    queue.push_back(job);
                    false
                }
                None => {
                    lanes.insert(lane, VecDeque::from([job]));
                    true
                }
            }
        };
        if idle {
            let inner = Arc::clone(&self.inner);
            runtime.spawn(async move { inner.drain(lane).await });
        }
        RemoteWrite { result, control }
    }
}

impl<S: RecordStore, G: RemoteGateway> CoordinatorInner<S, G> {
    /// Runs the writes of `lane` one at a time until the queue is empty.
    async fn drain(&self, lane: RecordKey) {
        let mut guard = LaneGuard {
            inner: self,
            lane,
            armed: true,
        };
        loop {
            let job = {
                let mut lanes = self.lanes.lock();
                match lanes.get_mut(&lane).and_then(VecDeque::pop_front) {
                    Some(job) => job,
                    None => {
                        lanes.remove(&lane);
                        guard.armed = false;
                        return;
                    }
                }
            };
            self.run(job).await;
        }
    }

    async fn run(&self, job: Job) {
        let Job {
            record,
            mutation,
            control,
            reply,
        } = job;
        let op = mutation.op();

        let result = if control.cancelled.load(Ordering::SeqCst) {
            None
        } else {
            tokio::select! {
                result = self.send_with_retry(record, &mutation) => Some(result),
                _ = control.wake.notified() => None,
            }
        };

        if !matches!(result, Some(Ok(()))) && op == WriteOp::Create {
            self.identities.abandon(record);
        }
        control.finished.store(true, Ordering::SeqCst);
        match result {
            Some(result) => {
                let _ = reply.send(result);
            }
            None => debug!(record = %record, %op, "remote write cancelled"),
        }
    }

    async fn send_with_retry(&self, record: RecordKey, mutation: &RemoteMutation) -> RemoteResult<()> {
        let op = mutation.op();
        let mutation = match mutation.to_remote(&self.identities) {
            Ok(mutation) => mutation,
            Err(e) => {
                self.warn(record, op, e.clone(), 0);
                return Err(e);
            }
        };

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            }
            attempt += 1;

            match mutation.send(self.gateway.as_ref()).await {
                Ok(issued) => {
                    match (op, issued) {
                        (WriteOp::Create, Some(remote)) => self.identities.confirm(record, remote),
                        (WriteOp::Create, None) | (WriteOp::Delete, _) => {
                            self.identities.forget(record)
                        }
                        (WriteOp::Update, _) => {}
                    }
                    debug!(record = %record, %op, attempt, "remote write applied");
                    emit(&self.events, SyncEvent::RemoteApplied { record, op });
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    debug!(record = %record, %op, attempt, error = %e, "remote write failed, retrying");
                }
                Err(e) => {
                    self.warn(record, op, e.clone(), attempt);
                    return Err(e);
                }
            }
        }
    }

    fn warn(&self, record: RecordKey, op: WriteOp, error: RemoteError, attempts: u32) {
        let warning = SyncWarning {
            record,
            op,
            error,
            attempts,
        };
        warn!("{warning}");
        emit(&self.events, SyncEvent::Warning(warning));
    }
}

fn current_runtime() -> SyncResult<Handle> {
    Handle::try_current().map_err(|_| SyncError::NoRuntime)
}

fn not_found(kind: RecordKind, id: i64) -> SyncError {
    SyncError::Storage(StoreError::NotFound { kind, id })
}
