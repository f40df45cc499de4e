//! The cache facade handed to application code.

use crate::config::SyncConfig;
use crate::coordinator::WriteCoordinator;
use crate::error::SyncResult;
use crate::events::SyncEvent;
use crate::identity::IdentityMap;
use crate::reconciler::{ReconcileReport, Reconciler};
use aircache_remote::RemoteGateway;
use aircache_store::{Booking, BookingId, Passenger, PassengerId, RecordStore};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Offline-first cache over an injected store and gateway.
///
/// Reads are served from the local store only. Writes go through the
/// [`WriteCoordinator`], refreshes through the [`Reconciler`]. Both publish
/// on one event channel.
pub struct CacheClient<S: RecordStore, G: RemoteGateway> {
    store: Arc<S>,
    config: SyncConfig,
    coordinator: WriteCoordinator<S, G>,
    reconciler: Reconciler<S, G>,
    events: broadcast::Sender<SyncEvent>,
}

impl<S, G> CacheClient<S, G>
where
    S: RecordStore + 'static,
    G: RemoteGateway + 'static,
{
    /// Assembles a cache from its parts.
    pub fn new(store: Arc<S>, gateway: Arc<G>, config: SyncConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let identities = Arc::new(IdentityMap::default());
        let coordinator = WriteCoordinator::from_parts(
            Arc::clone(&store),
            Arc::clone(&gateway),
            &config,
            events.clone(),
            Arc::clone(&identities),
        );
        let reconciler = Reconciler::from_parts(
            Arc::clone(&store),
            gateway,
            &config,
            events.clone(),
            identities,
        );
        Self {
            store,
            config,
            coordinator,
            reconciler,
            events,
        }
    }

    /// Lists cached passengers, newest first.
    pub fn list_passengers(&self) -> SyncResult<Vec<Passenger>> {
        Ok(self.store.list_passengers()?)
    }

    /// Gets one cached passenger.
    pub fn get_passenger(&self, id: PassengerId) -> SyncResult<Passenger> {
        Ok(self.store.get_passenger(id)?)
    }

    /// Lists the cached bookings of a passenger, latest date first.
    pub fn list_bookings(&self, passenger_id: PassengerId) -> SyncResult<Vec<Booking>> {
        Ok(self.store.list_bookings(passenger_id)?)
    }

    /// Gets one cached booking.
    pub fn get_booking(&self, id: BookingId) -> SyncResult<Booking> {
        Ok(self.store.get_booking(id)?)
    }

    /// Runs one reconciliation pass.
    pub async fn reconcile(&self) -> SyncResult<ReconcileReport> {
        self.reconciler.reconcile().await
    }

    /// Starts periodic reconciliation if an interval is configured.
    pub fn start_periodic_reconcile(&self) -> Option<JoinHandle<()>> {
        self.config
            .reconcile_interval
            .map(|interval| self.reconciler.spawn_periodic(interval))
    }

    /// Returns the write coordinator.
    pub fn coordinator(&self) -> &WriteCoordinator<S, G> {
        &self.coordinator
    }

    /// Returns the reconciler.
    pub fn reconciler(&self) -> &Reconciler<S, G> {
        &self.reconciler
    }

    /// Returns the local store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Subscribes to sync events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }
}
