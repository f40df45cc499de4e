//! In-memory gateway for tests.

use crate::error::{RemoteError, RemoteResult};
use crate::gateway::RemoteGateway;
use crate::protocol::Listing;
use aircache_store::{Booking, BookingId, Passenger, PassengerId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// A call received by a [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `list_passengers`
    ListPassengers,
    /// `get_passenger`
    GetPassenger(PassengerId),
    /// `create_passenger`, with the passenger's name.
    CreatePassenger(String),
    /// `update_passenger`
    UpdatePassenger(PassengerId),
    /// `delete_passenger`
    DeletePassenger(PassengerId),
    /// `list_bookings`
    ListBookings(PassengerId),
    /// `get_booking`
    GetBooking(BookingId),
    /// `create_booking`, with the flight number.
    CreateBooking(String),
    /// `update_booking`
    UpdateBooking(BookingId),
    /// `delete_booking`
    DeleteBooking(BookingId),
}

#[derive(Default)]
struct MockState {
    passengers: BTreeMap<PassengerId, Passenger>,
    bookings: BTreeMap<BookingId, Booking>,
    last_passenger_id: i64,
    last_booking_id: i64,
    calls: Vec<GatewayCall>,
    failure: Option<RemoteError>,
    fail_next: VecDeque<RemoteError>,
    delays: VecDeque<Duration>,
    data_missing: bool,
}

/// A remote gateway holding its records in memory.
///
/// Behaves like a well-formed remote store and can be told to fail,
/// to answer slowly, or to omit the `data` field from list responses.
/// Calls are logged in completion order.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
    latency: Duration,
}

impl MockGateway {
    /// Creates an empty mock gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Stores a passenger as if it had been created remotely.
    ///
    /// Records without an identity are assigned the next free one.
    pub fn seed_passenger(&self, passenger: Passenger) -> PassengerId {
        let mut state = self.state.lock();
        let id = match passenger.id {
            Some(id) => id,
            None => PassengerId(state.last_passenger_id + 1),
        };
        state.last_passenger_id = state.last_passenger_id.max(id.get());
        state.passengers.insert(
            id,
            Passenger {
                id: Some(id),
                ..passenger
            },
        );
        id
    }

    /// Stores a booking as if it had been created remotely.
    pub fn seed_booking(&self, booking: Booking) -> BookingId {
        let mut state = self.state.lock();
        let id = match booking.id {
            Some(id) => id,
            None => BookingId(state.last_booking_id + 1),
        };
        state.last_booking_id = state.last_booking_id.max(id.get());
        state.bookings.insert(
            id,
            Booking {
                id: Some(id),
                ..booking
            },
        );
        id
    }

    /// Removes a passenger and its bookings without logging a call.
    pub fn remove_passenger(&self, id: PassengerId) {
        let mut state = self.state.lock();
        state.passengers.remove(&id);
        state.bookings.retain(|_, b| b.passenger_id != id);
    }

    /// Returns the stored passengers, ordered by identity.
    pub fn passengers(&self) -> Vec<Passenger> {
        self.state.lock().passengers.values().cloned().collect()
    }

    /// Returns one stored passenger.
    pub fn passenger(&self, id: PassengerId) -> Option<Passenger> {
        self.state.lock().passengers.get(&id).cloned()
    }

    /// Returns the stored bookings, ordered by identity.
    pub fn bookings(&self) -> Vec<Booking> {
        self.state.lock().bookings.values().cloned().collect()
    }

    /// Makes every call fail with `error` until [`MockGateway::recover`].
    pub fn fail_with(&self, error: RemoteError) {
        self.state.lock().failure = Some(error);
    }

    /// Makes only the next call fail with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        self.state.lock().fail_next.push_back(error);
    }

    /// Clears a sticky failure set by [`MockGateway::fail_with`].
    pub fn recover(&self) {
        self.state.lock().failure = None;
    }

    /// Delays only the next call by `delay` instead of the base latency.
    pub fn delay_next(&self, delay: Duration) {
        self.state.lock().delays.push_back(delay);
    }

    /// Makes passenger listings omit their `data` field.
    pub fn set_data_missing(&self, missing: bool) {
        self.state.lock().data_missing = missing;
    }

    /// Returns the calls received so far.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    /// Returns how many calls were received.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Waits out the call's latency, logs it and applies injected failures.
    async fn enter(&self, call: GatewayCall) -> RemoteResult<()> {
        let delay = self.state.lock().delays.pop_front().unwrap_or(self.latency);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.calls.push(call);
        if let Some(error) = state.fail_next.pop_front() {
            return Err(error);
        }
        match &state.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::server(404, format!("{what} not found"))
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn list_passengers(&self) -> RemoteResult<Listing<Passenger>> {
        self.enter(GatewayCall::ListPassengers).await?;
        let state = self.state.lock();
        if state.data_missing {
            return Ok(Listing::missing_data());
        }
        // Newest first, like the remote service.
        Ok(Listing::new(
            state.passengers.values().rev().cloned().collect(),
        ))
    }

    async fn get_passenger(&self, id: PassengerId) -> RemoteResult<Passenger> {
        self.enter(GatewayCall::GetPassenger(id)).await?;
        self.passenger(id).ok_or_else(|| not_found("Passenger"))
    }

    async fn create_passenger(&self, passenger: &Passenger) -> RemoteResult<Passenger> {
        self.enter(GatewayCall::CreatePassenger(passenger.full_name.clone()))
            .await?;
        let mut state = self.state.lock();
        state.last_passenger_id += 1;
        let id = PassengerId(state.last_passenger_id);
        let created = Passenger {
            id: Some(id),
            ..passenger.clone()
        };
        state.passengers.insert(id, created.clone());
        Ok(created)
    }

    async fn update_passenger(&self, passenger: &Passenger) -> RemoteResult<Passenger> {
        let id = passenger
            .id
            .ok_or_else(|| RemoteError::InvalidRequest("passenger has no identity".into()))?;
        self.enter(GatewayCall::UpdatePassenger(id)).await?;
        let mut state = self.state.lock();
        match state.passengers.get_mut(&id) {
            Some(stored) => {
                *stored = passenger.clone();
                Ok(passenger.clone())
            }
            None => Err(not_found("Passenger")),
        }
    }

    async fn delete_passenger(&self, id: PassengerId) -> RemoteResult<()> {
        self.enter(GatewayCall::DeletePassenger(id)).await?;
        let mut state = self.state.lock();
        state.passengers.remove(&id);
        state.bookings.retain(|_, b| b.passenger_id != id);
        Ok(())
    }

    async fn list_bookings(&self, passenger_id: PassengerId) -> RemoteResult<Listing<Booking>> {
        self.enter(GatewayCall::ListBookings(passenger_id)).await?;
        let state = self.state.lock();
        let mut items: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.passenger_id == passenger_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.booking_date.cmp(&a.booking_date).then(b.id.cmp(&a.id)));
        Ok(Listing::new(items))
    }

    async fn get_booking(&self, id: BookingId) -> RemoteResult<Booking> {
        self.enter(GatewayCall::GetBooking(id)).await?;
        self.state
            .lock()
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Booking"))
    }

    async fn create_booking(&self, booking: &Booking) -> RemoteResult<Booking> {
        self.enter(GatewayCall::CreateBooking(booking.flight_number.clone()))
            .await?;
        let mut state = self.state.lock();
        if !state.passengers.contains_key(&booking.passenger_id) {
            return Err(not_found("Passenger"));
        }
        state.last_booking_id += 1;
        let id = BookingId(state.last_booking_id);
        let created = Booking {
            id: Some(id),
            ..booking.clone()
        };
        state.bookings.insert(id, created.clone());
        Ok(created)
    }

    async fn update_booking(&self, booking: &Booking) -> RemoteResult<Booking> {
        let id = booking
            .id
            .ok_or_else(|| RemoteError::InvalidRequest("booking has no identity".into()))?;
        self.enter(GatewayCall::UpdateBooking(id)).await?;
        let mut state = self.state.lock();
        match state.bookings.get_mut(&id) {
            Some(stored) => {
                *stored = booking.clone();
                Ok(booking.clone())
            }
            None => Err(not_found("Booking")),
        }
    }

    async fn delete_booking(&self, id: BookingId) -> RemoteResult<()> {
        self.enter(GatewayCall::DeleteBooking(id)).await?;
        self.state.lock().bookings.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Passenger {
        Passenger::new("Ada", "ada@example.com", "555")
    }

    #[tokio::test]
    async fn create_issues_identities() {
        let gateway = MockGateway::new();
        gateway.seed_passenger(ada().with_id(PassengerId(10)));

        let created = gateway.create_passenger(&ada()).await.unwrap();
        assert_eq!(created.id, Some(PassengerId(11)));

        let listing = gateway.list_passengers().await.unwrap();
        assert_eq!(listing.items[0].id, Some(PassengerId(11)));
        assert_eq!(listing.count, Some(2));
    }

    #[tokio::test]
    async fn fail_next_is_one_shot() {
        let gateway = MockGateway::new();
        gateway.fail_next(RemoteError::NetworkUnreachable("down".into()));

        assert!(gateway.list_passengers().await.is_err());
        assert!(gateway.list_passengers().await.is_ok());
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn sticky_failure_until_recover() {
        let gateway = MockGateway::new();
        gateway.fail_with(RemoteError::server(503, "maintenance"));
        assert!(gateway.get_passenger(PassengerId(1)).await.is_err());
        assert!(gateway.delete_passenger(PassengerId(1)).await.is_err());

        gateway.recover();
        gateway.delete_passenger(PassengerId(1)).await.unwrap();
    }

    #[tokio::test]
    async fn missing_data_listing() {
        let gateway = MockGateway::new();
        gateway.seed_passenger(ada());
        gateway.set_data_missing(true);

        let listing = gateway.list_passengers().await.unwrap();
        assert!(listing.data_missing);
        assert!(listing.items.is_empty());
    }

    #[tokio::test]
    async fn update_missing_is_not_found_delete_missing_is_ok() {
        let gateway = MockGateway::new();
        let result = gateway
            .update_passenger(&ada().with_id(PassengerId(4)))
            .await;
        assert_eq!(result.unwrap_err().status(), Some(404));
        gateway.delete_booking(BookingId(4)).await.unwrap();
    }

    #[tokio::test]
    async fn delete_passenger_drops_bookings() {
        let gateway = MockGateway::new();
        let pid = gateway.seed_passenger(ada());
        gateway.seed_booking(Booking::new(pid, "MA1", "2025-01-01"));

        gateway.delete_passenger(pid).await.unwrap();
        assert!(gateway.bookings().is_empty());
        assert_eq!(gateway.calls(), vec![GatewayCall::DeletePassenger(pid)]);
    }
}
