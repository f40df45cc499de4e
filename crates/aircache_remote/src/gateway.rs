//! Remote gateway abstraction.

use crate::error::RemoteResult;
use crate::protocol::Listing;
use aircache_store::{Booking, BookingId, Passenger, PassengerId};
use async_trait::async_trait;

/// A remote gateway performs CRUD calls against the authoritative store.
///
/// Gateways are stateless and never retry; retry policy belongs to the
/// caller. Implementations are explicitly constructed and injected.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetches the full passenger snapshot.
    async fn list_passengers(&self) -> RemoteResult<Listing<Passenger>>;

    /// Fetches one passenger.
    async fn get_passenger(&self, id: PassengerId) -> RemoteResult<Passenger>;

    /// Creates a passenger; the remote issues the identity.
    async fn create_passenger(&self, passenger: &Passenger) -> RemoteResult<Passenger>;

    /// Replaces a passenger.
    async fn update_passenger(&self, passenger: &Passenger) -> RemoteResult<Passenger>;

    /// Deletes a passenger. Deleting an absent passenger succeeds.
    async fn delete_passenger(&self, id: PassengerId) -> RemoteResult<()>;

    /// Fetches the bookings of one passenger.
    async fn list_bookings(&self, passenger_id: PassengerId) -> RemoteResult<Listing<Booking>>;

    /// Fetches one booking.
    async fn get_booking(&self, id: BookingId) -> RemoteResult<Booking>;

    /// Creates a booking; the remote issues the identity.
    async fn create_booking(&self, booking: &Booking) -> RemoteResult<Booking>;

    /// Replaces a booking.
    async fn update_booking(&self, booking: &Booking) -> RemoteResult<Booking>;

    /// Deletes a booking. Deleting an absent booking succeeds.
    async fn delete_booking(&self, id: BookingId) -> RemoteResult<()>;
}
