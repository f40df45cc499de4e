//! Record store trait definition.

use crate::error::StoreResult;
use crate::model::{Booking, BookingId, Passenger, PassengerId};

/// Durable local storage for passengers and their bookings.
///
/// # Invariants
///
/// - Every method is synchronous and durable before it returns
/// - A write either fully commits or fails with a [`crate::StoreError`]
/// - Identities are unique per record kind and never change
/// - Deleting a passenger deletes all of its bookings
/// - A booking can only reference an existing passenger
///
/// # Implementors
///
/// - [`super::SqliteStore`] - SQLite file or in-memory database
pub trait RecordStore: Send + Sync {
    /// Inserts a passenger under a newly allocated identity.
    ///
    /// Any identity already set on `passenger` is ignored.
    fn insert_passenger(&self, passenger: &Passenger) -> StoreResult<PassengerId>;

    /// Inserts a passenger under the identity it carries.
    ///
    /// Used when the identity was issued by the remote store.
    ///
    /// # Errors
    ///
    /// Returns `MissingId` when `passenger.id` is `None` and `Conflict` when
    /// the identity is already taken.
    fn insert_passenger_with_id(&self, passenger: &Passenger) -> StoreResult<()>;

    /// Reads one passenger.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no passenger has this identity.
    fn get_passenger(&self, id: PassengerId) -> StoreResult<Passenger>;

    /// Lists all passengers, most recently created first.
    fn list_passengers(&self) -> StoreResult<Vec<Passenger>>;

    /// Overwrites every field of an existing passenger.
    ///
    /// Returns the number of rows affected (0 when absent).
    fn update_passenger(&self, passenger: &Passenger) -> StoreResult<usize>;

    /// Deletes a passenger and, by cascade, its bookings.
    ///
    /// Returns the number of passengers deleted.
    fn delete_passenger(&self, id: PassengerId) -> StoreResult<usize>;

    /// Returns true if a passenger with this identity exists.
    fn contains_passenger(&self, id: PassengerId) -> StoreResult<bool>;

    /// Counts stored passengers.
    fn count_passengers(&self) -> StoreResult<usize>;

    /// Inserts a booking under a newly allocated identity.
    ///
    /// # Errors
    ///
    /// Returns `ReferentialViolation` when the owning passenger is missing.
    fn insert_booking(&self, booking: &Booking) -> StoreResult<BookingId>;

    /// Reads one booking.
    fn get_booking(&self, id: BookingId) -> StoreResult<Booking>;

    /// Lists the bookings of one passenger, latest booking date first.
    fn list_bookings(&self, passenger_id: PassengerId) -> StoreResult<Vec<Booking>>;

    /// Overwrites every field of an existing booking.
    ///
    /// Returns the number of rows affected (0 when absent).
    fn update_booking(&self, booking: &Booking) -> StoreResult<usize>;

    /// Deletes a booking. Returns the number of rows deleted.
    fn delete_booking(&self, id: BookingId) -> StoreResult<usize>;

    /// Counts the bookings of one passenger.
    fn count_bookings(&self, passenger_id: PassengerId) -> StoreResult<usize>;
}
