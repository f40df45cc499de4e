//! # AirCache Store
//!
//! Durable local record store for the AirCache offline-first cache.
//!
//! The store holds two record kinds keyed by integer identity:
//! [`Passenger`] and the [`Booking`]s that belong to a passenger.
//! It is the source of truth for immediate reads and writes; the sync
//! layer keeps it aligned with the remote service.
//!
//! ## Design Principles
//!
//! - Every operation is synchronous and durable before it returns
//! - No operation partially applies
//! - Deleting a passenger cascades to its bookings
//! - A booking can never reference a passenger that does not exist
//!
//! ## Example
//!
//! ```rust
//! use aircache_store::{Booking, Passenger, RecordStore, SqliteStore};
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let pid = store.insert_passenger(&Passenger::new("Ada", "ada@example.com", "555")).unwrap();
//! store.insert_booking(&Booking::new(pid, "MA101", "2025-06-01")).unwrap();
//!
//! store.delete_passenger(pid).unwrap();
//! assert!(store.list_bookings(pid).unwrap().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod model;
mod schema;
mod sqlite;
mod store;

pub use error::{RecordKind, StoreError, StoreResult};
pub use model::{
    Booking, BookingId, BookingStatus, MembershipLevel, ParseEnumError, Passenger, PassengerId,
    ProfileImage,
};
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStore;
pub use store::RecordStore;
