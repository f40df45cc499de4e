//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use aircache_store::SqliteStore;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name of the store inside a file-backed fixture.
const STORE_FILE: &str = "aircache.db";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: SqliteStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: SqliteStore::open_in_memory().expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SqliteStore::open(temp_dir.path().join(STORE_FILE))
            .expect("Failed to open file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store path if file-backed, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join(STORE_FILE))
    }

    /// Closes the store and opens the same file again.
    ///
    /// # Panics
    ///
    /// Panics for in-memory fixtures.
    pub fn reopen(self) -> Self {
        let temp_dir = self
            .temp_dir
            .expect("Only file-backed stores can be reopened");
        drop(self.store);
        let store = SqliteStore::open(temp_dir.path().join(STORE_FILE))
            .expect("Failed to reopen file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = SqliteStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use aircache_store::{Passenger, RecordStore};
/// use aircache_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     store.insert_passenger(&Passenger::new("Ada", "ada@example.com", "1")).unwrap();
///     assert_eq!(store.count_passengers().unwrap(), 1);
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&SqliteStore) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary file-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&SqliteStore, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    f(&test_store.store, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use aircache_store::{Booking, BookingStatus, MembershipLevel, Passenger, PassengerId, RecordStore};

    /// Returns a passenger named after `n`, with a unique email.
    pub fn sample_passenger(n: usize) -> Passenger {
        let level = MembershipLevel::ALL[n % MembershipLevel::ALL.len()];
        Passenger::new(
            format!("Passenger {n}"),
            format!("passenger{n}@example.com"),
            format!("555-{n:04}"),
        )
        .with_membership(level)
        .with_date_of_birth(format!("19{:02}-01-15", 50 + n % 50))
    }

    /// Returns a booking for `passenger_id` on flight `MA{n}`.
    pub fn sample_booking(passenger_id: PassengerId, n: usize) -> Booking {
        Booking::new(
            passenger_id,
            format!("MA{}", 100 + n),
            format!("2025-{:02}-{:02}", 1 + n % 12, 1 + n % 28),
        )
        .with_seat(format!("{}{}", 1 + n % 30, ['A', 'B', 'C', 'D'][n % 4]))
        .with_status(BookingStatus::Confirmed)
    }

    /// Creates a store with `passenger_count` passengers, each holding
    /// `bookings_each` bookings.
    pub fn populated_store(passenger_count: usize, bookings_each: usize) -> TestStore {
        let test_store = TestStore::memory();
        for n in 0..passenger_count {
            let pid = test_store
                .insert_passenger(&sample_passenger(n))
                .expect("Failed to insert passenger");
            for b in 0..bookings_each {
                test_store
                    .insert_booking(&sample_booking(pid, n * bookings_each + b))
                    .expect("Failed to insert booking");
            }
        }
        test_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aircache_store::RecordStore;

    #[test]
    fn memory_store_works() {
        let test_store = TestStore::memory();
        assert_eq!(test_store.count_passengers().unwrap(), 0);
        assert!(test_store.path().is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let test_store = TestStore::file();
        test_store
            .insert_passenger(&scenarios::sample_passenger(1))
            .unwrap();

        let test_store = test_store.reopen();
        assert_eq!(test_store.count_passengers().unwrap(), 1);
    }

    #[test]
    fn populated_store_counts() {
        let test_store = scenarios::populated_store(3, 2);
        assert_eq!(test_store.count_passengers().unwrap(), 3);
        for passenger in test_store.list_passengers().unwrap() {
            let id = passenger.id.unwrap();
            assert_eq!(test_store.count_bookings(id).unwrap(), 2);
        }
    }
}
