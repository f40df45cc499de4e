//! Local to remote identity mapping.
//!
//! The local store allocates identities for records created offline. The
//! remote issues its own when the create reaches it, and the two may differ.
//! Later remote writes for such a record must address the remote identity.

use crate::events::RecordKey;
use aircache_remote::{RemoteError, RemoteResult};
use aircache_store::{BookingId, PassengerId};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteIdentity {
    /// The remote create has been queued but not acknowledged.
    Pending,
    /// The remote acknowledged the create under this identity.
    Known(i64),
    /// The remote create failed or was cancelled.
    Unsynced,
}

/// Remote identities of records created locally.
///
/// Records absent from the map have the same identity on both sides,
/// which holds for everything the reconciler wrote.
#[derive(Debug, Default)]
pub(crate) struct IdentityMap {
    entries: Mutex<HashMap<RecordKey, RemoteIdentity>>,
}

impl IdentityMap {
    /// Marks a local create whose remote create is queued.
    pub(crate) fn begin_create(&self, key: RecordKey) {
        self.entries.lock().insert(key, RemoteIdentity::Pending);
    }

    /// Records the identity the remote issued for a queued create.
    ///
    /// Ignored if the entry was forgotten in the meantime.
    pub(crate) fn confirm(&self, key: RecordKey, remote: i64) {
        if let Some(entry) = self.entries.lock().get_mut(&key) {
            if *entry == RemoteIdentity::Pending {
                *entry = RemoteIdentity::Known(remote);
            }
        }
    }

    /// Marks a queued create as never having reached the remote.
    pub(crate) fn abandon(&self, key: RecordKey) {
        if let Some(entry) = self.entries.lock().get_mut(&key) {
            if *entry == RemoteIdentity::Pending {
                *entry = RemoteIdentity::Unsynced;
            }
        }
    }

    /// Drops the mapping for `key`; both sides use the local identity again.
    pub(crate) fn forget(&self, key: RecordKey) {
        self.entries.lock().remove(&key);
    }

    /// Resolves the remote identity of a passenger.
    pub(crate) fn passenger(&self, id: PassengerId) -> RemoteResult<PassengerId> {
        self.resolve(RecordKey::Passenger(id), id.get()).map(PassengerId)
    }

    /// Resolves the remote identity of a booking.
    pub(crate) fn booking(&self, id: BookingId) -> RemoteResult<BookingId> {
        self.resolve(RecordKey::Booking(id), id.get()).map(BookingId)
    }

    fn resolve(&self, key: RecordKey, local: i64) -> RemoteResult<i64> {
        match self.entries.lock().get(&key) {
            None => Ok(local),
            Some(RemoteIdentity::Known(remote)) => Ok(*remote),
            Some(RemoteIdentity::Pending | RemoteIdentity::Unsynced) => Err(
                RemoteError::InvalidRequest(format!("{key} was never created remotely")),
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
