//! Events broadcast by the sync layer.

use aircache_remote::RemoteError;
use aircache_store::{BookingId, PassengerId};
use std::fmt;
use tokio::sync::broadcast;

/// Identity of a record, across both kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// A passenger.
    Passenger(PassengerId),
    /// A booking.
    Booking(BookingId),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Passenger(id) => write!(f, "passenger {id}"),
            RecordKey::Booking(id) => write!(f, "booking {id}"),
        }
    }
}

/// Kind of remote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// Record created.
    Create,
    /// Record replaced.
    Update,
    /// Record removed.
    Delete,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteOp::Create => "create",
            WriteOp::Update => "update",
            WriteOp::Delete => "delete",
        })
    }
}

/// A background remote write that gave up.
///
/// The local store already holds the change; the next reconciliation
/// decides what survives.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncWarning {
    /// Record whose remote write failed.
    pub record: RecordKey,
    /// The mutation that failed.
    pub op: WriteOp,
    /// The last error received.
    pub error: RemoteError,
    /// Attempts made, the first one included.
    pub attempts: u32,
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "remote {} of {} failed after {} attempt(s): {}",
            self.op, self.record, self.attempts, self.error
        )
    }
}

/// Event published on the sync channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A background remote write failed for good.
    Warning(SyncWarning),
    /// A background remote write was accepted.
    RemoteApplied {
        /// Record written.
        record: RecordKey,
        /// The mutation applied.
        op: WriteOp,
    },
    /// A reconciliation pass completed.
    Reconciled {
        /// Records inserted or overwritten.
        upserted: usize,
        /// Records deleted.
        deleted: usize,
    },
}

/// Publishes an event; having no subscribers is not an error.
pub(crate) fn emit(events: &broadcast::Sender<SyncEvent>, event: SyncEvent) {
    let _ = events.send(event);
}
