//! # AirCache Sync
//!
//! Offline-first write coordination and reconciliation for AirCache.
//!
//! This crate provides:
//! - [`WriteCoordinator`]: local write first, remote write in the background
//! - [`Reconciler`]: full-snapshot, server-wins refresh of the local store
//! - [`CacheClient`]: the facade assembling both over one event channel
//! - Retry with exponential backoff for background writes
//!
//! ## Architecture
//!
//! The local [`RecordStore`](aircache_store::RecordStore) answers every read
//! and accepts every write immediately. The remote store is authoritative:
//! 1. Writes are applied locally and returned to the caller
//! 2. The matching remote mutation is queued on a per-passenger lane
//! 3. A failed remote mutation becomes a [`SyncWarning`] event
//! 4. The next reconciliation makes the local store equal the remote
//!
//! ## Key Invariants
//!
//! - Server wins: after a pass, local passengers equal the remote snapshot
//! - A pass is idempotent; a second pass reports no changes
//! - At most one pass is in flight
//! - Remote writes for the same record reach the remote in submission order
//! - A local failure is returned to the caller and never sent remotely
//!
//! ## Example
//!
//! ```rust,ignore
//! use aircache_remote::{HttpGateway, RemoteConfig, ReqwestClient};
//! use aircache_store::{Passenger, SqliteStore};
//! use aircache_sync::{CacheClient, SyncConfig};
//! use std::sync::Arc;
//!
//! let config = RemoteConfig::new("http://10.0.2.2:3000");
//! let client = ReqwestClient::new(config.timeout)?;
//! let cache = CacheClient::new(
//!     Arc::new(SqliteStore::open("aircache.db")?),
//!     Arc::new(HttpGateway::new(config, client)),
//!     SyncConfig::default(),
//! );
//!
//! let receipt = cache
//!     .coordinator()
//!     .create_or_update(Passenger::new("Ada", "ada@example.com", "555"))?;
//! let report = cache.reconcile().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod coordinator;
mod error;
mod events;
mod identity;
mod reconciler;

pub use client::CacheClient;
pub use config::{RetryConfig, SyncConfig};
pub use coordinator::{RemoteOutcome, RemoteWrite, WriteCoordinator, WriteReceipt};
pub use error::{SyncError, SyncResult};
pub use events::{RecordKey, SyncEvent, SyncWarning, WriteOp};
pub use reconciler::{ReconcileIssue, ReconcileReport, ReconcileState, ReconcileStats, Reconciler};
