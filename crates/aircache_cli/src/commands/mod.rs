//! CLI command implementations.

pub mod bookings;
pub mod passengers;
pub mod reconcile;

use aircache_remote::{HttpGateway, RemoteConfig, ReqwestClient};
use aircache_store::SqliteStore;
use aircache_sync::{CacheClient, RemoteOutcome, RemoteWrite, SyncConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The cache as wired by the CLI.
pub type Cache = CacheClient<SqliteStore, HttpGateway<ReqwestClient>>;

/// Opened cache shared by all commands.
pub struct Context {
    pub cache: Cache,
}

impl Context {
    /// Opens the local database and points the gateway at `server`.
    pub fn open(
        db: &Path,
        server: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let store = SqliteStore::open(db)?;
        let config = RemoteConfig::new(server).with_timeout(timeout);
        let client = ReqwestClient::new(timeout)?;
        tracing::debug!(db = %db.display(), server, "opened cache");

        let cache = CacheClient::new(
            Arc::new(store),
            Arc::new(HttpGateway::new(config, client)),
            SyncConfig::default(),
        );
        Ok(Self { cache })
    }
}

/// Waits for a background remote write and reports how it ended.
///
/// The local change stands either way; a failure only means the remote
/// has not seen it yet.
pub async fn report_remote(remote: RemoteWrite) {
    match remote.outcome().await {
        RemoteOutcome::Applied => println!("Remote: applied"),
        RemoteOutcome::Failed(e) => {
            println!("Remote: not applied ({e}); kept locally until the next reconcile")
        }
        RemoteOutcome::Cancelled => println!("Remote: cancelled"),
    }
}
