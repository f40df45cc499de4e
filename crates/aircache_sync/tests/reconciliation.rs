//! Reconciliation over HTTP against the fake service.

use aircache_remote::{
    HttpGateway, HttpRequest, HttpResponse, LoopbackClient, LoopbackServer, RemoteConfig,
    RemoteError,
};
use aircache_store::{Booking, Passenger, PassengerId, ProfileImage, RecordStore, SqliteStore};
use aircache_sync::{
    CacheClient, ReconcileIssue, RetryConfig, SyncConfig, SyncError, SyncEvent,
};
use aircache_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn person(id: i64, name: &str) -> Passenger {
    Passenger::new(name, format!("{}@example.com", name.to_lowercase()), "555")
        .with_id(PassengerId(id))
}

fn cache_for(
    remote: &Arc<FakeRemote>,
    config: SyncConfig,
) -> CacheClient<SqliteStore, FakeGateway> {
    CacheClient::new(
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Arc::new(remote.gateway()),
        config.with_retry(RetryConfig::no_retry()),
    )
}

#[tokio::test]
async fn overwrite_insert_and_delete() {
    let remote = FakeRemote::new();
    remote.seed_passenger(person(1, "Y"));
    remote.seed_passenger(person(3, "C"));

    let cache = cache_for(&remote, SyncConfig::new());
    cache.store().insert_passenger_with_id(&person(1, "X")).unwrap();
    cache.store().insert_passenger_with_id(&person(2, "B")).unwrap();
    let mut events = cache.subscribe();

    let report = cache.reconcile().await.unwrap();
    assert_eq!((report.upserted, report.deleted), (2, 1));
    assert_eq!(
        cache.list_passengers().unwrap(),
        vec![person(3, "C"), person(1, "Y")]
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::Reconciled {
            upserted: 2,
            deleted: 1
        }
    );

    let again = cache.reconcile().await.unwrap();
    assert!(again.is_noop());
}

#[tokio::test]
async fn attachment_is_overwritten() {
    let remote = FakeRemote::new();
    remote.seed_passenger(
        person(1, "Ada").with_profile_image(ProfileImage::from_bytes(b"remote-image")),
    );
    let cache = cache_for(&remote, SyncConfig::new());
    cache
        .store()
        .insert_passenger_with_id(
            &person(1, "Ada").with_profile_image(ProfileImage::from_bytes(b"local-image")),
        )
        .unwrap();

    cache.reconcile().await.unwrap();
    let image = cache.get_passenger(PassengerId(1)).unwrap().profile_image.unwrap();
    assert_eq!(image.decode().unwrap(), b"remote-image");
}

#[tokio::test]
async fn offline_pass_changes_nothing() {
    let remote = FakeRemote::new();
    remote.seed_passenger(person(1, "Remote"));
    remote.set_offline(true);

    let cache = cache_for(&remote, SyncConfig::new());
    cache.store().insert_passenger_with_id(&person(7, "Local")).unwrap();

    let err = cache.reconcile().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Remote(RemoteError::NetworkUnreachable(_))
    ));
    assert_eq!(cache.list_passengers().unwrap(), vec![person(7, "Local")]);
}

#[tokio::test]
async fn server_error_pass_changes_nothing() {
    let remote = FakeRemote::new();
    remote.fail_next(500);
    let cache = cache_for(&remote, SyncConfig::new());
    cache.store().insert_passenger_with_id(&person(7, "Local")).unwrap();

    let err = cache.reconcile().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Remote(RemoteError::ServerError { status: 500, .. })
    ));
    assert_eq!(cache.store().count_passengers().unwrap(), 1);
}

#[tokio::test]
async fn missing_data_empties_local_store() {
    let remote = FakeRemote::new();
    remote.seed_passenger(person(1, "A"));
    remote.set_omit_data(true);

    let cache = cache_for(&remote, SyncConfig::new());
    let pid = cache.store().insert_passenger(&person(0, "Local")).unwrap();
    cache
        .store()
        .insert_booking(&Booking::new(pid, "MA9", "2025-02-02"))
        .unwrap();

    let report = cache.reconcile().await.unwrap();
    assert_eq!(report.deleted, 1);
    assert!(cache.list_passengers().unwrap().is_empty());
    assert!(cache.list_bookings(pid).unwrap().is_empty());
}

#[tokio::test]
async fn missing_data_with_strict_envelope_aborts() {
    let remote = FakeRemote::new();
    remote.set_omit_data(true);

    let cache = cache_for(&remote, SyncConfig::new().with_strict_envelope(true));
    cache.store().insert_passenger_with_id(&person(1, "Kept")).unwrap();

    let err = cache.reconcile().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Remote(RemoteError::MalformedResponse(_))
    ));
    assert_eq!(cache.store().count_passengers().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_passes_leave_one_consistent_state() {
    let remote = FakeRemote::new();
    for n in 1..=20 {
        remote.seed_passenger(person(n, &format!("P{n}")));
    }
    let cache = Arc::new(cache_for(&remote, SyncConfig::new()));
    for n in 15..=30 {
        cache
            .store()
            .insert_passenger_with_id(&person(n, &format!("Stale{n}")))
            .unwrap();
    }

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.reconcile().await })
        })
        .collect();

    let mut completed = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => completed += 1,
            Err(SyncError::ReconcileInProgress) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert!(completed >= 1);

    let mut expected = remote.passengers();
    expected.reverse();
    assert_eq!(cache.list_passengers().unwrap(), expected);
}

/// Serves a listing in which one record has no identity.
struct PartialListing;

impl LoopbackServer for PartialListing {
    fn handle(&self, _request: &HttpRequest) -> Result<HttpResponse, String> {
        Ok(HttpResponse::new(
            200,
            r#"{"success": true, "count": 2, "data": [
                {"full_name": "Nobody", "email": "n@example.com"},
                {"id": 4, "full_name": "Four", "email": "four@example.com", "phone": "555"}
            ]}"#,
        ))
    }
}

#[tokio::test]
async fn record_without_identity_is_skipped_and_reported() {
    let gateway = HttpGateway::new(
        RemoteConfig::new("http://partial.test"),
        LoopbackClient::new(PartialListing),
    );
    let cache = CacheClient::new(
        Arc::new(SqliteStore::open_in_memory().unwrap()),
        Arc::new(gateway),
        SyncConfig::new(),
    );

    let report = cache.reconcile().await.unwrap();
    assert_eq!(report.upserted, 1);
    assert!(matches!(
        report.errors.as_slice(),
        [ReconcileIssue::MissingIdentity { index: 0 }]
    ));
    assert_eq!(cache.list_passengers().unwrap(), vec![person(4, "Four")]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn pass_converges_to_remote_and_is_idempotent(
        local in snapshot_strategy(40, 12),
        remote_snapshot in snapshot_strategy(40, 12),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let remote = FakeRemote::new();
            for passenger in &remote_snapshot {
                remote.seed_passenger(passenger.clone());
            }
            let cache = cache_for(&remote, SyncConfig::new());
            for passenger in &local {
                cache.store().insert_passenger_with_id(passenger).unwrap();
            }

            let first = cache.reconcile().await.unwrap();
            assert!(first.errors.is_empty());
            let mut expected = remote.passengers();
            expected.reverse();
            assert_eq!(cache.list_passengers().unwrap(), expected);

            let second = cache.reconcile().await.unwrap();
            assert!(second.is_noop());
        });
    }
}
