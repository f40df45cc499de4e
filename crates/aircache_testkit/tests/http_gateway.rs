//! HttpGateway against the in-process fake service.

use aircache_remote::{RemoteError, RemoteGateway};
use aircache_store::{Booking, BookingStatus, Passenger, PassengerId, ProfileImage};
use aircache_testkit::prelude::*;

#[tokio::test]
async fn passenger_crud_round_trip() {
    let remote = FakeRemote::new();
    let gateway = remote.gateway();

    let created = gateway
        .create_passenger(
            &Passenger::new("Ada Lovelace", "ada@example.com", "555-0100")
                .with_profile_image(ProfileImage::from_bytes(b"\x89PNG")),
        )
        .await
        .unwrap();
    let id = created.id.unwrap();

    let fetched = gateway.get_passenger(id).await.unwrap();
    assert_eq!(fetched, created);

    let renamed = Passenger {
        full_name: "Ada King".into(),
        ..fetched
    };
    gateway.update_passenger(&renamed).await.unwrap();
    assert_eq!(remote.passengers()[0].full_name, "Ada King");

    gateway.delete_passenger(id).await.unwrap();
    assert!(remote.passengers().is_empty());

    let missing = gateway.get_passenger(id).await.unwrap_err();
    assert_eq!(missing, RemoteError::server(404, "Passenger not found"));
}

#[tokio::test]
async fn deleting_twice_is_not_an_error() {
    let remote = FakeRemote::new();
    let id = remote.seed_passenger(Passenger::new("A", "a@x.com", "1"));
    let gateway = remote.gateway();

    gateway.delete_passenger(id).await.unwrap();
    gateway.delete_passenger(id).await.unwrap();
    assert_eq!(
        remote.request_lines(),
        vec![format!("DELETE /entities/{id}"), format!("DELETE /entities/{id}")]
    );
}

#[tokio::test]
async fn bookings_by_parent() {
    let remote = FakeRemote::new();
    let pid = remote.seed_passenger(Passenger::new("A", "a@x.com", "1"));
    let other = remote.seed_passenger(Passenger::new("B", "b@x.com", "2"));
    remote.seed_booking(Booking::new(pid, "MA1", "2025-01-01"));
    remote.seed_booking(Booking::new(pid, "MA2", "2025-03-01"));
    remote.seed_booking(Booking::new(other, "MA3", "2025-02-01"));
    let gateway = remote.gateway();

    let listing = gateway.list_bookings(pid).await.unwrap();
    let flights: Vec<_> = listing.items.iter().map(|b| b.flight_number.as_str()).collect();
    assert_eq!(flights, ["MA2", "MA1"]);

    let created = gateway
        .create_booking(&Booking::new(other, "MA4", "2025-04-01").with_status(BookingStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(created.status, BookingStatus::Confirmed);

    let orphan = gateway
        .create_booking(&Booking::new(PassengerId(999), "MA5", "2025-04-01"))
        .await;
    assert_eq!(orphan.unwrap_err().status(), Some(400));
}

#[tokio::test]
async fn offline_and_injected_failures() {
    let remote = FakeRemote::new();
    let gateway = remote.gateway();

    remote.set_offline(true);
    let err = gateway.list_passengers().await.unwrap_err();
    assert!(matches!(err, RemoteError::NetworkUnreachable(_)));
    assert!(err.is_retryable());

    remote.set_offline(false);
    remote.fail_next(503);
    let err = gateway.list_passengers().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.is_retryable());

    assert!(gateway.list_passengers().await.is_ok());
}

#[tokio::test]
async fn omitted_data_decodes_as_missing() {
    let remote = FakeRemote::new();
    remote.seed_passenger(Passenger::new("A", "a@x.com", "1"));
    remote.set_omit_data(true);

    let listing = remote.gateway().list_passengers().await.unwrap();
    assert!(listing.data_missing);
    assert!(listing.items.is_empty());
    assert_eq!(listing.count, Some(1));
}
