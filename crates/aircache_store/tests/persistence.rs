//! Integration tests for the SQLite record store.

use aircache_store::{
    Booking, BookingStatus, Passenger, PassengerId, RecordStore, StoreError, SCHEMA_VERSION,
};
use aircache_testkit::prelude::*;
use proptest::prelude::*;

#[test]
fn data_survives_reopen() {
    let test_store = TestStore::file();
    let pid = test_store
        .insert_passenger(&Passenger::new("Grace Hopper", "grace@example.com", "555-0199"))
        .unwrap();
    let bid = test_store
        .insert_booking(
            &Booking::new(pid, "MA404", "2025-05-04")
                .with_seat("1A")
                .with_status(BookingStatus::Confirmed),
        )
        .unwrap();

    let test_store = test_store.reopen();
    assert_eq!(test_store.schema_version().unwrap(), SCHEMA_VERSION);
    assert_eq!(test_store.get_passenger(pid).unwrap().full_name, "Grace Hopper");
    let booking = test_store.get_booking(bid).unwrap();
    assert_eq!(booking.seat_number.as_deref(), Some("1A"));
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[test]
fn cascade_survives_reopen() {
    let test_store = TestStore::file();
    let pid = test_store.insert_passenger(&scenarios::sample_passenger(1)).unwrap();
    test_store
        .insert_booking(&scenarios::sample_booking(pid, 1))
        .unwrap();

    // Foreign keys are per-connection in SQLite; a reopened store must still cascade.
    let test_store = test_store.reopen();
    test_store.delete_passenger(pid).unwrap();
    assert_eq!(test_store.count_bookings(pid).unwrap(), 0);
}

#[test]
fn referential_violation_leaves_store_unchanged() {
    with_temp_store(|store| {
        let result = store.insert_booking(&Booking::new(PassengerId(3), "MA9", "2025-09-09"));
        assert!(matches!(
            result,
            Err(StoreError::ReferentialViolation { .. })
        ));
        assert_eq!(store.count_bookings(PassengerId(3)).unwrap(), 0);
    });
}

#[test]
fn file_store_lives_at_its_path() {
    with_file_store(|store, path| {
        store.insert_passenger(&scenarios::sample_passenger(0)).unwrap();
        assert!(path.exists());
    });
}

proptest! {
    #[test]
    fn put_then_get_round_trips(passenger in passenger_strategy()) {
        let test_store = TestStore::memory();
        let id = test_store.insert_passenger(&passenger).unwrap();
        prop_assert_eq!(test_store.get_passenger(id).unwrap(), passenger.with_id(id));
    }

    #[test]
    fn bookings_survive_reopen_in_date_order(
        bookings in prop::collection::vec(booking_strategy(PassengerId(1)), 0..8),
    ) {
        let test_store = TestStore::file();
        let pid = test_store.insert_passenger(&scenarios::sample_passenger(0)).unwrap();
        prop_assert_eq!(pid, PassengerId(1));
        let mut expected = Vec::new();
        for booking in &bookings {
            let id = test_store.insert_booking(booking).unwrap();
            expected.push(booking.clone().with_id(id));
        }
        expected.sort_by(|a, b| b.booking_date.cmp(&a.booking_date).then(b.id.cmp(&a.id)));

        let test_store = test_store.reopen();
        prop_assert_eq!(test_store.list_bookings(pid).unwrap(), expected);
    }

    #[test]
    fn delete_cascades_for_any_population(
        passengers in 1usize..6,
        bookings_each in 0usize..4,
        victim in any::<prop::sample::Index>(),
    ) {
        let test_store = scenarios::populated_store(passengers, bookings_each);
        let ids: Vec<PassengerId> = test_store
            .list_passengers()
            .unwrap()
            .into_iter()
            .filter_map(|p| p.id)
            .collect();
        prop_assert_eq!(ids.len(), passengers);

        let victim_id = ids[victim.index(ids.len())];
        test_store.delete_passenger(victim_id).unwrap();

        for pid in ids {
            let expected = if pid == victim_id { 0 } else { bookings_each };
            prop_assert_eq!(test_store.count_bookings(pid).unwrap(), expected);
        }
    }
}
