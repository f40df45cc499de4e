//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random records that maintain the
//! store's invariants (non-empty names, well-formed dates, unique ids).

use aircache_store::{
    Booking, BookingStatus, MembershipLevel, Passenger, PassengerId, ProfileImage,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for membership levels.
pub fn membership_strategy() -> impl Strategy<Value = MembershipLevel> {
    prop::sample::select(MembershipLevel::ALL.to_vec())
}

/// Strategy for booking statuses.
pub fn status_strategy() -> impl Strategy<Value = BookingStatus> {
    prop_oneof![
        Just(BookingStatus::Confirmed),
        Just(BookingStatus::Pending),
        Just(BookingStatus::Cancelled),
    ]
}

/// Strategy for `YYYY-MM-DD` dates.
pub fn date_strategy() -> impl Strategy<Value = String> {
    (1950u32..2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

/// Strategy for small profile images.
pub fn profile_image_strategy() -> impl Strategy<Value = ProfileImage> {
    prop::collection::vec(any::<u8>(), 1..64).prop_map(|bytes| ProfileImage::from_bytes(&bytes))
}

/// Strategy for passengers without an identity.
pub fn passenger_strategy() -> impl Strategy<Value = Passenger> {
    (
        prop::string::string_regex("[A-Z][a-z]{1,12}( [A-Z][a-z]{1,12})?").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,10}@[a-z]{2,8}\\.com").expect("Invalid regex"),
        prop::string::string_regex("[0-9]{3}-[0-9]{4}").expect("Invalid regex"),
        prop::option::of(date_strategy()),
        membership_strategy(),
        any::<bool>(),
        prop::option::of(profile_image_strategy()),
    )
        .prop_map(
            |(name, email, phone, dob, level, active, image)| Passenger {
                id: None,
                full_name: name,
                email,
                phone,
                date_of_birth: dob,
                membership_level: level,
                is_active: active,
                profile_image: image,
            },
        )
}

/// Strategy for bookings owned by `passenger_id`, without an identity.
pub fn booking_strategy(passenger_id: PassengerId) -> impl Strategy<Value = Booking> {
    (
        prop::string::string_regex("[A-Z]{2}[0-9]{2,4}").expect("Invalid regex"),
        date_strategy(),
        prop::option::of(
            prop::string::string_regex("[1-9][0-9]?[A-F]").expect("Invalid regex"),
        ),
        status_strategy(),
    )
        .prop_map(move |(flight, date, seat, status)| Booking {
            id: None,
            passenger_id,
            flight_number: flight,
            booking_date: date,
            seat_number: seat,
            status,
        })
}

/// Strategy for a remote snapshot: passengers with distinct identities
/// drawn from `1..max_id`.
pub fn snapshot_strategy(max_id: i64, max_len: usize) -> impl Strategy<Value = Vec<Passenger>> {
    (
        prop::collection::btree_set(1..max_id, 0..=max_len),
        prop::collection::vec(passenger_strategy(), max_len),
    )
        .prop_map(|(ids, passengers): (BTreeSet<i64>, Vec<Passenger>)| {
            ids.into_iter()
                .zip(passengers)
                .map(|(id, p)| p.with_id(PassengerId(id)))
                .collect()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn passengers_have_no_identity(passenger in passenger_strategy()) {
            prop_assert!(passenger.id.is_none());
            prop_assert!(!passenger.full_name.is_empty());
            prop_assert!(passenger.email.contains('@'));
        }

        #[test]
        fn snapshot_identities_are_distinct(snapshot in snapshot_strategy(50, 10)) {
            let ids: BTreeSet<_> = snapshot.iter().map(|p| p.id).collect();
            prop_assert_eq!(ids.len(), snapshot.len());
        }

        #[test]
        fn dates_are_iso(date in date_strategy()) {
            prop_assert_eq!(date.len(), 10);
            prop_assert_eq!(&date[4..5], "-");
        }
    }
}
