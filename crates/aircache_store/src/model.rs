//! Record types held by the store.
//!
//! The same types travel over the wire, so field names follow the JSON
//! representation used by the remote service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassengerId(pub i64);

/// Identity of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i64);

macro_rules! integer_id {
    ($name:ident) => {
        impl $name {
            /// Returns the raw integer value.
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

integer_id!(PassengerId);
integer_id!(BookingId);

/// Error returned when an enumerated column holds an unknown value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Membership tier of a passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MembershipLevel {
    /// Base tier.
    #[default]
    #[serde(alias = "economy")]
    Economy,
    /// Premium economy.
    #[serde(alias = "premium")]
    Premium,
    /// Business.
    #[serde(alias = "business")]
    Business,
    /// First class.
    #[serde(rename = "First Class", alias = "first_class", alias = "first class")]
    FirstClass,
}

impl MembershipLevel {
    /// All levels, lowest first.
    pub const ALL: [MembershipLevel; 4] = [
        MembershipLevel::Economy,
        MembershipLevel::Premium,
        MembershipLevel::Business,
        MembershipLevel::FirstClass,
    ];

    /// Returns the canonical text form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipLevel::Economy => "Economy",
            MembershipLevel::Premium => "Premium",
            MembershipLevel::Business => "Business",
            MembershipLevel::FirstClass => "First Class",
        }
    }
}

impl fmt::Display for MembershipLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(MembershipLevel::Economy),
            "premium" => Ok(MembershipLevel::Premium),
            "business" => Ok(MembershipLevel::Business),
            "first class" | "first_class" | "firstclass" => Ok(MembershipLevel::FirstClass),
            _ => Err(ParseEnumError {
                kind: "membership level",
                value: s.to_string(),
            }),
        }
    }
}

/// Status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Seat confirmed.
    #[serde(alias = "confirmed")]
    Confirmed,
    /// Awaiting confirmation.
    #[default]
    #[serde(alias = "pending")]
    Pending,
    /// Cancelled by either side.
    #[serde(alias = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    /// Returns the canonical text form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Pending => "Pending",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            _ => Err(ParseEnumError {
                kind: "booking status",
                value: s.to_string(),
            }),
        }
    }
}

macro_rules! text_enum_sql {
    ($name:ident) => {
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: ParseEnumError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum_sql!(MembershipLevel);
text_enum_sql!(BookingStatus);

/// A profile image stored as base64 text.
///
/// The encoded form is what gets persisted locally and sent to the remote.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileImage(String);

impl ProfileImage {
    /// Wraps text that is already base64 encoded.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encodes raw image bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Returns the encoded text.
    #[must_use]
    pub fn as_encoded(&self) -> &str {
        &self.0
    }

    /// Decodes the image back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.0.as_bytes())
    }
}

impl fmt::Debug for ProfileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProfileImage({} chars)", self.0.len())
    }
}

impl ToSql for ProfileImage {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for ProfileImage {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Self)
    }
}

fn default_active() -> bool {
    true
}

/// A passenger profile (the top-level cached record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    /// Identity, `None` until the record has been stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PassengerId>,
    /// Full name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: String,
    /// Date of birth as `YYYY-MM-DD`.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    /// Membership tier.
    #[serde(default)]
    pub membership_level: MembershipLevel,
    /// Whether the account is active.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Optional profile image.
    #[serde(default)]
    pub profile_image: Option<ProfileImage>,
}

impl Passenger {
    /// Creates an active economy passenger without an identity.
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
            email: email.into(),
            phone: phone.into(),
            date_of_birth: None,
            membership_level: MembershipLevel::default(),
            is_active: true,
            profile_image: None,
        }
    }

    /// Sets the identity.
    #[must_use]
    pub fn with_id(mut self, id: PassengerId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the date of birth.
    #[must_use]
    pub fn with_date_of_birth(mut self, date: impl Into<String>) -> Self {
        self.date_of_birth = Some(date.into());
        self
    }

    /// Sets the membership level.
    #[must_use]
    pub fn with_membership(mut self, level: MembershipLevel) -> Self {
        self.membership_level = level;
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Sets the profile image.
    #[must_use]
    pub fn with_profile_image(mut self, image: ProfileImage) -> Self {
        self.profile_image = Some(image);
        self
    }
}

/// A flight booking owned by exactly one passenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Identity, `None` until the record has been stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookingId>,
    /// Owning passenger.
    pub passenger_id: PassengerId,
    /// Flight code.
    pub flight_number: String,
    /// Booking date as `YYYY-MM-DD`.
    pub booking_date: String,
    /// Seat label.
    #[serde(default)]
    pub seat_number: Option<String>,
    /// Booking status.
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    /// Creates a pending booking without an identity.
    pub fn new(
        passenger_id: PassengerId,
        flight_number: impl Into<String>,
        booking_date: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            passenger_id,
            flight_number: flight_number.into(),
            booking_date: booking_date.into(),
            seat_number: None,
            status: BookingStatus::default(),
        }
    }

    /// Sets the identity.
    #[must_use]
    pub fn with_id(mut self, id: BookingId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the seat label.
    #[must_use]
    pub fn with_seat(mut self, seat: impl Into<String>) -> Self {
        self.seat_number = Some(seat.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }
}
