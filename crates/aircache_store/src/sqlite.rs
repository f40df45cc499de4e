//! SQLite-backed record store.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{is_foreign_key_violation, is_key_violation, RecordKind, StoreError, StoreResult};
use crate::model::{Booking, BookingId, Passenger, PassengerId};
use crate::schema;
use crate::store::RecordStore;

const PASSENGER_COLUMNS: &str =
    "id, full_name, email, phone, date_of_birth, membership_level, is_active, profile_image";

const BOOKING_COLUMNS: &str =
    "id, passenger_id, flight_number, booking_date, seat_number, status";

/// A record store persisted in a SQLite database.
///
/// The connection is guarded by a mutex, so the store can be shared across
/// threads and tasks. Each call holds the lock for exactly one statement.
///
/// # Example
///
/// ```rust
/// use aircache_store::{Passenger, RecordStore, SqliteStore};
///
/// let store = SqliteStore::open_in_memory().unwrap();
/// let id = store.insert_passenger(&Passenger::new("Ada", "ada@example.com", "555")).unwrap();
/// assert_eq!(store.get_passenger(id).unwrap().full_name, "Ada");
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a throwaway store that lives only in memory.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Returns the applied schema version.
    pub fn schema_version(&self) -> StoreResult<i32> {
        schema::schema_version(&self.conn.lock())
    }
}

fn read_passenger(row: &Row) -> rusqlite::Result<Passenger> {
    Ok(Passenger {
        id: Some(row.get(0)?),
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        date_of_birth: row.get(4)?,
        membership_level: row.get(5)?,
        is_active: row.get(6)?,
        profile_image: row.get(7)?,
    })
}

fn read_booking(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: Some(row.get(0)?),
        passenger_id: row.get(1)?,
        flight_number: row.get(2)?,
        booking_date: row.get(3)?,
        seat_number: row.get(4)?,
        status: row.get(5)?,
    })
}

fn booking_write_error(err: rusqlite::Error, booking: &Booking) -> StoreError {
    if is_foreign_key_violation(&err) {
        StoreError::ReferentialViolation {
            passenger_id: booking.passenger_id,
        }
    } else {
        err.into()
    }
}

impl RecordStore for SqliteStore {
    fn insert_passenger(&self, passenger: &Passenger) -> StoreResult<PassengerId> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO passengers (full_name, email, phone, date_of_birth, membership_level, is_active, profile_image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                passenger.full_name,
                passenger.email,
                passenger.phone,
                passenger.date_of_birth,
                passenger.membership_level,
                passenger.is_active,
                passenger.profile_image,
            ],
        )?;
        Ok(PassengerId(conn.last_insert_rowid()))
    }

    fn insert_passenger_with_id(&self, passenger: &Passenger) -> StoreResult<()> {
        let id = passenger
            .id
            .ok_or(StoreError::MissingId(RecordKind::Passenger))?;
        let result = self.conn.lock().execute(
            "INSERT INTO passengers (id, full_name, email, phone, date_of_birth, membership_level, is_active, profile_image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                passenger.full_name,
                passenger.email,
                passenger.phone,
                passenger.date_of_birth,
                passenger.membership_level,
                passenger.is_active,
                passenger.profile_image,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_key_violation(&e) => Err(StoreError::Conflict {
                kind: RecordKind::Passenger,
                id: id.get(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn get_passenger(&self, id: PassengerId) -> StoreResult<Passenger> {
        let sql = format!("SELECT {PASSENGER_COLUMNS} FROM passengers WHERE id = ?1");
        self.conn
            .lock()
            .query_row(&sql, params![id], read_passenger)
            .optional()?
            .ok_or(StoreError::NotFound {
                kind: RecordKind::Passenger,
                id: id.get(),
            })
    }

    fn list_passengers(&self) -> StoreResult<Vec<Passenger>> {
        let sql = format!("SELECT {PASSENGER_COLUMNS} FROM passengers ORDER BY id DESC");
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_passenger)?;
        let mut passengers = Vec::new();
        for row in rows {
            passengers.push(row?);
        }
        Ok(passengers)
    }

    fn update_passenger(&self, passenger: &Passenger) -> StoreResult<usize> {
        let id = passenger
            .id
            .ok_or(StoreError::MissingId(RecordKind::Passenger))?;
        let affected = self.conn.lock().execute(
            "UPDATE passengers SET full_name = ?1, email = ?2, phone = ?3, date_of_birth = ?4,
                    membership_level = ?5, is_active = ?6, profile_image = ?7
             WHERE id = ?8",
            params![
                passenger.full_name,
                passenger.email,
                passenger.phone,
                passenger.date_of_birth,
                passenger.membership_level,
                passenger.is_active,
                passenger.profile_image,
                id,
            ],
        )?;
        Ok(affected)
    }

    fn delete_passenger(&self, id: PassengerId) -> StoreResult<usize> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM passengers WHERE id = ?1", params![id])?;
        Ok(deleted)
    }

    fn contains_passenger(&self, id: PassengerId) -> StoreResult<bool> {
        let found = self
            .conn
            .lock()
            .query_row(
                "SELECT 1 FROM passengers WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_passengers(&self) -> StoreResult<usize> {
        let count: i64 =
            self.conn
                .lock()
                .query_row("SELECT COUNT(*) FROM passengers", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn insert_booking(&self, booking: &Booking) -> StoreResult<BookingId> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO bookings (passenger_id, flight_number, booking_date, seat_number, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                booking.passenger_id,
                booking.flight_number,
                booking.booking_date,
                booking.seat_number,
                booking.status,
            ],
        )
        .map_err(|e| booking_write_error(e, booking))?;
        Ok(BookingId(conn.last_insert_rowid()))
    }

    fn get_booking(&self, id: BookingId) -> StoreResult<Booking> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
        self.conn
            .lock()
            .query_row(&sql, params![id], read_booking)
            .optional()?
            .ok_or(StoreError::NotFound {
                kind: RecordKind::Booking,
                id: id.get(),
            })
    }

    fn list_bookings(&self, passenger_id: PassengerId) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE passenger_id = ?1
             ORDER BY booking_date DESC, id DESC"
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![passenger_id], read_booking)?;
        let mut bookings = Vec::new();
        for row in rows {
            bookings.push(row?);
        }
        Ok(bookings)
    }

    fn update_booking(&self, booking: &Booking) -> StoreResult<usize> {
        let id = booking.id.ok_or(StoreError::MissingId(RecordKind::Booking))?;
        let affected = self
            .conn
            .lock()
            .execute(
                "UPDATE bookings SET passenger_id = ?1, flight_number = ?2, booking_date = ?3,
                        seat_number = ?4, status = ?5
                 WHERE id = ?6",
                params![
                    booking.passenger_id,
                    booking.flight_number,
                    booking.booking_date,
                    booking.seat_number,
                    booking.status,
                    id,
                ],
            )
            .map_err(|e| booking_write_error(e, booking))?;
        Ok(affected)
    }

    fn delete_booking(&self, id: BookingId) -> StoreResult<usize> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
        Ok(deleted)
    }

    fn count_bookings(&self, passenger_id: PassengerId) -> StoreResult<usize> {
        let count: i64 = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM bookings WHERE passenger_id = ?1",
            params![passenger_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
