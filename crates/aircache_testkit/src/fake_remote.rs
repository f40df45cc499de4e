//! An in-process stand-in for the remote REST service.
//!
//! [`FakeRemote`] answers the same routes and envelopes as the real
//! service, so an [`HttpGateway`] can be exercised end to end over a
//! [`LoopbackClient`] without a network.

use aircache_remote::{
    Endpoints, HttpGateway, HttpMethod, HttpRequest, HttpResponse, LoopbackClient,
    LoopbackServer, RemoteConfig,
};
use aircache_store::{Booking, BookingId, Passenger, PassengerId};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Base URL used by gateways connected to a fake remote.
pub const FAKE_BASE_URL: &str = "http://fake-remote.test";

/// Gateway type returned by [`FakeRemote::gateway`].
pub type FakeGateway = HttpGateway<LoopbackClient<Arc<FakeRemote>>>;

#[derive(Default)]
struct FakeState {
    passengers: BTreeMap<PassengerId, Passenger>,
    bookings: BTreeMap<BookingId, Booking>,
    last_passenger_id: i64,
    last_booking_id: i64,
    requests: Vec<HttpRequest>,
    fail_next: VecDeque<u16>,
}

/// Fake REST service holding passengers and bookings in memory.
pub struct FakeRemote {
    endpoints: Endpoints,
    state: Mutex<FakeState>,
    offline: AtomicBool,
    omit_data: AtomicBool,
}

enum Target {
    Passengers,
    Passenger(PassengerId),
    Bookings,
    Booking(BookingId),
    BookingsOf(PassengerId),
}

impl FakeRemote {
    /// Creates an empty fake remote serving the default routes.
    pub fn new() -> Arc<Self> {
        Self::with_endpoints(Endpoints::default())
    }

    /// Creates an empty fake remote serving custom routes.
    pub fn with_endpoints(endpoints: Endpoints) -> Arc<Self> {
        Arc::new(Self {
            endpoints,
            state: Mutex::new(FakeState::default()),
            offline: AtomicBool::new(false),
            omit_data: AtomicBool::new(false),
        })
    }

    /// Returns a gateway connected to this fake remote.
    pub fn gateway(self: &Arc<Self>) -> FakeGateway {
        let config =
            RemoteConfig::new(FAKE_BASE_URL).with_endpoints(self.endpoints.clone());
        HttpGateway::new(config, LoopbackClient::new(Arc::clone(self)))
    }

    /// Stores a passenger; records without an identity get the next one.
    pub fn seed_passenger(&self, passenger: Passenger) -> PassengerId {
        let mut state = self.state.lock();
        let id = passenger
            .id
            .unwrap_or(PassengerId(state.last_passenger_id + 1));
        state.last_passenger_id = state.last_passenger_id.max(id.get());
        state.passengers.insert(
            id,
            Passenger {
                id: Some(id),
                ..passenger
            },
        );
        id
    }

    /// Stores a booking; records without an identity get the next one.
    pub fn seed_booking(&self, booking: Booking) -> BookingId {
        let mut state = self.state.lock();
        let id = booking.id.unwrap_or(BookingId(state.last_booking_id + 1));
        state.last_booking_id = state.last_booking_id.max(id.get());
        state.bookings.insert(
            id,
            Booking {
                id: Some(id),
                ..booking
            },
        );
        id
    }

    /// Returns the stored passengers, ordered by identity.
    pub fn passengers(&self) -> Vec<Passenger> {
        self.state.lock().passengers.values().cloned().collect()
    }

    /// Returns the stored bookings, ordered by identity.
    pub fn bookings(&self) -> Vec<Booking> {
        self.state.lock().bookings.values().cloned().collect()
    }

    /// Simulates losing (or regaining) connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes list responses omit their `data` field.
    pub fn set_omit_data(&self, omit: bool) {
        self.omit_data.store(omit, Ordering::SeqCst);
    }

    /// Makes the next request fail with `status`.
    pub fn fail_next(&self, status: u16) {
        self.state.lock().fail_next.push_back(status);
    }

    /// Returns all requests received while online.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().requests.clone()
    }

    /// Returns `METHOD path` for each request received while online.
    pub fn request_lines(&self) -> Vec<String> {
        self.state
            .lock()
            .requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.path()))
            .collect()
    }

    fn target(&self, path: &str) -> Option<Target> {
        let path = path.trim_end_matches('/');
        if path == self.endpoints.entities {
            return Some(Target::Passengers);
        }
        if path == self.endpoints.children {
            return Some(Target::Bookings);
        }
        if let Some(rest) = path
            .strip_prefix(self.endpoints.children.as_str())
            .and_then(|r| r.strip_prefix('/'))
        {
            if let Some(pid) = rest
                .strip_prefix(self.endpoints.by_parent.as_str())
                .and_then(|r| r.strip_prefix('/'))
            {
                return pid.parse().ok().map(|id| Target::BookingsOf(PassengerId(id)));
            }
            return rest.parse().ok().map(|id| Target::Booking(BookingId(id)));
        }
        path.strip_prefix(self.endpoints.entities.as_str())
            .and_then(|r| r.strip_prefix('/'))
            .and_then(|id| id.parse().ok())
            .map(|id| Target::Passenger(PassengerId(id)))
    }

    fn route(&self, state: &mut FakeState, request: &HttpRequest) -> HttpResponse {
        let Some(target) = self.target(request.path()) else {
            return message(404, "Route not found");
        };
        match (request.method, target) {
            (HttpMethod::Get, Target::Passengers) => {
                let mut items: Vec<&Passenger> = state.passengers.values().collect();
                items.reverse();
                self.listing(&items)
            }
            (HttpMethod::Post, Target::Passengers) => {
                let Some(passenger) = parse_body::<Passenger>(request) else {
                    return message(400, "Error creating passenger");
                };
                state.last_passenger_id += 1;
                let id = PassengerId(state.last_passenger_id);
                let created = Passenger {
                    id: Some(id),
                    ..passenger
                };
                state.passengers.insert(id, created.clone());
                object(201, &created)
            }
            (HttpMethod::Get, Target::Passenger(id)) => match state.passengers.get(&id) {
                Some(p) => object(200, p),
                None => message(404, "Passenger not found"),
            },
            (HttpMethod::Put, Target::Passenger(id)) => {
                let Some(passenger) = parse_body::<Passenger>(request) else {
                    return message(400, "Error updating passenger");
                };
                match state.passengers.get_mut(&id) {
                    Some(stored) => {
                        *stored = Passenger {
                            id: Some(id),
                            ..passenger
                        };
                        object(200, stored)
                    }
                    None => message(404, "Passenger not found"),
                }
            }
            (HttpMethod::Delete, Target::Passenger(id)) => {
                if state.passengers.remove(&id).is_none() {
                    return message(404, "Passenger not found");
                }
                state.bookings.retain(|_, b| b.passenger_id != id);
                message(200, "Passenger deleted successfully")
            }
            (HttpMethod::Post, Target::Bookings) => {
                let Some(booking) = parse_body::<Booking>(request) else {
                    return message(400, "Error creating booking");
                };
                if !state.passengers.contains_key(&booking.passenger_id) {
                    return message(400, "Error creating booking");
                }
                state.last_booking_id += 1;
                let id = BookingId(state.last_booking_id);
                let created = Booking {
                    id: Some(id),
                    ..booking
                };
                state.bookings.insert(id, created.clone());
                object(201, &created)
            }
            (HttpMethod::Get, Target::BookingsOf(pid)) => {
                let mut items: Vec<&Booking> = state
                    .bookings
                    .values()
                    .filter(|b| b.passenger_id == pid)
                    .collect();
                items.sort_by(|a, b| b.booking_date.cmp(&a.booking_date).then(b.id.cmp(&a.id)));
                self.listing(&items)
            }
            (HttpMethod::Get, Target::Booking(id)) => match state.bookings.get(&id) {
                Some(b) => object(200, b),
                None => message(404, "Booking not found"),
            },
            (HttpMethod::Put, Target::Booking(id)) => {
                let Some(booking) = parse_body::<Booking>(request) else {
                    return message(400, "Error updating booking");
                };
                match state.bookings.get_mut(&id) {
                    Some(stored) => {
                        *stored = Booking {
                            id: Some(id),
                            ..booking
                        };
                        object(200, stored)
                    }
                    None => message(404, "Booking not found"),
                }
            }
            (HttpMethod::Delete, Target::Booking(id)) => match state.bookings.remove(&id) {
                Some(_) => message(200, "Booking deleted successfully"),
                None => message(404, "Booking not found"),
            },
            _ => message(405, "Method not allowed"),
        }
    }

    fn listing<T: Serialize>(&self, items: &[&T]) -> HttpResponse {
        let body = if self.omit_data.load(Ordering::SeqCst) {
            json!({ "success": true, "count": items.len() })
        } else {
            json!({ "success": true, "count": items.len(), "data": items })
        };
        HttpResponse::new(200, body.to_string())
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(request: &HttpRequest) -> Option<T> {
    request
        .body
        .as_deref()
        .and_then(|body| serde_json::from_slice(body).ok())
}

fn object<T: Serialize>(status: u16, record: &T) -> HttpResponse {
    let body = serde_json::to_vec(record).unwrap_or_default();
    HttpResponse::new(status, body)
}

fn message(status: u16, text: &str) -> HttpResponse {
    let body: Value = json!({ "success": (200..300).contains(&status), "message": text });
    HttpResponse::new(status, body.to_string())
}

impl LoopbackServer for FakeRemote {
    fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err("connection refused".to_string());
        }
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        if let Some(status) = state.fail_next.pop_front() {
            return Ok(message(status, "Injected failure"));
        }
        Ok(self.route(&mut state, request))
    }
}
