//! HTTP gateway implementation.
//!
//! Maps each [`RemoteGateway`] call onto one JSON request and classifies
//! the outcome. Every request is bounded by the configured timeout.

use crate::client::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::gateway::RemoteGateway;
use crate::protocol::{decode_listing, decode_object, encode_body, error_message, Listing};
use aircache_store::{Booking, BookingId, Passenger, PassengerId};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

/// HTTP-based remote gateway.
pub struct HttpGateway<C: HttpClient> {
    config: RemoteConfig,
    client: C,
}

impl<C: HttpClient> HttpGateway<C> {
    /// Creates a new HTTP gateway.
    pub fn new(config: RemoteConfig, client: C) -> Self {
        Self { config, client }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RemoteResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url: self.config.url(path),
            body,
        };
        debug!(%method, url = %request.url, "remote request");

        let response = match timeout(self.config.timeout, self.client.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(%method, path, error = %e, "remote unreachable");
                return Err(RemoteError::NetworkUnreachable(e));
            }
            Err(_) => {
                warn!(%method, path, timeout = ?self.config.timeout, "remote request timed out");
                return Err(RemoteError::NetworkUnreachable(format!(
                    "no response within {:?}",
                    self.config.timeout
                )));
            }
        };

        if !response.is_success() {
            let message = error_message(&response.body);
            debug!(%method, path, status = response.status, %message, "remote rejected request");
            return Err(RemoteError::server(response.status, message));
        }

        Ok(response)
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        match self.execute(HttpMethod::Delete, path, None).await {
            Ok(_) => Ok(()),
            Err(RemoteError::ServerError { status: 404, .. }) => {
                debug!(path, "delete target already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// The body sent for passenger writes; identities are issued remotely.
fn passenger_body(passenger: &Passenger) -> RemoteResult<Vec<u8>> {
    encode_body(&Passenger {
        id: None,
        ..passenger.clone()
    })
}

fn booking_body(booking: &Booking) -> RemoteResult<Vec<u8>> {
    encode_body(&Booking {
        id: None,
        ..booking.clone()
    })
}

#[async_trait]
impl<C: HttpClient> RemoteGateway for HttpGateway<C> {
    async fn list_passengers(&self) -> RemoteResult<Listing<Passenger>> {
        let response = self
            .execute(HttpMethod::Get, &self.config.endpoints.passengers(), None)
            .await?;
        let listing: Listing<Passenger> = decode_listing(&response.body)?;
        if listing.data_missing {
            warn!("passenger listing has no `data` field, treating as empty");
        }
        Ok(listing)
    }

    async fn get_passenger(&self, id: PassengerId) -> RemoteResult<Passenger> {
        let response = self
            .execute(HttpMethod::Get, &self.config.endpoints.passenger(id), None)
            .await?;
        decode_object(&response.body)
    }

    async fn create_passenger(&self, passenger: &Passenger) -> RemoteResult<Passenger> {
        let body = passenger_body(passenger)?;
        let response = self
            .execute(
                HttpMethod::Post,
                &self.config.endpoints.passengers(),
                Some(body),
            )
            .await?;
        decode_object(&response.body)
    }

    async fn update_passenger(&self, passenger: &Passenger) -> RemoteResult<Passenger> {
        let id = passenger
            .id
            .ok_or_else(|| RemoteError::InvalidRequest("passenger has no identity".into()))?;
        let body = passenger_body(passenger)?;
        let response = self
            .execute(
                HttpMethod::Put,
                &self.config.endpoints.passenger(id),
                Some(body),
            )
            .await?;
        decode_object(&response.body)
    }

    async fn delete_passenger(&self, id: PassengerId) -> RemoteResult<()> {
        self.delete(&self.config.endpoints.passenger(id)).await
    }

    async fn list_bookings(&self, passenger_id: PassengerId) -> RemoteResult<Listing<Booking>> {
        let response = self
            .execute(
                HttpMethod::Get,
                &self.config.endpoints.bookings_of(passenger_id),
                None,
            )
            .await?;
        decode_listing(&response.body)
    }

    async fn get_booking(&self, id: BookingId) -> RemoteResult<Booking> {
        let response = self
            .execute(HttpMethod::Get, &self.config.endpoints.booking(id), None)
            .await?;
        decode_object(&response.body)
    }

    async fn create_booking(&self, booking: &Booking) -> RemoteResult<Booking> {
        let body = booking_body(booking)?;
        let response = self
            .execute(HttpMethod::Post, &self.config.endpoints.bookings(), Some(body))
            .await?;
        decode_object(&response.body)
    }

    async fn update_booking(&self, booking: &Booking) -> RemoteResult<Booking> {
        let id = booking
            .id
            .ok_or_else(|| RemoteError::InvalidRequest("booking has no identity".into()))?;
        let body = booking_body(booking)?;
        let response = self
            .execute(HttpMethod::Put, &self.config.endpoints.booking(id), Some(body))
            .await?;
        decode_object(&response.body)
    }

    async fn delete_booking(&self, id: BookingId) -> RemoteResult<()> {
        self.delete(&self.config.endpoints.booking(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LoopbackClient, LoopbackServer};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Replies with a fixed response and records every request.
    struct Canned {
        response: Mutex<Result<HttpResponse, String>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Ok(HttpResponse::new(status, body.as_bytes()))),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Err("connection refused".into())),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl LoopbackServer for Canned {
        fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.seen.lock().push(request.clone());
            self.response.lock().clone()
        }
    }

    fn gateway(server: Arc<Canned>) -> HttpGateway<LoopbackClient<Arc<Canned>>> {
        HttpGateway::new(
            RemoteConfig::new("http://remote.test"),
            LoopbackClient::new(server),
        )
    }

    #[tokio::test]
    async fn list_unwraps_envelope() {
        let server = Canned::new(
            200,
            r#"{"success": true, "count": 2, "data": [
                {"id": 2, "full_name": "B", "email": "b@x.com", "phone": "2"},
                {"id": 1, "full_name": "A", "email": "a@x.com", "phone": "1"}
            ]}"#,
        );
        let listing = gateway(Arc::clone(&server)).list_passengers().await.unwrap();
        assert_eq!(listing.items.len(), 2);
        let seen = server.seen.lock();
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[0].url, "http://remote.test/entities");
    }

    #[tokio::test]
    async fn list_without_data_is_empty() {
        let server = Canned::new(200, r#"{"success": true, "count": 0}"#);
        let listing = gateway(server).list_passengers().await.unwrap();
        assert!(listing.items.is_empty());
        assert!(listing.data_missing);
    }

    #[tokio::test]
    async fn unreachable_is_classified() {
        let result = gateway(Canned::unreachable()).list_passengers().await;
        assert!(matches!(result, Err(RemoteError::NetworkUnreachable(_))));
    }

    #[tokio::test]
    async fn status_is_classified() {
        let server = Canned::new(500, r#"{"success": false, "message": "Error fetching passengers"}"#);
        let result = gateway(server).list_passengers().await;
        assert_eq!(
            result.unwrap_err(),
            RemoteError::server(500, "Error fetching passengers")
        );
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let server = Canned::new(200, "<html>oops</html>");
        let result = gateway(server).get_passenger(PassengerId(1)).await;
        assert!(matches!(result, Err(RemoteError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn slow_server_times_out_as_unreachable() {
        let server = Canned::new(200, r#"{"data": []}"#);
        let gateway = HttpGateway::new(
            RemoteConfig::new("http://remote.test").with_timeout(Duration::from_millis(20)),
            LoopbackClient::new(server).with_latency(Duration::from_millis(500)),
        );
        let result = gateway.list_passengers().await;
        assert!(matches!(result, Err(RemoteError::NetworkUnreachable(_))));
    }

    #[tokio::test]
    async fn create_sends_body_without_identity() {
        let server = Canned::new(
            201,
            r#"{"success": true, "data": {"id": 77, "full_name": "A", "email": "a@x.com", "phone": "1"}}"#,
        );
        let created = gateway(Arc::clone(&server))
            .create_passenger(&Passenger::new("A", "a@x.com", "1").with_id(PassengerId(5)))
            .await
            .unwrap();
        assert_eq!(created.id, Some(PassengerId(77)));

        let seen = server.seen.lock();
        assert_eq!(seen[0].method, HttpMethod::Post);
        let body: serde_json::Value =
            serde_json::from_slice(seen[0].body.as_ref().unwrap()).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["full_name"], "A");
    }

    #[tokio::test]
    async fn update_targets_identity() {
        let server = Canned::new(200, r#"{"id": 5, "full_name": "A", "email": "a@x.com"}"#);
        gateway(Arc::clone(&server))
            .update_passenger(&Passenger::new("A", "a@x.com", "1").with_id(PassengerId(5)))
            .await
            .unwrap();
        let seen = server.seen.lock();
        assert_eq!(seen[0].method, HttpMethod::Put);
        assert_eq!(seen[0].url, "http://remote.test/entities/5");
    }

    #[tokio::test]
    async fn update_without_identity_is_rejected_locally() {
        let server = Canned::new(200, "{}");
        let result = gateway(Arc::clone(&server))
            .update_passenger(&Passenger::new("A", "a@x.com", "1"))
            .await;
        assert!(matches!(result, Err(RemoteError::InvalidRequest(_))));
        assert!(server.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn delete_of_absent_record_succeeds() {
        let server = Canned::new(404, r#"{"success": false, "message": "Booking not found"}"#);
        gateway(Arc::clone(&server))
            .delete_booking(BookingId(3))
            .await
            .unwrap();
        assert_eq!(server.seen.lock()[0].url, "http://remote.test/children/3");
    }

    #[tokio::test]
    async fn bookings_by_parent_route() {
        let server = Canned::new(
            200,
            r#"{"success": true, "count": 1, "data": [
                {"id": 1, "passenger_id": 4, "flight_number": "MA1", "booking_date": "2025-01-01", "status": "Confirmed"}
            ]}"#,
        );
        let listing = gateway(Arc::clone(&server))
            .list_bookings(PassengerId(4))
            .await
            .unwrap();
        assert_eq!(listing.items[0].passenger_id, PassengerId(4));
        assert_eq!(
            server.seen.lock()[0].url,
            "http://remote.test/children/by-parent/4"
        );
    }
}
