//! Configuration for the remote gateway.

use aircache_store::{BookingId, PassengerId};
use std::time::Duration;

/// Resource paths of the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Collection path for passengers.
    pub entities: String,
    /// Collection path for bookings.
    pub children: String,
    /// Segment under `children` that lists the bookings of one passenger.
    pub by_parent: String,
}

impl Endpoints {
    /// Creates endpoint paths.
    pub fn new(
        entities: impl Into<String>,
        children: impl Into<String>,
        by_parent: impl Into<String>,
    ) -> Self {
        Self {
            entities: trim_path(entities.into()),
            children: trim_path(children.into()),
            by_parent: by_parent.into().trim_matches('/').to_string(),
        }
    }

    /// `GET`/`POST` path for passengers.
    pub fn passengers(&self) -> String {
        self.entities.clone()
    }

    /// `GET`/`PUT`/`DELETE` path for one passenger.
    pub fn passenger(&self, id: PassengerId) -> String {
        format!("{}/{}", self.entities, id)
    }

    /// `POST` path for bookings.
    pub fn bookings(&self) -> String {
        self.children.clone()
    }

    /// `GET`/`PUT`/`DELETE` path for one booking.
    pub fn booking(&self, id: BookingId) -> String {
        format!("{}/{}", self.children, id)
    }

    /// `GET` path for the bookings of one passenger.
    pub fn bookings_of(&self, passenger_id: PassengerId) -> String {
        format!("{}/{}/{}", self.children, self.by_parent, passenger_id)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new("/entities", "/children", "by-parent")
    }
}

fn trim_path(path: String) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Configuration for the remote gateway.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the service (e.g., "http://10.0.2.2:3000").
    pub base_url: String,
    /// Resource paths.
    pub endpoints: Endpoints,
    /// Upper bound for a single request, after which it counts as unreachable.
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Creates a configuration with default endpoints and a 10 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the resource paths.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins the base URL and a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:3000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routes() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.passengers(), "/entities");
        assert_eq!(endpoints.passenger(PassengerId(4)), "/entities/4");
        assert_eq!(endpoints.booking(BookingId(9)), "/children/9");
        assert_eq!(endpoints.bookings_of(PassengerId(4)), "/children/by-parent/4");
    }

    #[test]
    fn custom_routes_are_normalized() {
        let endpoints = Endpoints::new("api/passengers/", "/api/bookings", "/passenger/");
        assert_eq!(endpoints.passengers(), "/api/passengers");
        assert_eq!(
            endpoints.bookings_of(PassengerId(2)),
            "/api/bookings/passenger/2"
        );
    }

    #[test]
    fn config_builder() {
        let config = RemoteConfig::new("http://sync.example.com/")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.base_url, "http://sync.example.com");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(
            config.url(&config.endpoints.passengers()),
            "http://sync.example.com/entities"
        );
    }
}
