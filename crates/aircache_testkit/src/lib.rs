//! # AirCache Testkit
//!
//! Test utilities for AirCache.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - [`FakeRemote`], an in-process stand-in for the REST service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aircache_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn lists_seeded_passengers() {
//!     let remote = FakeRemote::new();
//!     remote.seed_passenger(Passenger::new("Ada", "ada@example.com", "1"));
//!     let listing = remote.gateway().list_passengers().await.unwrap();
//!     assert_eq!(listing.items.len(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fake_remote;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fake_remote::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fake_remote::*;
pub use fixtures::*;
pub use generators::*;
