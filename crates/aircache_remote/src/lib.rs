//! # AirCache Remote
//!
//! Gateway to the authoritative remote store of the AirCache cache.
//!
//! This crate provides:
//! - The [`RemoteGateway`] abstraction over passenger and booking CRUD
//! - [`HttpGateway`], speaking the service's JSON envelope format
//! - An [`HttpClient`] seam with a reqwest implementation and a loopback
//!   client for in-process servers
//! - [`MockGateway`], an in-memory gateway for tests
//!
//! ## Failure Classification
//!
//! Every failed call is classified as one [`RemoteError`]:
//! - no answer within the timeout, or no connection: `NetworkUnreachable`
//! - a non-2xx status: `ServerError`
//! - an undecodable body: `MalformedResponse`
//!
//! The gateway never retries. Retry policy belongs to the sync layer.
//!
//! ## Wire Format
//!
//! List responses use the envelope `{"success", "count", "data": [...]}`.
//! A list envelope without `data` decodes to an empty [`Listing`] with
//! `data_missing` set, so callers can decide how far to trust it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod gateway;
mod http;
mod mock;
mod protocol;
mod reqwest_client;

pub use client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, LoopbackClient, LoopbackServer};
pub use config::{Endpoints, RemoteConfig};
pub use error::{RemoteError, RemoteResult};
pub use gateway::RemoteGateway;
pub use http::HttpGateway;
pub use mock::{GatewayCall, MockGateway};
pub use protocol::{decode_listing, decode_object, encode_body, error_message, Listing};
pub use reqwest_client::ReqwestClient;
