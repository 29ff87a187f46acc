//! REST API client for the AuraChat backend
//!
//! JSON over HTTP with bearer-token auth. The client reads the token from the
//! shared key-value store on every request and discards it when the server
//! rejects it, mirroring the request/response interceptor contract the UI
//! layer relies on.

mod client;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder};
