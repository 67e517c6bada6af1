//! # kudosync API
//!
//! Remote API client for the kudosync offline-first engine.
//!
//! The engine talks to the server exclusively through the [`RemoteApi`]
//! trait: fetch the canonical record set, create a record, thank a
//! record. [`HttpApi`] implements the trait over an injected
//! [`HttpClient`], so the concrete HTTP library is a host decision
//! (reqwest, ureq, a platform fetch shim, ...), and [`MockApi`] provides
//! a scripted double for tests.
//!
//! The client is stateless: it holds no cache and no queue. Any
//! non-2xx response surfaces as [`ApiError::Status`] carrying the
//! response body as its message; the engine treats every dispatch error
//! as transient and retries with backoff.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod mock;

pub use client::{HttpApi, HttpClient, HttpResponse, RemoteApi, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult};
pub use mock::MockApi;
