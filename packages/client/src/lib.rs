#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Fetch orchestration and dataset state.
//!
//! This crate issues the queries built by `careboard_api`, turns payloads
//! into shaped datasets, and keeps those datasets consistent while filters
//! change underneath them: stale responses are discarded, failed fetches
//! leave the last-known data in place, and the prevalence dataset follows
//! the primary dataset rather than the filter state.

pub mod config;
pub mod dashboard;
pub mod http;
pub mod payload;
pub mod refresh;
pub mod slot;

use async_trait::async_trait;
use careboard_api::ApiRequest;

/// Errors a fetch can surface.
///
/// A failed fetch never clears a dataset; callers keep rendering the last
/// successful value and recover through the next filter change. No retries
/// happen at this layer.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (connection failure, or the
    /// body died mid-transfer).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server error: HTTP {status}")]
    Server {
        /// The HTTP status code returned.
        status: u16,
    },

    /// The body arrived but was not the shape the endpoint promises.
    /// Treated like a server fault: the data cannot be used.
    #[error("malformed payload: {message}")]
    Malformed {
        /// Description of what failed to decode.
        message: String,
    },
}

/// Transport boundary the orchestrator talks through.
///
/// The production implementation is [`http::HttpTransport`]; tests swap in
/// scripted implementations. No timeout policy lives here; a caller that
/// needs liveness bounds configures them on the transport it injects.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Performs the GET request and returns the decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails, the server answers
    /// non-2xx, or the body is not valid JSON.
    async fn get_json(&self, request: &ApiRequest) -> Result<serde_json::Value, FetchError>;
}
