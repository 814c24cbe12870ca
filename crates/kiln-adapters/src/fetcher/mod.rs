//! Remote fetch adapters.

mod http;

pub use http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpFetcher};
