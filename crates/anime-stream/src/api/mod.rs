//! Upstream JSON API client.
//!
//! This module provides a pool-balanced, retry-enabled client for the anime
//! API, plus the transport seam it is built on.

pub mod client;
pub mod pool;
pub mod retry;
pub mod transport;

pub use client::{encode_segment, ApiClient};
pub use pool::ServerPool;
pub use retry::RetryPolicy;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError};
