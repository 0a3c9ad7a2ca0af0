//! Network collaborator interface
//!
//! The fetch task only needs "GET this URL and hand me the body as it
//! arrives". Transport details (sockets, DNS, TLS, timeouts) belong to the
//! [`HttpClient`] implementation; bodies are streamed into a [`BodySink`] so
//! nothing forces a whole response into memory.

pub mod http;
pub mod price;
pub mod sntp;

use core::ops::ControlFlow;

use thiserror_no_std::Error;

/// Everything that can go wrong while fetching remote data.
///
/// None of these are fatal: the fetch task logs them and waits for the next
/// period.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid or unsupported URL")]
    InvalidUrl,
    #[error("DNS lookup failed")]
    Dns,
    #[error("Connection failed")]
    Connect,
    #[error("Transport I/O error")]
    Io,
    #[error("Request timed out")]
    Timeout,
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Malformed HTTP response head")]
    MalformedResponse,
    #[error("Response body exceeds buffer")]
    BodyTooLarge,
    #[error("Malformed JSON body")]
    MalformedJson,
    #[error("Price field missing from body")]
    MissingField,
    #[error("Price is not a positive number")]
    NonPositive,
}

/// Consumer of a response body, fed chunk by chunk in stream order.
pub trait BodySink {
    /// Accept the next chunk. Returning `Break` tells the client that no more
    /// bytes are wanted and the transfer may be cut short.
    fn write(&mut self, chunk: &[u8]) -> ControlFlow<()>;
}

/// HTTP GET capability.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// Fetch `url` and stream its body into `sink`.
    ///
    /// A non-2xx status is reported as [`FetchError::Status`] before any body
    /// byte reaches the sink. Implementations enforce their own timeout.
    async fn get<S: BodySink>(&mut self, url: &str, sink: &mut S) -> Result<(), FetchError>;
}
