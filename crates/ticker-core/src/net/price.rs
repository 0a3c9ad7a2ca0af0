//! Price quote extraction
//!
//! Quote endpoints answer with a small JSON object such as
//! `{"bitcoin":{"jpy":6030000}}`. The body is collected into a fixed buffer
//! and the value is looked up as `body[asset][currency]`.

use core::ops::ControlFlow;

use serde_json::Value;

use super::{BodySink, FetchError};

/// Largest price response accepted.
pub const PRICE_BODY_MAX: usize = 1024;

/// Fixed-capacity collector for a price response body.
#[derive(Default)]
pub struct PriceBody {
    bytes: heapless::Vec<u8, PRICE_BODY_MAX>,
    overflowed: bool,
}

impl PriceBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Extract the quote from the collected body.
    pub fn parse(&self, asset: &str, currency: &str) -> Result<f64, FetchError> {
        if self.overflowed {
            return Err(FetchError::BodyTooLarge);
        }
        parse_price(&self.bytes, asset, currency)
    }
}

impl BodySink for PriceBody {
    fn write(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        if self.bytes.extend_from_slice(chunk).is_err() {
            self.overflowed = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

/// Read `body[asset][currency]` as a strictly positive number.
pub fn parse_price(body: &[u8], asset: &str, currency: &str) -> Result<f64, FetchError> {
    let document: Value = serde_json::from_slice(body).map_err(|_| FetchError::MalformedJson)?;

    let value = document
        .get(asset)
        .and_then(|quote| quote.get(currency))
        .and_then(Value::as_f64)
        .ok_or(FetchError::MissingField)?;

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FetchError::NonPositive)
    }
}
