//! Streaming headline extraction
//!
//! Feed documents can be far larger than the device's free memory, so they
//! are never held in full. [`FeedParser`] consumes the HTTP body as it
//! arrives, keeps at most one bounded title in flight, and stops reading as
//! soon as it has enough titles.

mod matcher;
mod parser;
mod sanitize;

pub use matcher::TagMatcher;
pub use parser::{FeedParser, MAX_TITLES, TITLE_DELIMITER, TITLE_MAX, TagSet};
pub use sanitize::{PLACEHOLDER, decode_entities, normalize_title, sanitize_non_ascii};

use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("No titles found inside any container element")]
    NoTitles,
}
