//! Minimal HTTP/1.0 plumbing for plain-TCP clients
//!
//! Requests are sent as HTTP/1.0 with `Connection: close`, so servers answer
//! with a plain (never chunked) body that simply ends when the connection
//! closes. The response head is parsed incrementally, like the feed itself.

use alloc::format;
use alloc::string::String;
use core::ops::ControlFlow;

use embedded_io_async::Read;
use log::debug;

use super::{BodySink, FetchError};
use crate::feed::TagMatcher;

/// Upper bound on the response head; anything longer is treated as malformed.
pub const MAX_HEAD_LEN: usize = 8 * 1024;

const STATUS_LINE_MAX: usize = 64;

/// URL scheme. Whether a scheme can actually be served is up to the
/// [`HttpClient`](super::HttpClient) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Parsed `http(s)://host[:port][/path]` URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Url<'a> {
    pub scheme: Scheme,
    pub host: &'a str,
    pub port: u16,
    /// Path and query, always starting with `/`.
    pub path: &'a str,
}

impl<'a> Url<'a> {
    pub fn parse(url: &'a str) -> Result<Self, FetchError> {
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else if let Some(rest) = url.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else {
            return Err(FetchError::InvalidUrl);
        };

        let (authority, path) = match rest.find(['/', '?']) {
            Some(i) if rest.as_bytes()[i] == b'/' => (&rest[..i], &rest[i..]),
            // A bare query still needs a path
            Some(i) => (&rest[..i], "/"),
            None => (rest, "/"),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().map_err(|_| FetchError::InvalidUrl)?),
            None => (authority, scheme.default_port()),
        };

        if host.is_empty() || host.contains('@') {
            return Err(FetchError::InvalidUrl);
        }

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }

    /// The request head for a GET of this URL.
    pub fn request(&self) -> String {
        format!(
            "GET {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: ticker/0.1\r\nAccept: */*\r\nConnection: close\r\n\r\n",
            self.path, self.host
        )
    }
}

/// Progress of [`ResponseHead::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadProgress {
    NeedMore,
    /// The head ended; body bytes start at `body_offset` in the last chunk.
    Complete { status: u16, body_offset: usize },
}

/// Incremental parser for an HTTP response status line and headers.
pub struct ResponseHead {
    status_line: heapless::Vec<u8, STATUS_LINE_MAX>,
    status_line_done: bool,
    end_of_head: TagMatcher,
    seen: usize,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHead {
    pub fn new() -> Self {
        Self {
            status_line: heapless::Vec::new(),
            status_line_done: false,
            end_of_head: TagMatcher::new(b"\r\n\r\n"),
            seen: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<HeadProgress, FetchError> {
        for (i, &byte) in chunk.iter().enumerate() {
            self.seen += 1;
            if self.seen > MAX_HEAD_LEN {
                return Err(FetchError::MalformedResponse);
            }

            if !self.status_line_done {
                if byte == b'\n' {
                    self.status_line_done = true;
                } else {
                    // Overlong status lines are cut; the code is near the start
                    self.status_line.push(byte).ok();
                }
            }

            if self.end_of_head.feed(byte) {
                let status = parse_status_line(&self.status_line)
                    .ok_or(FetchError::MalformedResponse)?;
                return Ok(HeadProgress::Complete {
                    status,
                    body_offset: i + 1,
                });
            }
        }
        Ok(HeadProgress::NeedMore)
    }
}

/// Extract the status code from `HTTP/1.x NNN Reason`.
pub fn parse_status_line(line: &[u8]) -> Option<u16> {
    let line = core::str::from_utf8(line).ok()?;
    let mut parts = line.split_ascii_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok()
}

/// Read a complete response from `reader`, streaming the body into `sink`.
///
/// Stops at end of stream or as soon as the sink signals it has enough.
/// Returns the number of body bytes delivered.
pub async fn read_response<R, S>(
    reader: &mut R,
    sink: &mut S,
    buf: &mut [u8],
) -> Result<usize, FetchError>
where
    R: Read,
    S: BodySink,
{
    let mut head = ResponseHead::new();

    let first_body = loop {
        let n = reader.read(buf).await.map_err(|_| FetchError::Io)?;
        if n == 0 {
            return Err(FetchError::MalformedResponse);
        }
        if let HeadProgress::Complete {
            status,
            body_offset,
        } = head.push(&buf[..n])?
        {
            if !(200..300).contains(&status) {
                return Err(FetchError::Status(status));
            }
            break body_offset..n;
        }
    };

    let mut delivered = first_body.len();
    if sink.write(&buf[first_body]).is_break() {
        return Ok(delivered);
    }

    loop {
        let n = reader.read(buf).await.map_err(|_| FetchError::Io)?;
        if n == 0 {
            break;
        }
        delivered += n;
        if let ControlFlow::Break(()) = sink.write(&buf[..n]) {
            debug!("Body sink satisfied after {} bytes", delivered);
            break;
        }
    }
    Ok(delivered)
}
