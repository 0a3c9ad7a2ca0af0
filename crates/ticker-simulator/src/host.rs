//! Host stand-ins for the device's network link, SNTP clock and HTTP client

use std::io::{ErrorKind, Read};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info};
use reqwest::blocking::Client;
use ticker_core::link::{Link, TimeSync};
use ticker_core::net::http::Url;
use ticker_core::net::{BodySink, FetchError, HttpClient};

/// Read size when streaming a response body into a sink.
const CHUNK_LEN: usize = 1024;

/// The desktop is assumed to be online.
pub struct HostLink;

impl Link for HostLink {
    fn begin_connect(&mut self) {
        info!("Using the host network");
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn rssi(&self) -> Option<i8> {
        None
    }
}

/// The operating system clock, which is already synchronised.
pub struct SystemClock;

impl TimeSync for SystemClock {
    fn start_sync(&self) {}

    fn epoch_secs(&self) -> Option<u64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|elapsed| elapsed.as_secs())
    }
}

/// Blocking `reqwest` client. It runs on the fetch thread, so blocking inside
/// the async calls only stalls that thread.
pub struct ReqwestHttpClient {
    client: Client,
    chunk: Vec<u8>,
}

impl ReqwestHttpClient {
    /// Build a client whose whole request, body included, is bounded by
    /// `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ticker-simulator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            chunk: vec![0; CHUNK_LEN],
        })
    }
}

impl HttpClient for ReqwestHttpClient {
    async fn get<S: BodySink>(&mut self, url: &str, sink: &mut S) -> Result<(), FetchError> {
        // Same URL rules as the device, so bad overrides fail identically
        Url::parse(url)?;

        let mut response = self.client.get(url).send().map_err(map_request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let delivered = copy_body(&mut response, sink, &mut self.chunk)?;
        debug!("GET {} done, {} body bytes", url, delivered);
        Ok(())
    }
}

fn map_request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_builder() {
        FetchError::InvalidUrl
    } else if e.is_connect() {
        FetchError::Connect
    } else {
        FetchError::Io
    }
}

/// Stream `reader` into `sink` until end of body or until the sink has had
/// enough. Returns the number of bytes handed over.
fn copy_body<R: Read, S: BodySink>(
    reader: &mut R,
    sink: &mut S,
    buf: &mut [u8],
) -> Result<usize, FetchError> {
    let mut delivered = 0;
    loop {
        let n = match reader.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                return Err(FetchError::Timeout);
            }
            Err(_) => return Err(FetchError::Io),
        };
        delivered += n;
        if sink.write(&buf[..n]).is_break() {
            debug!("Body sink satisfied after {} bytes", delivered);
            break;
        }
    }
    Ok(delivered)
}
