//! HTTP client over embassy-net TCP sockets

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Ipv4Address, Stack};
use embassy_time::{Duration, with_timeout};
use embedded_io_async::{ErrorKind, ErrorType, Read};
use log::debug;
use ticker_core::net::http::{Scheme, Url, read_response};
use ticker_core::net::{BodySink, FetchError, HttpClient};

const RX_BUFFER_LEN: usize = 4096;
const TX_BUFFER_LEN: usize = 512;
const CHUNK_LEN: usize = 1024;

/// One request at a time over a fresh TCP connection.
///
/// The socket buffers live in the client, so it is meant to be owned by a
/// single long-lived task.
pub struct TcpHttpClient {
    stack: Stack<'static>,
    timeout: Duration,
    rx_buffer: [u8; RX_BUFFER_LEN],
    tx_buffer: [u8; TX_BUFFER_LEN],
    chunk: [u8; CHUNK_LEN],
}

impl TcpHttpClient {
    /// `timeout` bounds a whole request, from DNS lookup to the last body byte.
    pub fn new(stack: Stack<'static>, timeout: Duration) -> Self {
        Self {
            stack,
            timeout,
            rx_buffer: [0; RX_BUFFER_LEN],
            tx_buffer: [0; TX_BUFFER_LEN],
            chunk: [0; CHUNK_LEN],
        }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, FetchError> {
        if let Ok(ip) = host.parse::<Ipv4Address>() {
            return Ok(IpAddress::Ipv4(ip));
        }
        self.stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|_| FetchError::Dns)?
            .first()
            .copied()
            .ok_or(FetchError::Dns)
    }

    async fn exchange<S: BodySink>(
        &mut self,
        url: &Url<'_>,
        sink: &mut S,
    ) -> Result<(), FetchError> {
        let address = self.resolve(url.host).await?;

        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.set_timeout(Some(self.timeout));
        socket
            .connect((address, url.port))
            .await
            .map_err(|_| FetchError::Connect)?;

        let request = url.request();
        let mut pending = request.as_bytes();
        while !pending.is_empty() {
            let written = socket.write(pending).await.map_err(|_| FetchError::Io)?;
            pending = &pending[written..];
        }
        socket.flush().await.map_err(|_| FetchError::Io)?;

        let result = read_response(&mut SocketReader(&mut socket), sink, &mut self.chunk).await;
        socket.close();
        let delivered = result?;
        debug!("GET {}{} done, {} body bytes", url.host, url.path, delivered);
        Ok(())
    }
}

impl HttpClient for TcpHttpClient {
    async fn get<S: BodySink>(&mut self, url: &str, sink: &mut S) -> Result<(), FetchError> {
        let url = Url::parse(url)?;
        // No TLS stack on the device
        if url.scheme != Scheme::Http {
            return Err(FetchError::InvalidUrl);
        }
        with_timeout(self.timeout, self.exchange(&url, sink))
            .await
            .map_err(|_| FetchError::Timeout)?
    }
}

/// Reads through the socket's own async API; a closed peer reads as `Ok(0)`.
struct SocketReader<'s, 'a>(&'s mut TcpSocket<'a>);

impl ErrorType for SocketReader<'_, '_> {
    type Error = ErrorKind;
}

impl Read for SocketReader<'_, '_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.0.read(buf).await.map_err(|_| ErrorKind::ConnectionReset)
    }
}
