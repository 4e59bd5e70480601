//! Protocol client.
//!
//! Wraps a framed TCP stream and exposes a strict request/response
//! exchange: one frame out, one frame in, in order. Connection
//! establishment retries a fixed number of times with a flat backoff
//! before giving up.

use std::io;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use roster_core::protocol::{
    decode_response, encode_request, DecodeError, FrameCodec, ProtocolError, Request, Response,
};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// How many times [`RosterClient::connect`] tries before giving up.
pub const CONNECT_ATTEMPTS: u32 = 5;

/// Pause between connection attempts.
pub const CONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// Default per-exchange timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client-side failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// All connection attempts failed.
    #[error("server unavailable after {attempts} attempts: {last}")]
    ServerUnavailable {
        /// Attempts made.
        attempts: u32,
        /// The last connect error.
        last: io::Error,
    },

    /// The server closed the connection mid-exchange.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Transport failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server sent something that is not a response.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The exchange did not complete in time.
    #[error("operation timed out")]
    Timeout,
}

/// Connection parameters.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl ClientOptions {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A connected client.
pub struct RosterClient {
    framed: Framed<TcpStream, FrameCodec>,
    timeout: Duration,
}

impl RosterClient {
    /// Connects, retrying [`CONNECT_ATTEMPTS`] times with
    /// [`CONNECT_BACKOFF`] between attempts.
    ///
    /// # Errors
    ///
    /// [`ClientError::ServerUnavailable`] when every attempt fails.
    pub async fn connect(options: &ClientOptions) -> Result<Self, ClientError> {
        let addr = options.addr();
        let mut last_err: Option<io::Error> = None;

        for attempt in 1..=CONNECT_ATTEMPTS {
            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    debug!(%addr, attempt, "connected");
                    return Ok(Self {
                        framed: Framed::new(stream, FrameCodec::new()),
                        timeout: options.timeout,
                    });
                }
                Err(err) => {
                    warn!(%addr, attempt, error = %err, "connection attempt failed");
                    last_err = Some(err);
                    if attempt < CONNECT_ATTEMPTS {
                        tokio::time::sleep(CONNECT_BACKOFF).await;
                    }
                }
            }
        }

        Err(ClientError::ServerUnavailable {
            attempts: CONNECT_ATTEMPTS,
            last: last_err.unwrap_or_else(|| io::Error::other("no attempt made")),
        })
    }

    /// Sends one request and waits for its response.
    ///
    /// # Errors
    ///
    /// Transport, decode, timeout, or early-close failures.
    pub async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        let payload = encode_request(request);

        tokio::time::timeout(self.timeout, self.framed.send(payload))
            .await
            .map_err(|_| ClientError::Timeout)??;

        let frame = tokio::time::timeout(self.timeout, self.framed.next())
            .await
            .map_err(|_| ClientError::Timeout)?
            .ok_or(ClientError::ConnectionClosed)??;

        Ok(decode_response(&frame)?)
    }
}
