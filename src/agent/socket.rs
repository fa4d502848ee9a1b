//! Tokio firecracker socket agent
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use super::{parse_response, HttpResponse, MAX_BUFFER_SIZE};
use crate::reqres::{FirecrackerEvent, FirecrackerRequest};
use crate::{Error, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// A persistent HTTP/1.1 connection to the Firecracker API socket.
/// Requests are strictly sequential: one in flight at a time.
#[derive(Debug)]
pub struct SocketAgentAsync {
    socket_path: PathBuf,
    stream: UnixStream,
    // bytes read past the end of the last response
    pending: Vec<u8>,
    request_timeout: Duration,
    // set once an exchange failed halfway; a late answer may still arrive
    broken: Option<String>,
}

impl SocketAgentAsync {
    pub async fn connect<P: AsRef<Path>>(socket_path: P) -> Result<Self> {
        let socket_path = socket_path.as_ref().to_path_buf();
        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|source| Error::Connect {
                path: socket_path.clone(),
                source,
            })?;
        debug!("Connected to {}", socket_path.display());
        Ok(Self {
            socket_path,
            stream,
            pending: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            broken: None,
        })
    }

    /// Connect, retrying up to `retry` more times while the failure is
    /// transient (socket missing or refusing). The wait doubles after each
    /// attempt, starting from `backoff`.
    pub async fn connect_with_retry<P: AsRef<Path>>(
        socket_path: P,
        retry: usize,
        backoff: Duration,
    ) -> Result<Self> {
        let mut wait = backoff;
        let mut attempt = 0;
        loop {
            match Self::connect(socket_path.as_ref()).await {
                Ok(agent) => return Ok(agent),
                Err(e) if e.is_retryable() && attempt < retry => {
                    attempt += 1;
                    warn!("{e}; retrying in {wait:?} ({attempt}/{retry})");
                    tokio::time::sleep(wait).await;
                    wait = (wait * 2).min(MAX_BACKOFF);
                }
                Err(e) => {
                    error!("{e}");
                    return Err(e);
                }
            }
        }
    }

    pub fn from_stream<P: AsRef<Path>>(stream: UnixStream, socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            stream,
            pending: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            broken: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Whether a previous exchange failed and left the stream out of step.
    /// A broken agent refuses every further event; connect again instead.
    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    fn poison(&mut self, reason: String) {
        self.pending.clear();
        self.broken = Some(reason);
    }

    pub async fn send_request(&mut self, request: &[u8]) -> io::Result<()> {
        self.stream.write_all(request).await?;
        self.stream.flush().await
    }

    pub async fn recv_response(&mut self) -> io::Result<HttpResponse> {
        let mut chunk = [0u8; MAX_BUFFER_SIZE];
        loop {
            if let Some((response, used)) = parse_response(&self.pending)? {
                self.pending.drain(..used);
                if !self.pending.is_empty() {
                    warn!(
                        "Discarding {} unexpected bytes after response",
                        self.pending.len()
                    );
                    self.pending.clear();
                }
                return Ok(response);
            }

            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before a full response arrived",
                ));
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }

    /// Run a single request/response round trip.
    ///
    /// A transport failure or timeout marks the agent broken: the answer to
    /// the failed request could still arrive and would be read as the
    /// answer to the next one.
    pub async fn event<E: FirecrackerEvent>(&mut self, event: &E) -> Result<E::Res> {
        let endpoint = event.endpoint();
        if let Some(reason) = &self.broken {
            let message = format!("connection out of step after earlier failure ({reason})");
            error!("{endpoint}: {message}");
            return Err(Error::Transport { endpoint, message });
        }
        let request = event.req().encode()?;
        trace!("{endpoint} -> {request:?}");

        let timeout = self.request_timeout;
        let exchange = async {
            self.send_request(request.as_bytes()).await?;
            self.recv_response().await
        };
        let response = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let msg = e.to_string();
                error!("{endpoint}: {msg}");
                self.poison(format!("{endpoint}: {msg}"));
                return Err(Error::Transport {
                    endpoint,
                    message: msg,
                });
            }
            Err(_) => {
                let msg = format!("{endpoint}: no answer within {timeout:?}");
                error!("{msg}");
                self.poison(msg.clone());
                return Err(Error::Timeout(msg));
            }
        };
        trace!("{endpoint} <- {} ({} bytes)", response.status, response.body.len());

        E::decode(response.status, &response.body).map_err(|message| {
            error!("{endpoint}: fail to decode response: {message}");
            Error::Decode { endpoint, message }
        })
    }
}
