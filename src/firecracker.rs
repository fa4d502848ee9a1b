//! The hypervisor process: launch it on an API socket and wait for that socket.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::*;

use crate::{
    agent::SocketAgentAsync,
    config::HypervisorConfig,
    handle_entry,
    supervisor::{Console, LineSink, Supervised, Supervisor},
    Error, Result,
};

const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(10);
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

/// A firecracker binary bound to one API socket path.
#[derive(Debug, Clone)]
pub struct Firecracker {
    pub(crate) id: String,

    // Path to local firecracker bin
    pub(crate) bin: PathBuf,

    pub(crate) socket: PathBuf,

    pub(crate) extra_args: Vec<String>,

    launch_timeout: Duration,

    socket_retry: usize,
}

impl Firecracker {
    pub fn from_config(config: &HypervisorConfig) -> Result<Self> {
        config.validate()?;

        let id = match &config.id {
            Some(id) => id.clone(),
            None => uuid::Uuid::new_v4().to_string(),
        };

        let socket = match &config.socket_path {
            Some(socket) => PathBuf::from(socket),
            // format: /run/firecracker-<id>.socket
            None => PathBuf::from(format!("/run/firecracker-{id}.socket")),
        };

        Ok(Self {
            id,
            bin: handle_entry(&config.frck_bin, "firecracker bin")?.into(),
            socket,
            extra_args: config.extra_args.clone(),
            launch_timeout: Duration::from_secs(config.launch_timeout),
            socket_retry: config.socket_retry,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket
    }

    /// `--api-sock <socket>` followed by the extra arguments.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--api-sock".into(), self.socket.clone().into()];
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    pub fn launch(&self) -> Result<Supervised> {
        self.launch_with_sink(Arc::new(Console))
    }

    pub fn launch_with_sink<S: LineSink>(&self, sink: Arc<S>) -> Result<Supervised> {
        info!(
            "Launching firecracker {} for instance {} on {}",
            self.bin.display(),
            self.id,
            self.socket.display()
        );
        Supervisor::with_sink(&self.bin, self.args(), sink).spawn()
    }

    /// Wait for the API socket to appear, giving up after the launch
    /// timeout or as soon as the process exits.
    pub async fn waiting_socket(&self, process: &mut Supervised) -> Result<()> {
        let waiting = async {
            loop {
                if tokio::fs::try_exists(&self.socket).await.unwrap_or(false) {
                    return Ok(());
                }
                if let Some(status) = process.try_status()? {
                    let msg = format!("firecracker exited before binding its socket: {status}");
                    error!("{msg}");
                    return Err(Error::Supervisor(msg));
                }
                tokio::time::sleep(SOCKET_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(self.launch_timeout, waiting).await {
            Ok(res) => res,
            Err(_) => {
                let msg = format!(
                    "socket {} did not appear within {:?}",
                    self.socket.display(),
                    self.launch_timeout
                );
                error!("{msg}");
                Err(Error::Timeout(msg))
            }
        }
    }

    /// Connect to the socket, retrying while it is not accepting yet.
    pub async fn connect(&self) -> Result<SocketAgentAsync> {
        SocketAgentAsync::connect_with_retry(&self.socket, self.socket_retry, CONNECT_BACKOFF).await
    }
}
