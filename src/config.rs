use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    models::{BootSource, Drive, MachineConfiguration, NetworkInterface, Vsock},
    Error, Result,
};

pub const DEFAULT_LAUNCH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SOCKET_RETRY: usize = 3;

fn config_error(msg: String) -> Error {
    error!("{msg}");
    Error::Config(msg)
}

/// How the hypervisor process is launched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HypervisorConfig {
    /// Instance id. A random uuid is allocated when missing.
    #[serde(default)]
    pub id: Option<String>,

    /// Path to the firecracker binary.
    #[serde(default)]
    pub frck_bin: Option<String>,

    /// Where firecracker binds its API socket.
    /// Defaults to `/run/firecracker-<id>.socket`.
    #[serde(default)]
    pub socket_path: Option<String>,

    /// Seconds to wait for the API socket to appear after launch.
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout: u64,

    /// Extra connect attempts once the socket exists.
    #[serde(default = "default_socket_retry")]
    pub socket_retry: usize,

    /// Arguments appended after `--api-sock <path>`.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_launch_timeout() -> u64 {
    DEFAULT_LAUNCH_TIMEOUT_SECS
}

fn default_socket_retry() -> usize {
    DEFAULT_SOCKET_RETRY
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            id: None,
            frck_bin: None,
            socket_path: None,
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT_SECS,
            socket_retry: DEFAULT_SOCKET_RETRY,
            extra_args: Vec::new(),
        }
    }
}

impl HypervisorConfig {
    pub fn validate(&self) -> Result<()> {
        match &self.frck_bin {
            None => return Err(config_error("Missing firecracker bin entry".to_string())),
            Some(bin) if bin.trim().is_empty() => {
                return Err(config_error("Empty firecracker bin entry".to_string()))
            }
            Some(_) => (),
        }

        if let Some(path) = &self.socket_path {
            // firecracker refuses to bind over an existing file
            if Path::new(path).exists() {
                return Err(config_error(format!("Socket {path} already exists")));
            }
        }

        if self.launch_timeout == 0 {
            return Err(config_error("Launch timeout must be positive".to_string()));
        }

        Ok(())
    }
}

/// Post-boot change of a drive's backing file, followed by a rescan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrivePatch {
    pub drive_id: String,
    pub path_on_host: String,
}

/// Timing of the boot sequence. All values are milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootPolicy {
    /// Upper bound for the instance to report `Running`.
    pub boot_timeout_ms: u64,
    /// Delay between two state polls.
    pub poll_interval_ms: u64,
    /// Pause after a rescan before polling again.
    pub rescan_settle_ms: u64,
    /// Upper bound for a single API round trip.
    pub request_timeout_ms: u64,
}

impl Default for BootPolicy {
    fn default() -> Self {
        Self {
            boot_timeout_ms: 5000,
            poll_interval_ms: 100,
            rescan_settle_ms: 250,
            request_timeout_ms: 10_000,
        }
    }
}

impl BootPolicy {
    pub fn boot_timeout(&self) -> Duration {
        Duration::from_millis(self.boot_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn rescan_settle(&self) -> Duration {
        Duration::from_millis(self.rescan_settle_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Declarative description of one microVM: everything sent before
/// `InstanceStart`, plus the optional live drive swap afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmSpec {
    pub boot_source: BootSource,

    #[serde(default)]
    pub drives: Vec<Drive>,

    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,

    pub machine_config: MachineConfiguration,

    #[serde(default)]
    pub vsock: Option<Vsock>,

    #[serde(default)]
    pub post_boot_patch: Option<DrivePatch>,

    #[serde(default)]
    pub policy: BootPolicy,
}

impl VmSpec {
    pub fn new(boot_source: BootSource, machine_config: MachineConfiguration) -> Self {
        Self {
            boot_source,
            drives: Vec::new(),
            network_interfaces: Vec::new(),
            machine_config,
            vsock: None,
            post_boot_patch: None,
            policy: BootPolicy::default(),
        }
    }

    pub fn with_drive(mut self, drive: Drive) -> Self {
        self.drives.push(drive);
        self
    }

    pub fn with_network_interface(mut self, iface: NetworkInterface) -> Self {
        self.network_interfaces.push(iface);
        self
    }

    pub fn with_vsock(mut self, vsock: Vsock) -> Self {
        self.vsock = Some(vsock);
        self
    }

    pub fn with_post_boot_patch<I: Into<String>, P: Into<String>>(
        mut self,
        drive_id: I,
        path_on_host: P,
    ) -> Self {
        self.post_boot_patch = Some(DrivePatch {
            drive_id: drive_id.into(),
            path_on_host: path_on_host.into(),
        });
        self
    }

    pub fn with_policy(mut self, policy: BootPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| config_error(format!("Bad vm spec: {e}")))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path: PathBuf = path.as_ref().into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| config_error(format!("Fail to read {}: {e}", path.display())))?;
        let spec = Self::from_json(&content)?;
        info!("Loaded vm spec from {}", path.display());
        Ok(spec)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| Error::Encode(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.boot_source.kernel_image_path.trim().is_empty() {
            return Err(config_error("Kernel image path must be specified".to_string()));
        }

        let mut drive_ids = HashSet::new();
        let mut roots = 0;
        for drive in &self.drives {
            check_id("drive", &drive.drive_id)?;
            if !drive_ids.insert(drive.drive_id.as_str()) {
                return Err(config_error(format!("Duplicate drive id {}", drive.drive_id)));
            }
            if drive.path_on_host.trim().is_empty() {
                return Err(config_error(format!(
                    "Drive {} has no host path",
                    drive.drive_id
                )));
            }
            if drive.is_root_device {
                roots += 1;
            }
        }
        if roots > 1 {
            return Err(config_error("At most one root device is allowed".to_string()));
        }

        let mut iface_ids = HashSet::new();
        for iface in &self.network_interfaces {
            check_id("network interface", &iface.iface_id)?;
            if !iface_ids.insert(iface.iface_id.as_str()) {
                return Err(config_error(format!(
                    "Duplicate network interface id {}",
                    iface.iface_id
                )));
            }
        }

        let vcpus = self.machine_config.vcpu_count;
        if vcpus == 0 || vcpus > 32 || (vcpus != 1 && vcpus % 2 != 0) {
            return Err(config_error(format!(
                "vcpu_count must be 1 or an even number up to 32, got {vcpus}"
            )));
        }
        if self.machine_config.mem_size_mib == 0 {
            return Err(config_error("mem_size_mib must be positive".to_string()));
        }

        if let Some(vsock) = &self.vsock {
            check_id("vsock", &vsock.vsock_id)?;
            if vsock.guest_cid < 3 {
                return Err(config_error(format!(
                    "Vsock guest cid must be at least 3, got {}",
                    vsock.guest_cid
                )));
            }
        }

        if let Some(patch) = &self.post_boot_patch {
            check_id("patched drive", &patch.drive_id)?;
            if patch.path_on_host.trim().is_empty() {
                return Err(config_error("Patched drive has no host path".to_string()));
            }
            if !drive_ids.contains(patch.drive_id.as_str()) {
                warn!(
                    "Patched drive {} is not among the configured drives",
                    patch.drive_id
                );
            }
        }

        if self.policy.boot_timeout_ms == 0 || self.policy.poll_interval_ms == 0 {
            return Err(config_error(
                "boot_timeout_ms and poll_interval_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// ids end up in the request path
fn check_id(what: &str, id: &str) -> Result<()> {
    if id.is_empty() || id.chars().any(|c| c == '/' || c.is_whitespace()) {
        return Err(config_error(format!("Invalid {what} id {id:?}")));
    }
    Ok(())
}
