//! Request and response bodies of the Firecracker API.
pub mod boot_source;
pub mod cpu_template;
pub mod drive;
pub mod error;
pub mod firecracker_version;
pub mod instance_action_info;
pub mod instance_info;
pub mod machine_configuration;
pub mod network_interface;
pub mod partial_drive;
pub mod vsock;

pub use boot_source::BootSource;
pub use cpu_template::CPUTemplate;
pub use drive::{CacheType, Drive, IoEngine};
pub use error::InternalError;
pub use firecracker_version::FirecrackerVersion;
pub use instance_action_info::{ActionType, InstanceActionInfo};
pub use instance_info::{InstanceInfo, State};
pub use machine_configuration::MachineConfiguration;
pub use network_interface::{DeviceState, NetworkInterface};
pub use partial_drive::PartialDrive;
pub use vsock::Vsock;

use serde::{Deserialize, Serialize};

/// Body of a `204 No Content` answer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Empty {}

/// Arbitrary JSON document held by the metadata service.
pub type MmdsContents = serde_json::Value;
