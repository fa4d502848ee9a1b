use serde::{Deserialize, Serialize};

/// The current detailed state (Not started, Running, Paused) of the Firecracker instance.
/// This value is read-only for the control-plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum State {
    #[serde(rename = "Not started")]
    NotStarted,
    #[serde(rename = "Running")]
    Running,
    #[serde(rename = "Paused")]
    Paused,
}

/// Describes MicroVM instance information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct InstanceInfo {
    /// Application name.
    #[serde(rename = "app_name", skip_serializing_if = "Option::is_none", default)]
    pub app_name: Option<String>,

    /// MicroVM / instance ID.
    /// Required: true
    #[serde(rename = "id")]
    pub id: String,

    /// Required: true
    /// Enum: [Not started Running Paused]
    #[serde(rename = "state")]
    pub state: State,

    /// MicroVM hypervisor build version.
    /// Required: true
    #[serde(rename = "vmm_version")]
    pub vmm_version: String,
}
