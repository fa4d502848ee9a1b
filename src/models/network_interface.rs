use serde::{Deserialize, Serialize};

/// Defines a network interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NetworkInterface {
    /// If this field is set, the device model will reply to
    /// HTTP GET requests sent to the MMDS address via this interface.
    #[serde(rename = "allow_mmds_requests", default)]
    pub allow_mmds_requests: bool,

    /// guest mac
    #[serde(rename = "guest_mac", skip_serializing_if = "Option::is_none", default)]
    pub guest_mac: Option<String>,

    /// Host level path for the guest network interface
    /// Required: true
    #[serde(rename = "host_dev_name")]
    pub host_dev_name: String,

    /// iface id
    /// Required: true
    #[serde(rename = "iface_id")]
    pub iface_id: String,

    /// Attachment state of the device.
    #[serde(rename = "state", skip_serializing_if = "Option::is_none", default)]
    pub state: Option<DeviceState>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DeviceState {
    #[serde(rename = "Attached")]
    Attached,
    #[serde(rename = "Detached")]
    Detached,
}
