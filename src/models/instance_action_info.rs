use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionType {
    #[serde(rename = "BlockDeviceRescan")]
    BlockDeviceRescan,
    #[serde(rename = "FlushMetrics")]
    FlushMetrics,
    #[serde(rename = "InstanceStart")]
    InstanceStart,
    #[serde(rename = "SendCtrlAltDel")]
    SendCtrlAltDel,
}

/// Variant wrapper containing the real action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct InstanceActionInfo {
    /// Enumeration indicating what type of action is contained in the payload
    /// Required: true
    #[serde(rename = "action_type")]
    pub action_type: ActionType,

    /// Action argument, e.g. the drive id of a `BlockDeviceRescan`.
    #[serde(rename = "payload", skip_serializing_if = "Option::is_none", default)]
    pub payload: Option<String>,
}

impl InstanceActionInfo {
    pub fn instance_start() -> Self {
        Self {
            action_type: ActionType::InstanceStart,
            payload: None,
        }
    }

    pub fn block_device_rescan<S: Into<String>>(drive_id: S) -> Self {
        Self {
            action_type: ActionType::BlockDeviceRescan,
            payload: Some(drive_id.into()),
        }
    }
}
