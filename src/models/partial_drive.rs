use serde::{Deserialize, Serialize};

/// Post-boot update of a drive. The host path is the only field the
/// API accepts once the microVM runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PartialDrive {
    /// drive id
    /// Required: true
    #[serde(rename = "drive_id")]
    pub drive_id: String,

    /// Host level path for the guest drive
    #[serde(rename = "path_on_host", skip_serializing_if = "Option::is_none", default)]
    pub path_on_host: Option<String>,
}
