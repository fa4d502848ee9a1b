use serde::{Deserialize, Serialize};

/// Body Firecracker sends along with any non-2xx status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InternalError {
    /// A description of the error condition
    /// readOnly: true
    #[serde(rename = "fault_message")]
    pub fault_message: String,
}
