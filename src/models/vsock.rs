use serde::{Deserialize, Serialize};

/// Defines a vsock device, backed by a set of Unix Domain Sockets, on the host side.
/// For host-initiated connections, Firecracker will be listening on the Unix socket
/// identified by the path `uds_path`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vsock {
    /// vsock id
    /// Required: true
    #[serde(rename = "vsock_id")]
    pub vsock_id: String,

    /// Guest Vsock CID
    /// Required: true
    /// Minimum: 3
    #[serde(rename = "guest_cid")]
    pub guest_cid: u32,

    /// Path to UNIX domain socket, used to proxy vsock connections.
    #[serde(rename = "uds_path", skip_serializing_if = "Option::is_none", default)]
    pub uds_path: Option<String>,
}
