use serde::{Deserialize, Serialize};

/// A block device backed by a file on the host.
///
/// `is_root_device` and `is_read_only` are fixed once the microVM has been
/// started. Only `path_on_host` can change afterwards, through
/// [`PartialDrive`](super::PartialDrive).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Drive {
    /// drive id
    /// Required: true
    #[serde(rename = "drive_id")]
    pub drive_id: String,

    /// partuuid
    /// Represents the unique id of the boot partition of this device.
    /// It is optional and it will be taken into account
    /// only if the is_root_device field is true.
    #[serde(rename = "partuuid", skip_serializing_if = "Option::is_none", default)]
    pub partuuid: Option<String>,

    /// is root device
    /// Required: true
    #[serde(rename = "is_root_device")]
    pub is_root_device: bool,

    /// cache type
    /// Represents the caching strategy for the block device.
    #[serde(rename = "cache_type", skip_serializing_if = "Option::is_none", default)]
    pub cache_type: Option<CacheType>,

    /// Is block read only.
    /// Required: true
    #[serde(rename = "is_read_only")]
    pub is_read_only: bool,

    /// Host level path for the guest drive.
    /// Required: true
    #[serde(rename = "path_on_host")]
    pub path_on_host: String,

    /// Type of the IO engine used by the device. "Async" is supported on
    /// host kernels newer than 5.10.51.
    #[serde(rename = "io_engine", skip_serializing_if = "Option::is_none", default)]
    pub io_engine: Option<IoEngine>,
}

impl Drive {
    /// A writable, non-root drive.
    pub fn new<I: Into<String>, P: Into<String>>(drive_id: I, path_on_host: P) -> Self {
        Self {
            drive_id: drive_id.into(),
            partuuid: None,
            is_root_device: false,
            cache_type: None,
            is_read_only: false,
            path_on_host: path_on_host.into(),
            io_engine: None,
        }
    }

    pub fn as_root_device(mut self) -> Self {
        self.is_root_device = true;
        self
    }

    pub fn as_read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum CacheType {
    #[serde(rename = "Unsafe")]
    Unsafe,
    #[serde(rename = "Writeback")]
    Writeback,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IoEngine {
    #[serde(rename = "Sync")]
    Sync,
    #[serde(rename = "Async")]
    Async,
}
