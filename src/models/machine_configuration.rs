use serde::{Deserialize, Serialize};

use super::cpu_template::CPUTemplate;

/// Guest sizing. Must be set before `InstanceStart`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MachineConfiguration {
    /// cpu template
    #[serde(rename = "cpu_template", skip_serializing_if = "Option::is_none", default)]
    pub cpu_template: Option<CPUTemplate>,

    /// Flag for enabling/disabling simultaneous multithreading
    #[serde(rename = "smt", skip_serializing_if = "Option::is_none", default)]
    pub smt: Option<bool>,

    /// Memory size of VM
    /// Required: true
    #[serde(rename = "mem_size_mib")]
    pub mem_size_mib: u32,

    /// Enable dirty page tracking.
    #[serde(rename = "track_dirty_pages", skip_serializing_if = "Option::is_none", default)]
    pub track_dirty_pages: Option<bool>,

    /// Number of vCPUs (either 1 or an even number)
    /// Required: true
    /// Maximum: 32
    /// Minimum: 1
    #[serde(rename = "vcpu_count")]
    pub vcpu_count: u8,
}

impl MachineConfiguration {
    pub fn new(vcpu_count: u8, mem_size_mib: u32) -> Self {
        Self {
            cpu_template: None,
            smt: None,
            mem_size_mib,
            track_dirty_pages: None,
            vcpu_count,
        }
    }
}
