use serde::{Deserialize, Serialize};

/// Boot source descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BootSource {
    /// Kernel boot arguments
    #[serde(rename = "boot_args", skip_serializing_if = "Option::is_none", default)]
    pub boot_args: Option<String>,

    /// Host level path to the initrd image used to boot the guest
    #[serde(rename = "initrd_path", skip_serializing_if = "Option::is_none", default)]
    pub initrd_path: Option<String>,

    /// Host level path to the kernel image used to boot the guest
    /// Required: true
    #[serde(rename = "kernel_image_path")]
    pub kernel_image_path: String,
}

impl BootSource {
    pub fn new<S: Into<String>>(kernel_image_path: S) -> Self {
        Self {
            boot_args: None,
            initrd_path: None,
            kernel_image_path: kernel_image_path.into(),
        }
    }

    pub fn with_boot_args<S: Into<String>>(mut self, boot_args: S) -> Self {
        self.boot_args = Some(boot_args.into());
        self
    }
}
