use log::*;
pub mod agent;
pub mod config;
mod error;
pub mod firecracker;
pub mod machine;
pub mod models;
pub mod options;
pub mod reqres;
pub mod supervisor;
pub use crate::config::{BootPolicy, DrivePatch, HypervisorConfig, VmSpec};
pub use crate::error::{ApiErrorKind, Error, Result};
pub use crate::firecracker::Firecracker;
pub use crate::machine::{InstanceSnapshot, Machine, MicroVMStatus};
pub use crate::options::HypervisorOptions;
pub use crate::supervisor::{
    supervise, Console, ExitReport, LineSink, StreamKind, Supervised, Supervisor,
};

#[doc(hidden)]
pub(crate) fn handle_entry<T: Clone>(option: &Option<T>, name: &'static str) -> Result<T> {
    option.clone().ok_or_else(|| {
        let msg = format!("Missing {name} entry");
        error!("{msg}");
        Error::Config(msg)
    })
}
