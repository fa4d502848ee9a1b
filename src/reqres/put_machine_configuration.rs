//! `PUT /machine-config`
use crate::models::{Empty, MachineConfiguration};
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutMachineConfigurationRequest(MachineConfiguration);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutMachineConfigurationResponse(pub Either<Empty, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutMachineConfiguration(pub PutMachineConfigurationRequest);

impl_all_firecracker_traits!(
    PutMachineConfiguration,
    "PUT",
    "/machine-config",
    MachineConfiguration,
    Empty
);
