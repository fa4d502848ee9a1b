//! `GET /machine-config`
use crate::models::MachineConfiguration;
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
pub struct GetMachineConfigurationRequest;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct GetMachineConfigurationResponse(pub Either<MachineConfiguration, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct GetMachineConfiguration(pub GetMachineConfigurationRequest);

impl_all_firecracker_traits!(
    GetMachineConfiguration,
    "GET",
    "/machine-config",
    MachineConfiguration
);
