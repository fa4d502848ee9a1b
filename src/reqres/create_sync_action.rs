//! `PUT /actions`
use crate::models::{Empty, InstanceActionInfo};
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct CreateSyncActionRequest(InstanceActionInfo);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct CreateSyncActionResponse(pub Either<Empty, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct CreateSyncAction(pub CreateSyncActionRequest);

impl_all_firecracker_traits!(CreateSyncAction, "PUT", "/actions", InstanceActionInfo, Empty);
