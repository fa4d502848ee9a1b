//! `PUT /boot-source`
use crate::models::{BootSource, Empty};
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestBootSourceRequest(BootSource);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestBootSourceResponse(pub Either<Empty, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestBootSource(pub PutGuestBootSourceRequest);

impl_all_firecracker_traits!(PutGuestBootSource, "PUT", "/boot-source", BootSource, Empty);
