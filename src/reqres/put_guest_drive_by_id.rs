//! `PUT /drives/{drive_id}`
use crate::models::{Drive, Empty};
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestDriveByIDRequest(Drive);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestDriveByIDResponse(pub Either<Empty, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestDriveByID(pub PutGuestDriveByIDRequest);

impl_all_firecracker_traits!(PutGuestDriveByID, "PUT", "/drives", Drive, drive_id, Empty);
