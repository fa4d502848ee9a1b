//! `PATCH /drives/{drive_id}`
use crate::models::{Empty, PartialDrive};
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PatchGuestDriveByIDRequest(PartialDrive);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PatchGuestDriveByIDResponse(pub Either<Empty, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PatchGuestDriveByID(pub PatchGuestDriveByIDRequest);

impl_all_firecracker_traits!(
    PatchGuestDriveByID,
    "PATCH",
    "/drives",
    PartialDrive,
    drive_id,
    Empty
);
