//! `GET /`
use crate::models::FirecrackerVersion;
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
pub struct GetFirecrackerVersionRequest;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct GetFirecrackerVersionResponse(pub Either<FirecrackerVersion, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct GetFirecrackerVersion(pub GetFirecrackerVersionRequest);

impl_all_firecracker_traits!(GetFirecrackerVersion, "GET", "/", FirecrackerVersion);
