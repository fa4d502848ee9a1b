//! `GET /mmds`
use crate::models::MmdsContents;
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
pub struct GetMmdsRequest;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct GetMmdsResponse(pub Either<MmdsContents, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct GetMmds(pub GetMmdsRequest);

impl_all_firecracker_traits!(GetMmds, "GET", "/mmds", MmdsContents);
