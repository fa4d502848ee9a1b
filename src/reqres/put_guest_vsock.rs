//! `PUT /vsock/{vsock_id}`
use crate::models::{Empty, Vsock};
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestVsockRequest(Vsock);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestVsockResponse(pub Either<Empty, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestVsock(pub PutGuestVsockRequest);

impl_all_firecracker_traits!(PutGuestVsock, "PUT", "/vsock", Vsock, vsock_id, Empty);
