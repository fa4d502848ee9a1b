//! `PUT /network-interfaces/{iface_id}`
use crate::models::{Empty, NetworkInterface};
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestNetworkInterfaceByIDRequest(NetworkInterface);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestNetworkInterfaceByIDResponse(pub Either<Empty, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct PutGuestNetworkInterfaceByID(pub PutGuestNetworkInterfaceByIDRequest);

impl_all_firecracker_traits!(
    PutGuestNetworkInterfaceByID,
    "PUT",
    "/network-interfaces",
    NetworkInterface,
    iface_id,
    Empty
);
