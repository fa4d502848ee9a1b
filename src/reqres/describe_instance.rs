//! `GET /instance`
use crate::models::InstanceInfo;
use crate::reqres::ApiFault;
use either::Either;

#[derive(Debug, Clone)]
pub struct DescribeInstanceRequest;

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct DescribeInstanceResponse(pub Either<InstanceInfo, ApiFault>);

#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct DescribeInstance(pub DescribeInstanceRequest);

impl_all_firecracker_traits!(DescribeInstance, "GET", "/instance", InstanceInfo);
