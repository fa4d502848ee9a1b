//! Typed requests and responses, one module per API operation.
use crate::agent::{serialize_request, HttpRequest};
use crate::models::InternalError;
use crate::Result;
use either::Either;
use serde::de::DeserializeOwned;

/// A non-2xx answer from Firecracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFault {
    pub status: u16,
    pub fault_message: String,
}

pub trait FirecrackerRequest {
    fn method(&self) -> &'static str;
    fn path(&self) -> String;
    fn body(&self) -> Result<Option<String>>;

    fn encode(&self) -> Result<String> {
        let request = HttpRequest::new(self.method(), &self.path(), self.body()?);
        Ok(serialize_request(&request))
    }
}

pub trait FirecrackerResponse: Sized {
    type Succ: DeserializeOwned;

    fn create_succ(content: Self::Succ) -> Self;
    fn create_fail(fault: ApiFault) -> Self;
    fn as_either(&self) -> &Either<Self::Succ, ApiFault>;
    fn into_either(self) -> Either<Self::Succ, ApiFault>;

    fn is_succ(&self) -> bool {
        self.as_either().is_left()
    }

    fn is_err(&self) -> bool {
        self.as_either().is_right()
    }

    fn succ(&self) -> Option<&Self::Succ> {
        self.as_either().as_ref().left()
    }

    fn err(&self) -> Option<&ApiFault> {
        self.as_either().as_ref().right()
    }

    /// 2xx bodies decode as `Succ` (an empty body as `{}`); anything else
    /// becomes an [`ApiFault`].
    fn decode(status: u16, payload: &[u8]) -> std::result::Result<Self, String> {
        if (200..300).contains(&status) {
            let payload: &[u8] = if payload.iter().all(u8::is_ascii_whitespace) {
                b"{}"
            } else {
                payload
            };
            serde_json::from_slice::<Self::Succ>(payload)
                .map(Self::create_succ)
                .map_err(|e| e.to_string())
        } else {
            let fault_message = match serde_json::from_slice::<InternalError>(payload) {
                Ok(InternalError { fault_message }) => fault_message,
                Err(_) => String::from_utf8_lossy(payload).trim().to_string(),
            };
            Ok(Self::create_fail(ApiFault {
                status,
                fault_message,
            }))
        }
    }
}

pub trait FirecrackerEvent {
    type Req: FirecrackerRequest;
    type Res: FirecrackerResponse;

    fn req(&self) -> &Self::Req;

    /// `METHOD /path`, used to tag logs and errors.
    fn endpoint(&self) -> String {
        format!("{} {}", self.req().method(), self.req().path())
    }

    fn decode(status: u16, payload: &[u8]) -> std::result::Result<Self::Res, String> {
        Self::Res::decode(status, payload)
    }
}

macro_rules! impl_firecracker_response {
    ($name:ident, $succ:ty) => {
        paste::paste! {
            impl $crate::reqres::FirecrackerResponse for [<$name Response>] {
                type Succ = $succ;

                #[inline]
                fn create_succ(content: Self::Succ) -> Self {
                    Self(either::Left(content))
                }

                #[inline]
                fn create_fail(fault: $crate::reqres::ApiFault) -> Self {
                    Self(either::Right(fault))
                }

                #[inline]
                fn as_either(&self) -> &either::Either<Self::Succ, $crate::reqres::ApiFault> {
                    &self.0
                }

                #[inline]
                fn into_either(self) -> either::Either<Self::Succ, $crate::reqres::ApiFault> {
                    self.0
                }
            }
        }
    };
}

macro_rules! impl_firecracker_event {
    ($name:ident) => {
        paste::paste! {
            impl $crate::reqres::FirecrackerEvent for $name {
                type Req = [<$name Request>];
                type Res = [<$name Response>];

                fn req(&self) -> &Self::Req {
                    &self.0
                }
            }
        }
    };
}

macro_rules! impl_all_firecracker_traits {
    // without body
    ($name:ident, $method:literal, $endpoint:literal, $succ:ty) => {
        paste::paste! {
            impl [<$name Request>] {
                pub fn new() -> Self {
                    Self
                }
            }

            impl $name {
                pub fn new() -> Self {
                    Self([<$name Request>])
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl $crate::reqres::FirecrackerRequest for [<$name Request>] {
                fn method(&self) -> &'static str {
                    $method
                }

                fn path(&self) -> String {
                    $endpoint.to_string()
                }

                fn body(&self) -> $crate::Result<Option<String>> {
                    Ok(None)
                }
            }
        }
        impl_firecracker_response!($name, $succ);
        impl_firecracker_event!($name);
    };
    // with body
    ($name:ident, $method:literal, $endpoint:literal, $payload:ty, $succ:ty) => {
        impl_all_firecracker_traits!(@payload $name, $payload);
        paste::paste! {
            impl $crate::reqres::FirecrackerRequest for [<$name Request>] {
                fn method(&self) -> &'static str {
                    $method
                }

                fn path(&self) -> String {
                    $endpoint.to_string()
                }

                fn body(&self) -> $crate::Result<Option<String>> {
                    serde_json::to_string(&self.0)
                        .map(Some)
                        .map_err(|e| $crate::Error::Encode(e.to_string()))
                }
            }
        }
        impl_firecracker_response!($name, $succ);
        impl_firecracker_event!($name);
    };
    // with body and id
    ($name:ident, $method:literal, $endpoint:literal, $payload:ty, $id:ident, $succ:ty) => {
        impl_all_firecracker_traits!(@payload $name, $payload);
        paste::paste! {
            impl $crate::reqres::FirecrackerRequest for [<$name Request>] {
                fn method(&self) -> &'static str {
                    $method
                }

                fn path(&self) -> String {
                    format!("{}/{}", $endpoint, self.0.$id)
                }

                fn body(&self) -> $crate::Result<Option<String>> {
                    serde_json::to_string(&self.0)
                        .map(Some)
                        .map_err(|e| $crate::Error::Encode(e.to_string()))
                }
            }
        }
        impl_firecracker_response!($name, $succ);
        impl_firecracker_event!($name);
    };
    (@payload $name:ident, $payload:ty) => {
        paste::paste! {
            impl [<$name Request>] {
                pub fn new(payload: $payload) -> Self {
                    Self(payload)
                }

                pub fn payload(&self) -> &$payload {
                    &self.0
                }
            }

            impl $name {
                pub fn new(payload: $payload) -> Self {
                    Self([<$name Request>]::new(payload))
                }
            }
        }
    };
}

pub mod create_sync_action;
pub use create_sync_action::CreateSyncAction;
pub mod describe_instance;
pub use describe_instance::DescribeInstance;
pub mod get_firecracker_version;
pub use get_firecracker_version::GetFirecrackerVersion;
pub mod get_machine_configuration;
pub use get_machine_configuration::GetMachineConfiguration;
pub mod get_mmds;
pub use get_mmds::GetMmds;

pub mod patch_guest_drive_by_id;
pub use patch_guest_drive_by_id::PatchGuestDriveByID;

pub mod put_guest_boot_source;
pub use put_guest_boot_source::PutGuestBootSource;
pub mod put_guest_drive_by_id;
pub use put_guest_drive_by_id::PutGuestDriveByID;
pub mod put_guest_network_interface_by_id;
pub use put_guest_network_interface_by_id::PutGuestNetworkInterfaceByID;
pub mod put_guest_vsock;
pub use put_guest_vsock::PutGuestVsock;
pub mod put_machine_configuration;
pub use put_machine_configuration::PutMachineConfiguration;

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::*;

    fn split(encoded: &str) -> (&str, &str) {
        let (head, body) = encoded.split_once("\r\n\r\n").unwrap();
        (head.lines().next().unwrap(), body)
    }

    #[test]
    fn test_encode_with_id_in_path() {
        let drive = Drive::new("rootfs", "./hello-rootfs.ext4").as_root_device();
        let event = PutGuestDriveByID::new(drive);
        assert_eq!(event.endpoint(), "PUT /drives/rootfs");
        let encoded = event.req().encode().unwrap();
        let (line, body) = split(&encoded);
        assert_eq!(line, "PUT /drives/rootfs HTTP/1.1");
        let drive: Drive = serde_json::from_str(body).unwrap();
        assert!(drive.is_root_device);
        assert!(!drive.is_read_only);
    }

    #[test]
    fn test_patch_drive_only_carries_path() {
        let event = PatchGuestDriveByID::new(PartialDrive {
            drive_id: "hotDummy".into(),
            path_on_host: Some("./real.img".into()),
        });
        let encoded = event.req().encode().unwrap();
        let (line, body) = split(&encoded);
        assert_eq!(line, "PATCH /drives/hotDummy HTTP/1.1");
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["drive_id".to_string(), "path_on_host".to_string()]);
    }

    #[test]
    fn test_rescan_action_body() {
        let event = CreateSyncAction::new(InstanceActionInfo::block_device_rescan("hotDummy"));
        assert_eq!(event.endpoint(), "PUT /actions");
        let encoded = event.req().encode().unwrap();
        let (_, body) = split(&encoded);
        assert_eq!(
            body,
            r#"{"action_type":"BlockDeviceRescan","payload":"hotDummy"}"#
        );
    }

    #[test]
    fn test_get_has_no_body() {
        let encoded = DescribeInstance::new().req().encode().unwrap();
        assert!(encoded.starts_with("GET /instance HTTP/1.1\r\n"));
        assert!(encoded.ends_with("\r\n\r\n"));
        assert!(!encoded.contains("Content-Length"));
    }

    #[test]
    fn test_decode_no_content_and_fault() {
        let res = CreateSyncAction::decode(204, b"").unwrap();
        assert!(res.is_succ());

        let res = CreateSyncAction::decode(
            400,
            br#"{"fault_message":"The requested operation is not supported after starting the microVM."}"#,
        )
        .unwrap();
        let fault = res.err().unwrap();
        assert_eq!(fault.status, 400);
        assert!(fault.fault_message.contains("after starting"));

        // non-JSON fault bodies are kept verbatim
        let res = DescribeInstance::decode(500, b"oops\n").unwrap();
        assert_eq!(res.err().unwrap().fault_message, "oops");
    }

    #[test]
    fn test_decode_instance_info() {
        let body = br#"{"app_name":"Firecracker","id":"anonymous-instance","state":"Running","vmm_version":"1.7.0"}"#;
        let res = DescribeInstance::decode(200, body).unwrap();
        let info = res.into_either().left().unwrap();
        assert_eq!(info.state, State::Running);
        assert_eq!(info.app_name.as_deref(), Some("Firecracker"));

        assert!(DescribeInstance::decode(200, b"").is_err());
    }
}
