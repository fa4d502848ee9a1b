//! Drive a microVM through the Firecracker API: configure, start, swap a
//! drive live.
//!
//! Every call is a blocking round trip and the next step never starts
//! before the previous one returned. The first failing call aborts the
//! whole sequence; whatever was applied before it stays applied.
use std::path::Path;

use either::Either;
use log::*;
use tokio::time::Instant;

use crate::{
    agent::SocketAgentAsync,
    config::{BootPolicy, VmSpec},
    error::ApiErrorKind,
    models::*,
    reqres::*,
    Error, Result,
};

/// Client side view of where the boot sequence is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicroVMStatus {
    None,        // nothing sent yet
    Configuring, // pre-boot resources being put
    Running,     // InstanceStart accepted
    Failure,     // a call of the sequence failed
}

/// Read-only view of the instance, assembled from three GETs.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSnapshot {
    pub info: InstanceInfo,
    pub machine_config: MachineConfiguration,
    pub mmds: MmdsContents,
}

#[derive(Debug)]
pub struct Machine {
    agent: SocketAgentAsync,
    status: MicroVMStatus,
}

impl Machine {
    pub fn new(agent: SocketAgentAsync) -> Self {
        Self {
            agent,
            status: MicroVMStatus::None,
        }
    }

    pub async fn connect<P: AsRef<Path>>(socket_path: P, policy: &BootPolicy) -> Result<Self> {
        let agent = SocketAgentAsync::connect(socket_path)
            .await?
            .with_request_timeout(policy.request_timeout());
        Ok(Self::new(agent))
    }

    pub fn status(&self) -> MicroVMStatus {
        self.status
    }

    pub fn socket_path(&self) -> &Path {
        self.agent.socket_path()
    }

    async fn execute<E: FirecrackerEvent>(
        &mut self,
        event: E,
    ) -> Result<<E::Res as FirecrackerResponse>::Succ> {
        let endpoint = event.endpoint();
        let res = self.agent.event(&event).await?;
        match res.into_either() {
            Either::Left(content) => {
                debug!("{endpoint}: ok");
                Ok(content)
            }
            Either::Right(ApiFault {
                status,
                fault_message,
            }) => {
                let kind = ApiErrorKind::classify(status, &fault_message);
                error!("{endpoint} failed with {status}: {fault_message}");
                Err(Error::Api {
                    endpoint,
                    status,
                    kind,
                    fault_message,
                })
            }
        }
    }

    pub async fn firecracker_version(&mut self) -> Result<FirecrackerVersion> {
        self.execute(GetFirecrackerVersion::new()).await
    }

    pub async fn describe_instance(&mut self) -> Result<InstanceInfo> {
        self.execute(DescribeInstance::new()).await
    }

    pub async fn machine_config(&mut self) -> Result<MachineConfiguration> {
        self.execute(GetMachineConfiguration::new()).await
    }

    pub async fn mmds(&mut self) -> Result<MmdsContents> {
        self.execute(GetMmds::new()).await
    }

    /// Instance info, machine configuration and MMDS contents.
    /// A fault on any of the three reads fails the snapshot.
    pub async fn snapshot(&mut self) -> Result<InstanceSnapshot> {
        let info = self.describe_instance().await?;
        let machine_config = self.machine_config().await?;
        let mmds = self.mmds().await?;
        Ok(InstanceSnapshot {
            info,
            machine_config,
            mmds,
        })
    }

    pub async fn put_boot_source(&mut self, boot_source: &BootSource) -> Result<()> {
        self.execute(PutGuestBootSource::new(boot_source.clone()))
            .await
            .map(drop)
    }

    pub async fn put_drive(&mut self, drive: &Drive) -> Result<()> {
        self.execute(PutGuestDriveByID::new(drive.clone()))
            .await
            .map(drop)
    }

    pub async fn put_network_interface(&mut self, iface: &NetworkInterface) -> Result<()> {
        self.execute(PutGuestNetworkInterfaceByID::new(iface.clone()))
            .await
            .map(drop)
    }

    pub async fn put_machine_config(
        &mut self,
        machine_config: &MachineConfiguration,
    ) -> Result<()> {
        self.execute(PutMachineConfiguration::new(machine_config.clone()))
            .await
            .map(drop)
    }

    pub async fn put_vsock(&mut self, vsock: &Vsock) -> Result<()> {
        self.execute(PutGuestVsock::new(vsock.clone()))
            .await
            .map(drop)
    }

    /// Put every pre-boot resource of `spec`: boot source, drives, network
    /// interfaces, machine configuration, vsock.
    pub async fn configure(&mut self, spec: &VmSpec) -> Result<()> {
        self.status = MicroVMStatus::Configuring;

        self.put_boot_source(&spec.boot_source).await?;

        for drive in &spec.drives {
            self.put_drive(drive).await?;
        }

        for iface in &spec.network_interfaces {
            self.put_network_interface(iface).await?;
        }

        self.put_machine_config(&spec.machine_config).await?;

        if let Some(vsock) = &spec.vsock {
            self.put_vsock(vsock).await?;
        }

        info!(
            "Configured {} drive(s), {} network interface(s)",
            spec.drives.len(),
            spec.network_interfaces.len()
        );
        Ok(())
    }

    /// Fire `InstanceStart`. Pre-boot only fields are frozen from here on.
    pub async fn start(&mut self) -> Result<()> {
        self.execute(CreateSyncAction::new(InstanceActionInfo::instance_start()))
            .await?;
        self.status = MicroVMStatus::Running;
        info!("Instance started");
        Ok(())
    }

    /// Poll the instance until it reports `expected`, for at most
    /// `policy.boot_timeout()`.
    pub async fn wait_for_state(
        &mut self,
        expected: State,
        policy: &BootPolicy,
    ) -> Result<InstanceInfo> {
        let deadline = Instant::now() + policy.boot_timeout();
        loop {
            let info = self.describe_instance().await?;
            if info.state == expected {
                return Ok(info);
            }
            if Instant::now() >= deadline {
                let msg = format!(
                    "instance still {:?} after {:?}, expected {expected:?}",
                    info.state,
                    policy.boot_timeout()
                );
                error!("{msg}");
                return Err(Error::Timeout(msg));
            }
            trace!("instance is {:?}, waiting for {expected:?}", info.state);
            tokio::time::sleep(policy.poll_interval()).await;
        }
    }

    /// Point a drive at another host file. This is the only drive field
    /// that may change after start.
    pub async fn patch_drive(&mut self, drive_id: &str, path_on_host: &str) -> Result<()> {
        self.execute(PatchGuestDriveByID::new(PartialDrive {
            drive_id: drive_id.to_string(),
            path_on_host: Some(path_on_host.to_string()),
        }))
        .await?;
        info!("Drive {drive_id} now backed by {path_on_host}");
        Ok(())
    }

    /// Ask the guest to re-read the geometry of `drive_id`.
    pub async fn rescan_drive(&mut self, drive_id: &str) -> Result<()> {
        self.execute(CreateSyncAction::new(InstanceActionInfo::block_device_rescan(
            drive_id,
        )))
        .await
        .map(drop)
    }

    /// Take the microVM from unconfigured to running, then apply the
    /// optional post-boot drive patch. Returns the final snapshot.
    pub async fn boot_and_configure(&mut self, spec: &VmSpec) -> Result<InstanceSnapshot> {
        spec.validate()?;
        match self.boot_sequence(spec).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                self.status = MicroVMStatus::Failure;
                error!("Boot sequence aborted: {e}");
                Err(e)
            }
        }
    }

    async fn boot_sequence(&mut self, spec: &VmSpec) -> Result<InstanceSnapshot> {
        let initial = self.snapshot().await?;
        info!("Instance before configuration: {initial:#?}");

        self.configure(spec).await?;
        self.start().await?;

        self.wait_for_state(State::Running, &spec.policy).await?;
        let booted = self.snapshot().await?;
        info!("Instance after start: {booted:#?}");

        let Some(patch) = &spec.post_boot_patch else {
            return Ok(booted);
        };

        self.patch_drive(&patch.drive_id, &patch.path_on_host).await?;
        self.rescan_drive(&patch.drive_id).await?;

        tokio::time::sleep(spec.policy.rescan_settle()).await;
        self.wait_for_state(State::Running, &spec.policy).await?;
        let rescanned = self.snapshot().await?;
        info!("Instance after rescan: {rescanned:#?}");
        Ok(rescanned)
    }
}
