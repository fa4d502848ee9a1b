use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fireclient::{ExitReport, HypervisorOptions, Machine, Result, VmSpec};
use log::*;

#[derive(Parser)]
#[command(name = "fireclient", version, about = "Boot and supervise Firecracker microVMs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run firecracker on an API socket and forward its output until it exits.
    Supervise {
        #[command(flatten)]
        launch: LaunchArgs,
        /// Extra arguments for firecracker (after --).
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Configure and start the microVM behind an already bound API socket.
    Boot {
        /// Path to the API socket.
        #[arg(long, env = "FC_API_SOCK")]
        api_sock: PathBuf,
        /// JSON file describing the microVM.
        #[arg(long, env = "FC_VM_SPEC")]
        spec: PathBuf,
    },
    /// Launch firecracker, boot the microVM, then wait for firecracker to exit.
    Run {
        #[command(flatten)]
        launch: LaunchArgs,
        /// JSON file describing the microVM.
        #[arg(long, env = "FC_VM_SPEC")]
        spec: PathBuf,
    },
}

#[derive(clap::Args)]
struct LaunchArgs {
    /// Path to the firecracker binary.
    #[arg(long, env = "FC_BIN")]
    firecracker: String,
    /// Where firecracker binds its API socket.
    #[arg(long, env = "FC_API_SOCK")]
    api_sock: String,
    /// Seconds to wait for the API socket to appear.
    #[arg(long, default_value_t = fireclient::config::DEFAULT_LAUNCH_TIMEOUT_SECS)]
    launch_timeout: u64,
}

impl LaunchArgs {
    fn options(&self) -> HypervisorOptions {
        HypervisorOptions::new()
            .frck_bin(&self.firecracker)
            .socket_path(&self.api_sock)
            .launch_timeout(self.launch_timeout)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Fail to start tokio runtime: {e}");
            return ExitCode::from(3);
        }
    };

    match runtime.block_on(dispatch(cli.command)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn dispatch(command: Command) -> Result<u8> {
    match command {
        Command::Supervise { launch, args } => {
            let firecracker = launch.options().args(args).build()?;
            let report = firecracker.launch()?.wait().await?;
            Ok(mirror(&report))
        }
        Command::Boot { api_sock, spec } => {
            let spec = VmSpec::from_file(spec)?;
            let mut machine = Machine::connect(&api_sock, &spec.policy).await?;
            ping(&mut machine).await?;
            machine.boot_and_configure(&spec).await?;
            Ok(0)
        }
        Command::Run { launch, spec } => {
            let spec = VmSpec::from_file(spec)?;
            spec.validate()?;
            let firecracker = launch.options().build()?;
            let mut process = firecracker.launch()?;

            let booted = async {
                firecracker.waiting_socket(&mut process).await?;
                let agent = firecracker
                    .connect()
                    .await?
                    .with_request_timeout(spec.policy.request_timeout());
                let mut machine = Machine::new(agent);
                ping(&mut machine).await?;
                machine.boot_and_configure(&spec).await
            }
            .await;

            if let Err(e) = booted {
                error!("Boot failed, stopping firecracker: {e}");
                // the process may already be gone
                if let Err(kill) = process.start_kill() {
                    debug!("{kill}");
                }
                process.wait().await?;
                return Err(e);
            }

            info!("microVM {} is running, waiting for firecracker to exit", firecracker.id());
            let report = process.wait().await?;
            Ok(mirror(&report))
        }
    }
}

async fn ping(machine: &mut Machine) -> Result<()> {
    let version = machine.firecracker_version().await?;
    info!(
        "Connected to firecracker {} on {}",
        version.firecracker_version,
        machine.socket_path().display()
    );
    Ok(())
}

/// Child exit code, or 128 + signal when it was killed.
fn mirror(report: &ExitReport) -> u8 {
    match (report.code(), report.signal()) {
        (Some(code), _) => (code & 0xff) as u8,
        (None, Some(signal)) => (128 + signal).min(255) as u8,
        (None, None) => 3,
    }
}
