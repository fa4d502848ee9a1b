use crate::config::HypervisorConfig;
use crate::firecracker::Firecracker;
use crate::Result;

/// Builder for [`HypervisorConfig`].
#[derive(Debug, Clone, Default)]
pub struct HypervisorOptions {
    config: HypervisorConfig,
}

impl HypervisorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(self) -> Result<Self> {
        self.config.validate()?;
        Ok(self)
    }

    pub fn build(&self) -> Result<Firecracker> {
        Firecracker::from_config(&self.config)
    }

    pub fn config(&self) -> &HypervisorConfig {
        &self.config
    }

    /// Instance id.
    /// If set to None, a random one is allocated.
    pub fn id<S: AsRef<str>>(mut self, id: S) -> Self {
        self.config.id = Some(id.as_ref().into());
        self
    }

    /// Seconds to wait for the API socket after launching
    pub fn launch_timeout(mut self, timeout: u64) -> Self {
        self.config.launch_timeout = timeout;
        self
    }

    /// Path to firecracker binary
    pub fn frck_bin<P: AsRef<str>>(mut self, path: P) -> Self {
        self.config.frck_bin = Some(path.as_ref().into());
        self
    }

    /// Where to put the API socket, default to None, and the path
    /// "/run/firecracker-<id>.socket" is used.
    pub fn socket_path<P: AsRef<str>>(mut self, path: P) -> Self {
        self.config.socket_path = Some(path.as_ref().into());
        self
    }

    /// Socket retrying times, default to 3 times
    pub fn socket_retry(mut self, retry: usize) -> Self {
        self.config.socket_retry = retry;
        self
    }

    /// Extra arguments passed to firecracker after `--api-sock`
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config
            .extra_args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }
}
