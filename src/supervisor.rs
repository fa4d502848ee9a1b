//! Launch a process, forward its output line by line and report how it exited.
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use log::*;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => write!(f, "stdout"),
            StreamKind::Stderr => write!(f, "stderr"),
        }
    }
}

/// Receives every line read from the child, without its line terminator.
/// Called from the drain tasks, possibly from both streams at once.
pub trait LineSink: Send + Sync + 'static {
    fn forward(&self, stream: StreamKind, line: &str);
}

/// Writes child stdout to our stdout and child stderr to our stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl LineSink for Console {
    fn forward(&self, stream: StreamKind, line: &str) {
        match stream {
            StreamKind::Stdout => println!("{line}"),
            StreamKind::Stderr => eprintln!("{line}"),
        }
    }
}

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub status: ExitStatus,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
}

impl ExitReport {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn signal(&self) -> Option<i32> {
        self.status.signal()
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code(), self.signal()) {
            (Some(code), _) => write!(f, "exited with code {code}")?,
            (None, Some(signal)) => write!(f, "killed by signal {signal}")?,
            (None, None) => write!(f, "exited with unknown status")?,
        }
        write!(
            f,
            " ({} stdout lines, {} stderr lines)",
            self.stdout_lines, self.stderr_lines
        )
    }
}

pub struct Supervisor<S: LineSink = Console> {
    bin: PathBuf,
    args: Vec<OsString>,
    sink: Arc<S>,
}

impl Supervisor<Console> {
    pub fn new<P, I, A>(bin: P, args: I) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self::with_sink(bin, args, Arc::new(Console))
    }
}

impl<S: LineSink> Supervisor<S> {
    pub fn with_sink<P, I, A>(bin: P, args: I, sink: Arc<S>) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            bin: bin.as_ref().to_path_buf(),
            args: args.into_iter().map(Into::into).collect(),
            sink,
        }
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Start the process and its two drain tasks.
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self) -> Result<Supervised> {
        let mut command = Command::new(&self.bin);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| {
            error!("Fail to launch {}: {source}", self.bin.display());
            Error::Launch {
                bin: self.bin.clone(),
                source,
            }
        })?;
        let pid = child.id();
        info!("Launched {} (pid {pid:?})", self.bin.display());

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Supervisor("fail to take stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Supervisor("fail to take stderr".to_string()))?;

        Ok(Supervised {
            bin: self.bin.clone(),
            pid,
            child,
            stdout: drain(stdout, StreamKind::Stdout, Arc::clone(&self.sink)),
            stderr: drain(stderr, StreamKind::Stderr, Arc::clone(&self.sink)),
        })
    }

    /// Launch, forward output until both streams close, and wait for exit.
    pub async fn supervise(&self) -> Result<ExitReport> {
        self.spawn()?.wait().await
    }
}

/// A running child whose output is being forwarded.
#[derive(Debug)]
pub struct Supervised {
    bin: PathBuf,
    pid: Option<u32>,
    child: Child,
    stdout: JoinHandle<io::Result<usize>>,
    stderr: JoinHandle<io::Result<usize>>,
}

impl Supervised {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the child has already exited, without blocking.
    pub fn try_status(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Send SIGKILL without waiting. Follow with [`Supervised::wait`].
    pub fn start_kill(&mut self) -> Result<()> {
        warn!("Killing {} (pid {:?})", self.bin.display(), self.pid);
        Ok(self.child.start_kill()?)
    }

    /// Block until the child exits, then join both drain tasks.
    /// A non-zero exit is a normal outcome, reported in the [`ExitReport`].
    pub async fn wait(mut self) -> Result<ExitReport> {
        debug!("Waiting for {} to finish", self.bin.display());
        let status = self.child.wait().await.map_err(|e| {
            let msg = format!("Fail to wait for {}: {e}", self.bin.display());
            error!("{msg}");
            Error::Supervisor(msg)
        })?;

        let stdout_lines = join_drain(self.stdout, StreamKind::Stdout).await?;
        let stderr_lines = join_drain(self.stderr, StreamKind::Stderr).await?;

        let report = ExitReport {
            status,
            stdout_lines,
            stderr_lines,
        };
        if report.success() {
            info!("{} {report}", self.bin.display());
        } else {
            warn!("{} {report}", self.bin.display());
        }
        Ok(report)
    }
}

fn drain<R, S>(reader: R, stream: StreamKind, sink: Arc<S>) -> JoinHandle<io::Result<usize>>
where
    R: AsyncRead + Unpin + Send + 'static,
    S: LineSink,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut lines = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            sink.forward(stream, line.trim_end_matches(['\n', '\r']));
            lines += 1;
        }
        trace!("{stream} closed after {lines} lines");
        Ok(lines)
    })
}

async fn join_drain(handle: JoinHandle<io::Result<usize>>, stream: StreamKind) -> Result<usize> {
    match handle.await {
        Ok(Ok(lines)) => Ok(lines),
        Ok(Err(e)) => {
            let msg = format!("Fail to read {stream}: {e}");
            error!("{msg}");
            Err(Error::Supervisor(msg))
        }
        Err(e) => {
            let msg = format!("{stream} drain task failed: {e}");
            error!("{msg}");
            Err(Error::Supervisor(msg))
        }
    }
}

/// Launch `bin` with `args`, forward its output to the console and wait
/// for it to exit.
pub async fn supervise<P, I, A>(bin: P, args: I) -> Result<ExitReport>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = A>,
    A: Into<OsString>,
{
    Supervisor::new(bin, args).supervise().await
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(StreamKind, String)>>);

    impl LineSink for Collect {
        fn forward(&self, stream: StreamKind, line: &str) {
            self.0.lock().unwrap().push((stream, line.to_string()));
        }
    }

    #[tokio::test]
    async fn test_forwards_both_streams() {
        let sink = Arc::new(Collect::default());
        let script = "echo out1; echo err1 >&2; echo out2; printf 'err2' >&2";
        let report = Supervisor::with_sink("/bin/sh", ["-c", script], Arc::clone(&sink))
            .supervise()
            .await
            .unwrap();

        assert!(report.success());
        assert_eq!(report.code(), Some(0));
        assert_eq!((report.stdout_lines, report.stderr_lines), (2, 2));

        let lines = sink.0.lock().unwrap();
        let of = |kind| {
            lines
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, l)| l.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(of(StreamKind::Stdout), vec!["out1", "out2"]);
        assert_eq!(of(StreamKind::Stderr), vec!["err1", "err2"]);
    }

    #[tokio::test]
    async fn test_reports_signal() {
        let sink = Arc::new(Collect::default());
        let report = Supervisor::with_sink("/bin/sh", ["-c", "kill -9 $$"], sink)
            .supervise()
            .await
            .unwrap();
        assert!(!report.success());
        assert_eq!(report.code(), None);
        assert_eq!(report.signal(), Some(9));
        assert!(report.to_string().starts_with("killed by signal 9"));
    }

    #[tokio::test]
    async fn test_lossy_utf8() {
        let sink = Arc::new(Collect::default());
        let script = r"printf 'a\377b\n'";
        let report = Supervisor::with_sink("/bin/sh", ["-c", script], Arc::clone(&sink))
            .supervise()
            .await
            .unwrap();
        assert!(report.success());
        let lines = sink.0.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let err = supervise("/definitely/not/here/firecracker", ["--api-sock", "/tmp/x"])
            .await
            .unwrap_err();
        match err {
            Error::Launch { bin, source } => {
                assert_eq!(bin, PathBuf::from("/definitely/not/here/firecracker"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
