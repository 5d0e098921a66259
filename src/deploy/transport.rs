//! Capability seams for shipping the compiled tree: archive, SSH channel and
//! known-hosts maintenance, with the real tar/`ssh`/`ssh-keygen` backends.

use crate::deploy::target::Target;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::debug;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Packs the contents of a directory into a compressed stream.
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, root: &Path) -> io::Result<Vec<u8>>;
}

/// Runs a command on the target with `payload` as its standard input.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        target: &Target,
        remote_command: &str,
        payload: Vec<u8>,
    ) -> io::Result<RemoteChannel>;
}

/// Waits for the remote command and yields its exit code.
#[async_trait]
pub trait RemoteExit: Send {
    async fn wait(self: Box<Self>) -> io::Result<i32>;
}

#[async_trait]
pub trait KnownHostsStore: Send + Sync {
    /// Drop any stored key for `host`.
    async fn purge(&self, host: &str) -> io::Result<()>;
}

pub struct RemoteChannel {
    pub stdout: BoxedReader,
    pub stderr: BoxedReader,
    pub exit: Box<dyn RemoteExit>,
}

/// Gzip-compressed tar of a directory's contents (entries rooted at `.`).
pub struct TarGzArchiver;

impl TarGzArchiver {
    fn archive_sync(root: &Path) -> io::Result<Vec<u8>> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(true);
        builder.append_dir_all(".", root)?;
        builder.into_inner()?.finish()
    }
}

#[async_trait]
impl Archiver for TarGzArchiver {
    async fn archive(&self, root: &Path) -> io::Result<Vec<u8>> {
        let root = root.to_path_buf();
        let bytes = tokio::task::spawn_blocking(move || Self::archive_sync(&root))
            .await
            .map_err(|e| io::Error::other(format!("Archive task join error: {e}")))??;
        debug!("Archived compiled tree: {} bytes", bytes.len());
        Ok(bytes)
    }
}

/// The system `ssh` client with strict host key checking disabled.
pub struct SshTransport {
    program: PathBuf,
}

impl SshTransport {
    pub fn new() -> Self {
        Self::with_program("ssh")
    }

    /// Use another `ssh`-compatible executable, invoked with the same arguments.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn open(
        &self,
        target: &Target,
        remote_command: &str,
        payload: Vec<u8>,
    ) -> io::Result<RemoteChannel> {
        debug!("Opening ssh channel to {} via {}", target, self.program.display());

        let mut child = Command::new(&self.program)
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg(target.endpoint())
            .arg("-p")
            .arg(&target.port)
            .arg(remote_command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("ssh stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("ssh stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("ssh stderr not captured"))?;

        // Fed in the background so the caller can drain output right away.
        let feeder = tokio::spawn(feed_payload(stdin, payload));

        Ok(RemoteChannel {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            exit: Box::new(SshProcess { child, feeder }),
        })
    }
}

/// Write the payload to the remote command's stdin and close it. A remote
/// side that stops reading early is not an error; its exit status decides.
async fn feed_payload(mut stdin: ChildStdin, payload: Vec<u8>) -> io::Result<()> {
    let written = match stdin.write_all(&payload).await {
        Ok(()) => stdin.shutdown().await,
        Err(e) => Err(e),
    };
    match written {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Remote command closed stdin before the payload was fully written");
            Ok(())
        }
        other => other,
    }
}

/// A running `ssh` child together with the task feeding its stdin.
struct SshProcess {
    child: Child,
    feeder: JoinHandle<io::Result<()>>,
}

#[async_trait]
impl RemoteExit for SshProcess {
    async fn wait(self: Box<Self>) -> io::Result<i32> {
        let SshProcess { mut child, feeder } = *self;
        feeder
            .await
            .map_err(|e| io::Error::other(format!("ssh stdin task failed: {e}")))??;
        let status = child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// `ssh-keygen -R <host>` against the user's known_hosts file.
pub struct SshKeygenKnownHosts;

#[async_trait]
impl KnownHostsStore for SshKeygenKnownHosts {
    async fn purge(&self, host: &str) -> io::Result<()> {
        let status = Command::new("ssh-keygen")
            .arg("-R")
            .arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "ssh-keygen -R {host} exited with {status}"
            )))
        }
    }
}
