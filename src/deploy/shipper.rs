use crate::deploy::relay::{relay_output, OutputSink};
use crate::deploy::target::Target;
use crate::deploy::transport::{
    Archiver, KnownHostsStore, SshKeygenKnownHosts, SshTransport, TarGzArchiver, Transport,
};
use crate::error::{NisoError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Remote working directory, recreated on every deploy.
pub const REMOTE_DIR: &str = "~/niso";

/// Parameters of one deploy call.
#[derive(Debug, Clone)]
pub struct DeploySession {
    pub target: Target,
    pub role: Option<String>,
    pub sudo: bool,
    pub erase_remote_folder: bool,
}

/// The fixed bootstrap sequence run on the remote host.
pub fn remote_command(sudo: bool, erase_after: bool) -> String {
    let sudo = if sudo { "sudo " } else { "" };
    let mut command = format!(
        "rm -rf {REMOTE_DIR} && mkdir {REMOTE_DIR} && cd {REMOTE_DIR} && tar xz && {sudo}bash install.sh"
    );
    if erase_after {
        command.push_str(&format!(" && rm -rf {REMOTE_DIR}"));
    }
    command
}

pub struct RemoteShipper {
    archiver: Box<dyn Archiver>,
    transport: Box<dyn Transport>,
    known_hosts: Box<dyn KnownHostsStore>,
    sink: Arc<dyn OutputSink>,
}

impl RemoteShipper {
    pub fn new(
        archiver: Box<dyn Archiver>,
        transport: Box<dyn Transport>,
        known_hosts: Box<dyn KnownHostsStore>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            archiver,
            transport,
            known_hosts,
            sink,
        }
    }

    /// Shipper using tar+gzip, the `ssh` client and `ssh-keygen`.
    pub fn system(sink: Arc<dyn OutputSink>) -> Self {
        Self::new(
            Box::new(TarGzArchiver),
            Box::new(SshTransport::new()),
            Box::new(SshKeygenKnownHosts),
            sink,
        )
    }

    /// Ship `tree` to the session target and run it. Returns the remote exit
    /// code, which is always zero; a non-zero exit is a `DeployFailed` error.
    pub async fn ship(&self, tree: &Path, session: &DeploySession) -> Result<i32> {
        let target = &session.target;

        // A re-provisioned host presents a new key; never let that block.
        if let Err(e) = self.known_hosts.purge(&target.host).await {
            debug!("Ignoring known_hosts purge failure for {}: {}", target.host, e);
        }

        let payload = self.archiver.archive(tree).await.map_err(|e| {
            NisoError::deploy_failed(format!("could not archive {}: {e}", tree.display()))
        })?;

        let command = remote_command(session.sudo, session.erase_remote_folder);
        info!("Running remote bootstrap on {}: {}", target, command);

        let channel = self
            .transport
            .open(target, &command, payload)
            .await
            .map_err(|e| NisoError::deploy_failed(format!("could not connect to {target}: {e}")))?;

        relay_output(channel.stdout, channel.stderr, Arc::clone(&self.sink))
            .await
            .map_err(|e| {
                NisoError::deploy_failed(format!("lost output stream from {}: {e}", target.host))
            })?;

        let code = channel.exit.wait().await.map_err(|e| {
            NisoError::deploy_failed(format!("could not collect exit status from {}: {e}", target.host))
        })?;

        if code != 0 {
            return Err(NisoError::deploy_failed(format!(
                "remote install on {} exited with status {code}",
                target.host
            )));
        }

        info!("Deploy to {} finished", target);
        Ok(code)
    }
}
