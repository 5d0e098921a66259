pub mod relay;
pub mod shipper;
pub mod ssh_config;
pub mod target;
pub mod transport;

pub use relay::{relay_output, OutputSink};
pub use shipper::{remote_command, DeploySession, RemoteShipper};
pub use ssh_config::{HostSettings, SshConfig};
pub use target::{AddressLiteral, InstanceRecord, Target, TargetResolver, TargetSpec};
pub use transport::{
    Archiver, BoxedReader, KnownHostsStore, RemoteChannel, RemoteExit, SshKeygenKnownHosts,
    SshTransport, TarGzArchiver, Transport,
};
