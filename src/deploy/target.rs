//! Deploy target resolution from an address literal or an instance record

use crate::deploy::ssh_config::SshConfig;
use crate::error::{NisoError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PORT: &str = "22";

/// Flow selector that reads the address from a provisioned instance record.
pub const INSTANCE_FLOW: &str = "do";

static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*@)?(.*?)(:.*)?$").expect("address pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user: String,
    pub host: String,
    pub port: String,
}

impl Target {
    /// `user@host` as passed to `ssh`.
    pub fn endpoint(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Components present in a `[user@]host[:port]` literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLiteral {
    pub user: Option<String>,
    pub host: String,
    pub port: Option<String>,
}

impl AddressLiteral {
    pub fn parse(spec: &str) -> Result<Self> {
        let parse_error = || NisoError::TargetParse {
            spec: spec.to_string(),
        };
        let captures = ADDRESS_PATTERN.captures(spec).ok_or_else(parse_error)?;

        let host = captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .filter(|host| !host.is_empty())
            .ok_or_else(parse_error)?;
        let user = captures
            .get(1)
            .map(|m| m.as_str().trim_end_matches('@').to_string())
            .filter(|user| !user.is_empty());
        let port = captures
            .get(3)
            .map(|m| m.as_str().trim_start_matches(':').to_string())
            .filter(|port| !port.is_empty());

        Ok(Self { user, host, port })
    }
}

/// Positional deploy arguments, before any file or config is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    Address {
        address: String,
        role: Option<String>,
    },
    Instance {
        provider: String,
        name: String,
        role: Option<String>,
    },
}

impl TargetSpec {
    pub fn from_args(first: &str, rest: &[String]) -> Result<Self> {
        if first == INSTANCE_FLOW {
            let name = rest.first().ok_or_else(|| NisoError::TargetParse {
                spec: first.to_string(),
            })?;
            return Ok(TargetSpec::Instance {
                provider: first.to_string(),
                name: name.clone(),
                role: rest.get(1).cloned(),
            });
        }

        Ok(TargetSpec::Address {
            address: first.to_string(),
            role: rest.first().cloned(),
        })
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            TargetSpec::Address { role, .. } | TargetSpec::Instance { role, .. } => {
                role.as_deref()
            }
        }
    }
}

/// `{networks: {v4: [{ip_address}, ...]}}` as written by provisioning.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceRecord {
    #[serde(alias = ":networks")]
    pub networks: Networks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub v4: Vec<NetworkAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkAddress {
    pub ip_address: String,
}

impl InstanceRecord {
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(NisoError::InstanceRecordNotFound {
                name: name.to_string(),
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| NisoError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn first_ipv4(&self) -> Option<&str> {
        self.networks.v4.first().map(|addr| addr.ip_address.as_str())
    }
}

pub struct TargetResolver {
    project_root: PathBuf,
    ssh_config: SshConfig,
}

impl TargetResolver {
    pub fn new(project_root: impl Into<PathBuf>, ssh_config: SshConfig) -> Self {
        Self {
            project_root: project_root.into(),
            ssh_config,
        }
    }

    pub fn instance_record_path(&self, provider: &str, name: &str) -> PathBuf {
        self.project_root
            .join(provider)
            .join("instances")
            .join(format!("{name}.yml"))
    }

    pub fn resolve(&self, spec: &TargetSpec) -> Result<Target> {
        match spec {
            TargetSpec::Address { address, .. } => self.resolve_address(address),
            TargetSpec::Instance { provider, name, .. } => {
                let path = self.instance_record_path(provider, name);
                let record = InstanceRecord::load(name, &path)?;
                let address = record.first_ipv4().ok_or_else(|| NisoError::TargetParse {
                    spec: format!("{provider} {name}"),
                })?;
                debug!("Instance {} resolved to {}", name, address);
                self.resolve_address(address)
            }
        }
    }

    /// Literal components win, then SSH config, then `root` / `22`.
    /// A configured `HostName` replaces the literal host.
    pub fn resolve_address(&self, address: &str) -> Result<Target> {
        let literal = AddressLiteral::parse(address)?;
        let settings = self.ssh_config.lookup(&literal.host);

        Ok(Target {
            user: literal
                .user
                .or(settings.user)
                .unwrap_or_else(|| DEFAULT_USER.to_string()),
            host: settings.host_name.unwrap_or(literal.host),
            port: literal
                .port
                .or(settings.port)
                .unwrap_or_else(|| DEFAULT_PORT.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TargetResolver {
        TargetResolver::new(".", SshConfig::default())
    }

    #[test]
    fn test_full_literal() {
        let target = resolver().resolve_address("deploy@10.0.0.5:2222").unwrap();
        assert_eq!(
            target,
            Target {
                user: "deploy".to_string(),
                host: "10.0.0.5".to_string(),
                port: "2222".to_string(),
            }
        );
    }

    #[test]
    fn test_bare_host_defaults() {
        let target = resolver().resolve_address("10.0.0.5").unwrap();
        assert_eq!(target.user, "root");
        assert_eq!(target.host, "10.0.0.5");
        assert_eq!(target.port, "22");
        assert_eq!(target.endpoint(), "root@10.0.0.5");
    }

    #[test]
    fn test_partial_literals() {
        let target = resolver().resolve_address("example.com:2200").unwrap();
        assert_eq!((target.user.as_str(), target.port.as_str()), ("root", "2200"));

        let target = resolver().resolve_address("admin@example.com").unwrap();
        assert_eq!((target.user.as_str(), target.port.as_str()), ("admin", "22"));
    }

    #[test]
    fn test_missing_host_is_an_error() {
        for spec in ["", "user@", "user@:22", ":22"] {
            assert!(
                matches!(
                    AddressLiteral::parse(spec),
                    Err(NisoError::TargetParse { .. })
                ),
                "{spec:?} should not parse"
            );
        }
    }

    #[test]
    fn test_ssh_config_fills_gaps() {
        let config = SshConfig::parse("Host web\n  HostName 10.1.1.1\n  User ops\n  Port 2022\n");
        let resolver = TargetResolver::new(".", config);

        let target = resolver.resolve_address("web").unwrap();
        assert_eq!(target.to_string(), "ops@10.1.1.1:2022");

        let target = resolver.resolve_address("admin@web:22").unwrap();
        assert_eq!(target.to_string(), "admin@10.1.1.1:22");
    }

    #[test]
    fn test_spec_from_args() {
        let args = vec!["web".to_string()];
        assert_eq!(
            TargetSpec::from_args("root@host", &args).unwrap(),
            TargetSpec::Address {
                address: "root@host".to_string(),
                role: Some("web".to_string()),
            }
        );

        let args = vec!["box-1".to_string(), "db".to_string()];
        let spec = TargetSpec::from_args("do", &args).unwrap();
        assert_eq!(spec.role(), Some("db"));
        assert!(matches!(spec, TargetSpec::Instance { ref name, .. } if name == "box-1"));

        assert!(TargetSpec::from_args("do", &[]).is_err());
    }
}
