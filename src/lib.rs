//! Niso - compiles shell-recipe projects into install bundles and ships them
//! to a remote host over SSH.

pub mod cli;
pub mod compile;
pub mod deploy;
pub mod error;
pub mod project;

pub use compile::{CompiledTree, Compiler};
pub use deploy::{DeploySession, RemoteShipper, Target, TargetResolver, TargetSpec};
pub use error::{NisoError, Result};
pub use project::{Project, ProjectConfig};
