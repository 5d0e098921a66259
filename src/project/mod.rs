pub mod config;

pub use config::{Attributes, Preferences, ProjectConfig, RecipeSource};

use crate::error::{NisoError, Result};
use std::path::{Path, PathBuf};

pub const DESCRIPTOR_FILE: &str = "niso.yml";
pub const INSTALL_SCRIPT: &str = "install.sh";
pub const COMPILED_DIR: &str = "compiled";

/// Directories mirrored recursively into the compiled tree.
pub const SOURCE_DIRS: [&str; 3] = ["recipes", "roles", "files"];

/// A directory known to contain a project descriptor.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Open the project rooted at `root`, failing if it has no descriptor.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(DESCRIPTOR_FILE).is_file() {
            return Err(NisoError::NotAProject { root });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_FILE)
    }

    pub fn compiled_dir(&self) -> PathBuf {
        self.root.join(COMPILED_DIR)
    }

    pub fn role_script(&self, role: &str) -> PathBuf {
        self.root.join("roles").join(format!("{role}.sh"))
    }

    /// Fail with `UnknownRole` unless `roles/<role>.sh` exists.
    pub fn ensure_role(&self, role: Option<&str>) -> Result<()> {
        match role {
            Some(role) if !self.role_script(role).is_file() => Err(NisoError::UnknownRole {
                role: role.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn load_config(&self) -> Result<ProjectConfig> {
        config::load(&self.descriptor_path())
    }
}
