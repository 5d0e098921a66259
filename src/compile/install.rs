//! Final `install.sh` assembly

use crate::compile::renderer::Renderer;
use crate::error::Result;
use crate::project::{Attributes, INSTALL_SCRIPT};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct InstallAssembler<'a> {
    root: &'a Path,
    output: &'a Path,
    renderer: &'a dyn Renderer,
}

impl<'a> InstallAssembler<'a> {
    pub fn new(root: &'a Path, output: &'a Path, renderer: &'a dyn Renderer) -> Self {
        Self {
            root,
            output,
            renderer,
        }
    }

    /// Write `install.sh` into the compiled tree.
    ///
    /// The role script is read back from `roles/<role>.sh` in the output
    /// tree, so it must already have gone through the same copy/template
    /// pass as the base script.
    pub fn assemble(&self, role: Option<&str>, attributes: &Attributes) -> Result<PathBuf> {
        let mut script = self
            .renderer
            .render(&self.root.join(INSTALL_SCRIPT), attributes)?;

        if let Some(role) = role {
            let compiled_role = self.output.join("roles").join(format!("{role}.sh"));
            script.push(b'\n');
            script.extend_from_slice(&std::fs::read(compiled_role)?);
        }

        std::fs::create_dir_all(self.output)?;
        let destination = self.output.join(INSTALL_SCRIPT);
        std::fs::write(&destination, script)?;
        debug!(
            "Assembled {} (role: {})",
            destination.display(),
            role.unwrap_or("none")
        );
        Ok(destination)
    }
}
