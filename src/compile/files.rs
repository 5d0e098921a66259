//! Mirrors project sources into the compiled tree

use crate::compile::renderer::Renderer;
use crate::error::{NisoError, Result};
use crate::project::{Attributes, ProjectConfig, DESCRIPTOR_FILE, SOURCE_DIRS};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub struct FileCompiler<'a> {
    root: &'a Path,
    output: &'a Path,
    renderer: &'a dyn Renderer,
}

impl<'a> FileCompiler<'a> {
    pub fn new(root: &'a Path, output: &'a Path, renderer: &'a dyn Renderer) -> Self {
        Self {
            root,
            output,
            renderer,
        }
    }

    /// Render every regular file under the source directories to its mirrored
    /// path, then every extra file listed in the descriptor to
    /// `files/<basename>`. Returns the number of files written.
    pub fn compile(&self, config: &ProjectConfig) -> Result<usize> {
        let mut written = 0;

        for relative in self.source_files()? {
            self.emit(
                &self.root.join(&relative),
                &self.output.join(&relative),
                &config.attributes,
            )?;
            written += 1;
        }

        for extra in &config.files {
            let Some(name) = extra.file_name() else {
                debug!("Skipping extra file without a name: {}", extra.display());
                continue;
            };
            self.emit(
                &self.root.join(expand_home(extra)),
                &self.output.join("files").join(name),
                &config.attributes,
            )?;
            written += 1;
        }

        Ok(written)
    }

    /// Write one attribute file per entry under `attributes/`. Every key must
    /// be a plain file name; nothing is written if one is not.
    pub fn write_attributes(&self, attributes: &Attributes) -> Result<()> {
        let entries: Vec<_> = attributes.text_entries().collect();
        if let Some((key, _)) = entries.iter().find(|(key, _)| !is_plain_file_name(key)) {
            return Err(NisoError::Parse {
                path: self.root.join(DESCRIPTOR_FILE),
                message: format!("attribute key '{key}' is not a plain file name"),
            });
        }

        let dir = self.output.join("attributes");
        std::fs::create_dir_all(&dir)?;
        for (key, value) in entries {
            std::fs::write(dir.join(key), value)?;
        }
        Ok(())
    }

    /// Render a single file, creating parent directories as needed.
    pub fn emit(&self, source: &Path, destination: &Path, attributes: &Attributes) -> Result<()> {
        let content = self.renderer.render(source, attributes)?;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(destination, content)?;
        debug!("Compiled {} -> {}", source.display(), destination.display());
        Ok(())
    }

    fn source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for dir in SOURCE_DIRS {
            let base = self.root.join(dir);
            if !base.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&base).follow_links(true) {
                let entry = entry.map_err(std::io::Error::from)?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(self.root) {
                    files.push(relative.to_path_buf());
                }
            }
        }

        Ok(files)
    }
}

fn is_plain_file_name(key: &str) -> bool {
    let mut components = Path::new(key).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == key
    )
}

/// Expand a leading `~/` so descriptor entries may point into the home
/// directory. Absolute results replace the project root when joined.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
