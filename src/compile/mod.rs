//! Compile pipeline: descriptor -> attributes -> recipes -> files -> install.sh

pub mod files;
pub mod install;
pub mod recipes;
pub mod renderer;

pub use files::FileCompiler;
pub use install::InstallAssembler;
pub use recipes::{HttpRecipeFetcher, RecipeFetcher, RecipeResolver};
pub use renderer::{CopyRenderer, RenderMode, Renderer, TemplateRenderer};

use crate::error::Result;
use crate::project::{Project, ProjectConfig};
use std::path::PathBuf;
use tracing::info;

/// Result of one compile pass.
#[derive(Debug, Clone)]
pub struct CompiledTree {
    pub root: PathBuf,
    pub install_script: PathBuf,
    pub mode: RenderMode,
    pub files_written: usize,
}

pub struct Compiler {
    fetcher: Box<dyn RecipeFetcher>,
}

impl Compiler {
    pub fn new(fetcher: Box<dyn RecipeFetcher>) -> Self {
        Self { fetcher }
    }

    /// Compiler backed by the real HTTP fetcher.
    pub fn http() -> Result<Self> {
        Ok(Self::new(Box::new(HttpRecipeFetcher::new()?)))
    }

    /// Compile `project` for `role`. The role is checked before anything is
    /// written under `compiled/`.
    pub async fn compile(&self, project: &Project, role: Option<&str>) -> Result<CompiledTree> {
        project.ensure_role(role)?;
        let config = project.load_config()?;
        self.compile_with(project, &config, role).await
    }

    pub async fn compile_with(
        &self,
        project: &Project,
        config: &ProjectConfig,
        role: Option<&str>,
    ) -> Result<CompiledTree> {
        project.ensure_role(role)?;

        let output = project.compiled_dir();
        let mode = RenderMode::from_preferences(&config.preferences);
        let renderer = mode.renderer();
        info!("Compiling {} in {:?} mode", project.root().display(), mode);

        let files = FileCompiler::new(project.root(), &output, renderer.as_ref());
        files.write_attributes(&config.attributes)?;

        RecipeResolver::new(self.fetcher.as_ref())
            .resolve(
                &config.recipes,
                &output.join("recipes"),
                config.preferences.cache_remote_recipes,
            )
            .await?;

        let files_written = files.compile(config)?;

        let install_script = InstallAssembler::new(project.root(), &output, renderer.as_ref())
            .assemble(role, &config.attributes)?;

        Ok(CompiledTree {
            root: output,
            install_script,
            mode,
            files_written,
        })
    }
}
