use crate::cli::options::{Commands, NisoCli};
use crate::cli::output::{print_compiled, print_created, print_deploy_banner, TerminalSink};
use crate::cli::scaffold::create_project;
use crate::compile::{CompiledTree, Compiler};
use crate::deploy::{DeploySession, RemoteShipper, SshConfig, TargetResolver, TargetSpec};
use crate::error::Result;
use crate::project::Project;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub async fn run(cli: NisoCli) -> Result<()> {
    match cli.command {
        Commands::Create { project } => create_command(&cli.directory.join(project)),
        Commands::Compile { role } => {
            let tree = compile_command(&cli.directory, role.as_deref()).await?;
            print_compiled(&tree);
            Ok(())
        }
        Commands::Deploy { first, args, sudo } => {
            deploy_command(&cli.directory, &first, &args, sudo).await
        }
    }
}

pub fn create_command(project: &Path) -> Result<()> {
    for (path, created) in create_project(project)? {
        print_created(&path, created);
    }
    Ok(())
}

pub async fn compile_command(root: &Path, role: Option<&str>) -> Result<CompiledTree> {
    let project = Project::open(root)?;
    Compiler::http()?.compile(&project, role).await
}

pub async fn deploy_command(root: &Path, first: &str, args: &[String], sudo: bool) -> Result<()> {
    let project = Project::open(root)?;
    let spec = TargetSpec::from_args(first, args)?;
    let role = spec.role();
    project.ensure_role(role)?;

    let target = TargetResolver::new(root, SshConfig::load_default()).resolve(&spec)?;
    print_deploy_banner(&target, role);

    let config = project.load_config()?;
    let tree = Compiler::http()?
        .compile_with(&project, &config, role)
        .await?;

    let session = DeploySession {
        target,
        role: role.map(str::to_string),
        sudo,
        erase_remote_folder: config.preferences.erase_remote_folder,
    };

    RemoteShipper::system(Arc::new(TerminalSink))
        .ship(&tree.root, &session)
        .await?;
    info!("Deployed role {:?} to {}", session.role, session.target);
    Ok(())
}
