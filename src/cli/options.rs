use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main niso CLI interface
#[derive(Parser)]
#[command(name = "niso")]
#[command(about = "Compile shell recipes into an install bundle and ship it over SSH")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct NisoCli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory (must contain niso.yml for compile and deploy)
    #[arg(short = 'C', long = "directory", global = true, default_value = ".")]
    pub directory: PathBuf,

    /// Enable verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new niso project
    Create {
        /// Directory to create
        #[arg(default_value = "niso")]
        project: PathBuf,
    },

    /// Compile and deploy to [user@]host[:port] <role>, or do <instance> <role>
    Deploy {
        /// Target address, or `do` to read a provisioned instance record
        first: String,
        /// Role, or instance name followed by role for `do`
        args: Vec<String>,
        /// Run install.sh through sudo on the remote host
        #[arg(long)]
        sudo: bool,
    },

    /// Compile the project into compiled/
    Compile {
        /// Role whose script is appended to install.sh
        role: Option<String>,
    },
}

impl NisoCli {
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}
