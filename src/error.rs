use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NisoError {
    #[error("You must be in the niso folder ({} has no niso.yml)", root.display())]
    NotAProject { root: PathBuf },

    #[error("{role} doesn't exist!")]
    UnknownRole { role: String },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("check your remote recipes in (niso.yml)\nrecipe {name}: {cause}")]
    RecipeFetch { name: String, cause: String },

    #[error("Cannot extract a host from target '{spec}'")]
    TargetParse { spec: String },

    #[error("Instance {name} not found (expected {})", path.display())]
    InstanceRecordNotFound { name: String, path: PathBuf },

    #[error("Deployment failed: {message}")]
    DeployFailed { message: String },

    #[error("Template rendering failed for {}: {message}", path.display())]
    Template { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NisoError {
    pub fn deploy_failed(message: impl Into<String>) -> Self {
        NisoError::DeployFailed {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NisoError>;
