//! `niso create`: lays down a starter project

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

const GITIGNORE: &str = "compiled\n";

const DESCRIPTOR: &str = r#"# Attributes are written to compiled/attributes/<key> and, with eval_erb,
# exposed to every file as {{attributes.<key>}}.
attributes:
  # environment: production

# Remote recipes fetched into compiled/recipes/<name>.sh
recipes:
  # rvm: https://example.com/recipes/rvm.sh

# Extra files copied to compiled/files/<basename>
files:
  # - ~/.ssh/id_rsa.pub

preferences:
  # Keep already fetched remote recipes instead of downloading them again
  # cache_remote_recipes: true
  # Render every file as a template
  # eval_erb: true
  # Remove ~/niso on the remote host once install.sh finishes
  # erase_remote_folder: true
"#;

const INSTALL: &str = r#"#!/bin/bash

# Log and exit on the first failure
set -e

# Load attributes as shell variables
for attribute in attributes/*; do
  [ -f "$attribute" ] || continue
  eval "$(basename "$attribute")=\"\$(cat "$attribute")\""
done

source recipes/niso.sh
"#;

const RECIPE: &str = r#"#!/bin/bash

# Helpers available to roles

niso.installed() {
  hash "$1" 2>/dev/null
}
"#;

const ROLE_DB: &str = r#"# Database role
echo "db role"
"#;

const ROLE_WEB: &str = r#"# Web role
echo "web role"
"#;

const SCAFFOLD: [(&str, &str); 7] = [
    (".gitignore", GITIGNORE),
    ("niso.yml", DESCRIPTOR),
    ("install.sh", INSTALL),
    ("recipes/niso.sh", RECIPE),
    ("roles/db.sh", ROLE_DB),
    ("roles/web.sh", ROLE_WEB),
    ("files/.gitkeep", ""),
];

/// Write the starter files under `project`. Existing files are left alone.
/// Returns each path with whether it was created.
pub fn create_project(project: &Path) -> Result<Vec<(PathBuf, bool)>> {
    let mut report = Vec::with_capacity(SCAFFOLD.len());

    for (relative, content) in SCAFFOLD {
        let path = project.join(relative);
        if path.exists() {
            debug!("Keeping existing {}", path.display());
            report.push((path, false));
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        report.push((path, true));
    }

    Ok(report)
}
