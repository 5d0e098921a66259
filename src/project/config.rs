//! Project descriptor (`niso.yml`) loading

use crate::error::{NisoError, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parsed project descriptor. Built once per invocation and passed by
/// reference through every pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    pub attributes: Attributes,
    pub recipes: Vec<RecipeSource>,
    pub files: Vec<PathBuf>,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub cache_remote_recipes: bool,
    pub eval_erb: bool,
    pub erase_remote_folder: bool,
    /// Keys this version does not act on.
    pub other: BTreeMap<String, Value>,
}

/// Attribute table in descriptor order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Mapping);

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    attributes: Option<Mapping>,
    recipes: Option<Mapping>,
    files: Option<Vec<String>>,
    preferences: Option<Mapping>,
}

/// Load the descriptor at `path`.
pub fn load(path: &Path) -> Result<ProjectConfig> {
    if !path.is_file() {
        return Err(NisoError::NotAProject {
            root: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path)?;
    let config = ProjectConfig::from_yaml_str(&content).map_err(|message| NisoError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    debug!(
        "Loaded {} attributes, {} recipes, {} extra files from {}",
        config.attributes.len(),
        config.recipes.len(),
        config.files.len(),
        path.display()
    );
    Ok(config)
}

impl ProjectConfig {
    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, String> {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str::<Option<RawConfig>>(content)
                .map_err(|e| e.to_string())?
                .unwrap_or_default()
        };

        let recipes = raw
            .recipes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, url)| {
                let url = match url {
                    Value::String(url) => url,
                    other => {
                        return Err(format!(
                            "recipe '{}' must map to a URL string, got {}",
                            scalar_text(&name),
                            scalar_text(&other)
                        ))
                    }
                };
                Ok(RecipeSource {
                    name: scalar_text(&name),
                    url,
                })
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;

        Ok(Self {
            attributes: Attributes(raw.attributes.unwrap_or_default()),
            recipes,
            files: raw
                .files
                .unwrap_or_default()
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            preferences: Preferences::from_mapping(raw.preferences.unwrap_or_default()),
        })
    }
}

impl Preferences {
    fn from_mapping(mapping: Mapping) -> Self {
        let mut preferences = Preferences::default();

        for (key, value) in mapping {
            let key = scalar_text(&key);
            match key.as_str() {
                "cache_remote_recipes" => preferences.cache_remote_recipes = truthy(&value),
                "eval_erb" => preferences.eval_erb = truthy(&value),
                "erase_remote_folder" => preferences.erase_remote_folder = truthy(&value),
                _ => {
                    debug!("Ignoring unknown preference '{}'", key);
                    preferences.other.insert(key, value);
                }
            }
        }

        preferences
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "on" | "1"
        ),
        Value::Number(n) => n.as_i64().map(|n| n != 0).unwrap_or(false),
        Value::Tagged(tagged) => truthy(&tagged.value),
        _ => false,
    }
}

impl Attributes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Each attribute as `(key, textual value)`, in descriptor order.
    pub fn text_entries(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.0
            .iter()
            .map(|(key, value)| (scalar_text(key), scalar_text(value)))
    }

    /// JSON view used as the template namespace.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .0
            .iter()
            .map(|(key, value)| {
                let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (scalar_text(key), value)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl From<Mapping> for Attributes {
    fn from(mapping: Mapping) -> Self {
        Attributes(mapping)
    }
}

/// Textual representation of a YAML value as written to attribute files.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
