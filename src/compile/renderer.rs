//! Copy or template strategy applied uniformly to every compiled file

use crate::error::{NisoError, Result};
use crate::project::{Attributes, Preferences};
use handlebars::Handlebars;
use serde_json::json;
use std::path::Path;

/// Produces the bytes written to the compiled tree for one source file.
pub trait Renderer: Send + Sync {
    fn render(&self, source: &Path, attributes: &Attributes) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Copy,
    Template,
}

impl RenderMode {
    pub fn from_preferences(preferences: &Preferences) -> Self {
        if preferences.eval_erb {
            RenderMode::Template
        } else {
            RenderMode::Copy
        }
    }

    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            RenderMode::Copy => Box::new(CopyRenderer),
            RenderMode::Template => Box::new(TemplateRenderer::new()),
        }
    }
}

/// Byte-identical transfer.
pub struct CopyRenderer;

impl Renderer for CopyRenderer {
    fn render(&self, source: &Path, _attributes: &Attributes) -> Result<Vec<u8>> {
        Ok(std::fs::read(source)?)
    }
}

/// Handlebars rendering with a single `attributes` namespace.
///
/// Output is shell script text, so HTML escaping is disabled and missing
/// attributes render as empty strings.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    pub fn render_str(&self, template: &str, attributes: &Attributes) -> std::result::Result<String, String> {
        let context = json!({ "attributes": attributes.to_json() });
        self.handlebars
            .render_template(template, &context)
            .map_err(|e| e.to_string())
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, source: &Path, attributes: &Attributes) -> Result<Vec<u8>> {
        let bytes = std::fs::read(source)?;
        let template = String::from_utf8(bytes).map_err(|_| NisoError::Template {
            path: source.to_path_buf(),
            message: "file is not valid UTF-8".to_string(),
        })?;

        self.render_str(&template, attributes)
            .map(String::into_bytes)
            .map_err(|message| NisoError::Template {
                path: source.to_path_buf(),
                message,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectConfig;

    fn attributes(yaml: &str) -> Attributes {
        ProjectConfig::from_yaml_str(yaml).unwrap().attributes
    }

    #[test]
    fn test_mode_selection() {
        let mut preferences = Preferences::default();
        assert_eq!(RenderMode::from_preferences(&preferences), RenderMode::Copy);

        preferences.eval_erb = true;
        assert_eq!(
            RenderMode::from_preferences(&preferences),
            RenderMode::Template
        );
    }

    #[test]
    fn test_template_does_not_escape_shell() {
        let renderer = TemplateRenderer::new();
        let attrs = attributes("attributes:\n  cmd: \"a && b > /tmp/'x'\"\n");

        let rendered = renderer
            .render_str("run {{attributes.cmd}}", &attrs)
            .unwrap();
        assert_eq!(rendered, "run a && b > /tmp/'x'");
    }

    #[test]
    fn test_template_missing_attribute_is_empty() {
        let renderer = TemplateRenderer::new();
        let rendered = renderer
            .render_str("[{{attributes.nope}}]", &Attributes::default())
            .unwrap();
        assert_eq!(rendered, "[]");
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        let bytes = vec![0u8, 159, 146, 150, b'{', b'{'];
        std::fs::write(&path, &bytes).unwrap();

        let copied = CopyRenderer.render(&path, &Attributes::default()).unwrap();
        assert_eq!(copied, bytes);
    }

    #[test]
    fn test_template_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, [0xffu8, 0xfe]).unwrap();

        let result = TemplateRenderer::new().render(&path, &Attributes::default());
        assert!(matches!(result, Err(NisoError::Template { .. })));
    }
}
