//! Template rendering
//!
//! Thin wrapper around a handlebars registry. Exactly four templates are
//! loaded from the configured directory: `index`, `no`, `404`, and `500`.

use std::path::Path;

use axum::response::Html;
use handlebars::Handlebars;

use crate::error::AppError;

/// Template names registered at startup
const TEMPLATE_NAMES: [&str; 4] = ["index", "no", "404", "500"];

/// Compiled template registry
#[derive(Debug)]
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Load and compile all templates from `dir`
    ///
    /// Each template is expected at `<dir>/<name>.hbs`.
    ///
    /// # Errors
    /// Returns error if any template file is missing or fails to compile
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let mut registry = Handlebars::new();

        for name in TEMPLATE_NAMES {
            let path = dir.join(format!("{name}.hbs"));
            registry.register_template_file(name, &path).map_err(|e| {
                AppError::Template(format!("failed to load {}: {e}", path.display()))
            })?;
        }

        tracing::debug!(dir = %dir.display(), "templates loaded");
        Ok(Self { registry })
    }

    /// Render a template to a string
    pub fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, AppError> {
        self.registry
            .render(name, context)
            .map_err(|e| AppError::Template(format!("failed to render {name}: {e}")))
    }

    /// Render a template as an HTML response body
    pub fn html(&self, name: &str, context: &serde_json::Value) -> Result<Html<String>, AppError> {
        self.render(name, context).map(Html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_fixtures(dir: &Path) {
        for name in TEMPLATE_NAMES {
            std::fs::write(
                dir.join(format!("{name}.hbs")),
                format!("<p id=\"{name}\">{{{{user}}}}</p>"),
            )
            .unwrap();
        }
    }

    #[test]
    fn loads_and_renders_all_templates() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let templates = Templates::load(dir.path()).unwrap();
        let body = templates
            .render("index", &json!({ "user": "null" }))
            .unwrap();

        assert_eq!(body, "<p id=\"index\">null</p>");
    }

    #[test]
    fn missing_template_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        std::fs::remove_file(dir.path().join("500.hbs")).unwrap();

        let error = Templates::load(dir.path()).expect_err("load must fail");
        assert!(matches!(error, AppError::Template(message) if message.contains("500.hbs")));
    }

    #[test]
    fn unregistered_template_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let templates = Templates::load(dir.path()).unwrap();
        let error = templates
            .render("profile", &json!({}))
            .expect_err("render must fail");
        assert!(matches!(error, AppError::Template(_)));
    }
}
