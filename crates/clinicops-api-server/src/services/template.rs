use crate::utils::error::ApiError;
use handlebars::Handlebars;

/// Renders workflow email subjects/bodies. Non-strict: a missing field
/// renders empty rather than failing the whole workflow run.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        Self { registry }
    }

    pub fn render(&self, template: &str, data: &serde_json::Value) -> Result<String, ApiError> {
        self.registry
            .render_template(template, data)
            .map_err(|e| ApiError::BadRequest(format!("template error: {}", e)))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitutes_fields() {
        let renderer = TemplateRenderer::new();
        let data = json!({
            "deal": { "title": "Implant plan", "value": "1200.00" },
            "patient": { "name": "Ana", "email": "ana@example.com" },
            "stage": { "name": "Treatment" },
        });

        let out = renderer
            .render("Hi {{patient.name}}, {{deal.title}} moved to {{stage.name}}", &data)
            .unwrap();
        assert_eq!(out, "Hi Ana, Implant plan moved to Treatment");
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let renderer = TemplateRenderer::new();
        let out = renderer
            .render("Hello {{patient.name}}!", &json!({ "deal": {} }))
            .unwrap();
        assert_eq!(out, "Hello !");
    }

    #[test]
    fn test_malformed_template_is_bad_request() {
        let renderer = TemplateRenderer::new();
        let err = renderer
            .render("{{#if}}", &serde_json::Value::Null)
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
