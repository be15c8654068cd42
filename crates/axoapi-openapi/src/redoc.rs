//! Redoc UI HTML generation

use crate::config::RedocOptions;

const REDOC_TEMPLATE: &str = include_str!("assets/redoc.html");
const SPEC_URL_SLOT: &str = "{{spec_url}}";
const OPTIONS_SLOT: &str = "{{options}}";

/// A Redoc page bound to one document URL.
///
/// Options are encoded once here; [`RedocUi::render`] only substitutes the
/// two prepared strings into the template.
#[derive(Debug, Clone)]
pub struct RedocUi {
    spec_url: String,
    options: String,
}

impl RedocUi {
    /// Prepare a page that loads the document from `spec_url`.
    ///
    /// An options encoding failure is logged and replaced by `{}`, so the page
    /// still loads with Redoc's defaults.
    pub fn new(spec_url: &str, options: &RedocOptions) -> Self {
        let options = match serde_json::to_string(options) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode Redoc options; using defaults");
                "{}".to_string()
            }
        };

        Self {
            spec_url: script_safe(serde_json::Value::from(spec_url).to_string()),
            options: script_safe(options),
        }
    }

    /// Encoded options as embedded in the page
    pub fn options_json(&self) -> &str {
        &self.options
    }

    /// Render the complete HTML page
    pub fn render(&self) -> String {
        REDOC_TEMPLATE
            .replace(SPEC_URL_SLOT, &self.spec_url)
            .replace(OPTIONS_SLOT, &self.options)
    }
}

/// Escape `<` inside JSON embedded in a `<script>` element so no value can
/// close the element. `\u003c` decodes back to `<` in JavaScript.
fn script_safe(json: String) -> String {
    json.replace('<', "\\u003c")
}

/// Render a Redoc page for `spec_url` with the given options
pub fn generate_redoc_html(spec_url: &str, options: &RedocOptions) -> String {
    RedocUi::new(spec_url, options).render()
}
