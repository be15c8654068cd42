//! OpenAPI serving configuration and Redoc display options

use serde::{Deserialize, Serialize};

/// Default path of the JSON document endpoint
pub const DEFAULT_SCHEMA_PATH: &str = "/openapi.json";
/// Default path of the documentation UI endpoint
pub const DEFAULT_SCHEMA_UI_PATH: &str = "/openapi";

/// Where (and whether) the document and its UI are served
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    /// Path to serve the OpenAPI JSON document
    pub schema_path: String,
    /// Path to serve the Redoc UI
    pub schema_ui_path: String,
    /// Whether the two endpoints are mounted at all
    pub enabled: bool,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            schema_path: DEFAULT_SCHEMA_PATH.to_string(),
            schema_ui_path: DEFAULT_SCHEMA_UI_PATH.to_string(),
            enabled: true,
        }
    }
}

impl OpenApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set path for the OpenAPI JSON endpoint
    pub fn schema_path(mut self, path: impl Into<String>) -> Self {
        self.schema_path = path.into();
        self
    }

    /// Set path for the Redoc UI
    pub fn schema_ui_path(mut self, path: impl Into<String>) -> Self {
        self.schema_ui_path = path.into();
        self
    }

    /// Turn off both endpoints
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Redoc display options, injected into the rendered page as JSON.
///
/// Every field is omitted from the JSON while it holds its zero value, so
/// Redoc applies its own default.
/// See <https://redocly.com/docs/api-reference-docs/configuration/functionality/>.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedocOptions {
    #[serde(skip_serializing_if = "is_false")]
    pub disable_search: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub min_character_length_to_init_search: u32,
    #[serde(skip_serializing_if = "is_false")]
    pub expand_default_server_variables: bool,
    #[serde(skip_serializing_if = "is_blank")]
    pub expand_responses: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub expand_single_schema_field: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_download_button: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_hostname: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_loading: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_request_payload_sample: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_schema_pattern: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_one_of_description: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_schema_titles: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_single_request_sample_tab: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub show_object_schema_examples: bool,
    #[serde(skip_serializing_if = "is_blank")]
    pub html_template: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub max_displayed_enum_values: u32,
    /// Tri-state: `None` leaves Redoc's default (enabled) in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_toggle: Option<bool>,
    #[serde(skip_serializing_if = "is_false")]
    pub native_scrollbars: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub only_required_in_samples: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub path_in_middle_panel: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub payload_sample_idx: u32,
    #[serde(skip_serializing_if = "is_false")]
    pub required_props_first: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub show_webhook_verbose: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_security_section: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub simple_one_of_type_label: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub sort_props_alphabetically: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub untrusted_definition: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl RedocOptions {
    /// All toggles at Redoc's defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used when the caller provides none: the download button is hidden.
    pub fn builtin() -> Self {
        Self {
            hide_download_button: true,
            ..Self::default()
        }
    }

    pub fn hide_download_button(mut self, hide: bool) -> Self {
        self.hide_download_button = hide;
        self
    }

    pub fn disable_search(mut self, disable: bool) -> Self {
        self.disable_search = disable;
        self
    }

    /// Comma separated status codes to expand, or `"all"`
    pub fn expand_responses(mut self, codes: impl Into<String>) -> Self {
        self.expand_responses = Some(codes.into());
        self
    }

    pub fn menu_toggle(mut self, enabled: bool) -> Self {
        self.menu_toggle = Some(enabled);
        self
    }

    pub fn sort_props_alphabetically(mut self, sort: bool) -> Self {
        self.sort_props_alphabetically = sort;
        self
    }

    pub fn required_props_first(mut self, first: bool) -> Self {
        self.required_props_first = first;
        self
    }

    pub fn native_scrollbars(mut self, native: bool) -> Self {
        self.native_scrollbars = native;
        self
    }

    pub fn untrusted_definition(mut self, untrusted: bool) -> Self {
        self.untrusted_definition = untrusted;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_options_serialize_empty() {
        assert_eq!(serde_json::to_value(RedocOptions::new()).unwrap(), json!({}));
    }

    #[test]
    fn builtin_hides_download_button() {
        let encoded = serde_json::to_string(&RedocOptions::builtin()).unwrap();
        assert_eq!(encoded, r#"{"hideDownloadButton":true}"#);
    }

    #[test]
    fn fields_use_redoc_names() {
        let options = RedocOptions {
            min_character_length_to_init_search: 5,
            hide_one_of_description: true,
            simple_one_of_type_label: true,
            html_template: Some("./index.html".to_string()),
            ..RedocOptions::default()
        }
        .expand_responses("200,201")
        .menu_toggle(false);

        let value = serde_json::to_value(options).unwrap();
        assert_eq!(value["minCharacterLengthToInitSearch"], 5);
        assert_eq!(value["hideOneOfDescription"], true);
        assert_eq!(value["simpleOneOfTypeLabel"], true);
        assert_eq!(value["htmlTemplate"], "./index.html");
        assert_eq!(value["expandResponses"], "200,201");
        assert_eq!(value["menuToggle"], false);
    }

    #[test]
    fn empty_strings_are_omitted() {
        let options = RedocOptions {
            html_template: Some(String::new()),
            ..RedocOptions::default()
        }
        .expand_responses("");
        assert_eq!(serde_json::to_value(options).unwrap(), json!({}));
    }

    #[test]
    fn config_defaults() {
        let config = OpenApiConfig::default();
        assert_eq!(config.schema_path, "/openapi.json");
        assert_eq!(config.schema_ui_path, "/openapi");
        assert!(config.enabled);
        assert!(!config.disabled().enabled);
    }
}
