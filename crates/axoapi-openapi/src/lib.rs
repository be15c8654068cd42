//! OpenAPI documentation for axoapi
//!
//! This crate holds the OpenAPI 3.0 document model that axoapi fills in while
//! routes are registered, plus the Redoc page that renders it in a browser.
//! Component schemas are derived with `utoipa`.
//!
//! # Usage
//!
//! ```rust
//! use axoapi_openapi::{OpenApiDocument, Operation};
//! use http::Method;
//!
//! let mut doc = OpenApiDocument::new("Pet Store", "1.0.0");
//! doc.add_operation("/pets/:id", &Method::GET, Operation::new().summary("Find pet by ID"));
//!
//! assert!(doc.paths.contains_key("/pets/{id}"));
//! ```

mod config;
mod path;
mod redoc;
mod spec;

pub use config::{OpenApiConfig, RedocOptions, DEFAULT_SCHEMA_PATH, DEFAULT_SCHEMA_UI_PATH};
pub use path::{join_paths, normalize_path, path_params};
pub use redoc::{generate_redoc_html, RedocUi};
pub use spec::{
    is_documented_method, Components, Contact, Info, License, MediaType, OpenApiDocument,
    Operation, Parameter, ParameterIn, PathItem, RequestBody, ResponseSpec, SchemaRef, Server,
    Tag, OPENAPI_VERSION,
};

// Re-export utoipa's ToSchema derive macro as Schema
pub use utoipa::ToSchema as Schema;

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::Full;

/// Generate the OpenAPI JSON response.
///
/// A serialization failure is logged and answered with `500`.
pub fn openapi_json(doc: &OpenApiDocument) -> Response<Full<Bytes>> {
    match doc.to_json() {
        Ok(json) => with_content_type(StatusCode::OK, "application/json", json),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize OpenAPI document");
            with_content_type(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain; charset=utf-8",
                "Failed to serialize OpenAPI document".to_string(),
            )
        }
    }
}

/// Generate the Redoc UI HTML response
pub fn redoc_html(ui: &RedocUi) -> Response<Full<Bytes>> {
    with_content_type(StatusCode::OK, "text/html; charset=utf-8", ui.render())
}

fn with_content_type(
    status: StatusCode,
    content_type: &'static str,
    body: String,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn json_response_has_document_body() {
        let doc = OpenApiDocument::new("Pet Store", "1.0.0");
        let response = openapi_json(&doc);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["openapi"], "3.0.0");
        assert_eq!(body["info"]["title"], "Pet Store");
    }

    #[tokio::test]
    async fn html_response_has_utf8_content_type() {
        let ui = RedocUi::new("/openapi.json", &RedocOptions::builtin());
        let response = redoc_html(&ui);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert!(body_string(response).await.contains("/openapi.json"));
    }
}
