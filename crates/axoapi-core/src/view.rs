//! HTML templates
//!
//! The engine loads templates once during setup and hands a shared
//! [`Templates`] to every request as an `Extension`.
//!
//! ```rust,ignore
//! async fn index(Extension(templates): Extension<Templates>) -> Result<Html<String>, ViewError> {
//!     let mut ctx = Context::new();
//!     ctx.insert("title", "Pet Store");
//!     templates.render("index.html", &ctx)
//! }
//! ```

use axum::response::{Html, IntoResponse, Response};
use http::StatusCode;
use std::path::Path;
use std::sync::Arc;
use tera::Tera;
use thiserror::Error;

pub use tera::Context;

/// Errors raised while rendering a template
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to serialize template context: {0}")]
    Serialization(String),
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "template rendering failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// A loaded set of templates, cheap to clone
#[derive(Clone)]
pub struct Templates {
    inner: Arc<Tera>,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("templates", &self.template_names())
            .finish()
    }
}

impl Templates {
    /// Load every template matching a glob pattern, e.g. `templates/**/*.html`
    pub fn from_glob(pattern: &str) -> crate::Result<Self> {
        let tera = Tera::new(pattern)?;
        Ok(Self::from_tera(tera))
    }

    /// Load the given files; each template is named after its file name
    pub fn from_files<I, P>(files: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files: Vec<(std::path::PathBuf, Option<String>)> = files
            .into_iter()
            .map(|file| {
                let file = file.as_ref().to_path_buf();
                let name = file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                (file, name)
            })
            .collect();

        let mut tera = Tera::default();
        tera.add_template_files(files)?;
        Ok(Self::from_tera(tera))
    }

    /// Use a `Tera` instance that was built by the caller
    pub fn from_tera(tera: Tera) -> Self {
        Self {
            inner: Arc::new(tera),
        }
    }

    /// Render a template to an HTML response body
    pub fn render(&self, template: &str, context: &Context) -> Result<Html<String>, ViewError> {
        Ok(Html(self.inner.render(template, context)?))
    }

    /// Render a template with a serializable context
    pub fn render_with<T: serde::Serialize>(
        &self,
        template: &str,
        data: &T,
    ) -> Result<Html<String>, ViewError> {
        let context =
            Context::from_serialize(data).map_err(|e| ViewError::Serialization(e.to_string()))?;
        self.render(template, &context)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.inner.get_template_names().any(|n| n == name)
    }

    pub fn template_names(&self) -> Vec<String> {
        self.inner.get_template_names().map(String::from).collect()
    }
}
