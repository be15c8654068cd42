//! OpenAPI 3.0 document types

use crate::path::{normalize_path, path_params};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version string written into every new document. Only 3.0.0 is supported.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// A complete OpenAPI document.
///
/// Unknown top-level fields (vendor extensions such as `x-logo`) survive a
/// round trip through [`OpenApiDocument::extensions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// API information block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reusable component definitions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, serde_json::Value>,
}

/// Operations available on a single path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

/// Operation (endpoint) in an OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, ResponseSpec>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
    /// Component schemas referenced by this operation, moved into the
    /// document's `components` when the operation is recorded.
    #[serde(skip)]
    pub(crate) schema_definitions: BTreeMap<String, serde_json::Value>,
}

/// Parameter in an OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterIn,
    #[serde(default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    Path,
    Query,
    Header,
    Cookie,
}

/// Request body in an OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: BTreeMap<String, MediaType>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

/// Media type in an OpenAPI document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
}

/// Response specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

/// Schema reference or inline schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(serde_json::Value),
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl OpenApiDocument {
    /// Create an empty document with the given title and version
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info::new(title, version),
            servers: Vec::new(),
            paths: BTreeMap::new(),
            components: None,
            tags: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }

    /// Replace the info block
    pub fn set_info(&mut self, info: Info) {
        self.info = info;
    }

    /// Record an operation for `path` and `method`.
    ///
    /// The path is normalized to brace syntax and any template parameter the
    /// operation does not declare is added as a required path parameter. A
    /// later call for the same key replaces the earlier operation, which is
    /// returned. Methods that OpenAPI 3.0 has no slot for are ignored.
    pub fn add_operation(
        &mut self,
        path: &str,
        method: &Method,
        mut operation: Operation,
    ) -> Option<Operation> {
        if !is_documented_method(method) {
            tracing::debug!(method = %method, path, "method has no OpenAPI slot; not documented");
            return None;
        }

        let path = normalize_path(path);
        operation.ensure_path_parameters(&path);

        let definitions = std::mem::take(&mut operation.schema_definitions);
        if !definitions.is_empty() {
            self.components
                .get_or_insert_with(Components::default)
                .schemas
                .extend(definitions);
        }

        let item = self.paths.entry(path).or_default();
        item.slot_mut(method)
            .and_then(|slot| slot.replace(operation))
    }

    /// Look up the operation recorded for `path` and `method`
    pub fn operation(&self, path: &str, method: &Method) -> Option<&Operation> {
        self.paths
            .get(&normalize_path(path))
            .and_then(|item| item.operation(method))
    }

    /// Add a schema definition under `#/components/schemas/{name}`
    pub fn schema(mut self, name: &str, schema: serde_json::Value) -> Self {
        self.components
            .get_or_insert_with(Components::default)
            .schemas
            .insert(name.to_string(), schema);
        self
    }

    /// Register a type that implements `utoipa::ToSchema`
    pub fn register<T: for<'a> utoipa::ToSchema<'a>>(self) -> Self {
        match schema_of::<T>() {
            Some((name, schema)) => self.schema(&name, schema),
            None => self,
        }
    }

    /// Add a server entry
    pub fn server(mut self, url: impl Into<String>, description: Option<&str>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description: description.map(str::to_string),
        });
        self
    }

    /// Add a top-level tag description
    pub fn tag(mut self, name: impl Into<String>, description: Option<&str>) -> Self {
        self.tags.push(Tag {
            name: name.into(),
            description: description.map(str::to_string),
        });
        self
    }

    /// Serialize the document to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize the document to a pretty-printed JSON string
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for OpenApiDocument {
    /// Titled after the running executable, version `1.0.0`.
    fn default() -> Self {
        Self::new(default_title(), "1.0.0")
    }
}

fn default_title() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "API".to_string())
}

/// Whether OpenAPI 3.0 has a path item slot for `method`
pub fn is_documented_method(method: &Method) -> bool {
    matches!(
        method.as_str(),
        "GET" | "PUT" | "POST" | "DELETE" | "OPTIONS" | "HEAD" | "PATCH" | "TRACE"
    )
}

impl Info {
    /// Create an info block with a title and version
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
        }
    }

    /// Set description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn terms_of_service(mut self, url: impl Into<String>) -> Self {
        self.terms_of_service = Some(url.into());
        self
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn license(mut self, name: impl Into<String>, url: Option<&str>) -> Self {
        self.license = Some(License {
            name: name.into(),
            url: url.map(str::to_string),
        });
        self
    }
}

impl PathItem {
    /// The operation stored for `method`, if any
    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        match method.as_str() {
            "GET" => self.get.as_ref(),
            "PUT" => self.put.as_ref(),
            "POST" => self.post.as_ref(),
            "DELETE" => self.delete.as_ref(),
            "OPTIONS" => self.options.as_ref(),
            "HEAD" => self.head.as_ref(),
            "PATCH" => self.patch.as_ref(),
            "TRACE" => self.trace.as_ref(),
            _ => None,
        }
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<Operation>> {
        match method.as_str() {
            "GET" => Some(&mut self.get),
            "PUT" => Some(&mut self.put),
            "POST" => Some(&mut self.post),
            "DELETE" => Some(&mut self.delete),
            "OPTIONS" => Some(&mut self.options),
            "HEAD" => Some(&mut self.head),
            "PATCH" => Some(&mut self.patch),
            "TRACE" => Some(&mut self.trace),
            _ => None,
        }
    }

    /// Iterate over the methods that carry an operation
    pub fn methods(&self) -> impl Iterator<Item = (Method, &Operation)> {
        [
            (Method::GET, &self.get),
            (Method::PUT, &self.put),
            (Method::POST, &self.post),
            (Method::DELETE, &self.delete),
            (Method::OPTIONS, &self.options),
            (Method::HEAD, &self.head),
            (Method::PATCH, &self.patch),
            (Method::TRACE, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

impl Operation {
    /// Create a new operation with a default `200` response
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            summary: None,
            description: None,
            operation_id: None,
            parameters: Vec::new(),
            request_body: None,
            responses: BTreeMap::from([(
                "200".to_string(),
                ResponseSpec {
                    description: "Successful response".to_string(),
                    content: BTreeMap::new(),
                },
            )]),
            deprecated: false,
            schema_definitions: BTreeMap::new(),
        }
    }

    /// Set summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set the operation id
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add a parameter
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the request body
    pub fn request_body(mut self, body: RequestBody) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Require a JSON request body of type `T`
    pub fn json_body<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let schema = self.reference::<T>();
        self.request_body = Some(RequestBody {
            description: None,
            content: json_content(schema),
            required: true,
        });
        self
    }

    /// Document a response without a body
    pub fn response(mut self, status: u16, description: impl Into<String>) -> Self {
        self.responses.insert(
            status.to_string(),
            ResponseSpec {
                description: description.into(),
                content: BTreeMap::new(),
            },
        );
        self
    }

    /// Document a JSON response of type `T`
    pub fn json_response<T: for<'a> utoipa::ToSchema<'a>>(
        mut self,
        status: u16,
        description: impl Into<String>,
    ) -> Self {
        let schema = self.reference::<T>();
        self.responses.insert(
            status.to_string(),
            ResponseSpec {
                description: description.into(),
                content: json_content(schema),
            },
        );
        self
    }

    /// Mark the operation deprecated
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Add a required string path parameter for every `{param}` of `path`
    /// that is not declared yet.
    pub fn ensure_path_parameters(&mut self, path: &str) {
        for name in path_params(path) {
            let declared = self
                .parameters
                .iter()
                .any(|p| p.location == ParameterIn::Path && p.name == name);
            if !declared {
                self.parameters.push(Parameter::path(name));
            }
        }
    }

    fn reference<T: for<'a> utoipa::ToSchema<'a>>(&mut self) -> Option<SchemaRef> {
        let (name, schema) = schema_of::<T>()?;
        let reference = SchemaRef::component(&name);
        self.schema_definitions.insert(name, schema);
        Some(reference)
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::new()
    }
}

impl Parameter {
    /// A required string path parameter
    pub fn path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterIn::Path,
            required: true,
            description: None,
            schema: Some(SchemaRef::string()),
        }
    }

    /// An optional string query parameter
    pub fn query(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterIn::Query,
            required: false,
            description: None,
            schema: Some(SchemaRef::string()),
        }
    }

    /// An optional string header parameter
    pub fn header(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ParameterIn::Header,
            required: false,
            description: None,
            schema: Some(SchemaRef::string()),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl SchemaRef {
    /// Reference to `#/components/schemas/{name}`
    pub fn component(name: &str) -> Self {
        SchemaRef::Ref {
            reference: format!("#/components/schemas/{}", name),
        }
    }

    /// Inline `{"type": "string"}`
    pub fn string() -> Self {
        SchemaRef::Inline(serde_json::json!({ "type": "string" }))
    }
}

fn json_content(schema: Option<SchemaRef>) -> BTreeMap<String, MediaType> {
    BTreeMap::from([("application/json".to_string(), MediaType { schema })])
}

fn schema_of<T: for<'a> utoipa::ToSchema<'a>>() -> Option<(String, serde_json::Value)> {
    let (name, schema) = T::schema();
    match serde_json::to_value(schema) {
        Ok(json) => Some((name.to_string(), json)),
        Err(err) => {
            tracing::error!(schema = name, error = %err, "failed to encode component schema");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(utoipa::ToSchema)]
    #[allow(dead_code)]
    struct Pet {
        id: u64,
        name: String,
    }

    #[test]
    fn empty_document_serializes_to_minimal_shape() {
        let doc = OpenApiDocument::new("Pet Store", "1.0.0");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "openapi": "3.0.0",
                "info": { "title": "Pet Store", "version": "1.0.0" },
                "paths": {}
            })
        );
    }

    #[test]
    fn default_document_uses_version_one() {
        let doc = OpenApiDocument::default();
        assert_eq!(doc.openapi, OPENAPI_VERSION);
        assert_eq!(doc.info.version, "1.0.0");
        assert!(!doc.info.title.is_empty());
    }

    #[test]
    fn add_operation_normalizes_and_adds_path_params() {
        let mut doc = OpenApiDocument::new("t", "1");
        doc.add_operation("/pets/:id", &Method::GET, Operation::new().summary("Get pet"));

        let op = doc.operation("/pets/{id}", &Method::GET).unwrap();
        assert_eq!(op.summary.as_deref(), Some("Get pet"));
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].name, "id");
        assert_eq!(op.parameters[0].location, ParameterIn::Path);
        assert!(op.parameters[0].required);
    }

    #[test]
    fn declared_path_params_are_not_duplicated() {
        let mut doc = OpenApiDocument::new("t", "1");
        let op = Operation::new().parameter(Parameter::path("id").description("Pet id"));
        doc.add_operation("/pets/{id}", &Method::DELETE, op);

        let op = doc.operation("/pets/{id}", &Method::DELETE).unwrap();
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].description.as_deref(), Some("Pet id"));
    }

    #[test]
    fn later_registration_wins() {
        let mut doc = OpenApiDocument::new("t", "1");
        assert!(doc
            .add_operation("/pets", &Method::GET, Operation::new().summary("first"))
            .is_none());
        let replaced = doc.add_operation("/pets", &Method::GET, Operation::new().summary("second"));

        assert_eq!(replaced.unwrap().summary.as_deref(), Some("first"));
        assert_eq!(
            doc.operation("/pets", &Method::GET).unwrap().summary.as_deref(),
            Some("second")
        );
        assert_eq!(doc.paths.len(), 1);
    }

    #[test]
    fn methods_share_a_path_item() {
        let mut doc = OpenApiDocument::new("t", "1");
        doc.add_operation("/pets", &Method::GET, Operation::new());
        doc.add_operation("/pets", &Method::POST, Operation::new());

        let methods: Vec<Method> = doc.paths["/pets"].methods().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn undocumented_methods_leave_paths_untouched() {
        let mut doc = OpenApiDocument::new("t", "1");
        doc.add_operation("/tunnel", &Method::CONNECT, Operation::new());
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn json_body_registers_component() {
        let mut doc = OpenApiDocument::new("t", "1");
        doc.add_operation(
            "/pets",
            &Method::POST,
            Operation::new().json_body::<Pet>().json_response::<Pet>(201, "Created"),
        );

        let value = serde_json::to_value(&doc).unwrap();
        assert!(value["components"]["schemas"]["Pet"].is_object());
        assert_eq!(
            value["paths"]["/pets"]["post"]["requestBody"]["content"]["application/json"]["schema"]
                ["$ref"],
            "#/components/schemas/Pet"
        );
        assert_eq!(value["paths"]["/pets"]["post"]["responses"]["201"]["description"], "Created");
    }

    #[test]
    fn extensions_round_trip() {
        let raw = json!({
            "openapi": "3.0.0",
            "info": { "title": "t", "version": "1" },
            "paths": {},
            "x-logo": { "url": "https://example.com/logo.png" }
        });
        let doc: OpenApiDocument = serde_json::from_value(raw.clone()).unwrap();
        assert!(doc.extensions.contains_key("x-logo"));
        assert_eq!(serde_json::to_value(&doc).unwrap(), raw);
    }

    #[test]
    fn info_builder_sets_optional_fields() {
        let info = Info::new("Pets", "2.0.0")
            .description("All the pets")
            .license("MIT", None);
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["description"], "All the pets");
        assert_eq!(value["license"]["name"], "MIT");
        assert!(value.get("contact").is_none());
    }
}
