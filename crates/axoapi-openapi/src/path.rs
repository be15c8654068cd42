//! Path template normalization
//!
//! axum (like most routers) spells parameters as `:name` and wildcards as
//! `*name`. OpenAPI only knows the brace form, so every path is rewritten
//! before it is used as a key in the document.

/// Rewrite a router path template into OpenAPI brace syntax.
///
/// `:id` and `*rest` segments become `{id}` and `{rest}`; segments already in
/// brace form are kept. The result always starts with `/`.
///
/// ```
/// use axoapi_openapi::normalize_path;
///
/// assert_eq!(normalize_path("/pets/:id"), "/pets/{id}");
/// assert_eq!(normalize_path("files/*path"), "/files/{path}");
/// assert_eq!(normalize_path("/pets/{id}"), "/pets/{id}");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        out.push('/');
    }

    for (i, segment) in path.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        match segment
            .strip_prefix(':')
            .or_else(|| segment.strip_prefix('*'))
        {
            Some(name) if !name.is_empty() => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            _ => out.push_str(segment),
        }
    }

    out
}

/// Names of the `{param}` placeholders of a normalized path, in order.
pub fn path_params(path: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut in_brace = false;
    let mut current = String::new();

    for ch in path.chars() {
        match ch {
            '{' => {
                in_brace = true;
                current.clear();
            }
            '}' if in_brace => {
                in_brace = false;
                if !current.is_empty() {
                    params.push(current.clone());
                }
            }
            _ if in_brace => current.push(ch),
            _ => {}
        }
    }

    params
}

/// Join a group prefix and a relative route path the way the router sees it.
///
/// Duplicate slashes are collapsed. A trailing slash on `relative` is kept,
/// except when `relative` is exactly `/`, which addresses the group root.
pub fn join_paths(prefix: &str, relative: &str) -> String {
    if relative.is_empty() || relative == "/" {
        return clean(prefix);
    }

    let mut joined = clean(&format!("{}/{}", prefix, relative));
    if relative.ends_with('/') && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

fn clean(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}
