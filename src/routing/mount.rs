//! Mount path composition.

use crate::routing::target::TargetId;

/// Join URL path pieces with exactly one `/` between them.
///
/// A leading slash on `base` and a trailing slash on `path` are preserved.
pub fn url_path_join(base: &str, path: &str) -> String {
    let mut joined = String::with_capacity(base.len() + path.len() + 1);
    joined.push_str(base.trim_end_matches('/'));
    joined.push('/');
    joined.push_str(path.trim_start_matches('/'));
    joined
}

/// The path a backend is exposed at: `<base_url>/higlass/<id>`.
pub fn mount_path(base_url: &str, id: &TargetId) -> String {
    url_path_join(base_url, &format!("/higlass/{}", id))
}

/// Normalize a configured base URL into an axum nest prefix.
///
/// Returns `None` for the root mount, which must be merged rather than nested.
pub fn nest_prefix(base_url: &str) -> Option<String> {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}
