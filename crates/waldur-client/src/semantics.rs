//! Tool annotations derived from the HTTP method a tool sends.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Annotations for a tool that issues `method` against the Waldur API.
///
/// `openWorldHint` is always set: every tool talks to the remote platform. Methods other than
/// `GET`/`HEAD` and `POST` only get the open-world hint.
#[must_use]
pub fn annotations_for_method(method: &Method, title: &str) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = if method == Method::GET || method == Method::HEAD
    {
        (Some(true), Some(false), Some(true))
    } else if method == Method::POST {
        (Some(false), Some(false), Some(false))
    } else {
        (None, None, None)
    };

    ToolAnnotations {
        title: Some(title.to_string()),
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

/// Annotations for a `POST` endpoint that only reads data (the SQL query endpoint).
///
/// Read-only enforcement happens upstream; the hint describes intended use.
#[must_use]
pub fn read_only_post_annotations(title: &str) -> ToolAnnotations {
    ToolAnnotations {
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: None,
        ..annotations_for_method(&Method::POST, title)
    }
}

#[cfg(test)]
mod tests {
    use super::{annotations_for_method, read_only_post_annotations};
    use reqwest::Method;

    #[test]
    fn get_is_read_only_and_idempotent() {
        let a = annotations_for_method(&Method::GET, "List projects");
        assert_eq!(a.title.as_deref(), Some("List projects"));
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(true));
        assert_eq!(a.open_world_hint, Some(true));
    }

    #[test]
    fn post_creates_and_is_not_idempotent() {
        let a = annotations_for_method(&Method::POST, "Invite");
        assert_eq!(a.read_only_hint, Some(false));
        assert_eq!(a.idempotent_hint, Some(false));
    }

    #[test]
    fn other_methods_only_set_open_world() {
        let a = annotations_for_method(&Method::DELETE, "x");
        assert_eq!(a.read_only_hint, None);
        assert_eq!(a.destructive_hint, None);
        assert_eq!(a.open_world_hint, Some(true));
    }

    #[test]
    fn query_post_is_annotated_read_only() {
        let a = read_only_post_annotations("Run query");
        assert_eq!(a.read_only_hint, Some(true));
        assert_eq!(a.destructive_hint, Some(false));
        assert_eq!(a.idempotent_hint, None);
        assert_eq!(a.open_world_hint, Some(true));
    }
}
