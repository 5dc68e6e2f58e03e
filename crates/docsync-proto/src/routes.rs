//! HTTP route scheme.
//!
//! Route structure: `{prefix}/v1/docs`, `{prefix}/v1/docs/{doc_id}` and
//! `{prefix}/v1/docs/{doc_id}/ops`
//!
//! Document identifiers are percent-encoded when building concrete paths so
//! that any string can be used as an id.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

/// API version segment.
pub const API_VERSION: &str = "v1";

/// Axum path pattern for the document listing.
pub const DOCS_ROUTE: &str = "/v1/docs";

/// Axum path pattern for a document.
pub const DOC_ROUTE: &str = "/v1/docs/{doc_id}";

/// Axum path pattern for a document's op-log.
pub const OPS_ROUTE: &str = "/v1/docs/{doc_id}/ops";

/// Axum path pattern for the health check.
pub const HEALTH_ROUTE: &str = "/health";

/// Characters escaped in a document id path segment.
const DOC_ID_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

/// Builds concrete paths below an optional prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteScheme {
    /// Path prefix without trailing slash (e.g. `"/sync"`), empty by default
    pub prefix: String,
}

impl RouteScheme {
    /// Create a scheme mounted below `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Path of the document listing.
    #[must_use]
    pub fn docs(&self) -> String {
        format!("{}/{}/docs", self.prefix, API_VERSION)
    }

    /// Path of a document.
    #[must_use]
    pub fn doc(&self, doc_id: &str) -> String {
        format!(
            "{}/{}/docs/{}",
            self.prefix,
            API_VERSION,
            utf8_percent_encode(doc_id, DOC_ID_ESCAPE)
        )
    }

    /// Path of a document's op-log.
    #[must_use]
    pub fn ops(&self, doc_id: &str) -> String {
        format!("{}/ops", self.doc(doc_id))
    }

    /// Path of the health check.
    #[must_use]
    pub fn health(&self) -> String {
        format!("{}{HEALTH_ROUTE}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_generation() {
        let scheme = RouteScheme::default();

        assert_eq!(scheme.docs(), DOCS_ROUTE);
        assert_eq!(scheme.doc("d1"), "/v1/docs/d1");
        assert_eq!(scheme.ops("d1"), "/v1/docs/d1/ops");
        assert_eq!(scheme.health(), "/health");
    }

    #[test]
    fn prefix_is_normalised() {
        let scheme = RouteScheme::new("/sync/");
        assert_eq!(scheme.doc("d1"), "/sync/v1/docs/d1");
        assert_eq!(scheme.health(), "/sync/health");
    }

    #[test]
    fn doc_ids_are_escaped() {
        let scheme = RouteScheme::default();
        assert_eq!(
            scheme.doc("urn:doc/with space?"),
            "/v1/docs/urn:doc%2Fwith%20space%3F"
        );
    }
}
