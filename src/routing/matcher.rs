//! Path template matching logic.
//!
//! # Responsibilities
//! - Parse `/a/{x}/b` templates into segment lists
//! - Match a concrete path against a template, extracting named parameters
//!
//! # Design Decisions
//! - A parameter matches exactly one non-empty path segment (no slashes)
//! - Matching is case-sensitive and whole-path; no prefix matching
//! - Trailing slash is a distinct path (no normalization)
//! - No regex to guarantee O(segments) matching

use std::collections::HashMap;

/// One template segment: a literal to compare or a named parameter to
/// capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// Named parameters extracted from a matched path. Raw strings; type
/// coercion is the handler's responsibility.
#[derive(Debug, Clone, Default)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A parsed path template like `/users/{id}/devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    has_params: bool,
}

impl PathTemplate {
    /// Parse a template. `{name}` segments become parameters; everything
    /// else is literal, including an empty trailing segment for paths ending
    /// in `/`.
    pub fn parse(template: &str) -> Self {
        let segments = template
            .strip_prefix('/')
            .unwrap_or(template)
            .split('/')
            .map(|part| {
                match part
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                    _ => Segment::Literal(part.to_string()),
                }
            })
            .collect::<Vec<_>>();
        let has_params = segments.iter().any(|s| matches!(s, Segment::Param(_)));
        Self {
            raw: template.to_string(),
            segments,
            has_params,
        }
    }

    /// The template text as registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the template contains any `{name}` segments.
    pub fn has_params(&self) -> bool {
        self.has_params
    }

    /// Match `path` against this template. Returns extracted parameters on a
    /// full match, `None` otherwise.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut parts = path.strip_prefix('/').unwrap_or(path).split('/');
        let mut params = HashMap::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        // The whole path must be consumed.
        if parts.next().is_some() {
            return None;
        }
        Some(PathParams(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_named_parameters() {
        let template = PathTemplate::parse("/a/{x}/b/{y}");
        let params = template.matches("/a/42/b/foo").unwrap();
        assert_eq!(params.get("x"), Some("42"));
        assert_eq!(params.get("y"), Some("foo"));
    }

    #[test]
    fn literal_segments_must_match_exactly() {
        let template = PathTemplate::parse("/users/{id}");
        assert!(template.matches("/accounts/42").is_none());
        assert!(template.matches("/Users/42").is_none()); // case-sensitive
    }

    #[test]
    fn parameter_requires_a_non_empty_segment() {
        let template = PathTemplate::parse("/users/{id}");
        assert!(template.matches("/users/").is_none());
        assert!(template.matches("/users").is_none());
    }

    #[test]
    fn parameter_never_spans_slashes() {
        let template = PathTemplate::parse("/files/{name}");
        assert!(template.matches("/files/a/b").is_none());
    }

    #[test]
    fn trailing_slash_is_a_distinct_path() {
        let template = PathTemplate::parse("/users");
        assert!(template.matches("/users").is_some());
        assert!(template.matches("/users/").is_none());

        let slashed = PathTemplate::parse("/users/");
        assert!(slashed.matches("/users/").is_some());
        assert!(slashed.matches("/users").is_none());
    }

    #[test]
    fn literal_template_extracts_no_params() {
        let template = PathTemplate::parse("/health");
        let params = template.matches("/health").unwrap();
        assert!(params.is_empty());
        assert!(!template.has_params());
    }
}
