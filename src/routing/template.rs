//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Compile templates (`/users/{id}/files/{rest:*}`) once, at registration
//! - Prefix matching for service roots
//! - Full matching for routes inside a service
//! - Specificity ordering used to break ties
//!
//! # Design Decisions
//! - Segment based: empty segments are ignored, so `/a/`, `a` and `/a` are equal
//! - Parameters capture exactly one non-empty segment
//! - A wildcard is only allowed as the last segment and may match nothing
//! - No regex: matching is a single bounded pass over the segments
//! - Request paths are split before they are percent-decoded

use std::fmt;

use serde::{Serialize, Serializer};

use crate::routing::error::RoutingError;

const RANK_WILDCARD: u8 = 0;
const RANK_END: u8 = 1;
const RANK_PARAM: u8 = 2;
const RANK_LITERAL: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard(Option<String>),
}

impl Segment {
    fn name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(name) => Some(name),
            Segment::Wildcard(name) => name.as_deref(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Segment::Literal(_) => RANK_LITERAL,
            Segment::Param(_) => RANK_PARAM,
            Segment::Wildcard(_) => RANK_WILDCARD,
        }
    }
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

/// Path parameters captured during matching, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Look up a captured value by parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_string(), value.into()));
    }

    pub(crate) fn extend(&mut self, other: PathParams) {
        self.0.extend(other.0);
    }
}

impl Serialize for PathParams {
    /// Serializes as a name → value map.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Result of matching a template against the start of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    /// Number of path segments consumed by the template.
    pub consumed: usize,
    /// Parameters captured by the template.
    pub params: PathParams,
    /// The unconsumed part of the path, always starting with `/`.
    pub remaining: String,
}

/// Ordering key for templates; greater is more specific.
///
/// Compares segment by segment: literal > parameter > end of template > wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(Vec<u8>);

impl PathTemplate {
    /// Compile a template string.
    pub fn compile(template: &str) -> Result<Self, RoutingError> {
        let mut segments: Vec<Segment> = Vec::new();

        for raw in split(template) {
            if matches!(segments.last(), Some(Segment::Wildcard(_))) {
                return Err(RoutingError::malformed(
                    template,
                    "wildcard must be the last segment",
                ));
            }

            let segment = parse_segment(template, raw)?;
            if let Some(name) = segment.name() {
                if segments.iter().any(|s| s.name() == Some(name)) {
                    return Err(RoutingError::malformed(
                        template,
                        format!("duplicate parameter {:?}", name),
                    ));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True for `""` and `/`.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if the last segment is a wildcard.
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    /// Names of parameters and named wildcards, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::name)
    }

    /// Match the template against the beginning of `path`.
    pub fn match_prefix(&self, path: &str) -> Option<PrefixMatch> {
        let parts: Vec<&str> = split(path).collect();
        let (consumed, params) = self.match_segments(&parts)?;
        Some(PrefixMatch {
            consumed,
            params,
            remaining: format!("/{}", parts[consumed..].join("/")),
        })
    }

    /// Match the template against the whole of `path`.
    pub fn match_full(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = split(path).collect();
        self.match_full_segments(&parts)
    }

    /// Like [`PathTemplate::match_full`], over already split and decoded segments.
    pub(crate) fn match_full_segments(&self, parts: &[&str]) -> Option<PathParams> {
        match self.match_segments(parts)? {
            (consumed, params) if consumed == parts.len() => Some(params),
            _ => None,
        }
    }

    /// Ordering key used to rank competing matches.
    pub fn specificity(&self) -> Specificity {
        let mut key: Vec<u8> = self.segments.iter().map(Segment::rank).collect();
        if !self.has_wildcard() {
            key.push(RANK_END);
        }
        Specificity(key)
    }

    /// True if both templates match exactly the same paths, parameter names aside.
    pub fn same_shape(&self, other: &PathTemplate) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    (Segment::Wildcard(_), Segment::Wildcard(_)) => true,
                    _ => false,
                })
    }

    /// Segments consumed and params captured when the template matches the
    /// start of `parts`.
    pub(crate) fn match_segments(&self, parts: &[&str]) -> Option<(usize, PathParams)> {
        let mut params = PathParams::default();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if *parts.get(i)? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.push(name, *parts.get(i)?);
                }
                Segment::Wildcard(name) => {
                    let rest = parts.get(i..).unwrap_or_default().join("/");
                    if let Some(name) = name {
                        params.push(name, rest);
                    }
                    return Some((parts.len(), params));
                }
            }
        }

        Some((self.segments.len(), params))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Split a raw request path into percent-decoded segments.
///
/// The path is split on `/` before decoding, so an encoded `%2F` stays inside
/// its segment. Returns `None` when a `%` is not followed by two hex digits or
/// a segment does not decode to UTF-8; such a path matches no template.
pub fn decode_segments(path: &str) -> Option<Vec<String>> {
    split(path)
        .map(|raw| {
            if !is_well_encoded(raw) {
                return None;
            }
            urlencoding::decode(raw).ok().map(|segment| segment.into_owned())
        })
        .collect()
}

fn is_well_encoded(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1..i + 3) {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}

fn parse_segment(template: &str, raw: &str) -> Result<Segment, RoutingError> {
    if raw == "*" {
        return Ok(Segment::Wildcard(None));
    }

    if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        if inner.contains(['{', '}']) {
            return Err(RoutingError::malformed(template, "nested braces"));
        }
        return match inner.strip_suffix(":*") {
            Some(name) => Ok(Segment::Wildcard(Some(param_name(template, name)?))),
            None if inner.contains(':') => Err(RoutingError::malformed(
                template,
                format!("unsupported parameter pattern {:?}", inner),
            )),
            None => Ok(Segment::Param(param_name(template, inner)?)),
        };
    }

    let opens = raw.matches('{').count();
    let closes = raw.matches('}').count();
    if opens != closes {
        return Err(RoutingError::malformed(template, "unbalanced braces"));
    }
    if opens > 0 {
        return Err(RoutingError::malformed(
            template,
            format!("parameter must span the whole segment in {:?}", raw),
        ));
    }

    Ok(Segment::Literal(raw.to_string()))
}

fn param_name(template: &str, name: &str) -> Result<String, RoutingError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(name.to_string())
    } else {
        Err(RoutingError::malformed(
            template,
            format!("invalid parameter name {:?}", name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> PathTemplate {
        PathTemplate::compile(s).unwrap()
    }

    #[test]
    fn test_compile_rejects_malformed() {
        for bad in [
            "/users/{id",
            "/users/id}",
            "/users/{}",
            "/users/{id}/{id}",
            "/users/{a{b}}",
            "/files/{rest:*}/more",
            "/users/x{id}",
            "/users/{id:[0-9]+}",
            "/users/{bad name}",
        ] {
            let err = PathTemplate::compile(bad).unwrap_err();
            assert!(
                matches!(err, RoutingError::MalformedTemplate { .. }),
                "{} should be malformed, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_root_templates() {
        assert!(t("").is_root());
        assert!(t("/").is_root());
        assert!(t("//").is_root());
        assert!(!t("/a").is_root());
    }

    #[test]
    fn test_match_full_literals_and_params() {
        let template = t("/users/{id}/orders/{order}");
        let params = template.match_full("/users/42/orders/7").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("order"), Some("7"));
        assert_eq!(params.len(), 2);

        assert!(template.match_full("/users/42/orders").is_none());
        assert!(template.match_full("/users/42/orders/7/extra").is_none());
        assert!(template.match_full("/users/42/invoices/7").is_none());
        // Literals are case-sensitive.
        assert!(template.match_full("/Users/42/orders/7").is_none());
    }

    #[test]
    fn test_match_full_trailing_slash_is_ignored() {
        assert!(t("/a/b").match_full("/a/b/").is_some());
        assert!(t("/a/b/").match_full("/a/b").is_some());
    }

    #[test]
    fn test_param_requires_non_empty_segment() {
        let template = t("/users/{id}");
        assert!(template.match_full("/users/").is_none());
        assert!(template.match_full("/users//").is_none());
    }

    #[test]
    fn test_wildcard_matches_rest() {
        let template = t("/static/{path:*}");
        let params = template.match_full("/static/css/site.css").unwrap();
        assert_eq!(params.get("path"), Some("css/site.css"));

        // zero segments is allowed
        let params = template.match_full("/static").unwrap();
        assert_eq!(params.get("path"), Some(""));

        assert!(template.match_full("/assets/site.css").is_none());

        let unnamed = t("/static/*");
        let params = unnamed.match_full("/static/a/b").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_match_full_segment_count_property() {
        let template = t("/a/{x}/c");
        let cases = [
            ("/a/1/c", true),
            ("/a/1", false),
            ("/a/1/c/d", false),
            ("/a/1/d", false),
            ("/b/1/c", false),
        ];
        for (path, expected) in cases {
            assert_eq!(template.match_full(path).is_some(), expected, "{}", path);
        }

        let wildcard = t("/a/{x}/{rest:*}");
        let cases = [
            ("/a", false),
            ("/a/1", true),
            ("/a/1/2", true),
            ("/a/1/2/3/4", true),
            ("/b/1/2", false),
        ];
        for (path, expected) in cases {
            assert_eq!(wildcard.match_full(path).is_some(), expected, "{}", path);
        }
    }

    #[test]
    fn test_match_prefix_reports_remaining() {
        let template = t("/users/{id}");
        let m = template.match_prefix("/users/42/orders/7").unwrap();
        assert_eq!(m.consumed, 2);
        assert_eq!(m.params.get("id"), Some("42"));
        assert_eq!(m.remaining, "/orders/7");

        let m = template.match_prefix("/users/42").unwrap();
        assert_eq!(m.remaining, "/");

        assert!(template.match_prefix("/users").is_none());
        assert!(template.match_prefix("/accounts/42").is_none());
    }

    #[test]
    fn test_empty_root_matches_everything() {
        let root = t("/");
        let m = root.match_prefix("/anything/at/all").unwrap();
        assert_eq!(m.consumed, 0);
        assert_eq!(m.remaining, "/anything/at/all");
        assert!(root.match_prefix("/").is_some());
    }

    #[test]
    fn test_specificity_literal_beats_param() {
        assert!(t("/a/b").specificity() > t("/a/{id}").specificity());
    }

    #[test]
    fn test_specificity_wildcard_ranks_below_plain() {
        assert!(t("/a").specificity() > t("/a/{rest:*}").specificity());
        assert!(t("/a/{id}").specificity() > t("/a/{rest:*}").specificity());
    }

    #[test]
    fn test_specificity_longer_prefix_ranks_higher() {
        assert!(t("/a/b").specificity() > t("/a").specificity());
        assert!(t("/a/{id}").specificity() > t("/a").specificity());
        assert!(t("/a/b/{rest:*}").specificity() > t("/a").specificity());
    }

    #[test]
    fn test_specificity_empty_root_is_lowest_non_wildcard() {
        let root = t("/").specificity();
        for other in ["/a", "/{id}", "/a/{rest:*}"] {
            assert!(t(other).specificity() > root, "{}", other);
        }
        assert!(root > t("/{rest:*}").specificity());
    }

    #[test]
    fn test_decode_segments_per_segment() {
        assert_eq!(
            decode_segments("/users/jane%20doe/").unwrap(),
            ["users", "jane doe"]
        );
        // an encoded slash stays inside its segment
        assert_eq!(decode_segments("/users/a%2Fb").unwrap(), ["users", "a/b"]);
        assert_eq!(decode_segments("/").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_decode_segments_rejects_bad_escapes() {
        for bad in ["/users/%zz", "/users/%2", "/users/100%", "/users/%g1", "/users/%FF"] {
            assert!(decode_segments(bad).is_none(), "{}", bad);
        }
    }

    #[test]
    fn test_match_full_segments_keeps_decoded_slash() {
        let template = t("/{id}");
        let params = template.match_full_segments(&["a/b"]).unwrap();
        assert_eq!(params.get("id"), Some("a/b"));
    }

    #[test]
    fn test_same_shape_ignores_param_names() {
        assert!(t("/a/{id}").same_shape(&t("/a/{key}")));
        assert!(t("/").same_shape(&t("")));
        assert!(!t("/a/{id}").same_shape(&t("/a/b")));
        assert!(!t("/a").same_shape(&t("/a/{rest:*}")));
    }
}
