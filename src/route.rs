//! # Route Module
//!
//! The route model: the criteria tuple accumulated at registration, the
//! serializable [`RouteSnapshot`] view yielded by route extraction, and
//! the [`RouteFilter`] used to select subsets for introspection,
//! enable/disable and removal.

use crate::media::{LanguageRange, MediaRange};
use crate::pattern::{PathPattern, PatternError, Specificity};
use http::Method;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// A registered path: either a literal absolute path or a compiled pattern.
///
/// Literal paths are hashed for O(1) dispatch; patterns are ordered by
/// specificity and tried in turn.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathSpec {
    Literal(String),
    Pattern(PathPattern),
}

impl PathSpec {
    /// Compile a template, choosing the literal form when it contains no
    /// capture or wildcard token.
    pub(crate) fn parse(template: &str) -> Result<Self, PatternError> {
        if template.is_empty() {
            return Err(PatternError::Invalid {
                reason: "empty pattern".to_string(),
                position: 0,
            });
        }
        if !template.starts_with('/') {
            return Err(PatternError::Invalid {
                reason: "pattern must start with '/'".to_string(),
                position: 0,
            });
        }
        if template.contains(['{', '}', '?', '*']) {
            Ok(Self::Pattern(PathPattern::parse(template)?))
        } else {
            Ok(Self::Literal(template.to_string()))
        }
    }

    pub(crate) fn template(&self) -> &str {
        match self {
            PathSpec::Literal(path) => path,
            PathSpec::Pattern(pattern) => pattern.template(),
        }
    }
}

/// The specificity key of a fully literal path.
pub(crate) fn literal_specificity(path: &str) -> Specificity {
    Specificity {
        literals: path.len() as u32,
        captures: 0,
        bounded: true,
        length: path.len() as u32,
    }
}

/// A client-side authority matcher: a literal or a `*` glob.
#[derive(Debug, Clone)]
pub struct AuthorityPattern {
    raw: String,
    regex: Option<Regex>,
}

impl AuthorityPattern {
    /// Compile an authority pattern; `*` matches any run of characters.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw: String = pattern.into();
        let regex = if raw.contains('*') {
            let mut src = String::with_capacity(raw.len() + 8);
            src.push('^');
            for (i, part) in raw.split('*').enumerate() {
                if i > 0 {
                    src.push_str(".*");
                }
                src.push_str(&regex::escape(part));
            }
            src.push('$');
            Regex::new(&src).ok()
        } else {
            None
        };
        Self { raw, regex }
    }

    /// The original pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a concrete authority.
    #[must_use]
    pub fn matches(&self, authority: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(authority),
            None => self.raw.eq_ignore_ascii_case(authority),
        }
    }
}

impl PartialEq for AuthorityPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for AuthorityPattern {}

impl fmt::Display for AuthorityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The orthogonal criteria of one route. Unset fields do not constrain.
#[derive(Debug, Clone, Default)]
pub(crate) struct Criteria {
    pub path: Option<PathSpec>,
    pub method: Option<Method>,
    pub consume: Option<MediaRange>,
    pub produce: Option<MediaRange>,
    pub language: Option<LanguageRange>,
    pub authority: Option<AuthorityPattern>,
    pub scheme: Option<String>,
}

/// One route about to enter the dispatch tree.
#[derive(Debug, Clone)]
pub(crate) struct RouteDef<R> {
    pub criteria: Criteria,
    pub resource: R,
    pub index: u64,
}

/// A route pulled back out of the dispatch tree, with typed criteria.
#[derive(Debug, Clone)]
pub(crate) struct ExtractedRoute {
    pub criteria: Criteria,
    pub enabled: bool,
    pub index: u64,
}

impl ExtractedRoute {
    pub(crate) fn snapshot(&self, conflicted: bool) -> RouteSnapshot {
        RouteSnapshot {
            path: self.criteria.path.as_ref().map(|p| p.template().to_string()),
            method: self.criteria.method.as_ref().map(|m| m.to_string()),
            consume: self.criteria.consume.as_ref().map(ToString::to_string),
            produce: self.criteria.produce.as_ref().map(ToString::to_string),
            language: self.criteria.language.as_ref().map(ToString::to_string),
            authority: self.criteria.authority.as_ref().map(ToString::to_string),
            scheme: self.criteria.scheme.clone(),
            enabled: self.enabled,
            index: self.index,
            conflicted,
        }
    }
}

/// Introspection view of one registered route.
///
/// Snapshots are plain values: consumers match on the fields instead of
/// visiting the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSnapshot {
    /// Path template, if the route constrains the path
    pub path: Option<String>,
    /// Method token, if constrained
    pub method: Option<String>,
    /// Consumed media range, if constrained
    pub consume: Option<String>,
    /// Produced media range, if constrained
    pub produce: Option<String>,
    /// Language range, if constrained
    pub language: Option<String>,
    /// Authority pattern, if constrained (client side)
    pub authority: Option<String>,
    /// Scheme, if constrained (client side)
    pub scheme: Option<String>,
    /// Whether the route currently participates in resolution
    pub enabled: bool,
    /// Registration index; lower registers earlier
    pub index: u64,
    /// Whether conflict detection flagged this route
    pub conflicted: bool,
}

/// Criteria subset selector for [`find_routes`](crate::router::Router::find_routes),
/// enable/disable and removal.
///
/// Set fields must match exactly (by template or token text); unset fields
/// match anything.
#[derive(Debug, Clone, Default)]
pub struct RouteFilter {
    path: Option<String>,
    method: Option<Method>,
    consume: Option<String>,
    produce: Option<String>,
    language: Option<String>,
    authority: Option<String>,
    scheme: Option<String>,
    enabled: Option<bool>,
}

impl RouteFilter {
    /// Match everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require this path template.
    #[must_use]
    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.path = Some(template.into());
        self
    }

    /// Require this method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Require this consumed media range.
    #[must_use]
    pub fn consume(mut self, range: impl Into<String>) -> Self {
        self.consume = Some(normalize_media(range.into()));
        self
    }

    /// Require this produced media range.
    #[must_use]
    pub fn produce(mut self, range: impl Into<String>) -> Self {
        self.produce = Some(normalize_media(range.into()));
        self
    }

    /// Require this language range.
    #[must_use]
    pub fn language(mut self, range: impl Into<String>) -> Self {
        self.language = Some(normalize_language(range.into()));
        self
    }

    /// Require this authority pattern.
    #[must_use]
    pub fn authority(mut self, pattern: impl Into<String>) -> Self {
        self.authority = Some(pattern.into());
        self
    }

    /// Require this scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Require the enabled flag to have this value.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub(crate) fn accepts(&self, snapshot: &RouteSnapshot) -> bool {
        fn field(want: &Option<String>, have: &Option<String>) -> bool {
            want.is_none() || want == have
        }
        field(&self.path, &snapshot.path)
            && self
                .method
                .as_ref()
                .map_or(true, |m| Some(m.to_string()) == snapshot.method)
            && field(&self.consume, &snapshot.consume)
            && field(&self.produce, &snapshot.produce)
            && field(&self.language, &snapshot.language)
            && field(&self.authority, &snapshot.authority)
            && field(&self.scheme, &snapshot.scheme)
            && self.enabled.map_or(true, |e| e == snapshot.enabled)
    }
}

/// Normalize a media range filter value to its canonical text, so filters
/// compare equal to snapshot fields regardless of input casing.
fn normalize_media(raw: String) -> String {
    MediaRange::parse(&raw).map_or(raw, |r| r.to_string())
}

fn normalize_language(raw: String) -> String {
    LanguageRange::parse(&raw).map_or(raw, |r| r.to_string())
}
