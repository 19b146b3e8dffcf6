//! Candidate collection and ranking over the dispatch tree.

use super::core::Link;
use crate::exchange::Exchange;
use crate::media::{AcceptHeader, AcceptLanguage, LanguageRange, LanguageScore, MediaRange, MediaScore};
use crate::pattern::{ParamVec, PathPattern, Specificity};
use crate::route::literal_specificity;
use http::Method;
use std::cmp::Reverse;
use tracing::debug;

/// Pre-parsed request view used throughout one resolution.
///
/// Headers are parsed once here so pattern and negotiation levels work on
/// ready values.
pub(crate) struct ResolveCx<'e> {
    pub method: &'e Method,
    pub path: &'e str,
    pub authority: Option<&'e str>,
    pub scheme: Option<&'e str>,
    pub accept: AcceptHeader,
    pub accept_language: AcceptLanguage,
    pub content_type: Option<MediaRange>,
}

impl<'e> ResolveCx<'e> {
    pub(crate) fn from_exchange<E: Exchange>(exchange: &'e E) -> Self {
        let headers = exchange.headers();
        Self {
            method: exchange.method(),
            path: exchange.path(),
            authority: exchange.authority(),
            scheme: exchange.scheme(),
            accept: AcceptHeader::from_headers(headers),
            accept_language: AcceptLanguage::from_headers(headers),
            content_type: headers
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| MediaRange::parse(s).ok()),
        }
    }
}

/// Total order over surviving candidates, most preferred greatest.
///
/// Field order is the comparison order: language score, produce score,
/// consume score, path specificity, method exactness, and finally the
/// registration index (lower registers first, hence `Reverse`). The index
/// is unique, so the order is total and resolution deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Rank {
    pub language: Option<LanguageScore>,
    pub produce: Option<MediaScore>,
    pub consume: Option<MediaScore>,
    pub path: Option<Specificity>,
    pub method_exact: bool,
    pub order: Reverse<u64>,
}

impl Default for Rank {
    fn default() -> Self {
        Self {
            language: None,
            produce: None,
            consume: None,
            path: None,
            method_exact: false,
            order: Reverse(0),
        }
    }
}

/// Accumulated state carried down one branch of the tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct Partial {
    pub rank: Rank,
    pub bindings: ParamVec,
    pub media: Option<MediaRange>,
    pub language: Option<LanguageRange>,
}

/// One terminal that survived every level.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<R> {
    pub resource: R,
    pub rank: Rank,
    pub bindings: ParamVec,
    pub media: Option<MediaRange>,
    pub language: Option<LanguageRange>,
}

/// How far resolution progressed before failing; deeper kinds win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) enum MissKind {
    #[default]
    None,
    Path,
    Method,
    Consume,
    Produce,
    Language,
    Disabled,
}

/// Failure evidence accumulated across every attempted branch.
///
/// The deepest miss decides the error; the sets feed `Allow` and
/// media-type lists in the corresponding responses.
#[derive(Debug, Clone, Default)]
pub(crate) struct Misses {
    pub kind: MissKind,
    pub allowed: Vec<Method>,
    pub supported: Vec<MediaRange>,
    pub producible: Vec<MediaRange>,
    pub languages: Vec<LanguageRange>,
}

impl Misses {
    fn note(&mut self, kind: MissKind) {
        if kind > self.kind {
            self.kind = kind;
        }
    }

    fn allow(&mut self, method: &Method) {
        if !self.allowed.contains(method) {
            self.allowed.push(method.clone());
        }
    }

    fn support(&mut self, range: &MediaRange) {
        if !self.supported.contains(range) {
            self.supported.push(range.clone());
        }
    }

    fn producible(&mut self, range: &MediaRange) {
        if !self.producible.contains(range) {
            self.producible.push(range.clone());
        }
    }

    fn language(&mut self, range: &LanguageRange) {
        if !self.languages.contains(range) {
            self.languages.push(range.clone());
        }
    }
}

impl<R: Clone> Link<R> {
    /// Collect every plausible candidate for the exchange.
    ///
    /// Constrained children that match descend with an upgraded rank; the
    /// pass-through slot always descends since unconstrained routes stay
    /// plausible. Miss evidence is only recorded where a constraint
    /// existed and nothing could satisfy it.
    pub(crate) fn resolve(
        &self,
        cx: &ResolveCx<'_>,
        partial: &Partial,
        out: &mut Vec<Candidate<R>>,
        misses: &mut Misses,
    ) {
        match self {
            Link::Authority(n) => {
                for (pattern, child) in &n.children {
                    if cx.authority.is_some_and(|a| pattern.matches(a)) {
                        child.resolve(cx, partial, out, misses);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve(cx, partial, out, misses);
                }
            }
            Link::Scheme(n) => {
                for (scheme, child) in &n.children {
                    if cx.scheme.is_some_and(|s| scheme.eq_ignore_ascii_case(s)) {
                        child.resolve(cx, partial, out, misses);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve(cx, partial, out, misses);
                }
            }
            Link::Path(n) => {
                let mut matched = false;
                if let Some(child) = n.literals.get(cx.path) {
                    debug!(path = cx.path, "literal path matched");
                    let mut next = partial.clone();
                    next.rank.path = Some(literal_specificity(cx.path));
                    child.resolve(cx, &next, out, misses);
                    matched = true;
                } else {
                    // patterns are pre-sorted by specificity; first match wins
                    for (pattern, child) in &n.patterns {
                        if let Some(bindings) = pattern.matches(cx.path) {
                            debug!(pattern = %pattern, path = cx.path, "path pattern matched");
                            let mut next = partial.clone();
                            next.rank.path = Some(pattern.specificity());
                            next.bindings.extend(bindings);
                            child.resolve(cx, &next, out, misses);
                            matched = true;
                            break;
                        }
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve(cx, partial, out, misses);
                } else if !matched {
                    misses.note(MissKind::Path);
                }
            }
            Link::Method(n) => {
                let mut matched = false;
                for (method, child) in &n.children {
                    if method == cx.method {
                        let mut next = partial.clone();
                        next.rank.method_exact = true;
                        child.resolve(cx, &next, out, misses);
                        matched = true;
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve(cx, partial, out, misses);
                } else if !matched && !n.children.is_empty() {
                    debug!(method = %cx.method, "method not allowed at matched path");
                    misses.note(MissKind::Method);
                    for (method, _) in &n.children {
                        misses.allow(method);
                    }
                }
            }
            Link::Consume(n) => {
                let mut matched = false;
                for (range, child) in &n.children {
                    if let Some(score) = consume_score(range, cx.content_type.as_ref()) {
                        let mut next = partial.clone();
                        next.rank.consume = Some(score);
                        child.resolve(cx, &next, out, misses);
                        matched = true;
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve(cx, partial, out, misses);
                } else if !matched && !n.children.is_empty() && n.strict {
                    misses.note(MissKind::Consume);
                    for (range, _) in &n.children {
                        misses.support(range);
                    }
                }
            }
            Link::Produce(n) => {
                let mut matched = false;
                for (range, child) in &n.children {
                    if let Some(score) = cx.accept.best_score(range) {
                        let mut next = partial.clone();
                        next.rank.produce = Some(score);
                        next.media = Some(range.clone());
                        child.resolve(cx, &next, out, misses);
                        matched = true;
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve(cx, partial, out, misses);
                } else if !matched && !n.children.is_empty() && n.strict {
                    misses.note(MissKind::Produce);
                    for (range, _) in &n.children {
                        misses.producible(range);
                    }
                }
            }
            Link::Language(n) => {
                let mut matched = false;
                for (range, child) in &n.children {
                    if let Some(score) = cx.accept_language.best_score(range) {
                        let mut next = partial.clone();
                        next.rank.language = Some(score);
                        next.language = Some(range.clone());
                        child.resolve(cx, &next, out, misses);
                        matched = true;
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve(cx, partial, out, misses);
                } else if !matched && !n.children.is_empty() && n.strict {
                    misses.note(MissKind::Language);
                    for (range, _) in &n.children {
                        misses.language(range);
                    }
                }
            }
            Link::Handler(n) => {
                if n.entries.is_empty() {
                    return;
                }
                let mut any_enabled = false;
                for entry in &n.entries {
                    if entry.enabled {
                        any_enabled = true;
                        let mut rank = partial.rank.clone();
                        rank.order = Reverse(entry.index);
                        out.push(Candidate {
                            resource: entry.resource.clone(),
                            rank,
                            bindings: partial.bindings.clone(),
                            media: partial.media.clone(),
                            language: partial.language.clone(),
                        });
                    }
                }
                if !any_enabled {
                    misses.note(MissKind::Disabled);
                }
            }
        }
    }

    /// Collect every terminal whose path is a prefix match for the
    /// exchange and whose other criteria are satisfied.
    ///
    /// Used by the interceptor variant: all matching terminals contribute,
    /// there is no first-match cut and no failure evidence.
    pub(crate) fn resolve_prefix(
        &self,
        cx: &ResolveCx<'_>,
        partial: &Partial,
        out: &mut Vec<Candidate<R>>,
    ) {
        match self {
            Link::Authority(n) => {
                for (pattern, child) in &n.children {
                    if cx.authority.is_some_and(|a| pattern.matches(a)) {
                        child.resolve_prefix(cx, partial, out);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve_prefix(cx, partial, out);
                }
            }
            Link::Scheme(n) => {
                for (scheme, child) in &n.children {
                    if cx.scheme.is_some_and(|s| scheme.eq_ignore_ascii_case(s)) {
                        child.resolve_prefix(cx, partial, out);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve_prefix(cx, partial, out);
                }
            }
            Link::Path(n) => {
                for (path, child) in &n.literals {
                    if literal_prefix_matches(path, cx.path) {
                        let mut next = partial.clone();
                        next.rank.path = Some(literal_specificity(path));
                        child.resolve_prefix(cx, &next, out);
                    }
                }
                for (pattern, child) in &n.patterns {
                    if pattern_prefix_matches(pattern, cx.path) {
                        let mut next = partial.clone();
                        next.rank.path = Some(pattern.specificity());
                        child.resolve_prefix(cx, &next, out);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve_prefix(cx, partial, out);
                }
            }
            Link::Method(n) => {
                for (method, child) in &n.children {
                    if method == cx.method {
                        let mut next = partial.clone();
                        next.rank.method_exact = true;
                        child.resolve_prefix(cx, &next, out);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve_prefix(cx, partial, out);
                }
            }
            Link::Consume(n) => {
                for (range, child) in &n.children {
                    if consume_score(range, cx.content_type.as_ref()).is_some() {
                        child.resolve_prefix(cx, partial, out);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve_prefix(cx, partial, out);
                }
            }
            Link::Produce(n) => {
                for (range, child) in &n.children {
                    if cx.accept.best_score(range).is_some() {
                        child.resolve_prefix(cx, partial, out);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve_prefix(cx, partial, out);
                }
            }
            Link::Language(n) => {
                for (range, child) in &n.children {
                    if cx.accept_language.best_score(range).is_some() {
                        child.resolve_prefix(cx, partial, out);
                    }
                }
                if let Some(pass) = &n.pass {
                    pass.resolve_prefix(cx, partial, out);
                }
            }
            Link::Handler(n) => {
                for entry in &n.entries {
                    if entry.enabled {
                        let mut rank = partial.rank.clone();
                        rank.order = Reverse(entry.index);
                        out.push(Candidate {
                            resource: entry.resource.clone(),
                            rank,
                            bindings: partial.bindings.clone(),
                            media: partial.media.clone(),
                            language: partial.language.clone(),
                        });
                    }
                }
            }
        }
    }
}

/// Score a registered consumer against the request body type.
///
/// A missing `Content-Type` keeps every consumer eligible without
/// preference; a consumer registered with `q=0` never participates.
fn consume_score(range: &MediaRange, content_type: Option<&MediaRange>) -> Option<MediaScore> {
    if range.q_millis() == 0 {
        return None;
    }
    match content_type {
        Some(ct) => {
            let base = range.score(ct);
            if base == 0 {
                return None;
            }
            Some(MediaScore {
                weighted: u32::from(base) * u32::from(range.q_millis()),
                specificity: range.specificity(),
            })
        }
        None => Some(MediaScore {
            weighted: 0,
            specificity: 0,
        }),
    }
}

/// Whether a registered literal path is the request path or a
/// segment-boundary prefix of it.
fn literal_prefix_matches(registered: &str, path: &str) -> bool {
    if registered == path {
        return true;
    }
    path.strip_prefix(registered).is_some_and(|rest| {
        registered.ends_with('/') || rest.starts_with('/')
    })
}

/// Whether a pattern matches the request path or any segment-boundary
/// prefix of it.
fn pattern_prefix_matches(pattern: &PathPattern, path: &str) -> bool {
    if pattern.matches(path).is_some() {
        return true;
    }
    path.bytes()
        .enumerate()
        .skip(1)
        .filter(|(_, b)| *b == b'/')
        .any(|(i, _)| pattern.matches(&path[..i]).is_some())
}
