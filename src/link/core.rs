//! Dispatch tree structure and mutation: insert, remove, enable, extract.

use crate::media::{LanguageRange, MediaRange};
use crate::pattern::PathPattern;
use crate::route::{AuthorityPattern, Criteria, ExtractedRoute, PathSpec, RouteDef};
use http::Method;
use std::collections::HashMap;
use tracing::debug;

/// The fixed chain of criterion levels, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Authority,
    Scheme,
    Path,
    Method,
    Consume,
    Produce,
    Language,
    Handler,
}

impl Level {
    fn next(self) -> Level {
        match self {
            Level::Authority => Level::Scheme,
            Level::Scheme => Level::Path,
            Level::Path => Level::Method,
            Level::Method => Level::Consume,
            Level::Consume => Level::Produce,
            Level::Produce => Level::Language,
            Level::Language => Level::Handler,
            Level::Handler => Level::Handler,
        }
    }
}

/// Per-tree negotiation policy: strict levels surface a negotiation error
/// when constrained routes exist and none match; lenient levels simply
/// yield no candidates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeOptions {
    pub strict_consume: bool,
    pub strict_produce: bool,
    pub strict_language: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            strict_consume: true,
            strict_produce: true,
            strict_language: true,
        }
    }
}

/// One level of the dispatch tree.
///
/// The abstract-base-and-subclasses arrangement collapses into a tagged
/// variant: every operation is a single `match` and the chain order is the
/// variant order.
#[derive(Debug, Clone)]
pub(crate) enum Link<R> {
    Authority(CriterionNode<AuthorityPattern, R>),
    Scheme(CriterionNode<String, R>),
    Path(PathNode<R>),
    Method(CriterionNode<Method, R>),
    Consume(CriterionNode<MediaRange, R>),
    Produce(CriterionNode<MediaRange, R>),
    Language(CriterionNode<LanguageRange, R>),
    Handler(HandlerNode<R>),
}

/// Children keyed by one criterion value, in insertion order, plus a
/// pass-through slot for routes that leave the criterion unconstrained.
#[derive(Debug, Clone)]
pub(crate) struct CriterionNode<K, R> {
    pub children: Vec<(K, Link<R>)>,
    pub pass: Option<Box<Link<R>>>,
    pub strict: bool,
}

impl<K, R> CriterionNode<K, R> {
    fn new(strict: bool) -> Self {
        Self {
            children: Vec::new(),
            pass: None,
            strict,
        }
    }
}

/// The path level: a hashed literal map plus a pattern vector kept sorted
/// by descending specificity.
#[derive(Debug, Clone)]
pub(crate) struct PathNode<R> {
    pub literals: HashMap<String, Link<R>>,
    pub patterns: Vec<(PathPattern, Link<R>)>,
    pub pass: Option<Box<Link<R>>>,
}

impl<R> PathNode<R> {
    fn new() -> Self {
        Self {
            literals: HashMap::new(),
            patterns: Vec::new(),
            pass: None,
        }
    }
}

/// The terminal level: resources in registration order.
#[derive(Debug, Clone)]
pub(crate) struct HandlerNode<R> {
    pub entries: Vec<HandlerEntry<R>>,
}

#[derive(Debug, Clone)]
pub(crate) struct HandlerEntry<R> {
    pub resource: R,
    pub enabled: bool,
    pub index: u64,
}

impl<R> Link<R> {
    /// An empty node for the given level.
    pub fn empty(level: Level, opts: TreeOptions) -> Self {
        match level {
            Level::Authority => Link::Authority(CriterionNode::new(false)),
            Level::Scheme => Link::Scheme(CriterionNode::new(false)),
            Level::Path => Link::Path(PathNode::new()),
            Level::Method => Link::Method(CriterionNode::new(false)),
            Level::Consume => Link::Consume(CriterionNode::new(opts.strict_consume)),
            Level::Produce => Link::Produce(CriterionNode::new(opts.strict_produce)),
            Level::Language => Link::Language(CriterionNode::new(opts.strict_language)),
            Level::Handler => Link::Handler(HandlerNode {
                entries: Vec::new(),
            }),
        }
    }

    /// Whether this node holds no routes at all; empty nodes are pruned on
    /// removal.
    pub fn is_empty(&self) -> bool {
        match self {
            Link::Authority(n) => n.children.is_empty() && n.pass.is_none(),
            Link::Scheme(n) => n.children.is_empty() && n.pass.is_none(),
            Link::Path(n) => {
                n.literals.is_empty() && n.patterns.is_empty() && n.pass.is_none()
            }
            Link::Method(n) => n.children.is_empty() && n.pass.is_none(),
            Link::Consume(n) => n.children.is_empty() && n.pass.is_none(),
            Link::Produce(n) => n.children.is_empty() && n.pass.is_none(),
            Link::Language(n) => n.children.is_empty() && n.pass.is_none(),
            Link::Handler(n) => n.entries.is_empty(),
        }
    }
}

impl<R: Clone> Link<R> {
    /// Insert a route, creating nodes along its criterion chain on demand.
    pub fn insert(&mut self, route: &RouteDef<R>, opts: TreeOptions) {
        match self {
            Link::Authority(n) => {
                n.descend_insert(route.criteria.authority.clone(), route, opts, Level::Authority);
            }
            Link::Scheme(n) => {
                n.descend_insert(route.criteria.scheme.clone(), route, opts, Level::Scheme);
            }
            Link::Path(n) => n.insert(route, opts),
            Link::Method(n) => {
                n.descend_insert(route.criteria.method.clone(), route, opts, Level::Method);
            }
            Link::Consume(n) => {
                n.descend_insert(route.criteria.consume.clone(), route, opts, Level::Consume);
            }
            Link::Produce(n) => {
                n.descend_insert(route.criteria.produce.clone(), route, opts, Level::Produce);
            }
            Link::Language(n) => {
                n.descend_insert(route.criteria.language.clone(), route, opts, Level::Language);
            }
            Link::Handler(n) => {
                debug!(
                    index = route.index,
                    path = route.criteria.path.as_ref().map(|p| p.template()),
                    "terminal route entry added"
                );
                n.entries.push(HandlerEntry {
                    resource: route.resource.clone(),
                    enabled: true,
                    index: route.index,
                });
            }
        }
    }
}

impl<R> Link<R> {
    /// Remove every route matching the criteria tuple; empty nodes along
    /// the chain are pruned. Returns the number of terminal entries
    /// removed.
    pub fn remove(&mut self, criteria: &Criteria) -> usize {
        match self {
            Link::Authority(n) => n.descend_remove(criteria.authority.as_ref(), criteria),
            Link::Scheme(n) => n.descend_remove(criteria.scheme.as_ref(), criteria),
            Link::Path(n) => n.remove(criteria),
            Link::Method(n) => n.descend_remove(criteria.method.as_ref(), criteria),
            Link::Consume(n) => n.descend_remove(criteria.consume.as_ref(), criteria),
            Link::Produce(n) => n.descend_remove(criteria.produce.as_ref(), criteria),
            Link::Language(n) => n.descend_remove(criteria.language.as_ref(), criteria),
            Link::Handler(n) => {
                let removed = n.entries.len();
                n.entries.clear();
                debug!(removed, "terminal route entries removed");
                removed
            }
        }
    }

    /// Flip the enabled flag on every route matching the criteria tuple.
    /// Returns the number of terminal entries affected.
    pub fn set_enabled(&mut self, criteria: &Criteria, enabled: bool) -> usize {
        match self {
            Link::Authority(n) => n.descend_enable(criteria.authority.as_ref(), criteria, enabled),
            Link::Scheme(n) => n.descend_enable(criteria.scheme.as_ref(), criteria, enabled),
            Link::Path(n) => n.set_enabled(criteria, enabled),
            Link::Method(n) => n.descend_enable(criteria.method.as_ref(), criteria, enabled),
            Link::Consume(n) => n.descend_enable(criteria.consume.as_ref(), criteria, enabled),
            Link::Produce(n) => n.descend_enable(criteria.produce.as_ref(), criteria, enabled),
            Link::Language(n) => n.descend_enable(criteria.language.as_ref(), criteria, enabled),
            Link::Handler(n) => {
                for entry in &mut n.entries {
                    entry.enabled = enabled;
                }
                debug!(enabled, entries = n.entries.len(), "terminal enabled state set");
                n.entries.len()
            }
        }
    }

    /// Walk the tree yielding one [`ExtractedRoute`] per terminal entry,
    /// with the criterion tuple accumulated along the way.
    pub fn extract(&self, acc: &Criteria, out: &mut Vec<ExtractedRoute>) {
        match self {
            Link::Authority(n) => {
                for (key, child) in &n.children {
                    let mut next = acc.clone();
                    next.authority = Some(key.clone());
                    child.extract(&next, out);
                }
                if let Some(pass) = &n.pass {
                    pass.extract(acc, out);
                }
            }
            Link::Scheme(n) => {
                for (key, child) in &n.children {
                    let mut next = acc.clone();
                    next.scheme = Some(key.clone());
                    child.extract(&next, out);
                }
                if let Some(pass) = &n.pass {
                    pass.extract(acc, out);
                }
            }
            Link::Path(n) => {
                for (path, child) in &n.literals {
                    let mut next = acc.clone();
                    next.path = Some(PathSpec::Literal(path.clone()));
                    child.extract(&next, out);
                }
                for (pattern, child) in &n.patterns {
                    let mut next = acc.clone();
                    next.path = Some(PathSpec::Pattern(pattern.clone()));
                    child.extract(&next, out);
                }
                if let Some(pass) = &n.pass {
                    pass.extract(acc, out);
                }
            }
            Link::Method(n) => {
                for (key, child) in &n.children {
                    let mut next = acc.clone();
                    next.method = Some(key.clone());
                    child.extract(&next, out);
                }
                if let Some(pass) = &n.pass {
                    pass.extract(acc, out);
                }
            }
            Link::Consume(n) => {
                for (key, child) in &n.children {
                    let mut next = acc.clone();
                    next.consume = Some(key.clone());
                    child.extract(&next, out);
                }
                if let Some(pass) = &n.pass {
                    pass.extract(acc, out);
                }
            }
            Link::Produce(n) => {
                for (key, child) in &n.children {
                    let mut next = acc.clone();
                    next.produce = Some(key.clone());
                    child.extract(&next, out);
                }
                if let Some(pass) = &n.pass {
                    pass.extract(acc, out);
                }
            }
            Link::Language(n) => {
                for (key, child) in &n.children {
                    let mut next = acc.clone();
                    next.language = Some(key.clone());
                    child.extract(&next, out);
                }
                if let Some(pass) = &n.pass {
                    pass.extract(acc, out);
                }
            }
            Link::Handler(n) => {
                for entry in &n.entries {
                    out.push(ExtractedRoute {
                        criteria: acc.clone(),
                        enabled: entry.enabled,
                        index: entry.index,
                    });
                }
            }
        }
    }
}

impl<K: PartialEq + Clone, R> CriterionNode<K, R> {
    fn descend_insert(
        &mut self,
        key: Option<K>,
        route: &RouteDef<R>,
        opts: TreeOptions,
        level: Level,
    ) where
        R: Clone,
    {
        match key {
            Some(key) => {
                let pos = match self.children.iter().position(|(k, _)| *k == key) {
                    Some(pos) => pos,
                    None => {
                        self.children.push((key, Link::empty(level.next(), opts)));
                        self.children.len() - 1
                    }
                };
                self.children[pos].1.insert(route, opts);
            }
            None => {
                self.pass
                    .get_or_insert_with(|| Box::new(Link::empty(level.next(), opts)))
                    .insert(route, opts);
            }
        }
    }

    fn descend_remove(&mut self, key: Option<&K>, criteria: &Criteria) -> usize {
        match key {
            Some(key) => {
                if let Some(pos) = self.children.iter().position(|(k, _)| k == key) {
                    let removed = self.children[pos].1.remove(criteria);
                    if self.children[pos].1.is_empty() {
                        self.children.remove(pos);
                    }
                    removed
                } else {
                    0
                }
            }
            None => {
                let removed = self.pass.as_mut().map_or(0, |p| p.remove(criteria));
                if self.pass.as_ref().is_some_and(|p| p.is_empty()) {
                    self.pass = None;
                }
                removed
            }
        }
    }

    fn descend_enable(&mut self, key: Option<&K>, criteria: &Criteria, enabled: bool) -> usize {
        match key {
            Some(key) => self
                .children
                .iter_mut()
                .find(|(k, _)| k == key)
                .map_or(0, |(_, child)| child.set_enabled(criteria, enabled)),
            None => self
                .pass
                .as_mut()
                .map_or(0, |p| p.set_enabled(criteria, enabled)),
        }
    }
}

impl<R> PathNode<R> {
    fn insert(&mut self, route: &RouteDef<R>, opts: TreeOptions)
    where
        R: Clone,
    {
        match &route.criteria.path {
            Some(PathSpec::Literal(path)) => {
                self.literals
                    .entry(path.clone())
                    .or_insert_with(|| Link::empty(Level::Path.next(), opts))
                    .insert(route, opts);
            }
            Some(PathSpec::Pattern(pattern)) => {
                let pos = match self.patterns.iter().position(|(p, _)| p == pattern) {
                    Some(pos) => pos,
                    None => {
                        // keep the vector sorted by descending specificity
                        let at = self
                            .patterns
                            .partition_point(|(p, _)| p.cmp_specificity(pattern).is_gt());
                        self.patterns
                            .insert(at, (pattern.clone(), Link::empty(Level::Path.next(), opts)));
                        at
                    }
                };
                self.patterns[pos].1.insert(route, opts);
            }
            None => {
                self.pass
                    .get_or_insert_with(|| Box::new(Link::empty(Level::Path.next(), opts)))
                    .insert(route, opts);
            }
        }
    }

    fn remove(&mut self, criteria: &Criteria) -> usize {
        match &criteria.path {
            Some(PathSpec::Literal(path)) => {
                if let Some(child) = self.literals.get_mut(path) {
                    let removed = child.remove(criteria);
                    if child.is_empty() {
                        self.literals.remove(path);
                    }
                    removed
                } else {
                    0
                }
            }
            Some(PathSpec::Pattern(pattern)) => {
                if let Some(pos) = self.patterns.iter().position(|(p, _)| p == pattern) {
                    let removed = self.patterns[pos].1.remove(criteria);
                    if self.patterns[pos].1.is_empty() {
                        self.patterns.remove(pos);
                    }
                    removed
                } else {
                    0
                }
            }
            None => {
                let removed = self.pass.as_mut().map_or(0, |p| p.remove(criteria));
                if self.pass.as_ref().is_some_and(|p| p.is_empty()) {
                    self.pass = None;
                }
                removed
            }
        }
    }

    fn set_enabled(&mut self, criteria: &Criteria, enabled: bool) -> usize {
        match &criteria.path {
            Some(PathSpec::Literal(path)) => self
                .literals
                .get_mut(path)
                .map_or(0, |child| child.set_enabled(criteria, enabled)),
            Some(PathSpec::Pattern(pattern)) => self
                .patterns
                .iter_mut()
                .find(|(p, _)| p == pattern)
                .map_or(0, |(_, child)| child.set_enabled(criteria, enabled)),
            None => self
                .pass
                .as_mut()
                .map_or(0, |p| p.set_enabled(criteria, enabled)),
        }
    }
}
