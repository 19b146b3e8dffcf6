//! Router core - snapshot reads on the hot path, serialized mutation.

use crate::exchange::Exchange;
use crate::link::{Candidate, Link, Level, MissKind, Misses, Partial, ResolveCx, TreeOptions};
use crate::media::{LanguageRange, MediaRange};
use crate::pattern::ParamVec;
use crate::route::{Criteria, ExtractedRoute, RouteFilter, RouteSnapshot};
use arc_swap::ArcSwap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::error::{MissingParameter, ResolveError};
use super::manager::RouteManager;

/// Negotiation policy knobs for a router.
///
/// Strict is the default on all three axes: when constrained routes exist
/// and none match, resolution fails with the specific negotiation error.
/// A lenient axis yields no candidates instead and lets resolution fall
/// through to whatever else matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Do not surface `UnsupportedMediaType` on a consume miss
    pub lenient_consume: bool,
    /// Do not surface `NotAcceptable` on a produce miss
    pub lenient_produce: bool,
    /// Do not surface `NotAcceptable` on a language miss
    pub lenient_language: bool,
}

impl RouterOptions {
    fn tree_options(self) -> TreeOptions {
        TreeOptions {
            strict_consume: !self.lenient_consume,
            strict_produce: !self.lenient_produce,
            strict_language: !self.lenient_language,
        }
    }
}

/// A successfully resolved exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<R> {
    /// The registered resource (handler reference)
    pub resource: R,
    /// Path parameters captured along the way, in template order
    pub bindings: ParamVec,
    /// The negotiated produced media type, when the route constrained one
    pub media_type: Option<MediaRange>,
    /// The negotiated language, when the route constrained one
    pub language: Option<LanguageRange>,
}

impl<R> Resolved<R> {
    /// Write the captured bindings back onto the exchange.
    pub fn apply<E: Exchange>(&self, exchange: &mut E) {
        for (name, value) in &self.bindings {
            exchange.set_path_parameter(name, value);
        }
    }

    /// Look up a binding by name, last write wins.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a binding a handler cannot work without.
    ///
    /// # Errors
    ///
    /// Returns [`MissingParameter`] when the matched route captured no
    /// parameter of that name.
    pub fn require_binding(&self, name: &str) -> Result<&str, MissingParameter> {
        self.binding(name).ok_or_else(|| MissingParameter {
            name: name.to_string(),
        })
    }
}

/// Two routes whose criteria cannot be told apart by resolution.
///
/// Conflicts are diagnostics, not errors: the later registration stays in
/// the tree and loses ties by registration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteConflict {
    /// The earlier registration
    pub first: RouteSnapshot,
    /// The later registration
    pub second: RouteSnapshot,
}

impl fmt::Display for RouteConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "route #{} conflicts with route #{}",
            self.second.index, self.first.index
        )
    }
}

/// Callback invoked for newly detected conflicts.
pub(crate) type ConflictSink = Box<dyn Fn(&RouteConflict) + Send + Sync>;

pub(crate) struct MutationState {
    next_index: u64,
    conflicts: Vec<RouteConflict>,
    conflicted: HashSet<u64>,
    sink: Option<ConflictSink>,
}

/// Operation applied to a matching route subset.
pub(crate) enum RouteOp {
    Remove,
    Enable,
    Disable,
}

/// The routing engine root.
///
/// `R` is the resource carried by each route - typically an `Arc` to a
/// handler. Resolution clones the winning resource out of the tree, so
/// cheaply clonable resources keep the hot path allocation-free.
///
/// # Concurrency
///
/// Readers load the current tree root atomically and keep it for the
/// duration of one `resolve` call. Mutations clone the tree, apply the
/// change and publish the new root, serialized by an internal writer lock,
/// so readers never observe a partially applied change.
pub struct Router<R> {
    pub(crate) root: ArcSwap<Link<R>>,
    pub(crate) state: Mutex<MutationState>,
    pub(crate) options: TreeOptions,
}

impl<R: Clone> Default for Router<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> Router<R> {
    /// Create a router with strict negotiation on every axis.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    /// Create a router with explicit negotiation policy.
    #[must_use]
    pub fn with_options(options: RouterOptions) -> Self {
        let tree = options.tree_options();
        Self {
            root: ArcSwap::from_pointee(Link::empty(Level::Authority, tree)),
            state: Mutex::new(MutationState {
                next_index: 0,
                conflicts: Vec::new(),
                conflicted: HashSet::new(),
                sink: None,
            }),
            options: tree,
        }
    }

    /// Start a fluent route registration.
    #[must_use]
    pub fn route(&self) -> RouteManager<'_, R> {
        RouteManager::new(self)
    }

    /// Resolve one exchange to the best matching resource.
    ///
    /// Synchronous and free of I/O; reads a consistent snapshot of the
    /// route set taken when the call began.
    pub fn resolve<E: Exchange>(&self, exchange: &E) -> Result<Resolved<R>, ResolveError> {
        debug!(
            method = %exchange.method(),
            path = %exchange.path(),
            "route resolution attempt"
        );
        let started = Instant::now();

        let root = self.root.load();
        let cx = ResolveCx::from_exchange(exchange);
        let mut candidates: Vec<Candidate<R>> = Vec::new();
        let mut misses = Misses::default();
        root.resolve(&cx, &Partial::default(), &mut candidates, &mut misses);

        let elapsed = started.elapsed();
        let winner = candidates.into_iter().max_by(|a, b| a.rank.cmp(&b.rank));

        match winner {
            Some(candidate) => {
                if elapsed > Duration::from_millis(1) {
                    warn!(
                        method = %exchange.method(),
                        path = %exchange.path(),
                        duration_us = elapsed.as_micros() as u64,
                        "slow route resolution"
                    );
                } else {
                    info!(
                        method = %exchange.method(),
                        path = %exchange.path(),
                        bindings = ?candidate.bindings,
                        duration_us = elapsed.as_micros() as u64,
                        "route resolved"
                    );
                }
                Ok(Resolved {
                    resource: candidate.resource,
                    bindings: candidate.bindings,
                    media_type: candidate.media,
                    language: candidate.language,
                })
            }
            None => {
                let error = error_from(misses);
                info!(
                    method = %exchange.method(),
                    path = %exchange.path(),
                    outcome = %error,
                    duration_us = elapsed.as_micros() as u64,
                    "no route resolved"
                );
                Err(error)
            }
        }
    }

    /// Resolve and immediately bind captured parameters onto the exchange.
    pub fn resolve_and_bind<E: Exchange>(
        &self,
        exchange: &mut E,
    ) -> Result<Resolved<R>, ResolveError> {
        let resolved = self.resolve(&*exchange)?;
        resolved.apply(exchange);
        Ok(resolved)
    }

    /// Snapshot the routes matching a filter, in registration order.
    #[must_use]
    pub fn find_routes(&self, filter: &RouteFilter) -> Vec<RouteSnapshot> {
        let state = self.lock_state();
        let extracted = self.extract_sorted(&self.root.load());
        extracted
            .iter()
            .map(|r| r.snapshot(state.conflicted.contains(&r.index)))
            .filter(|s| filter.accepts(s))
            .collect()
    }

    /// Snapshot every registered route, in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteSnapshot> {
        self.find_routes(&RouteFilter::new())
    }

    /// The conflicts currently present in the route set.
    #[must_use]
    pub fn conflicts(&self) -> Vec<RouteConflict> {
        self.lock_state().conflicts.clone()
    }

    /// Install a diagnostic sink invoked once per newly detected conflict.
    ///
    /// Without a sink, new conflicts are logged as warnings.
    pub fn on_conflict(&self, sink: impl Fn(&RouteConflict) + Send + Sync + 'static) {
        self.lock_state().sink = Some(Box::new(sink));
    }

    /// Every registered path template, literal paths included.
    ///
    /// Useful for pre-registering per-path metrics at startup.
    #[must_use]
    pub fn path_templates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.extract_sorted(&self.root.load())
            .iter()
            .filter_map(|r| r.criteria.path.as_ref().map(|p| p.template().to_string()))
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Print the route table to stdout.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        println!("[routes] count={}", routes.len());
        for route in routes {
            println!(
                "[route] #{} {} {} enabled={}{}",
                route.index,
                route.method.as_deref().unwrap_or("*"),
                route.path.as_deref().unwrap_or("/**"),
                route.enabled,
                if route.conflicted { " CONFLICT" } else { "" },
            );
        }
    }

    pub(crate) fn commit_insert(&self, routes: Vec<(Criteria, R)>) -> usize {
        let mut state = self.lock_state();
        let mut root = (**self.root.load()).clone();
        let mut registered = 0;
        for (criteria, resource) in routes {
            let def = crate::route::RouteDef {
                criteria,
                resource,
                index: state.next_index,
            };
            state.next_index += 1;
            root.insert(&def, self.options);
            registered += 1;
        }
        self.refresh_conflicts(&root, &mut state);
        self.root.store(Arc::new(root));
        info!(registered, "routing table updated");
        registered
    }

    pub(crate) fn commit_matching<F>(&self, matcher: F, op: RouteOp) -> usize
    where
        F: Fn(&ExtractedRoute) -> bool,
    {
        let mut state = self.lock_state();
        let mut root = (**self.root.load()).clone();
        let extracted = self.extract_sorted(&root);

        let mut seen = HashSet::new();
        let mut affected = 0;
        for route in extracted.iter().filter(|r| matcher(r)) {
            if !seen.insert(criteria_key(&route.criteria)) {
                continue;
            }
            affected += match op {
                RouteOp::Remove => root.remove(&route.criteria),
                RouteOp::Enable => root.set_enabled(&route.criteria, true),
                RouteOp::Disable => root.set_enabled(&route.criteria, false),
            };
        }

        if affected > 0 {
            self.refresh_conflicts(&root, &mut state);
            self.root.store(Arc::new(root));
        }
        debug!(affected, "route subset mutation applied");
        affected
    }

    fn extract_sorted(&self, root: &Link<R>) -> Vec<ExtractedRoute> {
        let mut extracted = Vec::new();
        root.extract(&Criteria::default(), &mut extracted);
        extracted.sort_by_key(|r| r.index);
        extracted
    }

    fn refresh_conflicts(&self, root: &Link<R>, state: &mut MutationState) {
        let extracted = self.extract_sorted(root);
        let mut conflicts = Vec::new();
        let mut conflicted = HashSet::new();
        for (i, a) in extracted.iter().enumerate() {
            for b in extracted.iter().skip(i + 1) {
                if conflicting(a, b) {
                    conflicted.insert(a.index);
                    conflicted.insert(b.index);
                    conflicts.push(RouteConflict {
                        first: a.snapshot(true),
                        second: b.snapshot(true),
                    });
                }
            }
        }

        for conflict in &conflicts {
            if !state.conflicts.contains(conflict) {
                match &state.sink {
                    Some(sink) => sink(conflict),
                    None => warn!(
                        first = conflict.first.index,
                        second = conflict.second.index,
                        path = conflict.first.path.as_deref().unwrap_or("*"),
                        "route conflict detected"
                    ),
                }
            }
        }

        state.conflicts = conflicts;
        state.conflicted = conflicted;
    }

    fn lock_state(&self) -> MutexGuard<'_, MutationState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Stable identity of a criteria tuple, used to dedup subset mutations.
fn criteria_key(criteria: &Criteria) -> String {
    let mut key = String::new();
    let mut push = |part: Option<String>| {
        if let Some(part) = part {
            key.push_str(&part);
        }
        key.push('\n');
    };
    push(criteria.path.as_ref().map(|p| p.template().to_string()));
    push(criteria.method.as_ref().map(ToString::to_string));
    push(criteria.consume.as_ref().map(ToString::to_string));
    push(criteria.produce.as_ref().map(ToString::to_string));
    push(criteria.language.as_ref().map(ToString::to_string));
    push(criteria.authority.as_ref().map(ToString::to_string));
    push(criteria.scheme.clone());
    key
}

/// Whether two routes are indistinguishable to resolution: equal on every
/// exact criterion, and overlapping at equal quality on each negotiation
/// axis.
fn conflicting(a: &ExtractedRoute, b: &ExtractedRoute) -> bool {
    let path_eq = match (&a.criteria.path, &b.criteria.path) {
        (None, None) => true,
        (Some(x), Some(y)) => x.template() == y.template(),
        _ => false,
    };
    path_eq
        && a.criteria.method == b.criteria.method
        && a.criteria.authority == b.criteria.authority
        && a.criteria.scheme == b.criteria.scheme
        && media_overlap(&a.criteria.consume, &b.criteria.consume)
        && media_overlap(&a.criteria.produce, &b.criteria.produce)
        && language_overlap(&a.criteria.language, &b.criteria.language)
}

fn media_overlap(a: &Option<MediaRange>, b: &Option<MediaRange>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x.q_millis() == y.q_millis() && x.overlaps(y),
        _ => false,
    }
}

fn language_overlap(a: &Option<LanguageRange>, b: &Option<LanguageRange>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => {
            x.q_millis() == y.q_millis()
                && (x.is_wildcard() || y.is_wildcard() || x.matches(y).is_some())
        }
        _ => false,
    }
}

fn error_from(misses: Misses) -> ResolveError {
    match misses.kind {
        MissKind::Disabled => ResolveError::Disabled,
        MissKind::Language | MissKind::Produce => ResolveError::NotAcceptable {
            producible: misses.producible,
            languages: misses.languages,
        },
        MissKind::Consume => ResolveError::UnsupportedMediaType {
            supported: misses.supported,
        },
        MissKind::Method => ResolveError::MethodNotAllowed {
            allowed: misses.allowed,
        },
        MissKind::Path | MissKind::None => ResolveError::NotFound,
    }
}
