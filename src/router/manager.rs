//! Fluent route registration and subset management.

use crate::media::{LanguageRange, MediaRange};
use crate::route::{AuthorityPattern, Criteria, ExtractedRoute, PathSpec};
use http::Method;
use tracing::debug;

use super::core::{RouteOp, Router};
use super::error::RegistrationError;

/// Fluent accumulator for one registration or subset operation.
///
/// Criteria accumulate across calls; multi-valued criteria expand into
/// their cartesian product at the terminal call, one route per
/// combination:
///
/// ```
/// use http::Method;
/// use trellis::router::Router;
///
/// # fn main() -> Result<(), trellis::router::RegistrationError> {
/// let router: Router<&'static str> = Router::new();
/// // registers GET and HEAD routes for both representations: 4 routes
/// let registered = router
///     .route()
///     .path("/report")
///     .method(Method::GET)
///     .method(Method::HEAD)
///     .produces("application/json")
///     .produces("application/xml")
///     .handler("report")?;
/// assert_eq!(registered, 4);
/// # Ok(())
/// # }
/// ```
///
/// The terminal calls [`enable`](Self::enable), [`disable`](Self::disable)
/// and [`remove`](Self::remove) instead select the already-registered
/// routes matching the accumulated criteria and act on them.
///
/// Validation is deferred to the terminal call: a malformed template or
/// range fails the whole operation and registers nothing.
#[must_use = "a route manager does nothing until a terminal call"]
pub struct RouteManager<'a, R> {
    router: &'a Router<R>,
    paths: Vec<(String, bool)>,
    methods: Vec<Method>,
    consumes: Vec<String>,
    produces: Vec<String>,
    languages: Vec<String>,
    authorities: Vec<String>,
    schemes: Vec<String>,
}

impl<'a, R: Clone> RouteManager<'a, R> {
    pub(crate) fn new(router: &'a Router<R>) -> Self {
        Self {
            router,
            paths: Vec::new(),
            methods: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            languages: Vec::new(),
            authorities: Vec::new(),
            schemes: Vec::new(),
        }
    }

    /// Add a path criterion, matching exactly this template.
    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.paths.push((template.into(), false));
        self
    }

    /// Add a path criterion that also matches the trailing-slash twin.
    ///
    /// `/a/` and `/a` both register, so either concrete form resolves.
    pub fn match_trailing_slash(mut self, template: impl Into<String>) -> Self {
        self.paths.push((template.into(), true));
        self
    }

    /// Add a method criterion.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a consumed media range criterion, matched against
    /// `Content-Type`.
    pub fn consumes(mut self, range: impl Into<String>) -> Self {
        self.consumes.push(range.into());
        self
    }

    /// Add a produced media range criterion, negotiated against `Accept`.
    pub fn produces(mut self, range: impl Into<String>) -> Self {
        self.produces.push(range.into());
        self
    }

    /// Add a language criterion, negotiated against `Accept-Language`.
    pub fn language(mut self, range: impl Into<String>) -> Self {
        self.languages.push(range.into());
        self
    }

    /// Add a client-side authority criterion; `*` globs.
    pub fn authority(mut self, pattern: impl Into<String>) -> Self {
        self.authorities.push(pattern.into());
        self
    }

    /// Add a client-side scheme criterion.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.schemes.push(scheme.into());
        self
    }

    /// Commit the accumulated criteria with this resource.
    ///
    /// Returns the number of routes registered (the cartesian product
    /// size).
    ///
    /// # Errors
    ///
    /// Fails without registering anything when a template or range is
    /// malformed.
    pub fn handler(self, resource: R) -> Result<usize, RegistrationError> {
        let combinations = self.combinations()?;
        debug!(routes = combinations.len(), "registering routes");
        Ok(self
            .router
            .commit_insert(
                combinations
                    .into_iter()
                    .map(|criteria| (criteria, resource.clone()))
                    .collect(),
            ))
    }

    /// Enable every registered route matching the accumulated criteria.
    ///
    /// Returns the number of affected routes.
    ///
    /// # Errors
    ///
    /// Fails when a template or range is malformed.
    pub fn enable(self) -> Result<usize, RegistrationError> {
        let selector = self.selector()?;
        Ok(self
            .router
            .commit_matching(|route| selector.accepts(route), RouteOp::Enable))
    }

    /// Disable every registered route matching the accumulated criteria.
    ///
    /// Disabled routes stay registered; resolving to one reports
    /// `Disabled`.
    ///
    /// # Errors
    ///
    /// Fails when a template or range is malformed.
    pub fn disable(self) -> Result<usize, RegistrationError> {
        let selector = self.selector()?;
        Ok(self
            .router
            .commit_matching(|route| selector.accepts(route), RouteOp::Disable))
    }

    /// Remove every registered route matching the accumulated criteria.
    ///
    /// # Errors
    ///
    /// Fails when a template or range is malformed.
    pub fn remove(self) -> Result<usize, RegistrationError> {
        let selector = self.selector()?;
        Ok(self
            .router
            .commit_matching(|route| selector.accepts(route), RouteOp::Remove))
    }

    /// Parse every accumulated path, expanding trailing-slash twins.
    fn parsed_paths(&self) -> Result<Vec<PathSpec>, RegistrationError> {
        let mut paths = Vec::new();
        for (template, trailing) in &self.paths {
            if *trailing {
                let bare = template.trim_end_matches('/');
                let bare = if bare.is_empty() { "/" } else { bare };
                paths.push(PathSpec::parse(bare)?);
                if bare != "/" {
                    paths.push(PathSpec::parse(&format!("{}/", bare))?);
                }
            } else {
                paths.push(PathSpec::parse(template)?);
            }
        }
        Ok(paths)
    }

    /// The cartesian product of the accumulated criteria.
    fn combinations(&self) -> Result<Vec<Criteria>, RegistrationError> {
        fn expand<T: Clone>(values: Vec<T>) -> Vec<Option<T>> {
            if values.is_empty() {
                vec![None]
            } else {
                values.into_iter().map(Some).collect()
            }
        }

        let paths = expand(self.parsed_paths()?);
        let methods = expand(self.methods.clone());
        let consumes = expand(
            self.consumes
                .iter()
                .map(|s| MediaRange::parse(s))
                .collect::<Result<Vec<_>, _>>()?,
        );
        let produces = expand(
            self.produces
                .iter()
                .map(|s| MediaRange::parse(s))
                .collect::<Result<Vec<_>, _>>()?,
        );
        let languages = expand(
            self.languages
                .iter()
                .map(|s| LanguageRange::parse(s))
                .collect::<Result<Vec<_>, _>>()?,
        );
        let authorities = expand(
            self.authorities
                .iter()
                .map(|s| AuthorityPattern::new(s.clone()))
                .collect(),
        );
        let schemes = expand(
            self.schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        );

        let mut out = Vec::new();
        for path in &paths {
            for method in &methods {
                for consume in &consumes {
                    for produce in &produces {
                        for language in &languages {
                            for authority in &authorities {
                                for scheme in &schemes {
                                    out.push(Criteria {
                                        path: path.clone(),
                                        method: method.clone(),
                                        consume: consume.clone(),
                                        produce: produce.clone(),
                                        language: language.clone(),
                                        authority: authority.clone(),
                                        scheme: scheme.clone(),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Build the subset selector used by enable/disable/remove.
    fn selector(&self) -> Result<Selector, RegistrationError> {
        Ok(Selector {
            paths: self.parsed_paths()?,
            methods: self.methods.clone(),
            consumes: self
                .consumes
                .iter()
                .map(|s| MediaRange::parse(s))
                .collect::<Result<Vec<_>, _>>()?,
            produces: self
                .produces
                .iter()
                .map(|s| MediaRange::parse(s))
                .collect::<Result<Vec<_>, _>>()?,
            languages: self
                .languages
                .iter()
                .map(|s| LanguageRange::parse(s))
                .collect::<Result<Vec<_>, _>>()?,
            authorities: self
                .authorities
                .iter()
                .map(|s| AuthorityPattern::new(s.clone()))
                .collect(),
            schemes: self
                .schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        })
    }
}

/// Typed subset selector: set dimensions must match one of the listed
/// values, empty dimensions match anything.
struct Selector {
    paths: Vec<PathSpec>,
    methods: Vec<Method>,
    consumes: Vec<MediaRange>,
    produces: Vec<MediaRange>,
    languages: Vec<LanguageRange>,
    authorities: Vec<AuthorityPattern>,
    schemes: Vec<String>,
}

impl Selector {
    fn accepts(&self, route: &ExtractedRoute) -> bool {
        fn dim<T: PartialEq>(allowed: &[T], value: &Option<T>) -> bool {
            allowed.is_empty() || value.as_ref().is_some_and(|v| allowed.contains(v))
        }
        dim(&self.paths, &route.criteria.path)
            && dim(&self.methods, &route.criteria.method)
            && dim(&self.consumes, &route.criteria.consume)
            && dim(&self.produces, &route.criteria.produce)
            && dim(&self.languages, &route.criteria.language)
            && dim(&self.authorities, &route.criteria.authority)
            && dim(&self.schemes, &route.criteria.scheme)
    }
}
