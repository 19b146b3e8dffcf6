//! Client-side routing: interceptor chains instead of a single handler.

use crate::exchange::Exchange;
use crate::link::{Candidate, Partial, ResolveCx};
use crate::route::{RouteFilter, RouteSnapshot};
use http::Method;

use super::core::{RouteConflict, Router, RouterOptions};
use super::error::RegistrationError;
use super::manager::RouteManager;

/// Router variant whose terminal resources are interceptor chains.
///
/// Unlike [`Router::resolve`], resolution does not pick a single best
/// route: every registered chain whose path is the request path or a
/// segment-boundary prefix of it - and whose other criteria are satisfied -
/// contributes. Chains concatenate ordered by path specificity, then by
/// registration order.
///
/// ```
/// use http::Method;
/// use trellis::exchange::RequestParts;
/// use trellis::router::InterceptorRouter;
///
/// # fn main() -> Result<(), trellis::router::RegistrationError> {
/// let router: InterceptorRouter<&'static str> = InterceptorRouter::new();
/// router.route().path("/api").interceptor("auth").register()?;
/// router
///     .route()
///     .path("/api/payments")
///     .interceptor("audit")
///     .register()?;
///
/// let request = RequestParts::new(Method::POST, "/api/payments/123");
/// assert_eq!(router.resolve(&request), vec!["audit", "auth"]);
/// # Ok(())
/// # }
/// ```
pub struct InterceptorRouter<I> {
    inner: Router<Vec<I>>,
}

impl<I: Clone> Default for InterceptorRouter<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Clone> InterceptorRouter<I> {
    /// Create an interceptor router with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Router::new(),
        }
    }

    /// Create an interceptor router with explicit negotiation policy.
    #[must_use]
    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            inner: Router::with_options(options),
        }
    }

    /// Start a fluent interceptor registration.
    #[must_use]
    pub fn route(&self) -> InterceptorManager<'_, I> {
        InterceptorManager {
            inner: self.inner.route(),
            chain: Vec::new(),
        }
    }

    /// Collect the interceptor chain for this exchange.
    ///
    /// Returns an empty vector when nothing applies; there is no failure
    /// mode on the client side.
    #[must_use]
    pub fn resolve<E: Exchange>(&self, exchange: &E) -> Vec<I> {
        let root = self.inner.root.load();
        let cx = ResolveCx::from_exchange(exchange);
        let mut candidates: Vec<Candidate<Vec<I>>> = Vec::new();
        root.resolve_prefix(&cx, &Partial::default(), &mut candidates);

        // most specific paths first; registration order stabilizes ties
        candidates.sort_by(|a, b| {
            b.rank
                .path
                .cmp(&a.rank.path)
                .then_with(|| a.rank.order.0.cmp(&b.rank.order.0))
        });
        candidates
            .into_iter()
            .flat_map(|candidate| candidate.resource)
            .collect()
    }

    /// Snapshot the routes matching a filter, in registration order.
    #[must_use]
    pub fn find_routes(&self, filter: &RouteFilter) -> Vec<RouteSnapshot> {
        self.inner.find_routes(filter)
    }

    /// The conflicts currently present in the route set.
    #[must_use]
    pub fn conflicts(&self) -> Vec<RouteConflict> {
        self.inner.conflicts()
    }
}

/// Fluent accumulator for one interceptor registration.
///
/// Shares the criteria surface of [`RouteManager`]; the terminal call is
/// [`register`](Self::register), committing the accumulated chain.
#[must_use = "an interceptor manager does nothing until a terminal call"]
pub struct InterceptorManager<'a, I> {
    inner: RouteManager<'a, Vec<I>>,
    chain: Vec<I>,
}

impl<'a, I: Clone> InterceptorManager<'a, I> {
    /// Add a path criterion; prefixes of a request path also apply.
    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.inner = self.inner.path(template);
        self
    }

    /// Add a method criterion.
    pub fn method(mut self, method: Method) -> Self {
        self.inner = self.inner.method(method);
        self
    }

    /// Add a consumed media range criterion.
    pub fn consumes(mut self, range: impl Into<String>) -> Self {
        self.inner = self.inner.consumes(range);
        self
    }

    /// Add a produced media range criterion.
    pub fn produces(mut self, range: impl Into<String>) -> Self {
        self.inner = self.inner.produces(range);
        self
    }

    /// Add a language criterion.
    pub fn language(mut self, range: impl Into<String>) -> Self {
        self.inner = self.inner.language(range);
        self
    }

    /// Add an authority criterion; `*` globs.
    pub fn authority(mut self, pattern: impl Into<String>) -> Self {
        self.inner = self.inner.authority(pattern);
        self
    }

    /// Add a scheme criterion.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.inner = self.inner.scheme(scheme);
        self
    }

    /// Append an interceptor to the chain being registered.
    pub fn interceptor(mut self, interceptor: I) -> Self {
        self.chain.push(interceptor);
        self
    }

    /// Commit the accumulated chain under the accumulated criteria.
    ///
    /// # Errors
    ///
    /// Fails when a template or range is malformed.
    pub fn register(self) -> Result<usize, RegistrationError> {
        self.inner.handler(self.chain)
    }

    /// Enable matching registrations.
    ///
    /// # Errors
    ///
    /// Fails when a template or range is malformed.
    pub fn enable(self) -> Result<usize, RegistrationError> {
        self.inner.enable()
    }

    /// Disable matching registrations.
    ///
    /// # Errors
    ///
    /// Fails when a template or range is malformed.
    pub fn disable(self) -> Result<usize, RegistrationError> {
        self.inner.disable()
    }

    /// Remove matching registrations.
    ///
    /// # Errors
    ///
    /// Fails when a template or range is malformed.
    pub fn remove(self) -> Result<usize, RegistrationError> {
        self.inner.remove()
    }
}
