//! # Trellis
//!
//! **Trellis** is a generic, composable web routing engine: it selects a
//! handler (server side) or an interceptor chain (client side) for an
//! exchange by successively matching orthogonal criteria - path, method,
//! consumed and produced content types, language, authority and scheme.
//!
//! ## Overview
//!
//! Trellis is deliberately small: it consumes a minimal view of a request
//! (the [`exchange::Exchange`] trait) and produces a resolved resource
//! reference plus bound path parameters. Wire codecs, TLS, body handling
//! and handler execution belong to the surrounding HTTP stack; the engine
//! performs no I/O and never reads a body.
//!
//! ## Architecture
//!
//! The library is organized into a few modules:
//!
//! - **[`pattern`]** - path template compilation, matching and specificity
//! - **[`media`]** - media and language ranges with RFC 7231 negotiation
//! - **[`exchange`]** - the request view consumed by the engine
//! - **[`route`]** - route snapshots and subset filters
//! - **[`router`]** - the router, the fluent registration surface and the
//!   client-side interceptor variant
//!
//! Internally every route is decomposed into a chain of criterion levels
//! (authority, scheme, path, method, consume, produce, language) ending in
//! a terminal handler level. Resolution walks this tree once, collects the
//! plausible terminals and ranks them by a total order, so the outcome is
//! deterministic for any route set and any request.
//!
//! ## Quick Start
//!
//! ```
//! use http::Method;
//! use trellis::{RequestParts, Router};
//!
//! # fn main() -> Result<(), trellis::RegistrationError> {
//! let router: Router<&'static str> = Router::new();
//!
//! router
//!     .route()
//!     .path("/pets/{id}")
//!     .method(Method::GET)
//!     .produces("application/json")
//!     .handler("get_pet")?;
//!
//! let mut request = RequestParts::new(Method::GET, "/pets/42")
//!     .with_header("accept", "application/json");
//!
//! let resolved = router.resolve_and_bind(&mut request).unwrap();
//! assert_eq!(resolved.resource, "get_pet");
//! assert_eq!(request.path_parameter("id"), Some("42"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Resolution outcomes
//!
//! When nothing matches, [`router::Router::resolve`] returns the failure
//! from the most progressed criterion as a value: `NotFound`,
//! `MethodNotAllowed` (with the allowed set for the `Allow` header),
//! `UnsupportedMediaType`, `NotAcceptable` (with the producible set) or
//! `Disabled`. Registration-time problems - malformed templates, duplicate
//! parameters, unparsable ranges - fail the fluent builder's terminal call
//! instead.
//!
//! ## Concurrency
//!
//! The routing tree is copy-on-write: mutation clones the tree and
//! publishes a new root atomically, resolution pins a snapshot for the
//! duration of one call. Any number of readers run concurrently with a
//! writer without locking the hot path.

pub mod exchange;
mod link;
pub mod media;
pub mod pattern;
pub mod route;
pub mod router;

pub use exchange::{Exchange, RequestParts};
pub use media::{AcceptHeader, AcceptLanguage, LanguageRange, MediaRange};
pub use pattern::{ParamVec, PathPattern, PatternError};
pub use route::{RouteFilter, RouteSnapshot};
pub use router::{
    InterceptorRouter, RegistrationError, Resolved, ResolveError, RouteConflict, RouteManager,
    Router, RouterOptions,
};
