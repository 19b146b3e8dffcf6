//! # Router Module
//!
//! The public routing surface: the [`Router`] holding the dispatch tree,
//! the fluent [`RouteManager`] used to register and manage routes, and the
//! client-side [`InterceptorRouter`] variant.
//!
//! ## Overview
//!
//! A [`Router`] resolves one exchange to one resource:
//!
//! ```
//! use http::Method;
//! use trellis::exchange::RequestParts;
//! use trellis::router::Router;
//!
//! # fn main() -> Result<(), trellis::router::RegistrationError> {
//! let router: Router<&'static str> = Router::new();
//! router
//!     .route()
//!     .path("/users/{id:[0-9]+}")
//!     .method(Method::GET)
//!     .produces("application/json")
//!     .handler("get_user")?;
//!
//! let request = RequestParts::new(Method::GET, "/users/42");
//! let resolved = router.resolve(&request).unwrap();
//! assert_eq!(resolved.resource, "get_user");
//! assert_eq!(resolved.bindings[0].1, "42");
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The dispatch tree is copy-on-write: every mutation rebuilds the root
//! under a writer lock and publishes it atomically, so `resolve` reads a
//! consistent snapshot without locking. Writers are expected to be rare
//! (registration, enable/disable) relative to resolution traffic.
//!
//! ## Failures
//!
//! `resolve` returns errors as values, never panics: the HTTP layer maps
//! [`ResolveError`] onto 404/405/415/406 responses with the corresponding
//! `Allow` or media-type lists.

mod core;
mod error;
mod interceptor;
mod manager;
#[cfg(test)]
mod tests;

pub use self::core::{Resolved, RouteConflict, Router, RouterOptions};
pub use error::{MissingParameter, RegistrationError, ResolveError};
pub use interceptor::{InterceptorManager, InterceptorRouter};
pub use manager::RouteManager;
