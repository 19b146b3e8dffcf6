//! # Exchange Module
//!
//! The minimal view of an HTTP exchange the routing engine consumes.
//!
//! The engine never reads a body and never performs I/O: it looks at the
//! method, the pre-normalized request path, a handful of headers and
//! (client side) the authority and scheme, then binds captured path
//! parameters back through [`Exchange::set_path_parameter`]. Any request
//! type of the surrounding HTTP layer can participate by implementing
//! [`Exchange`]; [`RequestParts`] is a plain owned implementation for
//! embedders and tests.

use http::{HeaderMap, Method};

/// Read-mostly view of one request as the router sees it.
///
/// `path` must be percent-decoded, normalized and absolute; the router
/// performs no decoding of its own.
pub trait Exchange {
    /// The request method token.
    fn method(&self) -> &Method;

    /// The normalized absolute request path.
    fn path(&self) -> &str;

    /// Case-insensitive header access.
    fn headers(&self) -> &HeaderMap;

    /// The request authority, when routing on the client side.
    fn authority(&self) -> Option<&str> {
        None
    }

    /// The request scheme, when routing on the client side.
    fn scheme(&self) -> Option<&str> {
        None
    }

    /// Sink for path parameters captured during resolution.
    fn set_path_parameter(&mut self, name: &str, value: &str);
}

/// Owned implementation of [`Exchange`].
///
/// # Example
///
/// ```
/// use http::Method;
/// use trellis::exchange::{Exchange, RequestParts};
///
/// let request = RequestParts::new(Method::GET, "/users/42")
///     .with_header("accept", "application/json");
/// assert_eq!(request.path(), "/users/42");
/// ```
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    path: String,
    headers: HeaderMap,
    authority: Option<String>,
    scheme: Option<String>,
    path_parameters: Vec<(String, String)>,
}

impl RequestParts {
    /// Create a request view from a method and path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            authority: None,
            scheme: None,
            path_parameters: Vec::new(),
        }
    }

    /// Append a header; invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<http::header::HeaderName>(),
            value.parse::<http::header::HeaderValue>(),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set the client-side authority.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Set the client-side scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Look up a bound path parameter, last write wins.
    #[must_use]
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All bound path parameters in binding order.
    #[must_use]
    pub fn path_parameters(&self) -> &[(String, String)] {
        &self.path_parameters
    }
}

impl Exchange for RequestParts {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    fn set_path_parameter(&mut self, name: &str, value: &str) {
        self.path_parameters
            .push((name.to_string(), value.to_string()));
    }
}
