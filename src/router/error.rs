//! Router error types: registration failures and resolution outcomes.

use crate::media::{LanguageRange, LanguageRangeError, MediaRange, MediaRangeError};
use crate::pattern::PatternError;
use http::Method;
use std::fmt;

/// Error raised at the terminal call of a route registration.
///
/// Criteria strings accumulate unchecked in the fluent builder and are
/// validated when the route is committed, so a malformed template or range
/// fails the whole registration atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A path template failed to compile
    Pattern(PatternError),
    /// A consume/produce range failed to parse
    MediaRange(MediaRangeError),
    /// A language range failed to parse
    LanguageRange(LanguageRangeError),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Pattern(e) => write!(f, "route registration failed: {}", e),
            RegistrationError::MediaRange(e) => write!(f, "route registration failed: {}", e),
            RegistrationError::LanguageRange(e) => write!(f, "route registration failed: {}", e),
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::Pattern(e) => Some(e),
            RegistrationError::MediaRange(e) => Some(e),
            RegistrationError::LanguageRange(e) => Some(e),
        }
    }
}

impl From<PatternError> for RegistrationError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

impl From<MediaRangeError> for RegistrationError {
    fn from(e: MediaRangeError) -> Self {
        Self::MediaRange(e)
    }
}

impl From<LanguageRangeError> for RegistrationError {
    fn from(e: LanguageRangeError) -> Self {
        Self::LanguageRange(e)
    }
}

/// A handler asked for a path parameter the matched route never captured.
///
/// Raised by [`Resolved::require_binding`](crate::router::Resolved::require_binding),
/// the typed end of the path-parameter binding contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParameter {
    /// The parameter name that was requested
    pub name: String,
}

impl fmt::Display for MissingParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required path parameter '{}'", self.name)
    }
}

impl std::error::Error for MissingParameter {}

/// Resolution outcome when no route can serve the exchange.
///
/// Returned as a value, never thrown: the HTTP layer translates the
/// variant into the matching status code with [`ResolveError::status`].
/// The carried sets feed the `Allow` header and media-type lists of the
/// response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No registered path matched
    NotFound,
    /// The path matched but not with this method
    MethodNotAllowed {
        /// Methods the matched path supports, for the `Allow` header
        allowed: Vec<Method>,
    },
    /// No registered consumer accepts the request `Content-Type`
    UnsupportedMediaType {
        /// The media ranges the matched routes can consume
        supported: Vec<MediaRange>,
    },
    /// Negotiation against `Accept` or `Accept-Language` failed
    NotAcceptable {
        /// The media types the matched routes can produce
        producible: Vec<MediaRange>,
        /// The languages the matched routes can produce
        languages: Vec<LanguageRange>,
    },
    /// The best matching route exists but is disabled
    Disabled,
}

impl ResolveError {
    /// The HTTP status code this outcome maps onto.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ResolveError::NotFound => 404,
            ResolveError::MethodNotAllowed { .. } => 405,
            ResolveError::UnsupportedMediaType { .. } => 415,
            ResolveError::NotAcceptable { .. } => 406,
            ResolveError::Disabled => 503,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound => write!(f, "no route matched the request path"),
            ResolveError::MethodNotAllowed { allowed } => {
                write!(f, "method not allowed; allowed:")?;
                for method in allowed {
                    write!(f, " {}", method)?;
                }
                Ok(())
            }
            ResolveError::UnsupportedMediaType { supported } => {
                write!(f, "unsupported media type; supported:")?;
                for range in supported {
                    write!(f, " {}", range)?;
                }
                Ok(())
            }
            ResolveError::NotAcceptable {
                producible,
                languages,
            } => {
                write!(f, "not acceptable; producible:")?;
                for range in producible {
                    write!(f, " {}", range)?;
                }
                for language in languages {
                    write!(f, " {}", language)?;
                }
                Ok(())
            }
            ResolveError::Disabled => write!(f, "matched route is disabled"),
        }
    }
}

impl std::error::Error for ResolveError {}
