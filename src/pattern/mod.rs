//! # Pattern Module
//!
//! Path template compilation and matching for the routing engine.
//!
//! A path template such as `/users/{id:[0-9]+}/posts/{post}` is compiled once
//! into an anchored regular expression plus an ordered parameter table. The
//! compiled [`PathPattern`] can then:
//!
//! - match a concrete request path, yielding parameter bindings
//! - report a [`Specificity`] key used to order overlapping patterns
//! - substitute bindings back into the template with [`PathPattern::fill`]
//!
//! ## Template grammar
//!
//! - Literal bytes match exactly; the engine never percent-decodes (callers
//!   supply an already-normalized absolute path).
//! - `{name}` captures a single path segment (no `/`).
//! - `{name:regex}` captures bytes subject to the given regex. The regex is
//!   inlined verbatim, so it stays within a segment unless it explicitly
//!   matches `/`.
//! - `{name:**}` or a bare `**` captures zero or more segments including
//!   their separators. At most one such token may appear in a template.
//! - Outside braces, `?` matches one character except `/` and `*` matches
//!   zero or more characters except `/`.
//!
//! ## Matching
//!
//! Single-segment tokens are greedy; the multi-segment token is reluctant:
//! it consumes the shortest run that still lets the rest of the template
//! match.
//!
//! ## Ordering
//!
//! Two patterns that both accept a path are disambiguated by their
//! [`Specificity`] key: literal bytes first, then single-segment captures,
//! then absence of a multi-segment token, then template length, with the
//! template text itself as the final tiebreak. The resulting order is total.

mod core;
#[cfg(test)]
mod tests;

pub use self::core::{ParamVec, PathPattern, PatternError, Specificity, MAX_INLINE_PARAMS};
