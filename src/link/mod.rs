//! # Link Module
//!
//! The recursive dispatch tree behind the router.
//!
//! A route is decomposed into one criterion per level, in a fixed chain:
//! authority, scheme, path, method, consumed media type, produced media
//! type, language, and finally the terminal handler level. Each level holds
//! insertion-ordered children keyed by its criterion value, plus a
//! pass-through slot for routes that do not constrain that criterion.
//!
//! Resolution walks the chain collecting every plausible terminal as a
//! candidate, ranks candidates by a total order (language score, produce
//! score, consume score, path specificity, method exactness, registration
//! index) and keeps the failure from the most progressed level when nothing
//! survives - a method mismatch on a matched path beats "not found", a
//! failed negotiation beats both.

mod core;
mod resolve;

pub(crate) use self::core::{Level, Link, TreeOptions};
pub(crate) use self::resolve::{Candidate, MissKind, Misses, Partial, ResolveCx};
