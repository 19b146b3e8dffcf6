//! Path template compiler - turns route templates into anchored matchers.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
///
/// Most route templates have well under 8 captures, so bindings stay on the
/// stack for the common case.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter bindings produced by a pattern match.
///
/// Parameter names come from the compiled pattern and are shared `Arc<str>`
/// values; only the captured values are per-request allocations.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Look up a binding by name with last-write-wins semantics.
///
/// If the same name was captured at several depths the most recently pushed
/// occurrence is returned.
#[must_use]
pub(crate) fn binding<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
    params
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]*$").expect("parameter name regex"));

/// Error raised when a path template cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The template is malformed at the given byte position.
    Invalid {
        /// Human-readable reason for the failure
        reason: String,
        /// Byte offset of the offending token in the template
        position: usize,
    },
    /// The same parameter name appears more than once in one template.
    DuplicateParameter {
        /// The repeated parameter name
        name: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Invalid { reason, position } => {
                write!(f, "invalid path pattern at byte {}: {}", position, reason)
            }
            PatternError::DuplicateParameter { name } => {
                write!(f, "duplicate path parameter '{}'", name)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Ordering key for overlapping patterns; larger keys are more specific.
///
/// Field order is significant: keys compare by literal byte count, then by
/// single-segment capture count, then by absence of a multi-segment token,
/// then by template length. Equal keys are disambiguated by the template
/// text so the overall order is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    /// Bytes matched verbatim (separators included)
    pub literals: u32,
    /// Count of `{name}` / `?` / `*` tokens
    pub captures: u32,
    /// `true` when the template has no multi-segment token
    pub bounded: bool,
    /// Total template length
    pub length: u32,
}

/// One parameter slot in the compiled pattern.
///
/// `group` is the synthetic regex group name, kept separate from `name` so
/// user-supplied constraints can contain their own capture groups without
/// shifting indices.
#[derive(Debug, Clone)]
struct ParamDef {
    name: Arc<str>,
    group: String,
}

/// Render pieces retained for [`PathPattern::fill`].
#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    /// Single-segment or constrained capture, by parameter index
    Param(usize),
    /// Whole-segment multi capture; renders as `/value` when non-empty
    Multi(usize),
    /// Multi capture embedded inside a segment
    InlineMulti(usize),
    /// `?`, `*`, or an unnamed capture - not reconstructible
    Opaque,
}

/// A compiled path template.
///
/// Compilation produces a single anchored regex plus an ordered parameter
/// table, following the same template-to-regex approach used for the route
/// table, generalized with constraints, wildcards and multi-segment
/// captures.
///
/// # Example
///
/// ```
/// use trellis::pattern::PathPattern;
///
/// let pattern = PathPattern::parse("/users/{id:[0-9]+}/profile").unwrap();
/// let bindings = pattern.matches("/users/42/profile").unwrap();
/// assert_eq!(bindings[0].1, "42");
/// assert!(pattern.matches("/users/abc/profile").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    params: Vec<ParamDef>,
    pieces: Vec<Piece>,
    specificity: Specificity,
}

impl PathPattern {
    /// Compile a path template.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Invalid`] for an empty or non-absolute
    /// template, malformed braces, an invalid parameter constraint, or a
    /// second multi-segment token, and [`PatternError::DuplicateParameter`]
    /// when a parameter name repeats.
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        if template.is_empty() {
            return Err(PatternError::Invalid {
                reason: "empty pattern".to_string(),
                position: 0,
            });
        }
        if !template.starts_with('/') {
            return Err(PatternError::Invalid {
                reason: "pattern must start with '/'".to_string(),
                position: 0,
            });
        }

        let mut compiler = Compiler::new(template);
        compiler.run()?;
        let Compiler {
            regex_src,
            params,
            pieces,
            literals,
            captures,
            multi_seen,
            ..
        } = compiler;

        let regex = Regex::new(&regex_src).map_err(|e| PatternError::Invalid {
            reason: e.to_string(),
            position: 0,
        })?;

        let specificity = Specificity {
            literals,
            captures,
            bounded: !multi_seen,
            length: template.len() as u32,
        };

        Ok(Self {
            template: template.to_string(),
            regex,
            params,
            pieces,
            specificity,
        })
    }

    /// The original template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The ordering key of this pattern.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Total order over patterns: specificity key, then template text.
    #[must_use]
    pub fn cmp_specificity(&self, other: &Self) -> std::cmp::Ordering {
        self.specificity
            .cmp(&other.specificity)
            .then_with(|| self.template.cmp(&other.template))
    }

    /// Match a concrete request path against this pattern.
    ///
    /// Returns the parameter bindings in template order, or `None` when the
    /// path does not match. A skipped multi-segment capture binds the empty
    /// string. Unnamed captures constrain the match but produce no binding.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut bindings = ParamVec::new();
        for p in &self.params {
            if p.name.is_empty() {
                continue;
            }
            let value = caps.name(&p.group).map(|m| m.as_str()).unwrap_or("");
            bindings.push((Arc::clone(&p.name), value.to_string()));
        }
        Some(bindings)
    }

    /// Substitute bindings back into the template.
    ///
    /// For a path accepted by [`matches`](Self::matches), filling the
    /// returned bindings reproduces that path. Returns `None` when the
    /// template contains anonymous wildcards (`?`, `*`, unnamed captures)
    /// or when a named binding is missing.
    #[must_use]
    pub fn fill(&self, bindings: &ParamVec) -> Option<String> {
        let mut out = String::with_capacity(self.template.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(lit) => out.push_str(lit),
                Piece::Param(idx) | Piece::InlineMulti(idx) => {
                    let value = binding(bindings, &self.params[*idx].name)?;
                    out.push_str(value);
                }
                Piece::Multi(idx) => {
                    let value = binding(bindings, &self.params[*idx].name)?;
                    if !value.is_empty() {
                        out.push('/');
                        out.push_str(value);
                    }
                }
                Piece::Opaque => return None,
            }
        }
        Some(out)
    }

    /// Whether the pattern contains a multi-segment token.
    #[must_use]
    pub fn has_multi(&self) -> bool {
        !self.specificity.bounded
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for PathPattern {}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl std::str::FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Single-pass template scanner.
///
/// Braces are parsed with depth counting so a constraint may itself contain
/// braces (e.g. `{id:[0-9]{3}}`) or separators (a constraint that matches
/// `/` explicitly crosses segments).
struct Compiler<'t> {
    template: &'t str,
    regex_src: String,
    lit_run: String,
    params: Vec<ParamDef>,
    pieces: Vec<Piece>,
    seen_names: HashSet<String>,
    literals: u32,
    captures: u32,
    multi_seen: bool,
}

impl<'t> Compiler<'t> {
    fn new(template: &'t str) -> Self {
        Self {
            template,
            regex_src: String::with_capacity(template.len() * 2 + 2),
            lit_run: String::new(),
            params: Vec::new(),
            pieces: Vec::new(),
            seen_names: HashSet::new(),
            literals: 0,
            captures: 0,
            multi_seen: false,
        }
    }

    fn run(&mut self) -> Result<(), PatternError> {
        self.regex_src.push('^');
        let template = self.template;
        let mut i = 0;
        while i < template.len() {
            let c = template[i..].chars().next().unwrap_or('\0');
            match c {
                '{' => {
                    let (end, inner) = parse_brace(template, i)?;
                    self.token(template, i, end + 1, inner)?;
                    i = end + 1;
                }
                '}' => {
                    return Err(PatternError::Invalid {
                        reason: "unmatched '}'".to_string(),
                        position: i,
                    });
                }
                '?' => {
                    self.flush_literals();
                    self.regex_src.push_str("[^/]");
                    self.captures += 1;
                    self.pieces.push(Piece::Opaque);
                    i += 1;
                }
                '*' => {
                    if template[i + 1..].starts_with('*') {
                        self.multi(template, i, i + 2, "")?;
                        i += 2;
                    } else {
                        self.flush_literals();
                        self.regex_src.push_str("[^/]*");
                        self.captures += 1;
                        self.pieces.push(Piece::Opaque);
                        i += 1;
                    }
                }
                _ => {
                    self.lit_run.push(c);
                    i += c.len_utf8();
                }
            }
        }
        self.flush_literals();
        self.regex_src.push('$');
        Ok(())
    }

    /// Handle one `{...}` token starting at `start` and ending before `end`.
    fn token(
        &mut self,
        template: &str,
        start: usize,
        end: usize,
        inner: &str,
    ) -> Result<(), PatternError> {
        let (name, constraint) = match inner.split_once(':') {
            Some((n, c)) => (n, Some(c)),
            None => (inner, None),
        };
        if !PARAM_NAME.is_match(name) {
            return Err(PatternError::Invalid {
                reason: format!("invalid parameter name '{}'", name),
                position: start,
            });
        }
        if constraint == Some("**") {
            return self.multi(template, start, end, name);
        }

        let idx = self.declare(name)?;
        self.flush_literals();
        match constraint {
            None => {
                self.regex_src
                    .push_str(&format!("(?P<{}>[^/]+)", self.params[idx].group));
            }
            Some(c) => {
                Regex::new(&format!("^(?:{})$", c)).map_err(|_| PatternError::Invalid {
                    reason: format!("invalid parameter constraint '{}'", c),
                    position: start,
                })?;
                self.regex_src
                    .push_str(&format!("(?P<{}>{})", self.params[idx].group, c));
            }
        }
        self.captures += 1;
        if name.is_empty() {
            self.pieces.push(Piece::Opaque);
        } else {
            self.pieces.push(Piece::Param(idx));
        }
        Ok(())
    }

    /// Handle a multi-segment token (`**` or `{name:**}`).
    ///
    /// When the token spans a whole segment the preceding separator folds
    /// into an optional group so the pattern also accepts zero segments.
    fn multi(
        &mut self,
        template: &str,
        start: usize,
        end: usize,
        name: &str,
    ) -> Result<(), PatternError> {
        if self.multi_seen {
            return Err(PatternError::Invalid {
                reason: "more than one multi-segment token".to_string(),
                position: start,
            });
        }
        let idx = self.declare(name)?;
        self.multi_seen = true;

        let whole_segment = start > 0
            && template.as_bytes()[start - 1] == b'/'
            && (end == template.len() || template.as_bytes()[end] == b'/')
            && self.lit_run.ends_with('/');

        if whole_segment {
            self.lit_run.pop();
            self.flush_literals();
            self.regex_src
                .push_str(&format!("(?:/(?P<{}>.*?))?", self.params[idx].group));
            if name.is_empty() {
                self.pieces.push(Piece::Opaque);
            } else {
                self.pieces.push(Piece::Multi(idx));
            }
        } else {
            self.flush_literals();
            self.regex_src
                .push_str(&format!("(?P<{}>.*?)", self.params[idx].group));
            if name.is_empty() {
                self.pieces.push(Piece::Opaque);
            } else {
                self.pieces.push(Piece::InlineMulti(idx));
            }
        }
        Ok(())
    }

    /// Register a parameter slot, enforcing name uniqueness.
    fn declare(&mut self, name: &str) -> Result<usize, PatternError> {
        if !name.is_empty() && !self.seen_names.insert(name.to_string()) {
            return Err(PatternError::DuplicateParameter {
                name: name.to_string(),
            });
        }
        let idx = self.params.len();
        self.params.push(ParamDef {
            name: Arc::from(name),
            group: format!("p{}", idx),
        });
        Ok(idx)
    }

    fn flush_literals(&mut self) {
        if !self.lit_run.is_empty() {
            self.literals += self.lit_run.len() as u32;
            self.regex_src.push_str(&regex::escape(&self.lit_run));
            self.pieces
                .push(Piece::Literal(std::mem::take(&mut self.lit_run)));
        }
    }
}

/// Find the matching `}` for the `{` at `start`, with depth counting.
fn parse_brace(template: &str, start: usize) -> Result<(usize, &str), PatternError> {
    let bytes = template.as_bytes();
    let mut depth = 1usize;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((i, &template[start + 1..i]));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(PatternError::Invalid {
        reason: "unclosed '{'".to_string(),
        position: start,
    })
}
