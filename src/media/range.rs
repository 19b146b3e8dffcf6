//! Media range parsing and scoring (RFC 7231 section 3.1.1 syntax).

use serde::{Serialize, Serializer};
use std::fmt;

/// Error raised when a media range cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRangeError {
    /// The value has no `type/subtype` form
    MissingSlash {
        /// The offending input
        value: String,
    },
    /// The type or subtype token is empty or contains whitespace
    InvalidToken {
        /// The offending input
        value: String,
    },
}

impl fmt::Display for MediaRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRangeError::MissingSlash { value } => {
                write!(f, "invalid media range '{}': expected type/subtype", value)
            }
            MediaRangeError::InvalidToken { value } => {
                write!(f, "invalid media range '{}': empty or malformed token", value)
            }
        }
    }
}

impl std::error::Error for MediaRangeError {}

/// A media range: `type/subtype` with optional parameters and a quality.
///
/// Type and subtype are lowercased on parse. Parameter names are
/// case-insensitive and stored lowercased; parameter values keep their case
/// except for `charset`, which is compared case-insensitively per RFC 7231.
/// The quality is stored in thousandths (RFC 7231 allows three decimals) so
/// ranking stays in integer arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    type_: String,
    subtype: String,
    parameters: Vec<(String, String)>,
    q_millis: u16,
}

impl MediaRange {
    /// Parse a media range such as `application/json` or
    /// `text/*;charset=utf-8;q=0.5`.
    ///
    /// Everything after a `q` parameter (accept-ext) is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MediaRangeError`] when the `type/subtype` part is missing
    /// or malformed.
    pub fn parse(value: &str) -> Result<Self, MediaRangeError> {
        let mut parts = split_unquoted(value, ';').into_iter();
        let essence = parts.next().unwrap_or_default().trim();
        let (t, sub) = essence
            .split_once('/')
            .ok_or_else(|| MediaRangeError::MissingSlash {
                value: value.to_string(),
            })?;
        let type_ = t.to_ascii_lowercase();
        let subtype = sub.to_ascii_lowercase();
        if !is_token(&type_) || !is_token(&subtype) {
            return Err(MediaRangeError::InvalidToken {
                value: value.to_string(),
            });
        }

        let mut parameters = Vec::new();
        let mut q_millis = 1000;
        for part in parts {
            let Some((name, raw)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let val = unquote(raw.trim());
            if name == "q" {
                q_millis = parse_quality(&val);
                break;
            }
            let val = if name == "charset" {
                val.to_ascii_lowercase()
            } else {
                val
            };
            parameters.push((name, val));
        }

        Ok(Self {
            type_,
            subtype,
            parameters,
            q_millis,
        })
    }

    /// The full wildcard range `*/*;q=1`.
    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            type_: "*".to_string(),
            subtype: "*".to_string(),
            parameters: Vec::new(),
            q_millis: 1000,
        }
    }

    /// The type token (lowercased), `*` for a wildcard.
    #[must_use]
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// The subtype token (lowercased), `*` for a wildcard.
    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Parameters in declaration order, excluding `q`.
    #[must_use]
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Quality factor in `[0.0, 1.0]`.
    #[must_use]
    pub fn q(&self) -> f32 {
        f32::from(self.q_millis) / 1000.0
    }

    /// Quality in thousandths, the unit negotiation arithmetic runs in.
    #[must_use]
    pub(crate) fn q_millis(&self) -> u16 {
        self.q_millis
    }

    /// Whether both type and subtype are wildcards.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.type_ == "*" && self.subtype == "*"
    }

    /// Number of non-quality parameters, the range specificity tiebreak.
    #[must_use]
    pub fn specificity(&self) -> u32 {
        self.parameters.len() as u32
    }

    /// Score this range against a concrete media type.
    ///
    /// Returns `1000` on an exact type/subtype match, `100` when the type
    /// matches and this range's subtype is `*`, `10` for `*/*`, else `0`.
    /// Every parameter of this range must be present and equal in `offer`
    /// or the score collapses to `0`.
    #[must_use]
    pub fn score(&self, offer: &MediaRange) -> u16 {
        let base = if self.is_wildcard() {
            10
        } else if self.type_ == offer.type_ && self.subtype == "*" {
            100
        } else if self.type_ == offer.type_ && self.subtype == offer.subtype {
            1000
        } else {
            0
        };
        if base == 0 {
            return 0;
        }
        for (name, value) in &self.parameters {
            let found = offer
                .parameters
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v);
            if found != Some(value) {
                return 0;
            }
        }
        base
    }

    /// Whether two ranges can accept a common concrete media type.
    ///
    /// Used by conflict detection: wildcards overlap everything on their
    /// axis, and parameters only disqualify when both sides declare the
    /// same name with different values.
    #[must_use]
    pub fn overlaps(&self, other: &MediaRange) -> bool {
        let type_overlap =
            self.type_ == "*" || other.type_ == "*" || self.type_ == other.type_;
        let subtype_overlap =
            self.subtype == "*" || other.subtype == "*" || self.subtype == other.subtype;
        if !type_overlap || !subtype_overlap {
            return false;
        }
        for (name, value) in &self.parameters {
            if let Some((_, v)) = other.parameters.iter().find(|(n, _)| n == name) {
                if v != value {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in &self.parameters {
            write!(f, ";{}={}", name, value)?;
        }
        if self.q_millis != 1000 {
            write!(f, ";q={}", self.q())?;
        }
        Ok(())
    }
}

impl Serialize for MediaRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl std::str::FromStr for MediaRange {
    type Err = MediaRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse a quality value into thousandths, clamped to `[0, 1000]`.
pub(crate) fn parse_quality(raw: &str) -> u16 {
    match raw.parse::<f32>() {
        Ok(v) => (v.clamp(0.0, 1.0) * 1000.0).round() as u16,
        Err(_) => 1000,
    }
}

/// Split on a separator, ignoring separators inside double quotes.
pub(crate) fn split_unquoted(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// RFC 7230 token check; `*` is in the token set, which covers wildcards.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
}

/// Strip surrounding double quotes, if present.
fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}
