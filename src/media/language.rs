//! Language range parsing and matching for `Accept-Language` negotiation.

use super::range::{parse_quality, split_unquoted};
use serde::{Serialize, Serializer};
use std::fmt;

/// Error raised when a language range cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageRangeError {
    /// The range is empty or has an empty tag
    Empty {
        /// The offending input
        value: String,
    },
}

impl fmt::Display for LanguageRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageRangeError::Empty { value } => {
                write!(f, "invalid language range '{}'", value)
            }
        }
    }
}

impl std::error::Error for LanguageRangeError {}

/// A language range: a primary tag, optional subtags, and a quality.
///
/// `*` is the wildcard range. Tags are compared case-insensitively and
/// stored lowercased; quality is stored in thousandths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRange {
    primary: String,
    subtags: Vec<String>,
    q_millis: u16,
}

impl LanguageRange {
    /// Parse a language range such as `en`, `fr-CA;q=0.8` or `*`.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageRangeError::Empty`] when the tag part is empty.
    pub fn parse(value: &str) -> Result<Self, LanguageRangeError> {
        let mut parts = split_unquoted(value, ';').into_iter();
        let tag = parts.next().unwrap_or_default().trim();
        if tag.is_empty() {
            return Err(LanguageRangeError::Empty {
                value: value.to_string(),
            });
        }

        let mut q_millis = 1000;
        for part in parts {
            if let Some((name, raw)) = part.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    q_millis = parse_quality(raw.trim());
                    break;
                }
            }
        }

        let mut tags = tag.split('-').map(str::to_ascii_lowercase);
        let primary = tags.next().unwrap_or_default();
        let subtags: Vec<String> = tags.collect();
        if primary.is_empty() || subtags.iter().any(String::is_empty) {
            return Err(LanguageRangeError::Empty {
                value: value.to_string(),
            });
        }

        Ok(Self {
            primary,
            subtags,
            q_millis,
        })
    }

    /// The wildcard range `*`.
    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            primary: "*".to_string(),
            subtags: Vec::new(),
            q_millis: 1000,
        }
    }

    /// Whether this is the wildcard range.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.primary == "*"
    }

    /// Quality factor in `[0.0, 1.0]`.
    #[must_use]
    pub fn q(&self) -> f32 {
        f32::from(self.q_millis) / 1000.0
    }

    #[must_use]
    pub(crate) fn q_millis(&self) -> u16 {
        self.q_millis
    }

    /// Match this (request-side) range against an offered tag.
    ///
    /// Either side's tag sequence must be a prefix of the other: `fr-CA`
    /// accepts an offer of `fr`, and `fr` accepts an offer of `fr-CA`.
    /// Returns the number of common tags, or `None` when the ranges are
    /// unrelated. The wildcard matches anything at depth zero.
    #[must_use]
    pub fn matches(&self, offer: &LanguageRange) -> Option<u32> {
        if self.is_wildcard() {
            return Some(0);
        }
        if offer.is_wildcard() {
            return Some(0);
        }
        if self.primary != offer.primary {
            return None;
        }
        let mut common = 1u32;
        for (a, b) in self.subtags.iter().zip(offer.subtags.iter()) {
            if a != b {
                return None;
            }
            common += 1;
        }
        // one side must be exhausted: the shorter is a prefix of the longer
        let shorter = 1 + self.subtags.len().min(offer.subtags.len()) as u32;
        if common == shorter {
            Some(common)
        } else {
            None
        }
    }
}

impl fmt::Display for LanguageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary)?;
        for tag in &self.subtags {
            write!(f, "-{}", tag)?;
        }
        if self.q_millis != 1000 {
            write!(f, ";q={}", self.q())?;
        }
        Ok(())
    }
}

impl Serialize for LanguageRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl std::str::FromStr for LanguageRange {
    type Err = LanguageRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Comparable outcome of matching an offered language.
///
/// A concrete match always outranks a wildcard one regardless of quality;
/// among concrete matches the quality decides, then the matched depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LanguageScore {
    /// `true` when a concrete registered language matched
    pub concrete: bool,
    /// Quality of the best matching request range, in thousandths
    pub weighted: u32,
    /// Number of tags in common with the request range
    pub depth: u32,
}

/// A parsed `Accept-Language` header.
#[derive(Debug, Clone)]
pub struct AcceptLanguage {
    ranges: Vec<LanguageRange>,
}

impl AcceptLanguage {
    /// Parse a header value; malformed items are skipped.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let ranges: Vec<LanguageRange> = split_unquoted(value, ',')
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| LanguageRange::parse(s).ok())
            .collect();
        if ranges.is_empty() {
            return Self::any();
        }
        Self { ranges }
    }

    /// Merge all `Accept-Language` headers left-to-right; absent or empty
    /// reads as `*`.
    #[must_use]
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        let merged: Vec<&str> = headers
            .get_all(http::header::ACCEPT_LANGUAGE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let merged = merged.join(",");
        if merged.trim().is_empty() {
            return Self::any();
        }
        Self::parse(&merged)
    }

    /// The header that accepts every language.
    #[must_use]
    pub fn any() -> Self {
        Self {
            ranges: vec![LanguageRange::wildcard()],
        }
    }

    /// The request ranges, in header order.
    #[must_use]
    pub fn ranges(&self) -> &[LanguageRange] {
        &self.ranges
    }

    /// Score an offered language against this header.
    ///
    /// A registered wildcard participates with the lowest possible score so
    /// it only wins when nothing concrete does. A concrete offer scores by
    /// the best matching request range; a range (or offer) with `q=0` is
    /// eliminated.
    #[must_use]
    pub fn best_score(&self, offer: &LanguageRange) -> Option<LanguageScore> {
        if offer.q_millis() == 0 {
            return None;
        }
        if offer.is_wildcard() {
            return Some(LanguageScore {
                concrete: false,
                weighted: 0,
                depth: 0,
            });
        }
        let mut best: Option<(u32, u16)> = None;
        for range in &self.ranges {
            if let Some(depth) = range.matches(offer) {
                let entry = (depth, range.q_millis());
                if best.map_or(true, |b| entry > b) {
                    best = Some(entry);
                }
            }
        }
        let (depth, q) = best?;
        if q == 0 {
            return None;
        }
        Some(LanguageScore {
            concrete: true,
            weighted: u32::from(q),
            depth,
        })
    }
}
