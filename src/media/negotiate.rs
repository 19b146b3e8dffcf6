//! Best-match selection between `Accept` headers and registered offers.

use super::range::{split_unquoted, MediaRange};

/// Comparable outcome of scoring an offer against an `Accept` header.
///
/// `weighted` is the match score multiplied by the quality of the selected
/// request range (both in thousandth units); `specificity` is that range's
/// parameter count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MediaScore {
    /// `score * q`, zero never occurs (a zero product is no match)
    pub weighted: u32,
    /// Parameter count of the matching request range
    pub specificity: u32,
}

/// A parsed `Accept` header: request media ranges in header order.
#[derive(Debug, Clone)]
pub struct AcceptHeader {
    ranges: Vec<MediaRange>,
}

impl AcceptHeader {
    /// Parse a header value; malformed items are skipped.
    ///
    /// An empty value reads as `*/*;q=1`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let ranges: Vec<MediaRange> = split_unquoted(value, ',')
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| MediaRange::parse(s).ok())
            .collect();
        if ranges.is_empty() {
            return Self::any();
        }
        Self { ranges }
    }

    /// Merge all `Accept` headers left-to-right per RFC 7230 section 3.2.2;
    /// absent or empty reads as `*/*;q=1`.
    #[must_use]
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        let merged: Vec<&str> = headers
            .get_all(http::header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let merged = merged.join(",");
        if merged.trim().is_empty() {
            return Self::any();
        }
        Self::parse(&merged)
    }

    /// The header that accepts everything.
    #[must_use]
    pub fn any() -> Self {
        Self {
            ranges: vec![MediaRange::wildcard()],
        }
    }

    /// The request ranges, in header order.
    #[must_use]
    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }

    /// Score a registered offer against this header.
    ///
    /// The most specific matching range decides: ranges are compared by
    /// `(score, parameter count, q)` and the winner's quality weights the
    /// final value. Returns `None` when nothing matches, when the deciding
    /// range carries `q=0`, or when the offer itself is registered with
    /// `q=0`.
    #[must_use]
    pub fn best_score(&self, offer: &MediaRange) -> Option<MediaScore> {
        if offer.q_millis() == 0 {
            return None;
        }
        let mut best: Option<(u16, u32, u16)> = None;
        for range in &self.ranges {
            let score = range.score(offer);
            if score == 0 {
                continue;
            }
            let entry = (score, range.specificity(), range.q_millis());
            if best.map_or(true, |b| entry > b) {
                best = Some(entry);
            }
        }
        let (score, specificity, q) = best?;
        if q == 0 {
            return None;
        }
        Some(MediaScore {
            weighted: u32::from(score) * u32::from(q),
            specificity,
        })
    }
}

/// Select the best offer for an `Accept` header.
///
/// Offers are iterated in registration order; the first offer with the
/// highest `(weighted, specificity)` wins, so ties preserve insertion
/// order. Returns the winning offer's position and its score.
#[must_use]
pub fn negotiate<'a, I>(accept: &AcceptHeader, offers: I) -> Option<(usize, MediaScore)>
where
    I: IntoIterator<Item = &'a MediaRange>,
{
    let mut best: Option<(usize, MediaScore)> = None;
    for (i, offer) in offers.into_iter().enumerate() {
        if let Some(score) = accept.best_score(offer) {
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((i, score));
            }
        }
    }
    best
}
