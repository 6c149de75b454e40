//! Fuzzy matching for command completion.
//!
//! Wraps the underlying matcher so history lookups do not depend on a
//! specific fuzzy matching crate.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// Case-insensitive fuzzy matcher for command templates.
pub struct Matcher {
    inner: SkimMatcherV2,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self {
            inner: SkimMatcherV2::default(),
        }
    }

    /// Match score of `pattern` against `text`, higher is better.
    ///
    /// Returns `None` if the pattern does not match at all.
    pub fn score(&self, text: &str, pattern: &str) -> Option<i64> {
        let pattern_lower = pattern.to_lowercase();
        self.inner.fuzzy_match(text, &pattern_lower)
    }

    /// Filter `candidates` by `pattern`, best match first.
    ///
    /// Ties keep their original order. An empty pattern keeps every
    /// candidate in order.
    pub fn rank<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a str>,
        pattern: &str,
    ) -> Vec<&'a str> {
        if pattern.is_empty() {
            return candidates.into_iter().collect();
        }

        let mut scored: Vec<(i64, &'a str)> = candidates
            .into_iter()
            .filter_map(|text| self.score(text, pattern).map(|score| (score, text)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, text)| text).collect()
    }
}
