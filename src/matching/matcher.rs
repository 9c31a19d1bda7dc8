use crate::matching::normalizer::PriceNormalizer;
use crate::models::{MatchResult, ProductRecord, TargetSpec};

/// Decides whether a catalog listing contains the target product at the
/// target price.
#[derive(Debug, Clone, Default)]
pub struct TargetMatcher {
    normalizer: PriceNormalizer,
}

impl TargetMatcher {
    pub fn new(normalizer: PriceNormalizer) -> Self {
        Self { normalizer }
    }

    /// Returns the first record, in extraction order, whose name contains the
    /// target name and whose price is within tolerance. Records with an
    /// unreadable price are skipped. Iteration stops at the first match.
    pub fn find_match<I>(&self, records: I, target: &TargetSpec) -> MatchResult
    where
        I: IntoIterator<Item = ProductRecord>,
    {
        records
            .into_iter()
            .filter(|record| target.name_matches(&record.name))
            .find(|record| {
                self.normalizer
                    .normalize(&record.price_text)
                    .map(|price| target.price_matches(price))
                    .unwrap_or(false)
            })
            .map(MatchResult::Found)
            .unwrap_or(MatchResult::NotFound)
    }
}
