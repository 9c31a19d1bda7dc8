use serde::{Deserialize, Serialize};

/// A candidate product pulled out of the catalog markup. Lives for one cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: String,
    pub price_text: String,
}

impl ProductRecord {
    pub fn new(name: impl Into<String>, price_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price_text: price_text.into(),
        }
    }
}

pub const DEFAULT_PRICE_TOLERANCE: f64 = 0.01;

/// The product/price combination the operator wants to hear about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetSpec {
    pub name_pattern: String,
    pub target_price: f64,
    pub tolerance: f64,
}

impl TargetSpec {
    pub fn new(name_pattern: impl Into<String>, target_price: f64) -> Self {
        Self {
            name_pattern: name_pattern.into(),
            target_price,
            tolerance: DEFAULT_PRICE_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn name_matches(&self, name: &str) -> bool {
        name.to_lowercase()
            .contains(&self.name_pattern.to_lowercase())
    }

    pub fn price_matches(&self, price: f64) -> bool {
        (price - self.target_price).abs() < self.tolerance
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Found(ProductRecord),
    NotFound,
}

impl MatchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found(_))
    }

    pub fn record(&self) -> Option<&ProductRecord> {
        match self {
            MatchResult::Found(record) => Some(record),
            MatchResult::NotFound => None,
        }
    }

    pub fn into_record(self) -> Option<ProductRecord> {
        match self {
            MatchResult::Found(record) => Some(record),
            MatchResult::NotFound => None,
        }
    }
}
