//! Currency conversion abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: u64,
    pub short_code: String,
    pub name: String,
}

/// A conversion as reported by a rate provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionQuote {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub value: f64,
}

/// Lookup key for a conversion. Compared by value, so identical requests
/// coalesce in caches regardless of where they were built.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl ConversionRequest {
    pub fn new(from: &str, to: &str, amount: f64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl PartialEq for ConversionRequest {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.amount.to_bits() == other.amount.to_bits()
    }
}

impl Eq for ConversionRequest {}

impl Hash for ConversionRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
        self.amount.to_bits().hash(state);
    }
}

/// Outcome of a conversion. Never mutated once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub request: ConversionRequest,
    pub value: f64,
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn fetch_currencies(&self) -> Result<Vec<Currency>>;
    async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConversionQuote>;
}
