//! Per-date diagnostic summary. Not used for sampling.

use crate::types::WeightMap;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const TOP_N: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthSummary {
    pub date: NaiveDate,
    /// Sum of the final weights, rounded to 6 decimals. Should be 1.0.
    pub total: f64,
    pub unit_count: usize,
    pub active_openings: Vec<String>,
    /// Heaviest units, descending. Ties broken by name.
    pub top10: Vec<(String, f64)>,
}

impl MonthSummary {
    pub fn from_weights(
        date: NaiveDate,
        total: f64,
        weights: &WeightMap,
        active_openings: Vec<String>,
    ) -> Self {
        let mut ranked: Vec<(String, f64)> =
            weights.iter().map(|(k, w)| (k.clone(), *w)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(TOP_N);

        Self {
            date,
            total: (total * 1e6).round() / 1e6,
            unit_count: weights.len(),
            active_openings,
            top10: ranked,
        }
    }
}
