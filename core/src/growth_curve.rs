//! New-customer counts per project month and intra-month day weights.
//!
//! A logistic curve over the project months, shaped by seasonality and a
//! small per-month noise, is scaled so each year hits its target. Day
//! weights (mean 1) bias the day-of-month draw towards sales periods.

use crate::{
    calendar::{black_friday_day, default_overrides, DateOverrides, ProjectRange, YearMonth},
    error::GeoResult,
    rng::StreamRng,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Steepness of the logistic base curve.
pub const LOGISTIC_K: f64 = 6.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seasonality {
    /// Month (1..=12) → multiplier. Missing months count as 1.0.
    pub by_month: BTreeMap<u32, f64>,
}

impl Default for Seasonality {
    fn default() -> Self {
        Self {
            by_month: [(1, 1.15), (7, 1.20), (8, 0.85), (11, 1.38), (12, 1.25)]
                .into_iter()
                .collect(),
        }
    }
}

impl Seasonality {
    pub fn factor(&self, month: u32) -> f64 {
        self.by_month.get(&month).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthConfig {
    pub targets_by_year: BTreeMap<i32, u64>,
    #[serde(default)]
    pub seasonality: Seasonality,
}

impl GrowthConfig {
    /// Yearly new-customer targets of the built-in project.
    pub fn example() -> Self {
        Self {
            targets_by_year: [
                (2017, 2_960),
                (2018, 7_400),
                (2019, 17_790),
                (2020, 16_710),
                (2021, 28_110),
                (2022, 39_940),
                (2023, 42_900),
                (2024, 53_250),
                (2025, 39_940),
            ]
            .into_iter()
            .collect(),
            seasonality: Seasonality::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyIntake {
    pub period: String,
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub new_customers: u64,
    pub day_weights: Vec<f64>,
}

/// Logistic values over `n` evenly spaced points in [-3, 3], scaled to mean 1.
pub fn logistic_index(n: usize, k: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let span = n.saturating_sub(1).max(1) as f64;
    let values: Vec<f64> = (0..n)
        .map(|i| {
            let x = -3.0 + 6.0 * (i as f64 / span);
            1.0 / (1.0 + (-k * x / 6.0).exp())
        })
        .collect();
    let mean = values.iter().sum::<f64>() / n as f64;
    values.into_iter().map(|v| v / mean).collect()
}

/// Day weights for `ym`, mean 1.0.
pub fn day_weights_for_month(ym: YearMonth, overrides: &DateOverrides) -> GeoResult<Vec<f64>> {
    let dim = ym.days_in_month() as usize;
    let mut rng = StreamRng::from_parts(&["day-bias", ym.period().as_str()]).with_name("day-bias");
    let mut w: Vec<f64> = (0..dim).map(|_| 1.0 + (rng.next_f64() * 0.10 - 0.05)).collect();

    match ym.month() {
        // January sales: strong push from the 7th, decaying.
        1 => {
            let start = dim.min(7);
            let length = 14usize.min((dim + 1).saturating_sub(start).max(1));
            let bump = 1.10 + rng.next_f64() * 0.25;
            for day in start..start + length {
                let dist = (day - start) as f64;
                let decay = 1.0 - 0.30 * (dist / (length as f64 - 1.0 + 1e-9));
                w[day - 1] *= bump * decay.max(0.80);
            }
        }
        // July sales from the 1st.
        7 => {
            let length = dim.min(10);
            let bump = 1.10 + rng.next_f64() * 0.20;
            for day in 1..=length {
                let dist = (day - 1) as f64;
                let decay = 1.0 - 0.25 * (dist / (length as f64 - 1.0 + 1e-9));
                w[day - 1] *= bump * decay.max(0.85);
            }
        }
        // Black Friday spike with a short halo.
        11 => {
            let bf = match overrides.fixed_day(ym) {
                Some(day) => day,
                None => black_friday_day(ym.year())?,
            } as usize;
            if (1..=dim).contains(&bf) {
                let spike = 1.80 + rng.next_f64() * 0.60;
                w[bf - 1] *= spike;
                for delta in [-3i64, -2, -1, 1, 2, 3] {
                    let day = bf as i64 + delta;
                    if (1..=dim as i64).contains(&day) {
                        let base = 1.10 + 0.20 * (1.0 - delta.abs() as f64 / 3.0);
                        w[day as usize - 1] *= base * (1.0 + (rng.next_f64() * 0.06 - 0.03));
                    }
                }
            }
        }
        // December: mid-month gifting window and the last days.
        12 => {
            let end = dim.min(24);
            let bump_mid = 1.10 + rng.next_f64() * 0.20;
            for day in 10..=end {
                w[day - 1] *= bump_mid * (1.0 + (rng.next_f64() * 0.06 - 0.03));
            }
            for day in dim.min(26)..=dim {
                w[day - 1] *= 1.05 + rng.next_f64() * 0.10;
            }
        }
        _ => {}
    }

    let mean = if dim > 0 { w.iter().sum::<f64>() / dim as f64 } else { 1.0 };
    if mean > 0.0 {
        w.iter_mut().for_each(|x| *x /= mean);
    }
    Ok(w)
}

/// New customers and day weights for every month in `range`.
pub fn build_monthly_new_customers(
    range: &ProjectRange,
    config: &GrowthConfig,
) -> GeoResult<Vec<MonthlyIntake>> {
    let months: Vec<YearMonth> = range.months().collect();
    let overrides = default_overrides(range)?;
    let base = logistic_index(months.len(), LOGISTIC_K);

    let adjusted: Vec<f64> = months
        .iter()
        .zip(&base)
        .map(|(ym, b)| {
            let mut rng = StreamRng::from_parts(&["month-noise", ym.period().as_str()]);
            let noise = 1.0 + (rng.next_f64() * 0.08 - 0.04);
            b * config.seasonality.factor(ym.month()) * noise
        })
        .collect();

    let mut raw_by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for (ym, v) in months.iter().zip(&adjusted) {
        *raw_by_year.entry(ym.year()).or_insert(0.0) += v;
    }

    let mut out = Vec::with_capacity(months.len());
    for (ym, v) in months.iter().zip(&adjusted) {
        let dim = ym.days_in_month();
        let target = config.targets_by_year.get(&ym.year()).copied().unwrap_or(0);
        let (new_customers, day_weights) = if target == 0 {
            (0, vec![1.0; dim as usize])
        } else {
            let year_total = raw_by_year.get(&ym.year()).copied().unwrap_or(0.0);
            let share = if year_total > 0.0 { v / year_total } else { 0.0 };
            let count = (share * target as f64).round() as u64;
            (count, day_weights_for_month(*ym, &overrides)?)
        };
        out.push(MonthlyIntake {
            period: ym.period(),
            year: ym.year(),
            month: ym.month(),
            days_in_month: dim,
            new_customers,
            day_weights,
        });
    }

    log::debug!(
        "growth curve: {} months, {} new customers",
        out.len(),
        out.iter().map(|m| m.new_customers).sum::<u64>()
    );
    Ok(out)
}
