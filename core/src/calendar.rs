//! Calendar helpers: project months, month arithmetic, Black Friday and
//! deterministic day-of-month sampling.
//!
//! Only year and month matter to the weight pipeline. Day resolution is kept
//! for the opening-date comparison and for the day sampler used by the
//! simulation driver.

use crate::{
    error::{GeoError, GeoResult},
    rng::StreamRng,
};
use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A calendar month. Stored as its first day, so it is always valid.
/// Deserializing any date of the month yields the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "NaiveDate")]
pub struct YearMonth(NaiveDate);

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> GeoResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(GeoError::InvalidYearMonth { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0
            .with_day(self.days_in_month())
            .unwrap_or(self.0)
    }

    pub fn days_in_month(&self) -> u32 {
        match self.0.checked_add_months(Months::new(1)) {
            Some(next) => (next - self.0).num_days() as u32,
            None => 31, // December of the last representable year
        }
    }

    /// The following month, if representable.
    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(&self, earlier: YearMonth) -> i64 {
        i64::from(self.year() - earlier.year()) * 12
            + i64::from(self.month()) - i64::from(earlier.month())
    }

    /// `YYYYMM`, the period suffix used in every monthly key.
    pub fn key(&self) -> String {
        format!("{:04}{:02}", self.year(), self.month())
    }

    /// `YYYY-MM`.
    pub fn period(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.period())
    }
}

/// Inclusive project date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Per-month metadata for the project range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMonth {
    pub year: i32,
    pub month: u32,
    pub period: String,
    pub days_in_month: u32,
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
}

impl ProjectRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start_month(&self) -> YearMonth {
        YearMonth::from_date(self.start)
    }

    pub fn end_month(&self) -> YearMonth {
        YearMonth::from_date(self.end)
    }

    /// Months from start to end, inclusive by month.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> {
        let end = self.end_month();
        std::iter::successors(Some(self.start_month()), |ym| ym.succ())
            .take_while(move |ym| *ym <= end)
    }

    /// Month distance between the start and end months.
    pub fn total_months(&self) -> i64 {
        self.end_month().months_since(self.start_month())
    }

    /// Position of `date` inside the range, clamped to [0, 1].
    pub fn time_fraction(&self, date: NaiveDate) -> f64 {
        let current = YearMonth::from_date(date).months_since(self.start_month());
        let total = self.total_months().max(1);
        (current as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn project_months(&self) -> Vec<ProjectMonth> {
        self.months()
            .map(|ym| ProjectMonth {
                year: ym.year(),
                month: ym.month(),
                period: ym.period(),
                days_in_month: ym.days_in_month(),
                month_start: ym.first_day(),
                month_end: ym.last_day(),
            })
            .collect()
    }
}

/// Day (1..=31) of the n-th `weekday` in the month.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u8) -> GeoResult<u32> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
        .map(|d| d.day())
        .ok_or_else(|| GeoError::Calendar {
            reason: format!("no occurrence {n} of {weekday} in {year:04}-{month:02}"),
        })
}

/// Black Friday: fourth Friday of November.
pub fn black_friday_day(year: i32) -> GeoResult<u32> {
    nth_weekday_of_month(year, 11, Weekday::Fri, 4)
}

/// Per-period fixed days, keyed by `YYYY-MM`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverrides {
    pub by_period_day: BTreeMap<String, u32>,
}

impl DateOverrides {
    pub fn fixed_day(&self, ym: YearMonth) -> Option<u32> {
        self.by_period_day.get(&ym.period()).copied()
    }
}

/// Default overrides: every November in the range is pinned to Black Friday.
pub fn default_overrides(range: &ProjectRange) -> GeoResult<DateOverrides> {
    let mut by_period_day = BTreeMap::new();
    for ym in range.months().filter(|ym| ym.month() == 11) {
        by_period_day.insert(ym.period(), black_friday_day(ym.year())?);
    }
    Ok(DateOverrides { by_period_day })
}

/// Inputs for `sample_day_in_month`.
#[derive(Debug, Clone, Copy)]
pub struct DaySampling<'a> {
    pub base_seed: &'a str,
    pub scope: &'a str,
    pub unique_key: Option<&'a str>,
    pub overrides: Option<&'a DateOverrides>,
    pub allowed_days: Option<&'a [u32]>,
}

impl Default for DaySampling<'_> {
    fn default() -> Self {
        Self {
            base_seed: "global",
            scope: "cohort",
            unique_key: None,
            overrides: None,
            allowed_days: None,
        }
    }
}

/// A date inside `ym`. An override wins (clamped into the month);
/// otherwise the day is drawn deterministically from the sampling key.
pub fn sample_day_in_month(ym: YearMonth, sampling: &DaySampling<'_>) -> GeoResult<NaiveDate> {
    let dim = ym.days_in_month();
    let on_day = |day: u32| {
        ym.first_day()
            .with_day(day)
            .ok_or(GeoError::InvalidYearMonth { year: ym.year(), month: ym.month() })
    };

    if let Some(fixed) = sampling.overrides.and_then(|o| o.fixed_day(ym)) {
        return on_day(fixed.clamp(1, dim));
    }

    let period = ym.period();
    let mut parts = vec![sampling.base_seed, sampling.scope, period.as_str()];
    if let Some(key) = sampling.unique_key {
        parts.push(key);
    }
    let mut rng = StreamRng::from_parts(&parts).with_name("day-sampler");

    if let Some(allowed) = sampling.allowed_days {
        let mut pool: Vec<u32> = allowed.iter().copied().filter(|d| (1..=dim).contains(d)).collect();
        pool.sort_unstable();
        if pool.is_empty() {
            return Err(GeoError::Calendar {
                reason: format!("allowed days contain no valid day for {period}"),
            });
        }
        let idx = rng.next_u64_below(pool.len() as u64) as usize;
        return on_day(pool[idx]);
    }

    on_day(rng.int_inclusive(1, dim))
}
