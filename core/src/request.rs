//! Assignment requests.
//!
//! Callers have historically asked for an assignment in several shapes
//! (year + month, customer + date, named fields, ...). Every shape is a
//! variant of `AssignCall`; `AssignRequest::canonicalize` resolves it to a
//! single `CanonicalRequest` before any weight computation runs.

use crate::{
    calendar::YearMonth,
    error::{GeoError, GeoResult},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A date or period in any accepted representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PeriodInput {
    Date(NaiveDate),
    YearMonth(YearMonth),
    /// `YYYY-MM`, `YYYY/MM`, `YYYYMM`, `YYYY-MM-DD` or `YYYY/MM/DD`.
    Text(String),
    Pair(i32, u32),
    /// Month number only; the year must come from elsewhere.
    Month(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum AssignCall {
    /// Year first, then a month number or any period.
    YearPeriod { year: i32, period: PeriodInput },
    /// Customer id, then a date or period. A date keeps its day.
    Customer { customer_id: String, period: PeriodInput },
    /// Named fields. Precedence: year + month, then date, then period.
    Named {
        #[serde(default)]
        customer_id: Option<String>,
        #[serde(default)]
        year: Option<i32>,
        #[serde(default)]
        month: Option<u32>,
        #[serde(default)]
        date: Option<NaiveDate>,
        #[serde(default)]
        period: Option<PeriodInput>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignRequest {
    pub call: AssignCall,
    /// Overrides the draw key when present.
    #[serde(default)]
    pub random_state: Option<String>,
}

/// The single request type the pipeline understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRequest {
    pub date: NaiveDate,
    pub period: YearMonth,
    pub draw_key: String,
}

impl AssignRequest {
    pub fn new(call: AssignCall) -> Self {
        Self { call, random_state: None }
    }

    pub fn year_month(year: i32, month: u32) -> Self {
        Self::new(AssignCall::YearPeriod { year, period: PeriodInput::Month(month) })
    }

    pub fn customer(customer_id: impl Into<String>, period: PeriodInput) -> Self {
        Self::new(AssignCall::Customer { customer_id: customer_id.into(), period })
    }

    pub fn with_random_state(mut self, state: impl Into<String>) -> Self {
        self.random_state = Some(state.into());
        self
    }

    pub fn canonicalize(&self) -> GeoResult<CanonicalRequest> {
        let (date, customer_id) = match &self.call {
            AssignCall::YearPeriod { year, period } => {
                (resolve_period(period, Some(*year))?.first_day(), None)
            }
            AssignCall::Customer { customer_id, period } => {
                let date = match period {
                    PeriodInput::Date(d) => *d,
                    other => resolve_period(other, None)?.first_day(),
                };
                (date, Some(customer_id.as_str()))
            }
            AssignCall::Named { customer_id, year, month, date, period } => {
                let resolved = match (year, month, date, period) {
                    (Some(y), Some(m), _, _) => YearMonth::new(*y, *m)?.first_day(),
                    (_, _, Some(d), _) => *d,
                    (_, _, _, Some(p)) => resolve_period(p, *year)?.first_day(),
                    (None, Some(m), None, None) => {
                        return Err(GeoError::MissingYear { month: *m });
                    }
                    _ => {
                        return Err(GeoError::UnrecognizedPeriod {
                            input: "no year/month, date or period supplied".into(),
                        });
                    }
                };
                (resolved, customer_id.as_deref())
            }
        };

        let period = YearMonth::from_date(date);
        let draw_key = self
            .random_state
            .as_deref()
            .or(customer_id)
            .map(str::to_string)
            .unwrap_or_else(|| period.key());

        Ok(CanonicalRequest { date, period, draw_key })
    }
}

/// Resolve any period representation to a month. A bare month number
/// takes its year from `fallback_year`.
pub fn resolve_period(period: &PeriodInput, fallback_year: Option<i32>) -> GeoResult<YearMonth> {
    match period {
        PeriodInput::Date(d) => Ok(YearMonth::from_date(*d)),
        PeriodInput::YearMonth(ym) => Ok(*ym),
        PeriodInput::Pair(y, m) => YearMonth::new(*y, *m),
        PeriodInput::Text(s) => parse_period(s),
        PeriodInput::Month(m) => {
            let year = fallback_year.ok_or(GeoError::MissingYear { month: *m })?;
            YearMonth::new(year, *m)
        }
    }
}

/// Parse `YYYY-MM`, `YYYY/MM`, `YYYYMM`, `YYYY-MM-DD` or `YYYY/MM/DD`.
pub fn parse_period(input: &str) -> GeoResult<YearMonth> {
    let s = input.trim();
    let full_dates = [(s.to_string(), "%Y-%m-%d"), (s.to_string(), "%Y/%m/%d")];
    let month_only = [
        (format!("{s}-01"), "%Y-%m-%d"),
        (format!("{s}/01"), "%Y/%m/%d"),
        (format!("{s}01"), "%Y%m%d"),
    ];
    month_only
        .iter()
        .chain(full_dates.iter())
        .find_map(|(text, fmt)| NaiveDate::parse_from_str(text, fmt).ok())
        .map(YearMonth::from_date)
        .ok_or_else(|| GeoError::UnrecognizedPeriod { input: input.to_string() })
}
