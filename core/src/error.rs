use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Invalid distribution at stage '{stage}': total weight {total} is not positive")]
    InvalidDistribution { stage: &'static str, total: f64 },

    #[error("Unrecognized period format: '{input}' (expected YYYY-MM or similar)")]
    UnrecognizedPeriod { input: String },

    #[error("Numeric month {month} supplied without a year")]
    MissingYear { month: u32 },

    #[error("Invalid year/month: {year}-{month}")]
    InvalidYearMonth { year: i32, month: u32 },

    #[error("Unknown region '{name}'")]
    UnknownRegion { name: String },

    #[error("Unknown sub-region '{name}'")]
    UnknownSubregion { name: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Calendar error: {reason}")]
    Calendar { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GeoResult<T> = Result<T, GeoError>;
