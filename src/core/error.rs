use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{field} must be between {min} and {max} years, got {value}")]
    DurationOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("{field} must be >= 1 year")]
    ZeroFrequency { field: &'static str },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be > {floor}, got {value}")]
    ShrinksBelowZero {
        field: &'static str,
        value: f64,
        floor: f64,
    },

    #[error("{field} takes {start} down to {final_value} within {years} years")]
    TurnsNegative {
        field: &'static str,
        start: f64,
        final_value: f64,
        years: u32,
    },
}
