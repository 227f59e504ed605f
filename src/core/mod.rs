mod accumulator;
mod engine;
mod error;
mod export;
mod tax;
mod types;
mod validation;

pub use accumulator::{accumulate_uniform, accumulate_with_tfr};
pub use engine::{
    MAX_DEDUCTIBLE_CONTRIBUTION, TFR_ACCRUAL_RATE, run_projection, simulate, withdrawal_tax_rate,
};
pub use error::ParameterError;
pub use export::{export_csv, export_result_csv};
pub use tax::{Bracket, BracketTable, IRPEF_BRACKETS};
pub use types::{
    Comparison, GrowthRule, PensionSummary, SideInvestment, SimulationParameters,
    SimulationResult, StreamSummary, YearlyRecord,
};
pub use validation::{MAX_DURATION_YEARS, MIN_DURATION_YEARS, validate_parameters};
