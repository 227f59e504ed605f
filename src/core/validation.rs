use super::error::ParameterError;
use super::types::{GrowthRule, SideInvestment, SimulationParameters};

pub const MIN_DURATION_YEARS: u32 = 1;
pub const MAX_DURATION_YEARS: u32 = 100;

/// Annual rates at or below this make the monthly growth factor non-positive.
const MIN_ANNUAL_RETURN_RATE: f64 = -1_200.0;

pub fn validate_parameters(params: &SimulationParameters) -> Result<(), ParameterError> {
    if !(MIN_DURATION_YEARS..=MAX_DURATION_YEARS).contains(&params.duration_years) {
        return Err(ParameterError::DurationOutOfRange {
            field: "durationYears",
            value: params.duration_years,
            min: MIN_DURATION_YEARS,
            max: MAX_DURATION_YEARS,
        });
    }

    for (field, value) in [
        ("annualIncome", params.annual_income),
        ("annualInvestment", params.annual_investment),
        ("employerContributionRate", params.employer_contribution_rate),
        ("memberContributionRate", params.member_contribution_rate),
    ] {
        require_non_negative(field, value)?;
    }

    require_finite("inflationRate", params.inflation_rate)?;
    if params.inflation_rate <= -100.0 {
        return Err(ParameterError::ShrinksBelowZero {
            field: "inflationRate",
            value: params.inflation_rate,
            floor: -100.0,
        });
    }
    require_return_rate("pensionFundReturnRate", params.pension_fund_return_rate)?;

    validate_growth(
        "incomeGrowth",
        params.income_growth,
        params.annual_income,
        params.duration_years,
    )?;
    validate_growth(
        "investmentGrowth",
        params.investment_growth,
        params.annual_investment,
        params.duration_years,
    )?;
    validate_side_investment("etfReinvestment", params.etf_reinvestment)?;
    validate_side_investment("personalInvestment", params.personal_investment)?;

    Ok(())
}

fn validate_growth(
    field: &'static str,
    rule: GrowthRule,
    start: f64,
    duration_years: u32,
) -> Result<(), ParameterError> {
    if rule.frequency_years == 0 {
        return Err(ParameterError::ZeroFrequency { field });
    }
    require_finite(field, rule.amount)?;
    if rule.is_percentage {
        if rule.amount <= -100.0 {
            return Err(ParameterError::ShrinksBelowZero {
                field,
                value: rule.amount,
                floor: -100.0,
            });
        }
        return Ok(());
    }

    // Additive steps are linear, so the last step-up is the lowest point.
    let final_value = start + rule.amount * rule.step_ups_within(duration_years) as f64;
    if final_value < 0.0 {
        return Err(ParameterError::TurnsNegative {
            field,
            start,
            final_value,
            years: duration_years,
        });
    }
    Ok(())
}

fn validate_side_investment(
    field: &'static str,
    investment: SideInvestment,
) -> Result<(), ParameterError> {
    if !investment.enabled {
        return Ok(());
    }
    require_return_rate(field, investment.annual_return_rate)?;
    require_finite(field, investment.tax_rate)?;
    if !(0.0..=100.0).contains(&investment.tax_rate) {
        return Err(ParameterError::OutOfRange {
            field,
            value: investment.tax_rate,
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NotFinite { field })
    }
}

fn require_return_rate(field: &'static str, value: f64) -> Result<(), ParameterError> {
    require_finite(field, value)?;
    if value <= MIN_ANNUAL_RETURN_RATE {
        return Err(ParameterError::ShrinksBelowZero {
            field,
            value,
            floor: MIN_ANNUAL_RETURN_RATE,
        });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ParameterError> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(ParameterError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::tests::sample_params;

    #[test]
    fn sample_parameters_are_valid() {
        assert_eq!(validate_parameters(&sample_params()), Ok(()));
    }

    #[test]
    fn rejects_zero_duration() {
        let mut params = sample_params();
        params.duration_years = 0;
        let err = validate_parameters(&params).expect_err("zero duration must be rejected");
        assert!(err.to_string().contains("durationYears"));
    }

    #[test]
    fn rejects_duration_above_bound() {
        let mut params = sample_params();
        params.duration_years = MAX_DURATION_YEARS + 1;
        assert!(matches!(
            validate_parameters(&params),
            Err(ParameterError::DurationOutOfRange { .. })
        ));

        params.duration_years = MAX_DURATION_YEARS;
        assert!(validate_parameters(&params).is_ok());
    }

    #[test]
    fn rejects_zero_frequency() {
        let mut params = sample_params();
        params.investment_growth.frequency_years = 0;
        assert_eq!(
            validate_parameters(&params),
            Err(ParameterError::ZeroFrequency {
                field: "investmentGrowth"
            })
        );
    }

    #[test]
    fn rejects_negative_income() {
        let mut params = sample_params();
        params.annual_income = -1.0;
        let err = validate_parameters(&params).expect_err("negative income");
        assert!(err.to_string().contains("annualIncome"));
    }

    #[test]
    fn rejects_nan_return_rate() {
        let mut params = sample_params();
        params.pension_fund_return_rate = f64::NAN;
        assert_eq!(
            validate_parameters(&params),
            Err(ParameterError::NotFinite {
                field: "pensionFundReturnRate"
            })
        );
    }

    #[test]
    fn rejects_percentage_growth_that_wipes_out_value() {
        let mut params = sample_params();
        params.income_growth = GrowthRule {
            amount: -100.0,
            frequency_years: 2,
            is_percentage: true,
        };
        assert!(matches!(
            validate_parameters(&params),
            Err(ParameterError::ShrinksBelowZero { .. })
        ));

        params.income_growth.is_percentage = false;
        params.income_growth.amount = -100.0;
        assert!(validate_parameters(&params).is_ok());
    }

    #[test]
    fn rejects_additive_growth_that_turns_value_negative() {
        let mut params = sample_params();
        params.duration_years = 10;
        params.income_growth = GrowthRule {
            amount: -10_000.0,
            frequency_years: 1,
            is_percentage: false,
        };
        assert_eq!(
            validate_parameters(&params),
            Err(ParameterError::TurnsNegative {
                field: "incomeGrowth",
                start: 30_000.0,
                final_value: -60_000.0,
                years: 10,
            })
        );

        // Three step-ups in ten years: 30,000 down to exactly zero is allowed.
        params.income_growth.frequency_years = 3;
        assert!(validate_parameters(&params).is_ok());

        params.investment_growth = GrowthRule {
            amount: -1_000.0,
            frequency_years: 2,
            is_percentage: false,
        };
        assert!(matches!(
            validate_parameters(&params),
            Err(ParameterError::TurnsNegative {
                field: "investmentGrowth",
                ..
            })
        ));
    }

    #[test]
    fn rejects_return_rates_that_flip_the_monthly_factor() {
        let mut params = sample_params();
        params.pension_fund_return_rate = -2_500.0;
        assert!(matches!(
            validate_parameters(&params),
            Err(ParameterError::ShrinksBelowZero {
                field: "pensionFundReturnRate",
                ..
            })
        ));

        params.pension_fund_return_rate = -1_200.0;
        assert!(validate_parameters(&params).is_err());

        params.pension_fund_return_rate = -50.0;
        assert!(validate_parameters(&params).is_ok());

        params.etf_reinvestment.enabled = true;
        params.etf_reinvestment.annual_return_rate = -1_200.0;
        assert!(matches!(
            validate_parameters(&params),
            Err(ParameterError::ShrinksBelowZero {
                field: "etfReinvestment",
                ..
            })
        ));
    }

    #[test]
    fn side_investment_tax_rate_checked_only_when_enabled() {
        let mut params = sample_params();
        params.etf_reinvestment = SideInvestment {
            enabled: false,
            annual_return_rate: 7.0,
            tax_rate: 140.0,
        };
        assert!(validate_parameters(&params).is_ok());

        params.etf_reinvestment.enabled = true;
        assert!(matches!(
            validate_parameters(&params),
            Err(ParameterError::OutOfRange {
                field: "etfReinvestment",
                ..
            })
        ));
    }
}
