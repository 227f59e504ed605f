use serde::{Deserialize, Serialize};

/// Periodic step-up rule for income or voluntary investment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRule {
    pub amount: f64,
    pub frequency_years: u32,
    pub is_percentage: bool,
}

impl GrowthRule {
    pub const NONE: GrowthRule = GrowthRule {
        amount: 0.0,
        frequency_years: 1,
        is_percentage: true,
    };

    /// Whether the rule fires at the start of `year` (1-based). Year 1 never steps up.
    pub fn applies_in(self, year: u32) -> bool {
        year > 1 && (year - 1) % self.frequency_years == 0
    }

    pub fn step_ups_within(self, duration_years: u32) -> u32 {
        duration_years.saturating_sub(1) / self.frequency_years
    }

    pub fn apply(self, value: f64) -> f64 {
        if self.is_percentage {
            value * (1.0 + self.amount / 100.0)
        } else {
            value + self.amount
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideInvestment {
    pub enabled: bool,
    pub annual_return_rate: f64,
    pub tax_rate: f64,
}

impl SideInvestment {
    pub const DISABLED: SideInvestment = SideInvestment {
        enabled: false,
        annual_return_rate: 0.0,
        tax_rate: 0.0,
    };
}

/// Inputs for one projection run. Rates are percentage points (`5.0` is 5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub duration_years: u32,
    pub annual_income: f64,
    pub annual_investment: f64,
    pub include_tfr: bool,
    pub employer_contribution_rate: f64,
    pub member_contribution_rate: f64,
    pub inflation_rate: f64,
    pub pension_fund_return_rate: f64,
    pub income_growth: GrowthRule,
    pub investment_growth: GrowthRule,
    pub etf_reinvestment: SideInvestment,
    pub personal_investment: SideInvestment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRecord {
    pub year: u32,
    pub income: f64,
    pub investment: f64,
    pub employer_contribution: f64,
    pub member_contribution: f64,
    pub tfr_accrual: f64,
    pub total_contributions: f64,
    pub gross_accumulated_value: f64,
    pub net_accumulated_value: f64,
    pub real_value: f64,
    pub net_real_value: f64,
    pub tax_rate: f64,
    pub total_fiscal_relaxation: f64,
    pub cumulative_fiscal_relaxation: f64,
    pub tfr_taxation_rate: f64,
    pub tfr_gross_value: f64,
    pub tfr_net_value: f64,
    pub tfr_net_real_value: f64,
    pub etf_contribution: f64,
    pub etf_gross_value: f64,
    pub etf_net_value: f64,
    pub etf_net_real_value: f64,
    pub personal_contribution: f64,
    pub personal_irpef_rate: f64,
    pub personal_gross_value: f64,
    pub personal_net_value: f64,
    pub personal_net_real_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionSummary {
    pub total_contributions: f64,
    pub final_value: f64,
    pub real_final_value: f64,
    pub net_final_value: f64,
    pub net_real_final_value: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub annualized_return: f64,
    pub net_annualized_return: f64,
}

/// Final figures for a stream that is taxed once on its end value: the TFR
/// left in the company, the ETF pool and the personal-investment pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub total_contributions: f64,
    pub final_value: f64,
    pub net_final_value: f64,
    pub net_real_final_value: f64,
    pub annualized_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub net_difference: f64,
    pub real_difference: f64,
    pub advantage_percent: f64,
    pub pension_with_etf_net: f64,
    pub pension_with_etf_net_real: f64,
    pub tfr_with_personal_net: f64,
    pub tfr_with_personal_net_real: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub yearly_results: Vec<YearlyRecord>,
    pub pension: PensionSummary,
    pub tfr: StreamSummary,
    pub etf: StreamSummary,
    pub personal: StreamSummary,
    pub comparison: Comparison,
}
