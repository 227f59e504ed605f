use tracing::debug;

use super::accumulator::{accumulate_uniform, accumulate_with_tfr};
use super::error::ParameterError;
use super::tax::IRPEF_BRACKETS;
use super::types::{
    Comparison, PensionSummary, SideInvestment, SimulationParameters, SimulationResult,
    StreamSummary, YearlyRecord,
};
use super::validation::validate_parameters;

pub const TFR_ACCRUAL_RATE: f64 = 7.41;
pub const MAX_DEDUCTIBLE_CONTRIBUTION: f64 = 5_164.57;

const TFR_REVALUATION_FIXED_RATE: f64 = 1.5;
const TFR_REVALUATION_INFLATION_SHARE: f64 = 0.75;

const WITHDRAWAL_TAX_MAX: f64 = 15.0;
const WITHDRAWAL_TAX_MIN: f64 = 9.0;
const WITHDRAWAL_TAX_STEP: f64 = 0.3;
const WITHDRAWAL_TAX_FULL_RATE_YEARS: u32 = 15;
const WITHDRAWAL_TAX_FLOOR_YEAR: u32 = 35;

#[derive(Debug, Clone, Copy)]
struct ContributionFlow {
    investment: f64,
    employer: f64,
    member: f64,
    tfr: f64,
}

impl ContributionFlow {
    fn for_year(params: &SimulationParameters, income: f64, investment: f64) -> Self {
        if !params.include_tfr {
            return Self {
                investment,
                employer: 0.0,
                member: 0.0,
                tfr: 0.0,
            };
        }
        Self {
            investment,
            employer: income * params.employer_contribution_rate / 100.0,
            member: income * params.member_contribution_rate / 100.0,
            tfr: income * TFR_ACCRUAL_RATE / 100.0,
        }
    }

    fn regular(self) -> f64 {
        self.investment + self.employer + self.member
    }

    fn total(self) -> f64 {
        self.regular() + self.tfr
    }

    fn personal(self) -> f64 {
        self.investment + self.member
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PoolYear {
    contribution: f64,
    gross: f64,
    net: f64,
    net_real: f64,
}

#[derive(Debug)]
struct GainsTaxedPool {
    config: SideInvestment,
    gross: f64,
    contributed: f64,
}

impl GainsTaxedPool {
    fn new(config: SideInvestment) -> Self {
        Self {
            config,
            gross: 0.0,
            contributed: 0.0,
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn advance(&mut self, contribution: f64, price_index: f64) -> PoolYear {
        if !self.config.enabled {
            return PoolYear::default();
        }
        self.contributed += contribution;
        self.gross = accumulate_uniform(self.gross, self.config.annual_return_rate, contribution);
        // Tax is charged on all gains to date every year, not on the year's increment.
        let net = net_after_gains_tax(self.gross, self.contributed, self.config.tax_rate);
        PoolYear {
            contribution,
            gross: self.gross,
            net,
            net_real: net / price_index,
        }
    }
}

#[derive(Debug)]
struct TfrCompany {
    gross: f64,
    revaluation_rate: f64,
}

#[derive(Debug, Clone, Copy)]
struct TfrYear {
    taxation_rate: f64,
    gross: f64,
    net: f64,
    net_real: f64,
}

impl TfrCompany {
    fn new(inflation_rate: f64) -> Self {
        Self {
            gross: 0.0,
            revaluation_rate: TFR_REVALUATION_FIXED_RATE
                + TFR_REVALUATION_INFLATION_SHARE * inflation_rate,
        }
    }

    fn advance(
        &mut self,
        accrual: f64,
        history: &[YearlyRecord],
        income: f64,
        price_index: f64,
    ) -> TfrYear {
        let taxation_rate = IRPEF_BRACKETS.tfr_taxation_rate(history, income);
        self.gross = (self.gross + accrual) * (1.0 + self.revaluation_rate / 100.0);
        let net = self.gross * (1.0 - taxation_rate / 100.0);
        TfrYear {
            taxation_rate,
            gross: self.gross,
            net,
            net_real: net / price_index,
        }
    }
}

pub fn simulate(params: &SimulationParameters) -> Result<SimulationResult, ParameterError> {
    validate_parameters(params)?;
    Ok(run_projection(params))
}

pub fn run_projection(params: &SimulationParameters) -> SimulationResult {
    debug!(
        duration_years = params.duration_years,
        include_tfr = params.include_tfr,
        etf = params.etf_reinvestment.enabled,
        personal = params.personal_investment.enabled,
        "running pension projection"
    );
    let yearly_results = project_years(params);
    let result = summarize(params, yearly_results);
    debug!(
        net_final_value = result.pension.net_final_value,
        tfr_net_final_value = result.tfr.net_final_value,
        "projection finished"
    );
    result
}

pub fn withdrawal_tax_rate(years: u32) -> f64 {
    if years <= WITHDRAWAL_TAX_FULL_RATE_YEARS {
        WITHDRAWAL_TAX_MAX
    } else if years >= WITHDRAWAL_TAX_FLOOR_YEAR {
        WITHDRAWAL_TAX_MIN
    } else {
        WITHDRAWAL_TAX_MAX - (years - WITHDRAWAL_TAX_FULL_RATE_YEARS) as f64 * WITHDRAWAL_TAX_STEP
    }
}

fn price_index(inflation_rate: f64, years: u32) -> f64 {
    (1.0 + inflation_rate / 100.0).powi(years as i32)
}

fn net_after_gains_tax(gross: f64, contributed: f64, tax_rate: f64) -> f64 {
    gross - (gross - contributed).max(0.0) * tax_rate / 100.0
}

fn prior_year_deduction(previous: &YearlyRecord) -> f64 {
    let eligible = (previous.investment + previous.member_contribution)
        .min(MAX_DEDUCTIBLE_CONTRIBUTION);
    IRPEF_BRACKETS.deduction_amount(eligible, previous.income)
}

fn project_years(params: &SimulationParameters) -> Vec<YearlyRecord> {
    let mut records: Vec<YearlyRecord> = Vec::with_capacity(params.duration_years as usize);

    let mut income = params.annual_income;
    let mut investment = params.annual_investment;
    let mut cumulative_deduction = 0.0;
    let mut pension_gross = 0.0;
    let mut tfr_company = TfrCompany::new(params.inflation_rate);
    let mut etf_pool = GainsTaxedPool::new(params.etf_reinvestment);
    let mut personal_pool = GainsTaxedPool::new(params.personal_investment);

    for year in 1..=params.duration_years {
        if params.income_growth.applies_in(year) {
            income = params.income_growth.apply(income);
        }
        if params.investment_growth.applies_in(year) {
            investment = params.investment_growth.apply(investment);
        }

        let flow = ContributionFlow::for_year(params, income, investment);
        let deduction = records.last().map(prior_year_deduction).unwrap_or(0.0);
        cumulative_deduction += deduction;

        let prices = price_index(params.inflation_rate, year);
        let tfr = tfr_company.advance(flow.tfr, &records, income, prices);

        let tax_rate = withdrawal_tax_rate(year);
        pension_gross = accumulate_with_tfr(
            pension_gross,
            params.pension_fund_return_rate,
            flow.regular(),
            flow.tfr,
        );
        let pension_net = pension_gross * (1.0 - tax_rate / 100.0);

        let etf = etf_pool.advance(deduction, prices);

        let personal_irpef_rate = if personal_pool.is_enabled() {
            IRPEF_BRACKETS.effective_rate_or_zero(income)
        } else {
            0.0
        };
        let personal_contribution = flow.personal() * (1.0 - personal_irpef_rate / 100.0);
        let personal = personal_pool.advance(personal_contribution, prices);

        records.push(YearlyRecord {
            year,
            income,
            investment,
            employer_contribution: flow.employer,
            member_contribution: flow.member,
            tfr_accrual: flow.tfr,
            total_contributions: flow.total(),
            gross_accumulated_value: pension_gross,
            net_accumulated_value: pension_net,
            real_value: pension_gross / prices,
            net_real_value: pension_net / prices,
            tax_rate,
            total_fiscal_relaxation: deduction,
            cumulative_fiscal_relaxation: cumulative_deduction,
            tfr_taxation_rate: tfr.taxation_rate,
            tfr_gross_value: tfr.gross,
            tfr_net_value: tfr.net,
            tfr_net_real_value: tfr.net_real,
            etf_contribution: etf.contribution,
            etf_gross_value: etf.gross,
            etf_net_value: etf.net,
            etf_net_real_value: etf.net_real,
            personal_contribution: personal.contribution,
            personal_irpef_rate,
            personal_gross_value: personal.gross,
            personal_net_value: personal.net,
            personal_net_real_value: personal.net_real,
        });
    }

    records
}

fn annualized_return(final_value: f64, contributed: f64, years: u32) -> f64 {
    if contributed <= 0.0 || years == 0 {
        return 0.0;
    }
    let ratio = (final_value / contributed).max(0.0);
    (ratio.powf(1.0 / years as f64) - 1.0) * 100.0
}

fn summarize_side_stream(
    config: SideInvestment,
    contributed: f64,
    final_value: f64,
    final_prices: f64,
    years: u32,
) -> StreamSummary {
    if !config.enabled {
        return StreamSummary::default();
    }
    let net_final_value = net_after_gains_tax(final_value, contributed, config.tax_rate);
    StreamSummary {
        total_contributions: contributed,
        final_value,
        net_final_value,
        net_real_final_value: net_final_value / final_prices,
        annualized_return: annualized_return(net_final_value, contributed, years),
    }
}

fn summarize(params: &SimulationParameters, yearly_results: Vec<YearlyRecord>) -> SimulationResult {
    let years = params.duration_years;
    let final_prices = price_index(params.inflation_rate, years);

    let mut total_contributions = 0.0;
    let mut total_tfr = 0.0;
    let mut total_etf = 0.0;
    let mut total_personal = 0.0;
    for record in &yearly_results {
        total_contributions += record.total_contributions;
        total_tfr += record.tfr_accrual;
        total_etf += record.etf_contribution;
        total_personal += record.personal_contribution;
    }

    let (final_value, net_final_value, tfr_gross, tfr_net, etf_gross, personal_gross) =
        match yearly_results.last() {
            Some(last) => (
                last.gross_accumulated_value,
                last.net_accumulated_value,
                last.tfr_gross_value,
                last.tfr_net_value,
                last.etf_gross_value,
                last.personal_gross_value,
            ),
            None => (0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        };

    let total_return = final_value - total_contributions;
    let pension = PensionSummary {
        total_contributions,
        final_value,
        real_final_value: final_value / final_prices,
        net_final_value,
        net_real_final_value: net_final_value / final_prices,
        total_return,
        total_return_percent: if total_contributions > 0.0 {
            total_return / total_contributions * 100.0
        } else {
            0.0
        },
        annualized_return: annualized_return(final_value, total_contributions, years),
        net_annualized_return: annualized_return(net_final_value, total_contributions, years),
    };

    let tfr = StreamSummary {
        total_contributions: total_tfr,
        final_value: tfr_gross,
        net_final_value: tfr_net,
        net_real_final_value: tfr_net / final_prices,
        annualized_return: annualized_return(tfr_net, total_tfr, years),
    };

    let etf = summarize_side_stream(
        params.etf_reinvestment,
        total_etf,
        etf_gross,
        final_prices,
        years,
    );
    let personal = summarize_side_stream(
        params.personal_investment,
        total_personal,
        personal_gross,
        final_prices,
        years,
    );

    let comparison = compare(&pension, &tfr, &etf, &personal);

    SimulationResult {
        yearly_results,
        pension,
        tfr,
        etf,
        personal,
        comparison,
    }
}

fn compare(
    pension: &PensionSummary,
    tfr: &StreamSummary,
    etf: &StreamSummary,
    personal: &StreamSummary,
) -> Comparison {
    Comparison {
        net_difference: pension.net_final_value - tfr.net_final_value,
        real_difference: pension.net_real_final_value - tfr.net_real_final_value,
        advantage_percent: if tfr.net_final_value > 0.0 {
            (pension.net_final_value / tfr.net_final_value - 1.0) * 100.0
        } else {
            0.0
        },
        pension_with_etf_net: pension.net_final_value + etf.net_final_value,
        pension_with_etf_net_real: pension.net_real_final_value + etf.net_real_final_value,
        tfr_with_personal_net: tfr.net_final_value + personal.net_final_value,
        tfr_with_personal_net_real: tfr.net_real_final_value + personal.net_real_final_value,
    }
}
