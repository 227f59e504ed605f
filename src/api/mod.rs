use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    GrowthRule, SideInvestment, SimulationParameters, SimulationResult, export_result_csv,
    run_projection, validate_parameters,
};

const CSV_FILENAME: &str = "simulazione-fondo-pensione.csv";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliGrowthMode {
    Percent,
    Amount,
}

impl CliGrowthMode {
    fn is_percentage(self) -> bool {
        matches!(self, CliGrowthMode::Percent)
    }
}

impl From<bool> for CliGrowthMode {
    fn from(is_percentage: bool) -> Self {
        if is_percentage {
            CliGrowthMode::Percent
        } else {
            CliGrowthMode::Amount
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliOutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    #[serde(alias = "duration")]
    duration_years: Option<u32>,
    annual_income: Option<f64>,
    #[serde(alias = "investment")]
    annual_investment: Option<f64>,
    #[serde(alias = "calculateTfr")]
    include_tfr: Option<bool>,
    #[serde(alias = "employerContribution")]
    employer_contribution_rate: Option<f64>,
    #[serde(alias = "memberContribution")]
    member_contribution_rate: Option<f64>,
    #[serde(alias = "inflation")]
    inflation_rate: Option<f64>,
    #[serde(alias = "pensionFundReturn")]
    pension_fund_return_rate: Option<f64>,

    income_growth_amount: Option<f64>,
    income_growth_frequency: Option<u32>,
    income_growth_is_percentage: Option<bool>,
    investment_growth_amount: Option<f64>,
    investment_growth_frequency: Option<u32>,
    investment_growth_is_percentage: Option<bool>,

    etf_enabled: Option<bool>,
    etf_return_rate: Option<f64>,
    etf_tax_rate: Option<f64>,
    personal_enabled: Option<bool>,
    personal_return_rate: Option<f64>,
    personal_tax_rate: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "tfr-projection",
    about = "Projects a pension fund against TFR left in the company, with optional ETF and personal investment alternatives"
)]
struct Cli {
    #[arg(long, default_value_t = 30, help = "Number of simulated years")]
    duration: u32,
    #[arg(long, default_value_t = 30_000.0, help = "Gross income in year 1")]
    annual_income: f64,
    #[arg(
        long,
        default_value_t = 3_000.0,
        help = "Voluntary pension contribution in year 1"
    )]
    annual_investment: f64,
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Simulate TFR, employer and member contributions"
    )]
    include_tfr: bool,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Employer contribution in percent of income"
    )]
    employer_contribution_rate: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Member contribution in percent of income"
    )]
    member_contribution_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected annual pension fund return in percent"
    )]
    pension_fund_return_rate: f64,
    #[arg(long, default_value_t = 10.0, help = "Income step-up amount")]
    income_growth_amount: f64,
    #[arg(long, default_value_t = 3, help = "Years between income step-ups")]
    income_growth_frequency: u32,
    #[arg(long, value_enum, default_value_t = CliGrowthMode::Percent)]
    income_growth_mode: CliGrowthMode,
    #[arg(long, default_value_t = 10.0, help = "Investment step-up amount")]
    investment_growth_amount: f64,
    #[arg(
        long,
        default_value_t = 5,
        help = "Years between investment step-ups"
    )]
    investment_growth_frequency: u32,
    #[arg(long, value_enum, default_value_t = CliGrowthMode::Percent)]
    investment_growth_mode: CliGrowthMode,
    #[arg(
        long,
        default_value_t = false,
        action = ArgAction::Set,
        help = "Reinvest each year's deduction in an ETF"
    )]
    etf_reinvestment: bool,
    #[arg(long, default_value_t = 7.0, help = "ETF annual return in percent")]
    etf_return_rate: f64,
    #[arg(
        long,
        default_value_t = 26.0,
        help = "Tax on ETF gains in percent"
    )]
    etf_tax_rate: f64,
    #[arg(
        long,
        default_value_t = false,
        action = ArgAction::Set,
        help = "Invest after-IRPEF personal contributions instead"
    )]
    personal_investment: bool,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Personal investment annual return in percent"
    )]
    personal_return_rate: f64,
    #[arg(
        long,
        default_value_t = 26.0,
        help = "Tax on personal investment gains in percent"
    )]
    personal_tax_rate: f64,
    #[arg(long, value_enum, default_value_t = CliOutputFormat::Json)]
    format: CliOutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    parameters: SimulationParameters,
    #[serde(flatten)]
    result: SimulationResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_params(cli: &Cli) -> Result<SimulationParameters, String> {
    let params = SimulationParameters {
        duration_years: cli.duration,
        annual_income: cli.annual_income,
        annual_investment: cli.annual_investment,
        include_tfr: cli.include_tfr,
        employer_contribution_rate: cli.employer_contribution_rate,
        member_contribution_rate: cli.member_contribution_rate,
        inflation_rate: cli.inflation_rate,
        pension_fund_return_rate: cli.pension_fund_return_rate,
        income_growth: GrowthRule {
            amount: cli.income_growth_amount,
            frequency_years: cli.income_growth_frequency,
            is_percentage: cli.income_growth_mode.is_percentage(),
        },
        investment_growth: GrowthRule {
            amount: cli.investment_growth_amount,
            frequency_years: cli.investment_growth_frequency,
            is_percentage: cli.investment_growth_mode.is_percentage(),
        },
        etf_reinvestment: SideInvestment {
            enabled: cli.etf_reinvestment,
            annual_return_rate: cli.etf_return_rate,
            tax_rate: cli.etf_tax_rate,
        },
        personal_investment: SideInvestment {
            enabled: cli.personal_investment,
            annual_return_rate: cli.personal_return_rate,
            tax_rate: cli.personal_tax_rate,
        },
    };

    validate_parameters(&params).map_err(|e| e.to_string())?;
    Ok(params)
}

fn render(cli: &Cli) -> Result<String, String> {
    let params = build_params(cli)?;
    let result = run_projection(&params);
    match cli.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&SimulateResponse {
            parameters: params,
            result,
        })
        .map_err(|e| format!("Failed to serialize result: {e}")),
        CliOutputFormat::Csv => {
            export_result_csv(&params, &result).map_err(|e| format!("Failed to write CSV: {e}"))
        }
    }
}

pub fn run_cli() -> Result<String, String> {
    render(&Cli::parse())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/export",
            get(export_get_handler).post(export_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "pension projection API listening");
    info!("Local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn export_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    export_handler_impl(payload).await
}

async fn export_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    export_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return rejected(msg),
    };
    let result = run_projection(&params);
    json_response(
        StatusCode::OK,
        SimulateResponse {
            parameters: params,
            result,
        },
    )
}

async fn export_handler_impl(payload: SimulatePayload) -> Response {
    let params = match params_from_payload(payload) {
        Ok(params) => params,
        Err(msg) => return rejected(msg),
    };
    let result = run_projection(&params);
    match export_result_csv(&params, &result) {
        Ok(csv) => with_cache_control((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{CSV_FILENAME}\""),
                ),
            ],
            csv,
        )),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to write CSV: {e}"),
        ),
    }
}

fn rejected(msg: String) -> Response {
    warn!(error = %msg, "rejected simulation request");
    error_response(StatusCode::BAD_REQUEST, &msg)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn params_from_json(json: &str) -> Result<SimulationParameters, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    params_from_payload(payload)
}

fn params_from_payload(payload: SimulatePayload) -> Result<SimulationParameters, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.duration_years {
        cli.duration = v;
    }
    if let Some(v) = payload.annual_income {
        cli.annual_income = v;
    }
    if let Some(v) = payload.annual_investment {
        cli.annual_investment = v;
    }
    if let Some(v) = payload.include_tfr {
        cli.include_tfr = v;
    }
    if let Some(v) = payload.employer_contribution_rate {
        cli.employer_contribution_rate = v;
    }
    if let Some(v) = payload.member_contribution_rate {
        cli.member_contribution_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.pension_fund_return_rate {
        cli.pension_fund_return_rate = v;
    }

    if let Some(v) = payload.income_growth_amount {
        cli.income_growth_amount = v;
    }
    if let Some(v) = payload.income_growth_frequency {
        cli.income_growth_frequency = v;
    }
    if let Some(v) = payload.income_growth_is_percentage {
        cli.income_growth_mode = v.into();
    }
    if let Some(v) = payload.investment_growth_amount {
        cli.investment_growth_amount = v;
    }
    if let Some(v) = payload.investment_growth_frequency {
        cli.investment_growth_frequency = v;
    }
    if let Some(v) = payload.investment_growth_is_percentage {
        cli.investment_growth_mode = v.into();
    }

    if let Some(v) = payload.etf_enabled {
        cli.etf_reinvestment = v;
    }
    if let Some(v) = payload.etf_return_rate {
        cli.etf_return_rate = v;
    }
    if let Some(v) = payload.etf_tax_rate {
        cli.etf_tax_rate = v;
    }
    if let Some(v) = payload.personal_enabled {
        cli.personal_investment = v;
    }
    if let Some(v) = payload.personal_return_rate {
        cli.personal_return_rate = v;
    }
    if let Some(v) = payload.personal_tax_rate {
        cli.personal_tax_rate = v;
    }

    build_params(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        duration: 30,
        annual_income: 30_000.0,
        annual_investment: 3_000.0,
        include_tfr: true,
        employer_contribution_rate: 1.5,
        member_contribution_rate: 1.0,
        inflation_rate: 2.0,
        pension_fund_return_rate: 5.0,
        income_growth_amount: 10.0,
        income_growth_frequency: 3,
        income_growth_mode: CliGrowthMode::Percent,
        investment_growth_amount: 10.0,
        investment_growth_frequency: 5,
        investment_growth_mode: CliGrowthMode::Percent,
        etf_reinvestment: false,
        etf_return_rate: 7.0,
        etf_tax_rate: 26.0,
        personal_investment: false,
        personal_return_rate: 7.0,
        personal_tax_rate: 26.0,
        format: CliOutputFormat::Json,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::simulate;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn clap_defaults_match_api_defaults() {
        let parsed = Cli::try_parse_from(["tfr-projection"]).expect("defaults parse");
        let from_flags = build_params(&parsed).expect("valid defaults");
        let from_api = build_params(&sample_cli()).expect("valid defaults");
        assert_eq!(from_flags, from_api);
        assert_eq!(parsed.format, CliOutputFormat::Json);
    }

    #[test]
    fn cli_flags_override_defaults() {
        let parsed = Cli::try_parse_from([
            "tfr-projection",
            "--duration",
            "12",
            "--include-tfr",
            "false",
            "--income-growth-mode",
            "amount",
            "--income-growth-amount",
            "1500",
            "--etf-reinvestment",
            "true",
            "--format",
            "csv",
        ])
        .expect("flags parse");
        let params = build_params(&parsed).expect("valid params");

        assert_eq!(params.duration_years, 12);
        assert!(!params.include_tfr);
        assert!(!params.income_growth.is_percentage);
        assert_approx(params.income_growth.amount, 1_500.0);
        assert!(params.etf_reinvestment.enabled);
        assert!(!params.personal_investment.enabled);
        assert_eq!(parsed.format, CliOutputFormat::Csv);
    }

    #[test]
    fn build_params_rejects_zero_frequency() {
        let mut cli = sample_cli();
        cli.income_growth_frequency = 0;
        let err = build_params(&cli).expect_err("must reject zero frequency");
        assert!(err.contains("incomeGrowth"));
    }

    #[test]
    fn build_params_rejects_zero_duration() {
        let mut cli = sample_cli();
        cli.duration = 0;
        let err = build_params(&cli).expect_err("must reject zero duration");
        assert!(err.contains("durationYears"));
    }

    #[test]
    fn params_from_json_parses_web_keys() {
        let json = r#"{
          "durationYears": 25,
          "annualIncome": 42000,
          "annualInvestment": 2500,
          "includeTfr": true,
          "employerContributionRate": 2,
          "memberContributionRate": 1.2,
          "inflationRate": 2.5,
          "pensionFundReturnRate": 4,
          "incomeGrowthAmount": 1000,
          "incomeGrowthFrequency": 2,
          "incomeGrowthIsPercentage": false,
          "etfEnabled": true,
          "etfReturnRate": 6,
          "etfTaxRate": 26,
          "personalEnabled": true,
          "personalTaxRate": 12.5
        }"#;
        let params = params_from_json(json).expect("json should parse");

        assert_eq!(params.duration_years, 25);
        assert_approx(params.annual_income, 42_000.0);
        assert_approx(params.annual_investment, 2_500.0);
        assert_approx(params.employer_contribution_rate, 2.0);
        assert_approx(params.member_contribution_rate, 1.2);
        assert_approx(params.inflation_rate, 2.5);
        assert_approx(params.pension_fund_return_rate, 4.0);
        assert_eq!(
            params.income_growth,
            GrowthRule {
                amount: 1_000.0,
                frequency_years: 2,
                is_percentage: false,
            }
        );
        assert_eq!(params.investment_growth.frequency_years, 5);
        assert!(params.etf_reinvestment.enabled);
        assert_approx(params.etf_reinvestment.annual_return_rate, 6.0);
        assert!(params.personal_investment.enabled);
        assert_approx(params.personal_investment.tax_rate, 12.5);
        assert_approx(params.personal_investment.annual_return_rate, 7.0);
    }

    #[test]
    fn params_from_json_accepts_calculator_aliases() {
        let json = r#"{
          "duration": 10,
          "investment": 1200,
          "calculateTfr": false,
          "employerContribution": 3,
          "inflation": 1.5,
          "pensionFundReturn": 6
        }"#;
        let params = params_from_json(json).expect("json should parse");
        assert_eq!(params.duration_years, 10);
        assert_approx(params.annual_investment, 1_200.0);
        assert!(!params.include_tfr);
        assert_approx(params.employer_contribution_rate, 3.0);
        assert_approx(params.inflation_rate, 1.5);
        assert_approx(params.pension_fund_return_rate, 6.0);
    }

    #[test]
    fn params_from_json_reports_validation_failures() {
        let err = params_from_json(r#"{ "etfEnabled": true, "etfTaxRate": 150 }"#)
            .expect_err("tax rate above 100 must be rejected");
        assert!(err.contains("etfReinvestment"));

        let err = params_from_json(r#"{ "durationYears": "ten" }"#).expect_err("bad type");
        assert!(err.starts_with("Invalid API JSON payload"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let mut cli = sample_cli();
        cli.duration = 3;
        cli.etf_reinvestment = true;
        let params = build_params(&cli).expect("valid params");
        let result = simulate(&params).expect("valid params");
        let json = serde_json::to_string(&SimulateResponse {
            parameters: params,
            result,
        })
        .expect("response should serialize");

        for key in [
            "\"parameters\"",
            "\"durationYears\"",
            "\"yearlyResults\"",
            "\"pension\"",
            "\"tfr\"",
            "\"etf\"",
            "\"personal\"",
            "\"comparison\"",
            "\"netAccumulatedValue\"",
            "\"totalFiscalRelaxation\"",
            "\"tfrNetRealValue\"",
            "\"advantagePercent\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn render_csv_includes_enabled_stream_columns() {
        let mut cli = sample_cli();
        cli.duration = 2;
        cli.personal_investment = true;
        cli.format = CliOutputFormat::Csv;
        let csv = render(&cli).expect("csv output");
        let header = csv.lines().next().expect("header row");
        assert!(header.starts_with("Anno,"));
        assert!(header.contains("Investimento Personale"));
        assert!(!header.contains("ETF"));
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn render_json_is_parseable() {
        let mut cli = sample_cli();
        cli.duration = 5;
        let json = render(&cli).expect("json output");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(
            value["yearlyResults"].as_array().map(|rows| rows.len()),
            Some(5)
        );
        assert_eq!(value["parameters"]["durationYears"], 5);
    }
}
