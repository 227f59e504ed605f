use csv::{Terminator, WriterBuilder};

use super::types::{SimulationParameters, SimulationResult, YearlyRecord};

#[derive(Clone, Copy)]
enum Format {
    Integer,
    Money,
    Rate,
}

type Field = (&'static str, Format, fn(&YearlyRecord) -> f64);

const BASE_COLUMNS: &[Field] = &[
    ("Anno", Format::Integer, |r| r.year as f64),
    ("Reddito", Format::Money, |r| r.income),
    ("Investimento", Format::Money, |r| r.investment),
    ("Contributo Datore", Format::Money, |r| r.employer_contribution),
    ("Contributo Aderente", Format::Money, |r| r.member_contribution),
    ("TFR", Format::Money, |r| r.tfr_accrual),
    ("Contributi Totali", Format::Money, |r| r.total_contributions),
    ("Detrazione Totale", Format::Money, |r| r.total_fiscal_relaxation),
    ("Detrazione Cumulativa", Format::Money, |r| r.cumulative_fiscal_relaxation),
    ("Aliquota Fiscale (%)", Format::Rate, |r| r.tax_rate),
    ("Valore Accumulato (Lordo)", Format::Money, |r| r.gross_accumulated_value),
    ("Valore Accumulato (Netto)", Format::Money, |r| r.net_accumulated_value),
    ("Valore Reale (Lordo)", Format::Money, |r| r.real_value),
    ("Valore Reale (Netto)", Format::Money, |r| r.net_real_value),
    ("Aliquota TFR (%)", Format::Rate, |r| r.tfr_taxation_rate),
    ("TFR Azienda (Lordo)", Format::Money, |r| r.tfr_gross_value),
    ("TFR Azienda (Netto)", Format::Money, |r| r.tfr_net_value),
    ("TFR Azienda Reale (Netto)", Format::Money, |r| r.tfr_net_real_value),
];

const ETF_COLUMNS: &[Field] = &[
    ("Investimento ETF", Format::Money, |r| r.etf_contribution),
    ("ETF (Lordo)", Format::Money, |r| r.etf_gross_value),
    ("ETF (Netto)", Format::Money, |r| r.etf_net_value),
    ("ETF Reale (Netto)", Format::Money, |r| r.etf_net_real_value),
];

const PERSONAL_COLUMNS: &[Field] = &[
    ("Investimento Personale", Format::Money, |r| r.personal_contribution),
    ("Aliquota IRPEF (%)", Format::Rate, |r| r.personal_irpef_rate),
    ("Investimento Personale (Lordo)", Format::Money, |r| r.personal_gross_value),
    ("Investimento Personale (Netto)", Format::Money, |r| r.personal_net_value),
    ("Investimento Personale Reale (Netto)", Format::Money, |r| {
        r.personal_net_real_value
    }),
];

fn format_value(format: Format, value: f64) -> String {
    match format {
        Format::Integer => format!("{value:.0}"),
        Format::Money => format!("{value:.2}"),
        Format::Rate => format!("{value:.1}"),
    }
}

fn columns(include_etf: bool, include_personal: bool) -> Vec<Field> {
    let mut columns = BASE_COLUMNS.to_vec();
    if include_etf {
        columns.extend_from_slice(ETF_COLUMNS);
    }
    if include_personal {
        columns.extend_from_slice(PERSONAL_COLUMNS);
    }
    columns
}

/// Renders the yearly records as CSV: one header row, one row per year,
/// rows joined by `\n`. ETF and personal-investment columns are appended
/// only for streams that are enabled.
pub fn export_csv(
    records: &[YearlyRecord],
    include_etf: bool,
    include_personal: bool,
) -> Result<String, csv::Error> {
    let columns = columns(include_etf, include_personal);
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|(header, _, _)| *header))?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|(_, format, value)| format_value(*format, value(record))),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    let mut content = String::from_utf8_lossy(&bytes).into_owned();
    if content.ends_with('\n') {
        content.pop();
    }
    Ok(content)
}

pub fn export_result_csv(
    params: &SimulationParameters,
    result: &SimulationResult,
) -> Result<String, csv::Error> {
    export_csv(
        &result.yearly_results,
        params.etf_reinvestment.enabled,
        params.personal_investment.enabled,
    )
}
