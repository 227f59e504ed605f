pub const MONTHS_PER_YEAR: u32 = 12;

/// TFR is paid as thirteen monthly portions; the thirteenth lands with the
/// twelfth in the last month of the year.
const TFR_PORTIONS: f64 = 13.0;

fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 100.0 / MONTHS_PER_YEAR as f64
}

pub fn accumulate_uniform(start_balance: f64, annual_rate: f64, yearly_contribution: f64) -> f64 {
    let rate = monthly_rate(annual_rate);
    let instalment = yearly_contribution / MONTHS_PER_YEAR as f64;
    let mut balance = start_balance;
    for _ in 0..MONTHS_PER_YEAR {
        balance = balance * (1.0 + rate) + instalment;
    }
    balance
}

/// One year of the pension fund: regular contributions in twelve instalments,
/// TFR in thirteen portions with two of them paid in month twelve.
pub fn accumulate_with_tfr(
    start_balance: f64,
    annual_rate: f64,
    yearly_contribution: f64,
    yearly_tfr: f64,
) -> f64 {
    let rate = monthly_rate(annual_rate);
    let instalment = yearly_contribution / MONTHS_PER_YEAR as f64;
    let tfr_portion = yearly_tfr / TFR_PORTIONS;
    let mut balance = start_balance;
    for month in 1..=MONTHS_PER_YEAR {
        let tfr_paid = if month == MONTHS_PER_YEAR {
            2.0 * tfr_portion
        } else {
            tfr_portion
        };
        balance = balance * (1.0 + rate) + instalment + tfr_paid;
    }
    balance
}
