use super::types::YearlyRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub threshold: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct BracketTable<'a> {
    brackets: &'a [Bracket],
}

pub const IRPEF_BRACKETS: BracketTable<'static> = BracketTable {
    brackets: &[
        Bracket {
            threshold: 0.0,
            rate: 23.0,
        },
        Bracket {
            threshold: 28_000.0,
            rate: 35.0,
        },
        Bracket {
            threshold: 50_000.0,
            rate: 43.0,
        },
    ],
};

/// Years of income averaged when estimating the TFR taxation rate.
pub const TFR_RATE_WINDOW_YEARS: usize = 5;

impl<'a> BracketTable<'a> {
    pub const fn new(brackets: &'a [Bracket]) -> Self {
        Self { brackets }
    }

    fn upper_bound(&self, index: usize) -> f64 {
        self.brackets
            .get(index + 1)
            .map(|b| b.threshold)
            .unwrap_or(f64::INFINITY)
    }

    /// Tax saved by deducting `amount` from `reference_income`. The amount is
    /// taken out of the highest band the income reaches first, then each lower
    /// band in turn; the lowest band absorbs whatever is left.
    pub fn deduction_amount(&self, amount: f64, reference_income: f64) -> f64 {
        if self.brackets.is_empty() {
            return 0.0;
        }

        let top = self
            .brackets
            .iter()
            .rposition(|b| reference_income > b.threshold)
            .unwrap_or(0);

        let mut remaining = amount.max(0.0);
        let mut deduction = 0.0;
        for index in (0..=top).rev() {
            if remaining <= 0.0 {
                break;
            }
            let bracket = self.brackets[index];
            let capacity = if index == 0 {
                f64::INFINITY
            } else if index == top {
                reference_income - bracket.threshold
            } else {
                self.upper_bound(index) - bracket.threshold
            };
            let slice = remaining.min(capacity);
            deduction += slice * bracket.rate / 100.0;
            remaining -= slice;
        }
        deduction
    }

    // Zero income divides by zero; public callers go through `effective_rate_or_zero`.
    pub(crate) fn effective_rate(&self, reference_income: f64) -> f64 {
        debug_assert!(reference_income > 0.0, "effective rate needs positive income");
        self.brackets
            .iter()
            .enumerate()
            .map(|(index, bracket)| {
                let band_width = self.upper_bound(index) - bracket.threshold;
                let portion = (reference_income - bracket.threshold).clamp(0.0, band_width);
                portion / reference_income * bracket.rate
            })
            .sum()
    }

    pub fn effective_rate_or_zero(&self, reference_income: f64) -> f64 {
        if reference_income > 0.0 {
            self.effective_rate(reference_income)
        } else {
            0.0
        }
    }

    /// Reference rate for taxing severance left in the company: the mean
    /// effective rate over the current year and up to four prior years.
    pub fn tfr_taxation_rate(&self, history: &[YearlyRecord], current_income: f64) -> f64 {
        let prior = history.len().min(TFR_RATE_WINDOW_YEARS - 1);
        let samples = history[history.len() - prior..]
            .iter()
            .map(|record| record.income)
            .chain(std::iter::once(current_income));

        let mut total = 0.0;
        let mut count = 0_usize;
        for income in samples {
            total += self.effective_rate_or_zero(income);
            count += 1;
        }
        total / count as f64
    }
}
