//! Discounting of cash-flow series
//!
//! Periodic series (NPV, IRR, MIRR) are plain slices with the first flow at
//! period 0. Dated series (XNPV, XIRR) go through [`CashFlowSeries`], which
//! owns the shape and chronology checks.

use chrono::NaiveDate;

use crate::error::{CalcError, CalcResult};
use crate::solver::find_root;

/// Default starting estimate for IRR and XIRR
pub const DEFAULT_IRR_GUESS: f64 = 0.1;

/// Day-count basis for dated discounting (actual days / 365)
pub const DAYS_PER_YEAR: f64 = 365.0;

/// A single dated cash flow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedCashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Non-empty, chronologically ordered dated cash flows
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSeries {
    flows: Vec<DatedCashFlow>,
}

impl CashFlowSeries {
    /// Pair up parallel `values` and `dates`.
    ///
    /// Fails with `ShapeMismatch` on unequal lengths and `ChronologyViolation`
    /// when any date precedes the one before it. Equal dates are allowed.
    pub fn new(values: &[f64], dates: &[NaiveDate]) -> CalcResult<Self> {
        if values.len() != dates.len() {
            return Err(CalcError::ShapeMismatch {
                values: values.len(),
                dates: dates.len(),
            });
        }
        if dates.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(CalcError::ChronologyViolation);
        }
        if values.is_empty() {
            return Err(CalcError::domain("at least one cash flow is required"));
        }

        let flows = values
            .iter()
            .zip(dates)
            .map(|(&amount, &date)| DatedCashFlow { date, amount })
            .collect();

        Ok(Self { flows })
    }

    pub fn flows(&self) -> &[DatedCashFlow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Date every flow is discounted back to
    pub fn start_date(&self) -> NaiveDate {
        self.flows[0].date
    }

    /// Sum of each flow discounted by `(1+rate)^(days since start / 365)`
    pub fn present_value(&self, rate: f64) -> f64 {
        let start = self.start_date();
        self.flows
            .iter()
            .map(|flow| {
                let years = (flow.date - start).num_days() as f64 / DAYS_PER_YEAR;
                flow.amount / (1.0 + rate).powf(years)
            })
            .sum()
    }
}

/// Net present value of periodic flows, first flow undiscounted at period 0
pub fn net_present_value(rate: f64, values: &[f64]) -> f64 {
    values
        .iter()
        .enumerate()
        .map(|(t, &value)| value / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Rate at which the periodic NPV of `values` is zero
pub fn internal_rate_of_return(values: &[f64]) -> CalcResult<f64> {
    find_root(|rate| net_present_value(rate, values), DEFAULT_IRR_GUESS)
}

/// Modified IRR: inflows compounded at `reinvest_rate`, outflows discounted at
/// `finance_rate`, combined over `n - 1` periods.
pub fn modified_internal_rate_of_return(
    values: &[f64],
    finance_rate: f64,
    reinvest_rate: f64,
) -> CalcResult<f64> {
    if values.len() < 2 {
        return Err(CalcError::domain("MIRR requires at least two values"));
    }

    let inflows: Vec<f64> = values.iter().map(|&v| if v > 0.0 { v } else { 0.0 }).collect();
    let outflows: Vec<f64> = values.iter().map(|&v| if v < 0.0 { v } else { 0.0 }).collect();

    let numerator = net_present_value(reinvest_rate, &inflows).abs();
    let denominator = net_present_value(finance_rate, &outflows).abs();
    if numerator == 0.0 || denominator == 0.0 {
        return Err(CalcError::domain(
            "MIRR requires at least one positive and one negative value",
        ));
    }

    let periods = (values.len() - 1) as f64;
    Ok((numerator / denominator).powf(1.0 / periods) * (1.0 + reinvest_rate) - 1.0)
}

/// Net present value of irregularly dated flows
pub fn xnpv(rate: f64, values: &[f64], dates: &[NaiveDate]) -> CalcResult<f64> {
    let series = CashFlowSeries::new(values, dates)?;
    Ok(series.present_value(rate))
}

/// Rate at which the XNPV of the dated flows is zero
pub fn xirr(values: &[f64], dates: &[NaiveDate], guess: f64) -> CalcResult<f64> {
    let series = CashFlowSeries::new(values, dates)?;
    find_root(|rate| series.present_value(rate), guess)
}
