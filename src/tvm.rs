//! Time-value-of-money formulas for a level annuity
//!
//! Sign convention: money paid out is negative, money received is positive.
//! Every formula falls back to its linear zero-interest form when `rate == 0`.

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};
use crate::solver::find_root;

/// Default starting estimate for [`interest_rate`]
pub const DEFAULT_RATE_GUESS: f64 = 0.10;

/// When payments fall within each period (the `type` argument)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum PaymentTiming {
    /// Ordinary annuity, `type = 0`
    #[default]
    End,
    /// Annuity due, `type = 1`
    Begin,
}

impl PaymentTiming {
    pub fn as_f64(self) -> f64 {
        match self {
            PaymentTiming::End => 0.0,
            PaymentTiming::Begin => 1.0,
        }
    }
}

impl TryFrom<f64> for PaymentTiming {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 0.0 {
            Ok(PaymentTiming::End)
        } else if value == 1.0 {
            Ok(PaymentTiming::Begin)
        } else {
            Err(format!("{} is not one of [0, 1]", value))
        }
    }
}

impl From<PaymentTiming> for f64 {
    fn from(timing: PaymentTiming) -> f64 {
        timing.as_f64()
    }
}

/// `(1 + r*type) * ((1+r)^n - 1) / r`, the payment accumulation factor
fn annuity_factor(rate: f64, growth: f64, timing: PaymentTiming) -> f64 {
    (1.0 + rate * timing.as_f64()) * (growth - 1.0) / rate
}

/// Future value of a present amount plus a level payment stream
pub fn future_value(rate: f64, nper: f64, pmt: f64, pv: f64, timing: PaymentTiming) -> f64 {
    if rate == 0.0 {
        return -(pv + pmt * nper);
    }

    let growth = (1.0 + rate).powf(nper);
    -(pv * growth + pmt * annuity_factor(rate, growth, timing))
}

/// Present value of a future amount plus a level payment stream
pub fn present_value(rate: f64, nper: f64, pmt: f64, fv: f64, timing: PaymentTiming) -> f64 {
    if rate == 0.0 {
        return -(fv + pmt * nper);
    }

    let growth = (1.0 + rate).powf(nper);
    -(fv + pmt * annuity_factor(rate, growth, timing)) / growth
}

/// Level payment that amortizes `pv` down to `fv` over `nper` periods
pub fn payment(rate: f64, nper: f64, pv: f64, fv: f64, timing: PaymentTiming) -> f64 {
    if rate == 0.0 {
        return -(fv + pv) / nper;
    }

    let growth = (1.0 + rate).powf(nper);
    -(fv + pv * growth) / annuity_factor(rate, growth, timing)
}

/// Interest portion of the payment made in period `per` (1-indexed).
///
/// The interest accrues on the balance left after `per - 1` payments. For an
/// annuity due it is discounted one period, and it is zero in the first period
/// because that payment is made before any interest accrues.
pub fn interest_payment(
    rate: f64,
    per: f64,
    nper: f64,
    pv: f64,
    fv: f64,
    timing: PaymentTiming,
) -> f64 {
    if timing == PaymentTiming::Begin && per == 1.0 {
        return 0.0;
    }

    let total = payment(rate, nper, pv, fv, timing);
    let balance = future_value(rate, per - 1.0, total, pv, timing);
    let interest = balance * rate;

    match timing {
        PaymentTiming::End => interest,
        PaymentTiming::Begin => interest / (1.0 + rate),
    }
}

/// Principal portion of the payment made in period `per`, `1 <= per <= nper`
pub fn principal_payment(
    rate: f64,
    per: f64,
    nper: f64,
    pv: f64,
    fv: f64,
    timing: PaymentTiming,
) -> CalcResult<f64> {
    if per < 1.0 || per > nper {
        return Err(CalcError::domain(format!(
            "PPMT requires 1 <= per <= nper (got per={}, nper={})",
            per, nper
        )));
    }

    let total = payment(rate, nper, pv, fv, timing);
    Ok(total - interest_payment(rate, per, nper, pv, fv, timing))
}

/// Number of periods needed to move from `pv` to `fv` with payment `pmt`
pub fn periods_to_maturity(
    rate: f64,
    pmt: f64,
    pv: f64,
    fv: f64,
    timing: PaymentTiming,
) -> CalcResult<f64> {
    if rate == 0.0 {
        if pmt == 0.0 {
            return Err(CalcError::domain(
                "NPER is undefined when both rate and pmt are zero",
            ));
        }
        return Ok(-(fv + pv) / pmt);
    }

    if rate <= -1.0 {
        return Err(CalcError::domain("NPER requires rate > -1"));
    }

    let z = pmt * (1.0 + rate * timing.as_f64()) / rate;
    let ratio = (z - fv) / (pv + z);
    if !(ratio > 0.0) || !ratio.is_finite() {
        return Err(CalcError::domain(
            "NPER has no solution for the given rate, pmt, pv and fv",
        ));
    }

    Ok(ratio.ln() / rate.ln_1p())
}

/// Per-period rate solving the annuity identity
///
/// `pv*(1+r)^n + pmt*(1+r*type)*((1+r)^n - 1)/r + fv = 0`
pub fn interest_rate(
    nper: f64,
    pmt: f64,
    pv: f64,
    fv: f64,
    timing: PaymentTiming,
    guess: f64,
) -> CalcResult<f64> {
    let annuity_identity = |r: f64| {
        if r == 0.0 {
            return pv + pmt * nper + fv;
        }
        let growth = (1.0 + r).powf(nper);
        pv * growth + pmt * annuity_factor(r, growth, timing) + fv
    };

    find_root(annuity_identity, guess)
}
