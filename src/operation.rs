//! Closed set of calculation operations
//!
//! Each [`Operation`] has a wire name, a declared [`Schema`] and a typed request
//! struct. [`Operation::parse`] validates raw JSON arguments against the schema,
//! deserializes them into a [`Request`] (applying defaults) and runs the domain
//! checks; [`Request::evaluate`] calls the formula.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::cashflows::{self, DEFAULT_IRR_GUESS};
use crate::error::{CalcError, CalcResult};
use crate::schedule::future_value_with_schedule;
use crate::tvm::{self, PaymentTiming, DEFAULT_RATE_GUESS};
use crate::validation::{
    require_mixed_signs, validate, Field, FieldKind, Schema, MIN_CASH_FLOWS,
};

const NUMBER: FieldKind = FieldKind::Number;
const TIMING: FieldKind = FieldKind::Timing;
const CASH_FLOWS: FieldKind = FieldKind::Numbers { min_items: MIN_CASH_FLOWS };

pub const FV_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("rate", NUMBER),
        Field::required("nper", NUMBER),
        Field::optional("pmt", NUMBER, "0"),
        Field::optional("pv", NUMBER, "0"),
        Field::optional("type", TIMING, "0"),
    ],
};

pub const PV_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("rate", NUMBER),
        Field::required("nper", NUMBER),
        Field::optional("pmt", NUMBER, "0"),
        Field::optional("fv", NUMBER, "0"),
        Field::optional("type", TIMING, "0"),
    ],
};

pub const PMT_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("rate", NUMBER),
        Field::required("nper", NUMBER),
        Field::required("pv", NUMBER),
        Field::optional("fv", NUMBER, "0"),
        Field::optional("type", TIMING, "0"),
    ],
};

pub const PPMT_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("rate", NUMBER),
        Field::required("per", NUMBER),
        Field::required("nper", NUMBER),
        Field::required("pv", NUMBER),
        Field::optional("fv", NUMBER, "0"),
        Field::optional("type", TIMING, "0"),
    ],
};

pub const NPER_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("rate", NUMBER),
        Field::required("pv", NUMBER),
        Field::optional("pmt", NUMBER, "0"),
        Field::optional("fv", NUMBER, "0"),
        Field::optional("type", TIMING, "0"),
    ],
};

pub const RATE_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("nper", NUMBER),
        Field::required("pv", NUMBER),
        Field::required("fv", NUMBER),
        Field::optional("pmt", NUMBER, "0"),
        Field::optional("type", TIMING, "0"),
        Field::optional("guess", NUMBER, "0.10"),
    ],
};

pub const NPV_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("rate", NUMBER),
        Field::required("values", CASH_FLOWS),
    ],
};

pub const IRR_SCHEMA: Schema = Schema {
    properties: &[Field::required("values", CASH_FLOWS)],
};

pub const MIRR_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("values", CASH_FLOWS),
        Field::required("finance_rate", NUMBER),
        Field::required("reinvest_rate", NUMBER),
    ],
};

pub const XNPV_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("rate", NUMBER),
        Field::required("values", CASH_FLOWS),
        Field::required("dates", FieldKind::Dates),
    ],
};

pub const XIRR_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("values", CASH_FLOWS),
        Field::required("dates", FieldKind::Dates),
        Field::optional("guess", NUMBER, "0.1"),
    ],
};

pub const FVSCHEDULE_SCHEMA: Schema = Schema {
    properties: &[
        Field::required("principal", NUMBER),
        Field::optional("rate_schedule", FieldKind::Numbers { min_items: 0 }, "[]"),
    ],
};

/// A calculation the service can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FutureValue,
    PresentValue,
    Payment,
    PrincipalPayment,
    PeriodsToMaturity,
    InterestRate,
    NetPresentValue,
    InternalRateOfReturn,
    ModifiedInternalRateOfReturn,
    Xnpv,
    Xirr,
    ScheduleFutureValue,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::FutureValue,
        Operation::PresentValue,
        Operation::Payment,
        Operation::PrincipalPayment,
        Operation::PeriodsToMaturity,
        Operation::InterestRate,
        Operation::NetPresentValue,
        Operation::InternalRateOfReturn,
        Operation::ModifiedInternalRateOfReturn,
        Operation::Xnpv,
        Operation::Xirr,
        Operation::ScheduleFutureValue,
    ];

    /// Method name used on the wire
    pub fn name(self) -> &'static str {
        match self {
            Operation::FutureValue => "fv",
            Operation::PresentValue => "pv",
            Operation::Payment => "pmt",
            Operation::PrincipalPayment => "ppmt",
            Operation::PeriodsToMaturity => "nper",
            Operation::InterestRate => "rate",
            Operation::NetPresentValue => "npv",
            Operation::InternalRateOfReturn => "irr",
            Operation::ModifiedInternalRateOfReturn => "mirr",
            Operation::Xnpv => "xnpv",
            Operation::Xirr => "xirr",
            Operation::ScheduleFutureValue => "fvschedule",
        }
    }

    /// Long-form alias accepted alongside [`Operation::name`]
    pub fn alias(self) -> &'static str {
        match self {
            Operation::FutureValue => "futureValue",
            Operation::PresentValue => "presentValue",
            Operation::Payment => "payment",
            Operation::PrincipalPayment => "principalPayment",
            Operation::PeriodsToMaturity => "periodsToMaturity",
            Operation::InterestRate => "interestRate",
            Operation::NetPresentValue => "netPresentValue",
            Operation::InternalRateOfReturn => "internalRateOfReturn",
            Operation::ModifiedInternalRateOfReturn => "modifiedInternalRateOfReturn",
            Operation::Xnpv => "xnpv",
            Operation::Xirr => "xirr",
            Operation::ScheduleFutureValue => "scheduleFutureValue",
        }
    }

    /// Short upper-case label used in messages and logs
    pub fn label(self) -> &'static str {
        match self {
            Operation::FutureValue => "FV",
            Operation::PresentValue => "PV",
            Operation::Payment => "PMT",
            Operation::PrincipalPayment => "PPMT",
            Operation::PeriodsToMaturity => "NPER",
            Operation::InterestRate => "RATE",
            Operation::NetPresentValue => "NPV",
            Operation::InternalRateOfReturn => "IRR",
            Operation::ModifiedInternalRateOfReturn => "MIRR",
            Operation::Xnpv => "XNPV",
            Operation::Xirr => "XIRR",
            Operation::ScheduleFutureValue => "FVSCHEDULE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name || op.alias() == name)
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            Operation::FutureValue => &FV_SCHEMA,
            Operation::PresentValue => &PV_SCHEMA,
            Operation::Payment => &PMT_SCHEMA,
            Operation::PrincipalPayment => &PPMT_SCHEMA,
            Operation::PeriodsToMaturity => &NPER_SCHEMA,
            Operation::InterestRate => &RATE_SCHEMA,
            Operation::NetPresentValue => &NPV_SCHEMA,
            Operation::InternalRateOfReturn => &IRR_SCHEMA,
            Operation::ModifiedInternalRateOfReturn => &MIRR_SCHEMA,
            Operation::Xnpv => &XNPV_SCHEMA,
            Operation::Xirr => &XIRR_SCHEMA,
            Operation::ScheduleFutureValue => &FVSCHEDULE_SCHEMA,
        }
    }

    /// Whether the operation reads a dated cash-flow series
    pub fn uses_dates(self) -> bool {
        matches!(self, Operation::Xnpv | Operation::Xirr)
    }

    /// Whether the operation reads a `values` cash-flow array
    pub fn uses_values(self) -> bool {
        self.schema().properties.iter().any(|field| field.name == "values")
    }

    /// Validate raw arguments and build the typed request
    pub fn parse(self, arguments: &Value) -> CalcResult<Request> {
        validate(arguments, self.schema()).into_result()?;

        let request = match self {
            Operation::FutureValue => Request::FutureValue(from_arguments(arguments)?),
            Operation::PresentValue => Request::PresentValue(from_arguments(arguments)?),
            Operation::Payment => Request::Payment(from_arguments(arguments)?),
            Operation::PrincipalPayment => Request::PrincipalPayment(from_arguments(arguments)?),
            Operation::PeriodsToMaturity => Request::PeriodsToMaturity(from_arguments(arguments)?),
            Operation::InterestRate => Request::InterestRate(from_arguments(arguments)?),
            Operation::NetPresentValue => Request::NetPresentValue(from_arguments(arguments)?),
            Operation::InternalRateOfReturn => {
                let request: IrrRequest = from_arguments(arguments)?;
                require_mixed_signs(self.label(), &request.values)?;
                Request::InternalRateOfReturn(request)
            }
            Operation::ModifiedInternalRateOfReturn => {
                let request: MirrRequest = from_arguments(arguments)?;
                require_mixed_signs(self.label(), &request.values)?;
                Request::ModifiedInternalRateOfReturn(request)
            }
            Operation::Xnpv => Request::Xnpv(from_arguments(arguments)?),
            Operation::Xirr => Request::Xirr(from_arguments(arguments)?),
            Operation::ScheduleFutureValue => {
                Request::ScheduleFutureValue(from_arguments(arguments)?)
            }
        };

        Ok(request)
    }

    /// Parse and evaluate in one step
    pub fn evaluate(self, arguments: &Value) -> CalcResult<f64> {
        self.parse(arguments)?.evaluate()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::from_name(s).ok_or_else(|| format!("Invalid method: {}", s))
    }
}

fn from_arguments<T: DeserializeOwned>(arguments: &Value) -> CalcResult<T> {
    T::deserialize(arguments).map_err(|e| CalcError::Validation(e.to_string()))
}

fn default_rate_guess() -> f64 { DEFAULT_RATE_GUESS }
fn default_irr_guess() -> f64 { DEFAULT_IRR_GUESS }

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FutureValueRequest {
    pub rate: f64,
    pub nper: f64,
    #[serde(default)]
    pub pmt: f64,
    #[serde(default)]
    pub pv: f64,
    #[serde(default, rename = "type")]
    pub timing: PaymentTiming,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PresentValueRequest {
    pub rate: f64,
    pub nper: f64,
    #[serde(default)]
    pub pmt: f64,
    #[serde(default)]
    pub fv: f64,
    #[serde(default, rename = "type")]
    pub timing: PaymentTiming,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentRequest {
    pub rate: f64,
    pub nper: f64,
    pub pv: f64,
    #[serde(default)]
    pub fv: f64,
    #[serde(default, rename = "type")]
    pub timing: PaymentTiming,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrincipalPaymentRequest {
    pub rate: f64,
    pub per: f64,
    pub nper: f64,
    pub pv: f64,
    #[serde(default)]
    pub fv: f64,
    #[serde(default, rename = "type")]
    pub timing: PaymentTiming,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeriodsToMaturityRequest {
    pub rate: f64,
    pub pv: f64,
    #[serde(default)]
    pub pmt: f64,
    #[serde(default)]
    pub fv: f64,
    #[serde(default, rename = "type")]
    pub timing: PaymentTiming,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterestRateRequest {
    pub nper: f64,
    pub pv: f64,
    pub fv: f64,
    #[serde(default)]
    pub pmt: f64,
    #[serde(default, rename = "type")]
    pub timing: PaymentTiming,
    #[serde(default = "default_rate_guess")]
    pub guess: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NpvRequest {
    pub rate: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IrrRequest {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MirrRequest {
    pub values: Vec<f64>,
    pub finance_rate: f64,
    pub reinvest_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct XnpvRequest {
    pub rate: f64,
    pub values: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct XirrRequest {
    pub values: Vec<f64>,
    pub dates: Vec<NaiveDate>,
    #[serde(default = "default_irr_guess")]
    pub guess: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleFutureValueRequest {
    pub principal: f64,
    #[serde(default)]
    pub rate_schedule: Vec<f64>,
}

/// A validated, typed request for one operation
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    FutureValue(FutureValueRequest),
    PresentValue(PresentValueRequest),
    Payment(PaymentRequest),
    PrincipalPayment(PrincipalPaymentRequest),
    PeriodsToMaturity(PeriodsToMaturityRequest),
    InterestRate(InterestRateRequest),
    NetPresentValue(NpvRequest),
    InternalRateOfReturn(IrrRequest),
    ModifiedInternalRateOfReturn(MirrRequest),
    Xnpv(XnpvRequest),
    Xirr(XirrRequest),
    ScheduleFutureValue(ScheduleFutureValueRequest),
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::FutureValue(_) => Operation::FutureValue,
            Request::PresentValue(_) => Operation::PresentValue,
            Request::Payment(_) => Operation::Payment,
            Request::PrincipalPayment(_) => Operation::PrincipalPayment,
            Request::PeriodsToMaturity(_) => Operation::PeriodsToMaturity,
            Request::InterestRate(_) => Operation::InterestRate,
            Request::NetPresentValue(_) => Operation::NetPresentValue,
            Request::InternalRateOfReturn(_) => Operation::InternalRateOfReturn,
            Request::ModifiedInternalRateOfReturn(_) => Operation::ModifiedInternalRateOfReturn,
            Request::Xnpv(_) => Operation::Xnpv,
            Request::Xirr(_) => Operation::Xirr,
            Request::ScheduleFutureValue(_) => Operation::ScheduleFutureValue,
        }
    }

    /// Run the formula. A non-finite result is reported as a domain error.
    pub fn evaluate(&self) -> CalcResult<f64> {
        let value = match self {
            Request::FutureValue(r) => tvm::future_value(r.rate, r.nper, r.pmt, r.pv, r.timing),
            Request::PresentValue(r) => tvm::present_value(r.rate, r.nper, r.pmt, r.fv, r.timing),
            Request::Payment(r) => tvm::payment(r.rate, r.nper, r.pv, r.fv, r.timing),
            Request::PrincipalPayment(r) => {
                tvm::principal_payment(r.rate, r.per, r.nper, r.pv, r.fv, r.timing)?
            }
            Request::PeriodsToMaturity(r) => {
                tvm::periods_to_maturity(r.rate, r.pmt, r.pv, r.fv, r.timing)?
            }
            Request::InterestRate(r) => {
                tvm::interest_rate(r.nper, r.pmt, r.pv, r.fv, r.timing, r.guess)?
            }
            Request::NetPresentValue(r) => cashflows::net_present_value(r.rate, &r.values),
            Request::InternalRateOfReturn(r) => cashflows::internal_rate_of_return(&r.values)?,
            Request::ModifiedInternalRateOfReturn(r) => {
                cashflows::modified_internal_rate_of_return(&r.values, r.finance_rate, r.reinvest_rate)?
            }
            Request::Xnpv(r) => cashflows::xnpv(r.rate, &r.values, &r.dates)?,
            Request::Xirr(r) => cashflows::xirr(&r.values, &r.dates, r.guess)?,
            Request::ScheduleFutureValue(r) => future_value_with_schedule(r.principal, &r.rate_schedule),
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(CalcError::DomainPrecondition(format!(
                "{} has no finite result for the given arguments",
                self.operation().label()
            )))
        }
    }
}
