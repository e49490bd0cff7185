//! Request/response boundary shared by the Lambda, CLI and batch hosts
//!
//! Every outcome, including validation and domain failures, comes back as an
//! [`Envelope`]: `{"result": x}` or `{"error": "..."}`.

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CalcResult;
use crate::operation::Operation;

pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required argument(s). Event must contain fields for 'method' and 'arguments'";

/// Uniform result/error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Success { result: f64 },
    Failure { error: String },
}

impl Envelope {
    pub fn failure(message: impl Into<String>) -> Self {
        Envelope::Failure { error: message.into() }
    }

    pub fn result(&self) -> Option<f64> {
        match self {
            Envelope::Success { result } => Some(*result),
            Envelope::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Failure { error } => Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Failure { .. })
    }
}

impl From<CalcResult<f64>> for Envelope {
    fn from(outcome: CalcResult<f64>) -> Self {
        match outcome {
            Ok(result) => Envelope::Success { result },
            Err(e) => Envelope::failure(e.to_string()),
        }
    }
}

/// Run one operation against raw JSON arguments
pub fn handle(operation: Operation, arguments: &Value) -> Envelope {
    info!("{} request: {}", operation.label(), arguments);

    let outcome = operation.parse(arguments).and_then(|request| {
        debug!("Evaluating {:?}", request);
        request.evaluate()
    });

    match &outcome {
        Ok(result) => info!("{} result: {}", operation.label(), result),
        Err(e) => error!(
            "Invalid {} request with args: {}. Error: {}",
            operation.label(),
            arguments,
            e
        ),
    }

    outcome.into()
}

/// Resolve `{"method": ..., "arguments": {...}}` to an operation and run it
pub fn dispatch(event: &Value) -> Envelope {
    let method = event.get("method").and_then(Value::as_str);
    let arguments = event.get("arguments");

    let (method, arguments) = match (method, arguments) {
        (Some(method), Some(arguments)) => (method, arguments),
        _ => {
            error!("{}", MISSING_FIELDS_MESSAGE);
            return Envelope::failure(MISSING_FIELDS_MESSAGE);
        }
    };

    match method.parse::<Operation>() {
        Ok(operation) => handle(operation, arguments),
        Err(message) => {
            error!("{}", message);
            Envelope::failure(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    #[test]
    fn test_envelope_serialization() {
        let ok = Envelope::Success { result: 1.5 };
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"result": 1.5}));

        let err = Envelope::failure("'rate' is a required property");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"error": "'rate' is a required property"})
        );
    }

    #[test]
    fn test_envelope_accessors() {
        let ok = Envelope::Success { result: 2.0 };
        assert_eq!(ok.result(), Some(2.0));
        assert_eq!(ok.error(), None);
        assert!(!ok.is_error());

        let err = Envelope::failure("boom");
        assert_eq!(err.result(), None);
        assert_eq!(err.error(), Some("boom"));
        assert!(err.is_error());
    }

    #[test]
    fn test_dispatch_requires_method_and_arguments() {
        assert_eq!(dispatch(&json!({"method": "fv"})).error(), Some(MISSING_FIELDS_MESSAGE));
        assert_eq!(dispatch(&json!({"arguments": {}})).error(), Some(MISSING_FIELDS_MESSAGE));
    }

    #[test]
    fn test_dispatch_unknown_method() {
        let envelope = dispatch(&json!({"method": "sqrt", "arguments": {}}));
        assert_eq!(envelope.error(), Some("Invalid method: sqrt"));
    }

    #[test]
    fn test_dispatch_resolves_alias() {
        let envelope = dispatch(&json!({
            "method": "scheduleFutureValue",
            "arguments": {"principal": 100, "rate_schedule": [0.04, 0.06, 0.05]}
        }));
        let result = envelope.result().unwrap();
        assert!((result - 115.752).abs() < 1e-10);
    }

    fn run(method: &str, arguments: Value) -> Envelope {
        dispatch(&json!({"method": method, "arguments": arguments}))
    }

    #[test]
    fn test_annuity_requests() {
        let fv = run("fv", json!({"rate": 0.004166666666667, "nper": 120, "pmt": -100, "pv": -100}));
        assert_abs_diff_eq!(fv.result().unwrap(), 15692.928894, epsilon = 1e-6);

        let pmt = run("payment", json!({"rate": 0.00625, "nper": 180, "pv": 200000, "fv": 300000, "type": 1}));
        assert_abs_diff_eq!(pmt.result().unwrap(), -2742.918559, epsilon = 1e-6);

        let ppmt = run("ppmt", json!({"rate": 0.10, "per": 1, "nper": 3, "pv": 1000}));
        assert_abs_diff_eq!(ppmt.result().unwrap(), -302.114804, epsilon = 1e-6);

        let nper = run("nper", json!({"rate": 0.005833333333333, "pmt": -150, "pv": 8000}));
        assert_abs_diff_eq!(nper.result().unwrap(), 64.07335, epsilon = 1e-5);

        let rate = run("rate", json!({"nper": 6, "pmt": -200, "pv": 1000, "fv": 0}));
        assert_abs_diff_eq!(rate.result().unwrap(), 0.054718, epsilon = 1e-6);
    }

    #[test]
    fn test_cash_flow_requests() {
        let irr = run("irr", json!({"values": [-100, 39, 59, 55, 20]}));
        assert_abs_diff_eq!(irr.result().unwrap(), 0.28095, epsilon = 1e-5);

        let mirr = run(
            "mirr",
            json!({"values": [-1000, 300, 400, 400, 300], "finance_rate": 0.12, "reinvest_rate": 0.10}),
        );
        assert_abs_diff_eq!(mirr.result().unwrap(), 0.12876, epsilon = 1e-5);

        let xirr = run(
            "xirr",
            json!({
                "values": [-1000, 300, 400, 400, 300],
                "dates": ["2011-12-01", "2012-01-01", "2013-02-01", "2014-03-01", "2015-04-01"]
            }),
        );
        assert_abs_diff_eq!(xirr.result().unwrap(), 0.23860325587217, epsilon = 1e-7);
    }

    #[test]
    fn test_missing_required_property() {
        let envelope = run("fv", json!({"nper": 120}));
        assert_eq!(envelope.error(), Some("'rate' is a required property"));

        let envelope = run("rate", json!({"nper": 6, "pv": 1000}));
        assert_eq!(envelope.error(), Some("'fv' is a required property"));
    }

    #[test]
    fn test_wrong_type() {
        let envelope = run("pv", json!({"rate": "test1", "nper": 120}));
        assert_eq!(envelope.error(), Some("'test1' is not of type 'number'"));

        let envelope = run("npv", json!({"rate": 0.1, "values": [-100, "x"]}));
        assert_eq!(envelope.error(), Some("'x' is not of type 'number'"));
    }

    #[test]
    fn test_too_few_cash_flows() {
        let envelope = run("irr", json!({"values": [100]}));
        assert_eq!(envelope.error(), Some("[100] is too short"));
    }

    #[test]
    fn test_sign_mix_required() {
        let envelope = run("irr", json!({"values": [100, 200, 300]}));
        assert!(envelope.error().unwrap().contains(crate::validation::SIGN_MIX_MESSAGE));

        let envelope = run(
            "mirr",
            json!({"values": [-100, -200], "finance_rate": 0.1, "reinvest_rate": 0.1}),
        );
        assert!(envelope.error().unwrap().starts_with("MIRR"));
    }

    #[test]
    fn test_dated_series_errors() {
        let envelope = run("xnpv", json!({"rate": 0.05, "values": [-100, 50], "dates": ["2016-01-01"]}));
        assert!(envelope.error().unwrap().starts_with("values and dates must be the same length"));

        let envelope = run(
            "xnpv",
            json!({"rate": 0.05, "values": [-100, 50], "dates": ["2016-02-01", "2016-01-01"]}),
        );
        assert_eq!(envelope.error(), Some("dates must be in chronological order"));
    }

    #[test]
    fn test_non_convergence_reported_as_error() {
        let arguments = json!({"values": [100, 200], "dates": ["2016-01-01", "2017-01-01"]});
        let err = Operation::Xirr.evaluate(&arguments).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumericalNonConvergence);

        let envelope = run("xirr", arguments);
        assert!(envelope.error().unwrap().starts_with("Failed to converge after"));

        let envelope = run("rate", json!({"nper": 0, "pmt": -200, "pv": 1000, "fv": 0}));
        assert!(envelope.error().unwrap().starts_with("Failed to converge after"));
    }

    #[test]
    fn test_unpadded_dates_rejected() {
        let envelope = run("xnpv", json!({"rate": 0.05, "values": [-100, 50], "dates": ["2016-1-1", "2016-02-01"]}));
        assert_eq!(envelope.error(), Some("'2016-1-1' is not a 'date'"));
    }

    #[test]
    fn test_pinned_operation_takes_bare_arguments() {
        let envelope = handle(Operation::FutureValue, &json!({"rate": 0.004166666666667, "nper": 120, "pv": -100}));
        assert_abs_diff_eq!(envelope.result().unwrap(), 164.700950, epsilon = 1e-6);
    }

    #[test]
    fn test_future_value_of_present_value_recovers_target() {
        let rate = 0.004166666666667;
        let pv = run("pv", json!({"rate": rate, "nper": 120, "pmt": -100, "fv": 15692.93}))
            .result()
            .unwrap();
        let fv = run("fv", json!({"rate": rate, "nper": 120, "pmt": -100, "pv": pv}))
            .result()
            .unwrap();
        assert_abs_diff_eq!(fv, 15692.93, epsilon = 1e-6);
    }
}
