//! TVM Calculator - time-value-of-money calculations behind a validated request boundary
//!
//! This library provides:
//! - Annuity formulas (FV, PV, PMT, IPMT/PPMT, NPER, RATE)
//! - Cash-flow discounting (NPV, IRR, MIRR) and dated discounting (XNPV, XIRR)
//! - Variable-rate compounding (FVSCHEDULE)
//! - Schema validation and a uniform `{"result"}` / `{"error"}` envelope
//!
//! Every calculation is a pure function; nothing is shared between calls.

pub mod error;
pub mod solver;
pub mod tvm;
pub mod cashflows;
pub mod schedule;
pub mod validation;
pub mod operation;
pub mod dispatch;
pub mod config;
pub mod loader;

// Re-export commonly used types
pub use error::{CalcError, CalcResult, ErrorKind};
pub use tvm::PaymentTiming;
pub use cashflows::CashFlowSeries;
pub use validation::{validate, Schema, ValidationOutcome};
pub use operation::{Operation, Request};
pub use dispatch::{dispatch, handle, Envelope};
pub use config::Settings;
