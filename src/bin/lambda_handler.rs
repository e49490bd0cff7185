//! AWS Lambda handler for TVM calculations
//!
//! Event shape:
//!   {"method": "fv", "arguments": {"rate": 0.05, "nper": 10, "pmt": -100}}
//!
//! With TVM_OPERATION set (one function per operation), the event is the bare
//! arguments object instead. Always responds with the result/error envelope.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::info;
use serde_json::Value;
use tvm_calculator::{dispatch, handle, Envelope, Operation, Settings};

/// Lambda handler function
async fn handler(event: LambdaEvent<Value>, operation: Option<Operation>) -> Result<Envelope, Error> {
    let (payload, context) = event.into_parts();
    info!("Request {}", context.request_id);

    let envelope = match operation {
        Some(operation) => handle(operation, &payload),
        None => dispatch(&payload),
    };

    Ok(envelope)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = Settings::from_env()?;
    settings.init_logging();

    let operation = settings.operation;
    if let Some(op) = operation {
        info!("Serving {} requests only", op.label());
    }

    run(service_fn(move |event: LambdaEvent<Value>| handler(event, operation))).await
}
