//! Fault boundary.
//!
//! # Responsibilities
//! - Run the rest of the chain inside `catch_unwind`
//! - Discard whatever the chain had written before the fault
//! - Answer 500 with a generic message, logging the detail exactly once
//!
//! # Design Decisions
//! - The only place in the crate that swallows a panic
//! - Installed first on the root group by `Engine::new`, so it is the
//!   outermost frame of every chain, matched or not
//! - Fault detail never reaches the response body
//! - Requires `panic = "unwind"` (the default profile setting)

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::http::StatusCode;

use crate::error::DispatchError;
use crate::http::context::Context;
use crate::observability::metrics;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Build the recovery middleware.
pub fn recovery() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |ctx: &mut Context| {
        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.next()));

        if let Err(payload) = outcome {
            let detail = panic_message(payload.as_ref());
            metrics::record_recovered_fault();

            ctx.reset_response();
            ctx.fail_with(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, &detail);
            ctx.set_error(DispatchError::UnrecoveredFault(detail));
        }
    }
}

/// Extract a human-readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
