//! Per-request access log and metrics.

use std::time::Instant;

use crate::http::context::Context;
use crate::observability::metrics;

/// Log method, path, status and latency once the chain below has returned.
pub fn access_log() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |ctx: &mut Context| {
        let start = Instant::now();
        ctx.next();

        let status = ctx.status().as_u16();
        tracing::info!(
            method = %ctx.method(),
            path = %ctx.path(),
            route = ctx.route_pattern().unwrap_or("-"),
            status,
            request_id = ctx.request_id().unwrap_or("-"),
            latency_us = start.elapsed().as_micros() as u64,
            "Request completed"
        );
        metrics::record_request(ctx.method().as_str(), status, start);
    }
}
