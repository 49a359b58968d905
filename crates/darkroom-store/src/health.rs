//! Storage health check

use std::time::{Duration, Instant};

use anyhow::Result;
use opendal::Operator;

/// Verify the storage endpoint is reachable by listing the root.
///
/// Returns the probe latency on success.
pub async fn check_health(op: &Operator) -> Result<Duration> {
    let started = Instant::now();
    op.list("/")
        .await
        .map_err(|e| anyhow::anyhow!("storage health check failed: {e}"))?;
    Ok(started.elapsed())
}

/// Returns true if storage is reachable, false otherwise (non-panicking).
pub async fn is_healthy(op: &Operator) -> bool {
    check_health(op).await.is_ok()
}
