use std::time::Duration;

use alloy::rpc::types::Log;
use tracing::{debug, warn};

use crate::interfaces::error::ClientError;
use crate::interfaces::event::EventKind;
use crate::services::rpc::ChainClient;

/// Retries of a single-block range before the error is propagated.
const SINGLE_BLOCK_RETRIES: u32 = 2;
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Fetches every log of `kind` in `[from, to]`, sorted by block number and
/// log index.
///
/// A failing range is split at its midpoint and both halves retried with
/// fresh attempt counters. A failing single block is retried with a linear
/// backoff, then the error is returned.
pub async fn get_logs_safe<C: ChainClient + ?Sized>(
    client: &C,
    kind: EventKind,
    from: u64,
    to: u64,
) -> Result<Vec<Log>, ClientError> {
    let mut logs = Vec::new();
    let mut worklist = vec![(from, to, 0u32)];

    while let Some((lo, hi, attempts)) = worklist.pop() {
        match client.logs(kind, lo, hi).await {
            Ok(batch) => logs.extend(batch),
            Err(e) if lo < hi => {
                let mid = lo + (hi - lo) / 2;
                debug!("{kind} logs {lo}-{hi} failed ({e}), splitting at {mid}");
                // Upper half pushed first so the lower half is fetched first.
                worklist.push((mid + 1, hi, 0));
                worklist.push((lo, mid, 0));
            }
            Err(e) if attempts < SINGLE_BLOCK_RETRIES => {
                let attempt = attempts + 1;
                warn!("{kind} logs at block {lo} failed ({e}), retry {attempt}");
                tokio::time::sleep(BACKOFF_STEP * attempt).await;
                worklist.push((lo, hi, attempt));
            }
            Err(e) => return Err(e),
        }
    }

    logs.sort_by_key(|log| {
        (
            log.block_number.unwrap_or_default(),
            log.log_index.unwrap_or_default(),
        )
    });
    Ok(logs)
}
