use std::pin::pin;

use anyhow::Result;
use tracing::{error, info};

use super::context::AppContext;

pub async fn run_once(ctx: &AppContext) -> Result<()> {
    let report = ctx.indexer.sync().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Syncs every `sync_interval` until Ctrl-C. A pass in progress always
/// completes; the signal is honored between passes.
pub async fn watch(ctx: &AppContext) -> Result<()> {
    let interval = ctx.settings.sync_interval;
    let mut shutdown = pin!(tokio::signal::ctrl_c());
    info!("Watching the order book every {}s", interval.as_secs());

    loop {
        match ctx.indexer.sync().await {
            Ok(report) if report.chunks > 0 => info!(
                "Pass done at block {}: {} made, {} cancelled, {} filled",
                report.to_block, report.made, report.cancelled, report.filled
            ),
            Ok(_) => {}
            Err(e) => error!("Sync pass failed: {}", e),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                return Ok(());
            }
        }
    }
}
