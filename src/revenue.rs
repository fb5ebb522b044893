mod checkpoint;
mod clock;
mod endpoints;
mod env;
mod hash;
mod lcd;
mod price;
mod rpc;
mod scanner;
mod table;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::log;

use self::env::APP_CONFIG;
use self::lcd::CosmosLcd;
use self::rpc::{BlockSource, TendermintRpc};
use self::scanner::{scan_blocks, scan_range, ScanPacing};

/*
  One bounded batch per invocation: resume from the watermark, scan forward,
  fold per-day stats, merge them into the cumulative daily table and rewrite
  it in full. A fatal fetch failure stops the scan but the table still gets
  everything that was fully committed, the watermark marks the resume point
  and the error surfaces through the exit code.
*/
pub async fn start_scan() -> Result<()> {
    log::init();

    // collaborator data up front, so a price outage fails before any state moves
    let price_usd = price::fetch_atom_price_usd().await?;
    info!(price_usd, "using spot ATOM price");

    let blocks = TendermintRpc::new();
    let details = CosmosLcd::new();

    let latest = blocks.latest_height().await?;
    let state_path = Path::new(&APP_CONFIG.state_file);
    let watermark = checkpoint::get_checkpoint(state_path);
    let (start, end) = scan_range(watermark, latest, APP_CONFIG.block_batch);
    info!(start, end, latest, ?watermark, "scanning blocks");

    let pacing = ScanPacing {
        block_delay: Duration::from_millis(APP_CONFIG.block_delay_ms),
        tx_delay: Duration::from_millis(APP_CONFIG.tx_delay_ms),
    };
    let outcome = scan_blocks(&blocks, &details, state_path, start, end, &pacing).await;

    let table_path = Path::new(&APP_CONFIG.table_file);
    let existing = table::load_table(table_path)?;
    let rows = table::merge(&existing, &outcome.stats, price_usd);
    table::write_table(table_path, &rows)?;

    info!(
        rows = rows.len(),
        table = %table_path.display(),
        last_committed = ?outcome.last_committed,
        "daily table written"
    );

    match outcome.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
