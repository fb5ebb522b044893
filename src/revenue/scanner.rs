use std::cmp::{max, min};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::checkpoint::put_checkpoint;
use super::clock::utc_date;
use super::hash::tx_hash_from_base64;
use super::lcd::TxDetailSource;
use super::rpc::BlockSource;

/// Additive per-day aggregate. Ratios are derived later by the table merge,
/// never carried here.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DayStats {
    pub tx_total: u64,
    pub tx_ibc: u64,
    pub total_fee_uatom: u64,
    pub ibc_fee_uatom: u64,
    pub lcd_errors: u64,
}

impl DayStats {
    pub fn absorb(&mut self, other: &DayStats) {
        self.tx_total += other.tx_total;
        self.tx_ibc += other.tx_ibc;
        self.total_fee_uatom += other.total_fee_uatom;
        self.ibc_fee_uatom += other.ibc_fee_uatom;
        self.lcd_errors += other.lcd_errors;
    }
}

pub type RunStats = BTreeMap<NaiveDate, DayStats>;

pub struct ScanOutcome {
    pub stats: RunStats,
    pub last_committed: Option<u64>,
    /// The fetch failure that stopped the run early, if any. Heights already
    /// committed stay committed; the failed height is not reflected anywhere.
    pub error: Option<anyhow::Error>,
}

pub struct ScanPacing {
    pub block_delay: Duration,
    pub tx_delay: Duration,
}

/// Resume one past the watermark, or start a recent window when no watermark
/// is known. The end bound keeps one invocation from processing an unbounded
/// backlog.
pub fn scan_range(watermark: Option<u64>, latest: u64, batch: u64) -> (u64, u64) {
    let start = match watermark {
        Some(height) => height + 1,
        None => max(1, latest.saturating_sub(batch)),
    };
    (start, min(latest, start.saturating_add(batch)))
}

struct HeightTally {
    date: NaiveDate,
    stats: DayStats,
}

/// Fetching Block -> Extracting Txs -> Fetching Tx Details -> Height Complete,
/// as a fold into a tally that stays private to this height. The first
/// failure short-circuits and the caller discards the tally, so a partially
/// fetched block never leaks into the run accumulator.
async fn tally_height(
    blocks: &impl BlockSource,
    details: &impl TxDetailSource,
    height: u64,
    tx_delay: Duration,
) -> Result<HeightTally> {
    let block = blocks
        .block(height)
        .await
        .with_context(|| format!("block fetch failed at height {}", height))?;

    let date = utc_date(&block.time)?;
    let mut stats = DayStats::default();

    for tx_b64 in &block.txs_base64 {
        let hash = tx_hash_from_base64(tx_b64)
            .with_context(|| format!("undecodable tx payload at height {}", height))?;
        let detail = details
            .tx_detail(&hash)
            .await
            .with_context(|| format!("tx detail fetch failed for {} at height {}", hash, height))?;

        stats.tx_total += 1;
        stats.total_fee_uatom += detail.fee_uatom;
        if detail.is_cross_chain() {
            stats.tx_ibc += 1;
            stats.ibc_fee_uatom += detail.fee_uatom;
        }

        sleep(tx_delay).await;
    }

    Ok(HeightTally { date, stats })
}

/// Walk heights start..=end sequentially. Each completed height advances the
/// watermark before its tally is folded into the run accumulator, so the
/// persisted table can never get ahead of the watermark. The first fetch
/// failure ends the run with everything committed so far.
pub async fn scan_blocks(
    blocks: &impl BlockSource,
    details: &impl TxDetailSource,
    state_path: &Path,
    start: u64,
    end: u64,
    pacing: &ScanPacing,
) -> ScanOutcome {
    let mut stats = RunStats::new();
    let mut last_committed = None;

    for height in start..=end {
        let tally = match tally_height(blocks, details, height, pacing.tx_delay).await {
            Ok(tally) => tally,
            Err(err) => {
                warn!(height, "stopping scan early: {:#}", err);
                return ScanOutcome {
                    stats,
                    last_committed,
                    error: Some(err),
                };
            }
        };

        if let Err(err) = put_checkpoint(state_path, height) {
            warn!(height, "stopping scan early: {:#}", err);
            return ScanOutcome {
                stats,
                last_committed,
                error: Some(err),
            };
        }

        stats.entry(tally.date).or_default().absorb(&tally.stats);
        last_committed = Some(height);
        debug!(height, tx_count = tally.stats.tx_total, "height committed");

        sleep(pacing.block_delay).await;
    }

    ScanOutcome {
        stats,
        last_committed,
        error: None,
    }
}
