use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::scanner::{DayStats, RunStats};

/// uatom per ATOM, the base denomination conversion for display columns.
const UATOM_PER_ATOM: f64 = 1_000_000.0;

/// One row of the persisted daily table. The integer columns are the
/// additive aggregates; every other column is derived and recomputed on each
/// merge, never carried over or summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub tx_total: u64,
    pub tx_ibc: u64,
    pub tx_ibc_ratio_pct: f64,
    pub total_fee_uatom: u64,
    pub ibc_fee_uatom: u64,
    pub ibc_fee_share_pct: f64,
    pub lcd_errors: u64,
    pub atom_price_usd_used: f64,
    pub total_fee_atom: f64,
    pub ibc_fee_atom: f64,
    pub total_fee_usd: f64,
    pub ibc_fee_usd: f64,
}

impl DailyRow {
    fn additive_stats(&self) -> DayStats {
        DayStats {
            tx_total: self.tx_total,
            tx_ibc: self.tx_ibc,
            total_fee_uatom: self.total_fee_uatom,
            ibc_fee_uatom: self.ibc_fee_uatom,
            lcd_errors: self.lcd_errors,
        }
    }
}

/// Load the cumulative table. A missing file is a first run; a present but
/// malformed file is an error, the table is the authoritative history and
/// guessing at it would corrupt every later merge.
pub fn load_table(path: &Path) -> Result<Vec<DailyRow>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open daily table at {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<DailyRow>, _>>()
        .with_context(|| format!("malformed daily table at {}", path.display()))
}

/// Fold freshly scanned buckets into the existing table: sum the additive
/// columns per date, then recompute every derived column from the summed
/// totals. Additive safety rests on the watermark never re-admitting an
/// already committed height upstream.
pub fn merge(existing: &[DailyRow], fresh: &RunStats, price_usd: f64) -> Vec<DailyRow> {
    let mut merged: BTreeMap<NaiveDate, DayStats> = BTreeMap::new();

    for row in existing {
        merged
            .entry(row.date)
            .or_default()
            .absorb(&row.additive_stats());
    }
    for (day, stats) in fresh {
        merged.entry(*day).or_default().absorb(stats);
    }

    merged
        .into_iter()
        .map(|(day, stats)| build_row(day, &stats, price_usd))
        .collect()
}

fn build_row(date: NaiveDate, stats: &DayStats, price_usd: f64) -> DailyRow {
    let total_fee_atom = stats.total_fee_uatom as f64 / UATOM_PER_ATOM;
    let ibc_fee_atom = stats.ibc_fee_uatom as f64 / UATOM_PER_ATOM;

    DailyRow {
        date,
        tx_total: stats.tx_total,
        tx_ibc: stats.tx_ibc,
        tx_ibc_ratio_pct: ratio_pct(stats.tx_ibc, stats.tx_total),
        total_fee_uatom: stats.total_fee_uatom,
        ibc_fee_uatom: stats.ibc_fee_uatom,
        ibc_fee_share_pct: ratio_pct(stats.ibc_fee_uatom, stats.total_fee_uatom),
        lcd_errors: stats.lcd_errors,
        atom_price_usd_used: price_usd,
        total_fee_atom,
        ibc_fee_atom,
        total_fee_usd: total_fee_atom * price_usd,
        ibc_fee_usd: ibc_fee_atom * price_usd,
    }
}

fn ratio_pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Rewrite the table in full, rows already in date order from the merge.
pub fn write_table(path: &Path, rows: &[DailyRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to write daily table to {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
