//! Candle CSV loading and the fast-to-hourly close resampling used when no
//! separate confirmation-timeframe file is supplied.

use crate::models::Candle;
use crate::trade_log::parse_timestamp;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Loads candles from a `timestamp,open,high,low,close,volume` CSV and
/// returns them sorted ascending by timestamp. Market data files are expected
/// to be well-formed, so a bad row is an error rather than a skip.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to read candle data {}", path.display()))?;

    let mut candles = Vec::new();
    for (row_idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("row {} of {}", row_idx + 1, path.display()))?;
        if row.len() < 6 {
            bail!(
                "row {} of {}: expected 6 columns, found {}",
                row_idx + 1,
                path.display(),
                row.len()
            );
        }

        let Some(timestamp) = parse_timestamp(&row[0]) else {
            bail!(
                "row {} of {}: unparsable timestamp {:?}",
                row_idx + 1,
                path.display(),
                &row[0]
            );
        };
        let parse_price = |raw: &str, name: &str| -> Result<f64> {
            raw.trim()
                .parse()
                .with_context(|| format!("row {}: bad {} {:?}", row_idx + 1, name, raw))
        };
        let candle = Candle {
            timestamp,
            open: parse_price(&row[1], "open")?,
            high: parse_price(&row[2], "high")?,
            low: parse_price(&row[3], "low")?,
            close: parse_price(&row[4], "close")?,
            volume: parse_price(&row[5], "volume")?,
        };
        candles.push(candle);
    }

    candles.sort_by_key(|candle| candle.timestamp);
    Ok(candles)
}

fn hour_bin(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp().div_euclid(3600)
}

/// Last close per hour bucket, in time order. The trailing partial hour is
/// included, which keeps the confirmation series current with the fast one.
pub fn resample_hourly_closes(candles: &[Candle]) -> Vec<f64> {
    let mut closes: Vec<f64> = Vec::new();
    let mut current_bin: Option<i64> = None;
    for candle in candles {
        let bin = hour_bin(candle.timestamp);
        if current_bin == Some(bin) {
            *closes.last_mut().expect("bin implies prior close") = candle.close;
        } else {
            closes.push(candle.close);
            current_bin = Some(bin);
        }
    }
    closes
}

/// Incremental version of [`resample_hourly_closes`] for the backtest loop,
/// so each tick is O(1) instead of rescanning history.
#[derive(Debug, Default)]
pub struct HourlyResampler {
    closes: Vec<f64>,
    current_bin: Option<i64>,
}

impl HourlyResampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candle: &Candle) {
        let bin = hour_bin(candle.timestamp);
        if self.current_bin == Some(bin) {
            *self.closes.last_mut().expect("bin implies prior close") = candle.close;
        } else {
            self.closes.push(candle.close);
            self.current_bin = Some(bin);
        }
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }
}
