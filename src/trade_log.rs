//! Flat CSV trade log: written append-only after each closed position and
//! read back as matcher input. Reading is tolerant; a malformed row is
//! skipped and counted, never fatal.

use crate::models::{TradeDirection, TradeRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use log::warn;
use std::path::Path;

const HEADERS: [&str; 10] = [
    "entry_time",
    "exit_time",
    "symbol",
    "direction",
    "entry_price",
    "exit_price",
    "quantity",
    "pnl",
    "stop_loss",
    "take_profit",
];

/// Trade records parsed from a log plus the count of rows that had to be
/// skipped (malformed timestamps, missing required fields). Skipped rows are
/// reported as unmatched by the reconciliation summary.
#[derive(Debug, Default)]
pub struct LoadedTrades {
    pub records: Vec<TradeRecord>,
    pub skipped: usize,
}

pub fn write_trade_records(path: &Path, trades: &[TradeRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create trade log {}", path.display()))?;
    writer.write_record(HEADERS)?;
    for trade in trades {
        write_row(&mut writer, trade)?;
    }
    writer.flush()?;
    Ok(())
}

/// Appends one record, creating the file with a header when absent.
pub fn append_trade_record(path: &Path, trade: &TradeRecord) -> Result<()> {
    let exists = path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open trade log {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    if !exists {
        writer.write_record(HEADERS)?;
    }
    write_row(&mut writer, trade)?;
    writer.flush()?;
    Ok(())
}

fn write_row<W: std::io::Write>(writer: &mut csv::Writer<W>, trade: &TradeRecord) -> Result<()> {
    writer.write_record([
        trade.entry_time.to_rfc3339(),
        trade.exit_time.to_rfc3339(),
        trade.symbol.clone(),
        trade.direction.as_str().to_string(),
        trade.entry_price.to_string(),
        trade.exit_price.to_string(),
        trade.quantity.to_string(),
        trade.pnl.to_string(),
        trade.stop_loss.map(|v| v.to_string()).unwrap_or_default(),
        trade.take_profit.map(|v| v.to_string()).unwrap_or_default(),
    ])?;
    Ok(())
}

pub fn load_trade_records(path: &Path) -> Result<LoadedTrades> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to read trade log {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let mut loaded = LoadedTrades::default();
    for (row_idx, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!("Skipping row {} of {}: {}", row_idx + 1, path.display(), err);
                loaded.skipped += 1;
                continue;
            }
        };
        match parse_row(&headers, &row) {
            Some(record) => loaded.records.push(record),
            None => {
                warn!(
                    "Skipping malformed row {} of {}",
                    row_idx + 1,
                    path.display()
                );
                loaded.skipped += 1;
            }
        }
    }
    Ok(loaded)
}

fn field<'a>(headers: &StringRecord, row: &'a StringRecord, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .position(|header| header == name)
        .and_then(|idx| row.get(idx))
}

fn parse_row(headers: &StringRecord, row: &StringRecord) -> Option<TradeRecord> {
    let entry_time = parse_timestamp(field(headers, row, "entry_time")?)?;
    let exit_time = parse_timestamp(field(headers, row, "exit_time")?)?;
    let symbol = field(headers, row, "symbol")?.trim();
    if symbol.is_empty() {
        return None;
    }
    let direction: TradeDirection = field(headers, row, "direction")?.parse().ok()?;
    let entry_price: f64 = field(headers, row, "entry_price")?.trim().parse().ok()?;
    let exit_price: f64 = field(headers, row, "exit_price")?.trim().parse().ok()?;
    let quantity: f64 = field(headers, row, "quantity")?.trim().parse().ok()?;
    let pnl: f64 = field(headers, row, "pnl")?.trim().parse().ok()?;
    let stop_loss = field(headers, row, "stop_loss").and_then(|v| v.trim().parse().ok());
    let take_profit = field(headers, row, "take_profit").and_then(|v| v.trim().parse().ok());

    Some(TradeRecord {
        entry_time,
        exit_time,
        symbol: symbol.to_string(),
        direction,
        entry_price,
        exit_price,
        quantity,
        pnl,
        stop_loss,
        take_profit,
    })
}

/// Accepts RFC 3339 or a naive `YYYY-MM-DD HH:MM:SS[.frac]` assumed UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn trade() -> TradeRecord {
        TradeRecord {
            entry_time: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            exit_time: Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap(),
            symbol: "BTCUSDT".to_string(),
            direction: TradeDirection::Long,
            entry_price: 42000.0,
            exit_price: 42600.0,
            quantity: 0.5,
            pnl: 300.0,
            stop_loss: Some(41000.0),
            take_profit: Some(43500.0),
        }
    }

    #[test]
    fn write_then_load_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        write_trade_records(&path, &[trade()]).unwrap();

        let loaded = load_trade_records(&path).unwrap();
        assert_eq!(loaded.skipped, 0);
        assert_eq!(loaded.records.len(), 1);
        let record = &loaded.records[0];
        assert_eq!(record.symbol, "BTCUSDT");
        assert_eq!(record.direction, TradeDirection::Long);
        assert_eq!(record.entry_price, 42000.0);
        assert_eq!(record.stop_loss, Some(41000.0));
        assert_eq!(record.entry_time, trade().entry_time);
    }

    #[test]
    fn append_creates_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        append_trade_record(&path, &trade()).unwrap();
        append_trade_record(&path, &trade()).unwrap();

        let loaded = load_trade_records(&path).unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.skipped, 0);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "entry_time,exit_time,symbol,direction,entry_price,exit_price,quantity,pnl"
        )
        .unwrap();
        writeln!(
            file,
            "2024-01-01 10:00:00,2024-01-01 11:00:00,BTCUSDT,BUY,100,101,1,1"
        )
        .unwrap();
        writeln!(file, "not-a-time,2024-01-01 11:00:00,BTCUSDT,BUY,100,101,1,1").unwrap();
        writeln!(
            file,
            "2024-01-01 10:00:00,2024-01-01 11:00:00,BTCUSDT,HOLD,100,101,1,1"
        )
        .unwrap();
        drop(file);

        let loaded = load_trade_records(&path).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.skipped, 2);
        // Optional protective levels absent from the header parse as None.
        assert_eq!(loaded.records[0].stop_loss, None);
    }

    #[test]
    fn timestamp_formats_are_accepted() {
        assert!(parse_timestamp("2024-01-01T10:00:00+00:00").is_some());
        assert!(parse_timestamp("2024-01-01 10:00:00").is_some());
        assert!(parse_timestamp("2024-01-01 10:00:00.123456").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
