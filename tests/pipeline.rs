//! End-to-end pipeline: synthetic candles -> backtest -> trade log on disk
//! -> reconciliation of that log against itself and against a perturbed
//! copy standing in for live fills.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use crossbot::backtester::Backtester;
use crossbot::config::{BacktestConfig, MatcherConfig, StrategyConfig};
use crossbot::engine::SignalEngine;
use crossbot::matcher::TradeMatcher;
use crossbot::models::{Candle, TradeRecord};
use crossbot::strategy::create_strategy;
use crossbot::trade_log;
use std::f64::consts::PI;
use std::path::Path;
use std::sync::Once;

const CANDLE_COUNT: usize = 2_000;
const CANDLE_MINUTES: i64 = 15;

fn ensure_test_env() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Deterministic wave-composed series with enough trend reversals to trip
/// both long and short crossovers.
fn synthetic_candles() -> Vec<Candle> {
    let start = start_time();
    (0..CANDLE_COUNT)
        .map(|i| {
            let t = i as f64;
            let fast_wave = (t / 18.0).sin();
            let slow_wave = (t / 140.0).cos();
            let seasonal_wave = ((t / 600.0) * PI).sin();
            let close = 1_000.0 + 120.0 * slow_wave + 35.0 * fast_wave + 60.0 * seasonal_wave;
            let intraday_range = 2.0 + 1.5 * fast_wave.abs();
            Candle {
                timestamp: start + ChronoDuration::minutes(CANDLE_MINUTES * i as i64),
                open: close - fast_wave * intraday_range * 0.45,
                high: close + intraday_range,
                low: close - intraday_range,
                close,
                volume: 1_000.0 + 500.0 * fast_wave.abs(),
            }
        })
        .collect()
}

fn run_backtest(output: &Path) -> Result<Vec<TradeRecord>> {
    let config = StrategyConfig::default();
    let strategy = create_strategy("multi_timeframe", &config)?;
    let engine = SignalEngine::new("WAVEUSD", config, strategy);
    let backtester = Backtester::new(engine, BacktestConfig::default());

    let summary = backtester.run(&synthetic_candles(), None);
    assert!(
        !summary.trades.is_empty(),
        "wave series must produce crossover trades"
    );
    trade_log::write_trade_records(output, &summary.trades)?;
    Ok(summary.trades)
}

#[test]
fn backtest_to_log_to_reconcile_round_trip() -> Result<()> {
    ensure_test_env();
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("backtest_trades.csv");
    let trades = run_backtest(&log_path)?;

    let loaded = trade_log::load_trade_records(&log_path)?;
    assert_eq!(loaded.skipped, 0);
    assert_eq!(loaded.records.len(), trades.len());

    // A log reconciled against itself matches completely.
    let matcher = TradeMatcher::new(MatcherConfig::default());
    let report = matcher.match_trades(&loaded.records, &loaded.records);
    assert_eq!(report.matched(), trades.len());
    assert!(report.unmatched_reference.is_empty());
    assert!(report.unmatched_candidate.is_empty());
    assert_eq!(report.match_rate(), 1.0);
    Ok(())
}

#[test]
fn perturbed_live_log_still_matches_within_tolerance() -> Result<()> {
    ensure_test_env();
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("backtest_trades.csv");
    let trades = run_backtest(&log_path)?;

    // Live fills: shifted 90 seconds and slipped 0.5%, both inside the
    // default tolerances, with one extra fill no backtest trade explains.
    let live_path = dir.path().join("live_trades.csv");
    let mut live: Vec<TradeRecord> = trades
        .iter()
        .map(|trade| TradeRecord {
            entry_time: trade.entry_time + ChronoDuration::seconds(90),
            entry_price: trade.entry_price * 1.005,
            ..trade.clone()
        })
        .collect();
    let mut rogue = trades[0].clone();
    rogue.entry_time = trades[0].entry_time + ChronoDuration::days(365);
    live.push(rogue);
    trade_log::write_trade_records(&live_path, &live)?;

    let reference = trade_log::load_trade_records(&log_path)?;
    let candidate = trade_log::load_trade_records(&live_path)?;
    let matcher = TradeMatcher::new(MatcherConfig::default());
    let report = matcher.match_trades(&reference.records, &candidate.records);

    assert_eq!(report.matched(), trades.len());
    assert_eq!(report.unmatched_candidate.len(), 1);
    assert_eq!(report.unmatched_candidate[0], live.len() - 1);
    assert!(report.unmatched_reference.is_empty());
    assert!((report.match_rate() - trades.len() as f64 / live.len() as f64).abs() < 1e-12);
    Ok(())
}

#[test]
fn widened_tolerances_are_honored() -> Result<()> {
    ensure_test_env();
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("backtest_trades.csv");
    let trades = run_backtest(&log_path)?;

    // Ten minutes off: outside the default window, inside a widened one.
    let shifted: Vec<TradeRecord> = trades
        .iter()
        .map(|trade| TradeRecord {
            entry_time: trade.entry_time + ChronoDuration::minutes(10),
            ..trade.clone()
        })
        .collect();

    let strict = TradeMatcher::new(MatcherConfig::default());
    assert_eq!(strict.match_trades(&trades, &shifted).matched(), 0);

    let relaxed = TradeMatcher::new(MatcherConfig {
        time_tolerance_minutes: 15,
        price_tolerance: 0.02,
    });
    assert_eq!(relaxed.match_trades(&trades, &shifted).matched(), trades.len());
    Ok(())
}

#[test]
fn malformed_live_rows_count_against_the_match_rate() -> Result<()> {
    ensure_test_env();
    let dir = tempfile::tempdir()?;

    let reference = vec![TradeRecord {
        entry_time: start_time(),
        exit_time: start_time() + ChronoDuration::hours(1),
        symbol: "WAVEUSD".to_string(),
        direction: "BUY".parse()?,
        entry_price: 100.0,
        exit_price: 101.0,
        quantity: 1.0,
        pnl: 1.0,
        stop_loss: None,
        take_profit: None,
    }];
    let ref_path = dir.path().join("reference.csv");
    trade_log::write_trade_records(&ref_path, &reference)?;

    // One live fill within tolerance plus one row with a broken timestamp.
    let live_path = dir.path().join("live.csv");
    std::fs::write(
        &live_path,
        "entry_time,exit_time,symbol,direction,entry_price,exit_price,quantity,pnl\n\
         2024-01-01 00:01:00,2024-01-01 01:00:00,WAVEUSD,BUY,100.2,101.0,1,0.8\n\
         not-a-time,2024-01-01 01:00:00,WAVEUSD,BUY,100.2,101.0,1,0.8\n",
    )?;

    let reference = trade_log::load_trade_records(&ref_path)?;
    let candidate = trade_log::load_trade_records(&live_path)?;
    assert_eq!(candidate.skipped, 1);

    let report = TradeMatcher::new(MatcherConfig::default())
        .match_trades(&reference.records, &candidate.records)
        .with_invalid_candidates(candidate.skipped);
    assert_eq!(report.matched(), 1);
    // The broken row stays a member of the live collection, so the rate is
    // 1 of 2, not 1 of 1.
    assert!((report.match_rate() - 0.5).abs() < 1e-12);
    Ok(())
}
