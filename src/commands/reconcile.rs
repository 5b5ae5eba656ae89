use crate::config::MatcherConfig;
use crate::events::LogSink;
use crate::matcher::TradeMatcher;
use crate::trade_log;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

pub fn run(
    reference: &Path,
    candidate: &Path,
    time_tolerance_minutes: Option<i64>,
    price_tolerance: Option<f64>,
    matches_output: Option<&Path>,
) -> Result<()> {
    let mut config = MatcherConfig::default();
    if let Some(minutes) = time_tolerance_minutes {
        config.time_tolerance_minutes = minutes;
    }
    if let Some(tolerance) = price_tolerance {
        config.price_tolerance = tolerance;
    }
    config.validate()?;

    let reference_log = trade_log::load_trade_records(reference)?;
    let candidate_log = trade_log::load_trade_records(candidate)?;
    info!(
        "Loaded {} reference trade(s) ({} skipped) and {} candidate trade(s) ({} skipped)",
        reference_log.records.len(),
        reference_log.skipped,
        candidate_log.records.len(),
        candidate_log.skipped
    );

    let matcher = TradeMatcher::with_event_sink(config, Box::new(LogSink));
    let report = matcher
        .match_trades(&reference_log.records, &candidate_log.records)
        .with_invalid_candidates(candidate_log.skipped);

    for &idx in &report.unmatched_candidate {
        let trade = &candidate_log.records[idx];
        info!(
            "[NO MATCH] {} {} entry {} @ {:.4}",
            trade.direction.as_str(),
            trade.symbol,
            trade.entry_time,
            trade.entry_price
        );
    }

    // Rows that failed to parse cannot match anything, so they count as
    // unmatched on their side of the summary.
    let unmatched_reference = report.unmatched_reference.len() + reference_log.skipped;
    let unmatched_candidate = report.unmatched_candidate.len() + candidate_log.skipped;
    info!(
        "Matched: {} | Unmatched candidate: {} | Unmatched reference: {}",
        report.matched(),
        unmatched_candidate,
        unmatched_reference
    );
    info!("Match rate: {:.1}%", report.match_rate() * 100.0);
    if candidate_log.skipped > 0 {
        warn!(
            "{} candidate row(s) were unparsable and counted as unmatched",
            candidate_log.skipped
        );
    }

    if let Some(path) = matches_output {
        write_matches(path, &report)?;
        info!("Matched pairs written to {}", path.display());
    }
    Ok(())
}

fn write_matches(path: &Path, report: &crate::matcher::MatchReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create match output {}", path.display()))?;
    writer.write_record(["reference_idx", "candidate_idx", "score", "time_diff_secs"])?;
    for pair in &report.pairs {
        writer.write_record([
            pair.reference_idx.to_string(),
            pair.candidate_idx.to_string(),
            format!("{:.6}", pair.score),
            pair.time_diff_secs.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
