//! Tolerance-based record linkage between two trade logs.
//!
//! The reference side is typically the backtest log and the candidate side
//! the live log. Matching is greedy per candidate in input order; this is
//! deliberately not an optimal assignment, so a candidate can claim a
//! reference record that a later candidate would have scored better on.

use crate::config::MatcherConfig;
use crate::events::{EngineEvent, EventSink, NullSink};
use crate::models::TradeRecord;
use std::collections::HashSet;

/// Relative price differences are amplified so sub-percent gaps still break
/// ties against whole seconds of time difference.
const PRICE_SCORE_WEIGHT: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub reference_idx: usize,
    pub candidate_idx: usize,
    /// time difference in seconds + 10000 * relative price difference
    pub score: f64,
    pub time_diff_secs: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub pairs: Vec<MatchedPair>,
    pub unmatched_reference: Vec<usize>,
    pub unmatched_candidate: Vec<usize>,
    pub candidate_total: usize,
}

impl MatchReport {
    pub fn matched(&self) -> usize {
        self.pairs.len()
    }

    /// Folds candidate rows that never made it past parsing into the
    /// totals. They stay members of the candidate collection and can never
    /// match, so they dilute the match rate.
    pub fn with_invalid_candidates(mut self, count: usize) -> Self {
        self.candidate_total += count;
        self
    }

    /// matched / |candidates| including unparsable rows, defined as 0 for
    /// an empty candidate set.
    pub fn match_rate(&self) -> f64 {
        if self.candidate_total == 0 {
            0.0
        } else {
            self.matched() as f64 / self.candidate_total as f64
        }
    }
}

pub struct TradeMatcher {
    config: MatcherConfig,
    events: Box<dyn EventSink>,
}

impl TradeMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self::with_event_sink(config, Box::new(NullSink))
    }

    pub fn with_event_sink(config: MatcherConfig, events: Box<dyn EventSink>) -> Self {
        Self { config, events }
    }

    /// Pairs candidate records one-to-one against reference records sharing
    /// symbol and direction, within the configured entry-time and relative
    /// entry-price tolerances. Pure with respect to its inputs; safe to call
    /// repeatedly.
    pub fn match_trades(
        &self,
        reference: &[TradeRecord],
        candidate: &[TradeRecord],
    ) -> MatchReport {
        let time_tolerance = self.config.time_tolerance();
        let mut consumed: HashSet<usize> = HashSet::new();
        let mut report = MatchReport {
            candidate_total: candidate.len(),
            ..MatchReport::default()
        };

        for (candidate_idx, cand) in candidate.iter().enumerate() {
            let mut best: Option<(usize, f64, i64)> = None;

            for (reference_idx, reference_trade) in reference.iter().enumerate() {
                if consumed.contains(&reference_idx)
                    || reference_trade.symbol != cand.symbol
                    || reference_trade.direction != cand.direction
                {
                    continue;
                }

                let time_diff = (cand.entry_time - reference_trade.entry_time).abs();
                if time_diff > time_tolerance {
                    continue;
                }

                let price_diff = (cand.entry_price - reference_trade.entry_price).abs();
                let price_avg = (cand.entry_price + reference_trade.entry_price) / 2.0;
                if price_avg <= 0.0 {
                    continue;
                }
                let price_pct_diff = price_diff / price_avg;
                if price_pct_diff > self.config.price_tolerance {
                    continue;
                }

                let time_diff_secs = time_diff.num_seconds();
                let score = time_diff_secs as f64 + price_pct_diff * PRICE_SCORE_WEIGHT;
                if best.map(|(_, best_score, _)| score < best_score).unwrap_or(true) {
                    best = Some((reference_idx, score, time_diff_secs));
                }
            }

            match best {
                Some((reference_idx, score, time_diff_secs)) => {
                    consumed.insert(reference_idx);
                    self.events.emit(EngineEvent::MatchFound {
                        reference_idx,
                        candidate_idx,
                        candidate: cand,
                        score,
                    });
                    report.pairs.push(MatchedPair {
                        reference_idx,
                        candidate_idx,
                        score,
                        time_diff_secs,
                    });
                }
                None => report.unmatched_candidate.push(candidate_idx),
            }
        }

        report.unmatched_reference = (0..reference.len())
            .filter(|idx| !consumed.contains(idx))
            .collect();
        report
    }
}
