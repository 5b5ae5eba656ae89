//! Structured events emitted by the decision logic. Presentation lives in
//! the sink implementations so the engine and matcher stay free of
//! formatting concerns.

use crate::models::{Position, Signal, TradeRecord};
use log::info;

#[derive(Debug)]
pub enum EngineEvent<'a> {
    SignalGenerated { signal: &'a Signal },
    PositionOpened { position: &'a Position },
    PositionClosed { trade: &'a TradeRecord },
    MatchFound {
        reference_idx: usize,
        candidate_idx: usize,
        candidate: &'a TradeRecord,
        score: f64,
    },
}

pub trait EventSink {
    fn emit(&self, event: EngineEvent<'_>);
}

/// Default sink: one log line per event.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: EngineEvent<'_>) {
        match event {
            EngineEvent::SignalGenerated { signal } => {
                info!(
                    "{} signal for {} (confidence {:.2}): {}",
                    signal.direction.as_str(),
                    signal.symbol,
                    signal.confidence,
                    signal.reason
                );
            }
            EngineEvent::PositionOpened { position } => {
                info!(
                    "Position OPENED: {} {} {} @ {:.2} | SL={:.2}, TP={:.2}",
                    position.direction.as_str(),
                    position.quantity,
                    position.symbol,
                    position.entry_price,
                    position.stop_loss,
                    position.take_profit
                );
            }
            EngineEvent::PositionClosed { trade } => {
                info!(
                    "Position CLOSED: {} {} {} @ exit {:.2} | PnL: {:.2}",
                    trade.direction.as_str(),
                    trade.quantity,
                    trade.symbol,
                    trade.exit_price,
                    trade.pnl
                );
            }
            EngineEvent::MatchFound {
                reference_idx,
                candidate_idx,
                candidate,
                score,
            } => {
                info!(
                    "[MATCH] {} {} entry {} @ {:.4} (reference #{} <-> candidate #{}, score {:.2})",
                    candidate.direction.as_str(),
                    candidate.symbol,
                    candidate.entry_time,
                    candidate.entry_price,
                    reference_idx,
                    candidate_idx,
                    score
                );
            }
        }
    }
}

/// Discards every event. Useful in tests and bulk reprocessing.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: EngineEvent<'_>) {}
}
