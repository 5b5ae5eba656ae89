use crate::config::StrategyConfig;
use crate::events::{EngineEvent, EventSink, LogSink};
use crate::models::{Position, Signal, StopTrigger, TradeDirection, TradeRecord};
use crate::strategy::{Strategy, TimeframeWindows};
use chrono::{DateTime, Utc};
use log::warn;

/// Explicit holder of the single live position. Passed into every engine
/// call so nothing is hidden in process-wide state; running several symbols
/// means one book per symbol.
#[derive(Debug, Default)]
pub struct PositionBook {
    position: Option<Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    pub fn current(&self) -> Option<&Position> {
        self.position.as_ref()
    }
}

/// The signal engine: evaluates a strategy over two timeframe windows and
/// owns the position lifecycle rules. Single-threaded; not reentrant.
pub struct SignalEngine {
    symbol: String,
    config: StrategyConfig,
    strategy: Box<dyn Strategy + Send + Sync>,
    events: Box<dyn EventSink>,
}

impl SignalEngine {
    pub fn new(
        symbol: impl Into<String>,
        config: StrategyConfig,
        strategy: Box<dyn Strategy + Send + Sync>,
    ) -> Self {
        Self::with_event_sink(symbol, config, strategy, Box::new(LogSink))
    }

    pub fn with_event_sink(
        symbol: impl Into<String>,
        config: StrategyConfig,
        strategy: Box<dyn Strategy + Send + Sync>,
        events: Box<dyn EventSink>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            config,
            strategy,
            events,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn min_fast_bars(&self) -> usize {
        self.strategy.min_fast_bars()
    }

    /// Runs the strategy for one tick. Insufficient history resolves to
    /// `None`; a returned signal is entry advice when the book is flat and
    /// exit advice (opposite direction) when a position is open.
    pub fn evaluate(
        &self,
        book: &PositionBook,
        windows: &TimeframeWindows,
        timestamp: DateTime<Utc>,
    ) -> Option<Signal> {
        let signal =
            self.strategy
                .generate_signal(&self.symbol, windows, book.current(), timestamp)?;
        self.events.emit(EngineEvent::SignalGenerated { signal: &signal });
        Some(signal)
    }

    /// Opens a position with ATR-sized protective levels. Declined (with a
    /// warning) when one is already open; callers are expected to check
    /// `book.is_open()` first.
    pub fn open_position(
        &self,
        book: &mut PositionBook,
        direction: TradeDirection,
        entry_price: f64,
        entry_time: DateTime<Utc>,
        quantity: f64,
        atr: f64,
    ) -> Option<Position> {
        if book.is_open() {
            warn!(
                "Declining entry for {}: a position is already open",
                self.symbol
            );
            return None;
        }

        let sl_offset = atr * self.config.atr_multiplier_sl;
        let tp_offset = atr * self.config.atr_multiplier_tp;
        let (stop_loss, take_profit) = match direction {
            TradeDirection::Long => (entry_price - sl_offset, entry_price + tp_offset),
            TradeDirection::Short => (entry_price + sl_offset, entry_price - tp_offset),
        };

        let position = Position {
            symbol: self.symbol.clone(),
            direction,
            entry_price,
            entry_time,
            quantity,
            stop_loss,
            take_profit,
        };
        self.events
            .emit(EngineEvent::PositionOpened { position: &position });
        book.position = Some(position.clone());
        Some(position)
    }

    /// Closes the open position, producing the immutable trade record.
    /// A close on a flat book is a warned no-op, not an error.
    pub fn close_position(
        &self,
        book: &mut PositionBook,
        exit_price: f64,
        exit_time: DateTime<Utc>,
    ) -> Option<TradeRecord> {
        let Some(position) = book.position.take() else {
            warn!("Attempted exit for {} with no open position", self.symbol);
            return None;
        };

        let trade = TradeRecord {
            entry_time: position.entry_time,
            exit_time,
            symbol: position.symbol.clone(),
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            pnl: position.realized_pnl(exit_price),
            stop_loss: Some(position.stop_loss),
            take_profit: Some(position.take_profit),
        };
        self.events.emit(EngineEvent::PositionClosed { trade: &trade });
        Some(trade)
    }

    /// Advisory check of the protective levels. The engine never closes a
    /// position on its own; the caller decides whether to act.
    pub fn check_stop_target(&self, book: &PositionBook, current_price: f64) -> Option<StopTrigger> {
        let position = book.current()?;
        match position.direction {
            TradeDirection::Long => {
                if current_price <= position.stop_loss {
                    Some(StopTrigger::StopLoss)
                } else if current_price >= position.take_profit {
                    Some(StopTrigger::TakeProfit)
                } else {
                    None
                }
            }
            TradeDirection::Short => {
                if current_price >= position.stop_loss {
                    Some(StopTrigger::StopLoss)
                } else if current_price <= position.take_profit {
                    Some(StopTrigger::TakeProfit)
                } else {
                    None
                }
            }
        }
    }
}
