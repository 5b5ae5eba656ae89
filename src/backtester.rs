//! Historical replay of the signal engine over candle data. Walks the fast
//! timeframe one bar at a time with windows that never include future bars,
//! sizes entries as a fixed fraction of equity and records every closed
//! trade.

use crate::config::BacktestConfig;
use crate::engine::{PositionBook, SignalEngine};
use crate::indicators::latest_atr;
use crate::market_data::HourlyResampler;
use crate::models::{Candle, StopTrigger, TradeRecord};
use crate::strategy::TimeframeWindows;
use log::info;

#[derive(Debug)]
pub struct BacktestSummary {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub trades: Vec<TradeRecord>,
}

impl BacktestSummary {
    pub fn total_return(&self) -> f64 {
        if self.initial_capital <= 0.0 {
            return 0.0;
        }
        (self.final_equity - self.initial_capital) / self.initial_capital
    }
}

pub struct Backtester {
    engine: SignalEngine,
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(engine: SignalEngine, config: BacktestConfig) -> Self {
        Self { engine, config }
    }

    /// Replays the fast candles. When `confirmation` is given its closes are
    /// consumed up to each fast timestamp; otherwise the confirmation series
    /// is resampled hourly from the fast candles themselves.
    pub fn run(&self, fast: &[Candle], confirmation: Option<&[Candle]>) -> BacktestSummary {
        let closes: Vec<f64> = fast.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = fast.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = fast.iter().map(|c| c.low).collect();
        let confirmation_closes: Vec<f64> = confirmation
            .map(|candles| candles.iter().map(|c| c.close).collect())
            .unwrap_or_default();

        let mut resampler = HourlyResampler::new();
        let mut confirmation_cursor = 0usize;
        let mut book = PositionBook::new();
        let mut equity = self.config.initial_capital;
        let mut trades: Vec<TradeRecord> = Vec::new();
        let warmup = self.engine.min_fast_bars();

        for (i, candle) in fast.iter().enumerate() {
            let confirmation_window: &[f64] = match confirmation {
                Some(candles) => {
                    while confirmation_cursor < candles.len()
                        && candles[confirmation_cursor].timestamp <= candle.timestamp
                    {
                        confirmation_cursor += 1;
                    }
                    &confirmation_closes[..confirmation_cursor]
                }
                None => {
                    resampler.push(candle);
                    resampler.closes()
                }
            };

            if i + 1 < warmup {
                continue;
            }
            let price = candle.close;

            // Protective levels first; a breach exits at the level itself.
            let stop_exit = book.current().and_then(|position| {
                let trigger = self.engine.check_stop_target(&book, price)?;
                let level = match trigger {
                    StopTrigger::StopLoss => position.stop_loss,
                    StopTrigger::TakeProfit => position.take_profit,
                };
                Some((trigger, level))
            });
            if let Some((trigger, exit_price)) = stop_exit {
                info!(
                    "{} hit for {} at {:.2}",
                    trigger.as_str(),
                    self.engine.symbol(),
                    exit_price
                );
                if let Some(trade) =
                    self.engine
                        .close_position(&mut book, exit_price, candle.timestamp)
                {
                    equity += trade.pnl;
                    trades.push(trade);
                }
                // A fresh entry decision waits for the next bar.
                continue;
            }

            let windows = TimeframeWindows {
                fast_closes: &closes[..=i],
                fast_highs: &highs[..=i],
                fast_lows: &lows[..=i],
                confirmation_closes: confirmation_window,
            };
            let Some(signal) = self.engine.evaluate(&book, &windows, candle.timestamp) else {
                continue;
            };

            if book.is_open() {
                if let Some(trade) =
                    self.engine.close_position(&mut book, price, candle.timestamp)
                {
                    equity += trade.pnl;
                    trades.push(trade);
                }
            } else {
                let Some(atr) = latest_atr(
                    &highs[..=i],
                    &lows[..=i],
                    &closes[..=i],
                    self.engine.config().atr_period,
                ) else {
                    continue;
                };
                let quantity = equity * self.config.size_ratio / price;
                self.engine.open_position(
                    &mut book,
                    signal.direction,
                    price,
                    candle.timestamp,
                    quantity,
                    atr,
                );
            }
        }

        // A position still open at the end of data is marked out at the
        // final close so the run's PnL is fully accounted.
        if book.is_open() {
            if let Some(last) = fast.last() {
                if let Some(trade) =
                    self.engine
                        .close_position(&mut book, last.close, last.timestamp)
                {
                    equity += trade.pnl;
                    trades.push(trade);
                }
            }
        }

        info!(
            "Backtest complete for {}: {} trade(s), equity {:.2} -> {:.2}",
            self.engine.symbol(),
            trades.len(),
            self.config.initial_capital,
            equity
        );

        BacktestSummary {
            initial_capital: self.config.initial_capital,
            final_equity: equity,
            trades,
        }
    }
}
