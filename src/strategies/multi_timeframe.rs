use crate::config::StrategyConfig;
use crate::indicators::{latest_atr, latest_sma};
use crate::models::{Position, Signal, TradeDirection};
use crate::strategy::{Strategy, TimeframeWindows};
use chrono::{DateTime, Utc};

const ENTRY_CONFIDENCE: f64 = 0.7;
const EXIT_CONFIDENCE: f64 = 0.8;

/// Fast/slow SMA crossover on the entry timeframe, filtered by an SMA on the
/// confirmation timeframe. Exits on crossover reversal; the exit signal
/// carries the opposite direction of the open position.
pub struct MultiTimeframeStrategy {
    template_id: String,
    config: StrategyConfig,
}

impl MultiTimeframeStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            template_id: "multi_timeframe".to_string(),
            config,
        }
    }
}

impl Strategy for MultiTimeframeStrategy {
    fn template_id(&self) -> &str {
        &self.template_id
    }

    fn generate_signal(
        &self,
        symbol: &str,
        windows: &TimeframeWindows,
        position: Option<&Position>,
        timestamp: DateTime<Utc>,
    ) -> Option<Signal> {
        let fast_ma = latest_sma(windows.fast_closes, self.config.fast_ma_period)?;
        let slow_ma = latest_sma(windows.fast_closes, self.config.slow_ma_period)?;
        let confirmation_ma = latest_sma(
            windows.confirmation_closes,
            self.config.confirmation_ma_period,
        )?;
        // The ATR that sizes protective levels must also be computable,
        // otherwise an entry could not be acted on.
        latest_atr(
            windows.fast_highs,
            windows.fast_lows,
            windows.fast_closes,
            self.config.atr_period,
        )?;

        let current_price = *windows.fast_closes.last()?;

        let Some(position) = position else {
            if fast_ma > slow_ma && current_price > confirmation_ma {
                return Some(Signal {
                    timestamp,
                    symbol: symbol.to_string(),
                    direction: TradeDirection::Long,
                    confidence: ENTRY_CONFIDENCE,
                    reason: format!(
                        "Fast MA {:.2} > Slow MA {:.2}, price above confirmation MA",
                        fast_ma, slow_ma
                    ),
                });
            }
            if fast_ma < slow_ma && current_price < confirmation_ma {
                return Some(Signal {
                    timestamp,
                    symbol: symbol.to_string(),
                    direction: TradeDirection::Short,
                    confidence: ENTRY_CONFIDENCE,
                    reason: format!(
                        "Fast MA {:.2} < Slow MA {:.2}, price below confirmation MA",
                        fast_ma, slow_ma
                    ),
                });
            }
            return None;
        };

        match position.direction {
            TradeDirection::Long if fast_ma < slow_ma => Some(Signal {
                timestamp,
                symbol: symbol.to_string(),
                direction: TradeDirection::Short,
                confidence: EXIT_CONFIDENCE,
                reason: "Exit: Fast MA < Slow MA (reversal)".to_string(),
            }),
            TradeDirection::Short if fast_ma > slow_ma => Some(Signal {
                timestamp,
                symbol: symbol.to_string(),
                direction: TradeDirection::Long,
                confidence: EXIT_CONFIDENCE,
                reason: "Exit: Fast MA > Slow MA (reversal)".to_string(),
            }),
            _ => None,
        }
    }

    fn min_fast_bars(&self) -> usize {
        self.config.min_fast_bars()
    }
}
