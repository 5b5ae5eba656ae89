use crate::config::StrategyConfig;
use crate::models::{Position, Signal};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// The rolling windows a strategy sees on one evaluation tick: the fast
/// (entry) timeframe plus the slower confirmation timeframe.
#[derive(Debug, Clone, Copy)]
pub struct TimeframeWindows<'a> {
    pub fast_closes: &'a [f64],
    pub fast_highs: &'a [f64],
    pub fast_lows: &'a [f64],
    pub confirmation_closes: &'a [f64],
}

/// A signal source: given two timeframe windows and the current position,
/// produce a directional signal or nothing. Implementations must return
/// `None` on insufficient history rather than fail.
pub trait Strategy {
    fn template_id(&self) -> &str;

    fn generate_signal(
        &self,
        symbol: &str,
        windows: &TimeframeWindows,
        position: Option<&Position>,
        timestamp: DateTime<Utc>,
    ) -> Option<Signal>;

    /// Fast-timeframe bars required before the first signal can fire.
    fn min_fast_bars(&self) -> usize;
}

#[path = "strategies/multi_timeframe.rs"]
pub mod multi_timeframe;

pub use multi_timeframe::MultiTimeframeStrategy;

pub fn create_strategy(
    template_id: &str,
    config: &StrategyConfig,
) -> Result<Box<dyn Strategy + Send + Sync>> {
    match template_id {
        "multi_timeframe" => Ok(Box::new(MultiTimeframeStrategy::new(config.clone()))),
        _ => Err(anyhow::anyhow!(
            "Unknown strategy template: {}",
            template_id
        )),
    }
}
