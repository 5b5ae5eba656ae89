use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One bar of market data for a single timeframe. Timestamps are expected
/// to be strictly ascending within a series; regular spacing is not assumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// Wire value used in trade logs ("BUY"/"SELL", matching the exchange side).
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Long => "BUY",
            TradeDirection::Short => "SELL",
        }
    }

    pub fn opposite(&self) -> TradeDirection {
        match self {
            TradeDirection::Long => TradeDirection::Short,
            TradeDirection::Short => TradeDirection::Long,
        }
    }
}

impl FromStr for TradeDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "LONG" => Ok(TradeDirection::Long),
            "SELL" | "SHORT" => Ok(TradeDirection::Short),
            other => Err(anyhow!("Unknown trade direction '{}'", other)),
        }
    }
}

/// A directional trading signal. For an open position, a signal carrying the
/// opposite direction denotes "close the position", not a fresh entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub direction: TradeDirection,
    pub confidence: f64,
    pub reason: String,
}

/// The single live position. Created on entry, replaced wholesale, cleared on exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    /// Realized PnL at the given exit price: (exit - entry) * quantity for
    /// longs, negated for shorts.
    pub fn realized_pnl(&self, exit_price: f64) -> f64 {
        let pnl = (exit_price - self.entry_price) * self.quantity;
        match self.direction {
            TradeDirection::Long => pnl,
            TradeDirection::Short => -pnl,
        }
    }
}

/// One closed trade, appended to the flat trade log. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

/// Which protective level a price has breached, if any. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTrigger {
    StopLoss,
    TakeProfit,
}

impl StopTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopTrigger::StopLoss => "SL",
            StopTrigger::TakeProfit => "TP",
        }
    }
}
