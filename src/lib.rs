pub mod backtester;
pub mod config;
pub mod engine;
pub mod events;
pub mod indicators;
pub mod market_data;
pub mod matcher;
pub mod models;
pub mod param_utils;
pub mod strategy;
pub mod trade_log;

pub mod commands {
    pub mod backtest;
    pub mod reconcile;
}
