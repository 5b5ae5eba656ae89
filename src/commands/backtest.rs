use crate::backtester::Backtester;
use crate::config::{BacktestConfig, StrategyConfig};
use crate::engine::SignalEngine;
use crate::market_data;
use crate::param_utils::parse_parameter_map_from_json;
use crate::strategy::create_strategy;
use crate::trade_log;
use anyhow::{bail, Context, Result};
use log::info;
use std::collections::HashMap;
use std::path::Path;

/// Individual CLI flags; each one overrides the JSON parameter map.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParamOverrides {
    pub fast_ma_period: Option<usize>,
    pub slow_ma_period: Option<usize>,
    pub confirmation_ma_period: Option<usize>,
    pub atr_period: Option<usize>,
}

pub fn run(
    symbol: &str,
    data_fast: &Path,
    data_confirmation: Option<&Path>,
    output: Option<&Path>,
    params_file: Option<&Path>,
    overrides: ParamOverrides,
) -> Result<()> {
    let mut parameters = load_parameters(params_file)?;
    for (key, value) in [
        ("fastMaPeriod", overrides.fast_ma_period),
        ("slowMaPeriod", overrides.slow_ma_period),
        ("confirmationMaPeriod", overrides.confirmation_ma_period),
        ("atrPeriod", overrides.atr_period),
    ] {
        if let Some(value) = value {
            parameters.insert(key.to_string(), value as f64);
        }
    }
    let strategy_config = StrategyConfig::from_parameters(&parameters)?;
    let backtest_config = BacktestConfig::from_parameters(&parameters)?;

    let fast = market_data::load_candles(data_fast)?;
    if fast.is_empty() {
        bail!("no candles in {}", data_fast.display());
    }
    let confirmation = data_confirmation
        .map(market_data::load_candles)
        .transpose()?;
    info!(
        "Loaded {} fast candle(s){} for {}",
        fast.len(),
        confirmation
            .as_ref()
            .map(|c| format!(" and {} confirmation candle(s)", c.len()))
            .unwrap_or_default(),
        symbol
    );

    let strategy = create_strategy("multi_timeframe", &strategy_config)?;
    let engine = SignalEngine::new(symbol, strategy_config, strategy);
    let backtester = Backtester::new(engine, backtest_config);
    let summary = backtester.run(&fast, confirmation.as_deref());

    info!(
        "Result: {} trade(s), final equity {:.2}, return {:.2}%",
        summary.trades.len(),
        summary.final_equity,
        summary.total_return() * 100.0
    );

    if let Some(output) = output {
        trade_log::write_trade_records(output, &summary.trades)?;
        info!("Trade log written to {}", output.display());
    }
    Ok(())
}

fn load_parameters(params_file: Option<&Path>) -> Result<HashMap<String, f64>> {
    match params_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read parameters {}", path.display()))?;
            parse_parameter_map_from_json(&raw)
        }
        None => Ok(HashMap::new()),
    }
}
