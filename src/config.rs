use crate::param_utils::{get_param_f64, get_param_usize};
use chrono::Duration;
use std::collections::HashMap;
use thiserror::Error;

/// Contract violations caught when configuration is constructed. Everything
/// else (short windows, empty inputs, malformed rows) degrades gracefully at
/// evaluation time instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be at least 1 (value: {value})")]
    InvalidPeriod { name: &'static str, value: usize },

    #[error("{name} must be a positive finite number (value: {value})")]
    InvalidMultiplier { name: &'static str, value: f64 },

    #[error("{name} must be a non-negative finite number (value: {value})")]
    InvalidTolerance { name: &'static str, value: f64 },
}

/// Parameters of the multi-timeframe signal engine. Defaults follow the
/// 9/21 crossover with a 20-period hourly confirmation filter.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub fast_ma_period: usize,
    pub slow_ma_period: usize,
    pub confirmation_ma_period: usize,
    pub atr_period: usize,
    pub atr_multiplier_sl: f64,
    pub atr_multiplier_tp: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fast_ma_period: 9,
            slow_ma_period: 21,
            confirmation_ma_period: 20,
            atr_period: 14,
            atr_multiplier_sl: 2.0,
            atr_multiplier_tp: 3.0,
        }
    }
}

impl StrategyConfig {
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            fast_ma_period: get_param_usize(parameters, "fastMaPeriod", defaults.fast_ma_period),
            slow_ma_period: get_param_usize(parameters, "slowMaPeriod", defaults.slow_ma_period),
            confirmation_ma_period: get_param_usize(
                parameters,
                "confirmationMaPeriod",
                defaults.confirmation_ma_period,
            ),
            atr_period: get_param_usize(parameters, "atrPeriod", defaults.atr_period),
            atr_multiplier_sl: get_param_f64(
                parameters,
                "atrMultiplierSl",
                defaults.atr_multiplier_sl,
            ),
            atr_multiplier_tp: get_param_f64(
                parameters,
                "atrMultiplierTp",
                defaults.atr_multiplier_tp,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("fastMaPeriod", self.fast_ma_period),
            ("slowMaPeriod", self.slow_ma_period),
            ("confirmationMaPeriod", self.confirmation_ma_period),
            ("atrPeriod", self.atr_period),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidPeriod { name, value });
            }
        }
        for (name, value) in [
            ("atrMultiplierSl", self.atr_multiplier_sl),
            ("atrMultiplierTp", self.atr_multiplier_tp),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidMultiplier { name, value });
            }
        }
        Ok(())
    }

    /// Bars of fast-timeframe history needed before any signal can fire.
    pub fn min_fast_bars(&self) -> usize {
        self.fast_ma_period
            .max(self.slow_ma_period)
            .max(self.atr_period + 1)
    }
}

/// Tolerances for the trade reconciliation matcher.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub time_tolerance_minutes: i64,
    pub price_tolerance: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            time_tolerance_minutes: 5,
            price_tolerance: 0.02,
        }
    }
}

impl MatcherConfig {
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            time_tolerance_minutes: get_param_usize(
                parameters,
                "timeTolMinutes",
                defaults.time_tolerance_minutes as usize,
            ) as i64,
            price_tolerance: get_param_f64(parameters, "priceTolPct", defaults.price_tolerance),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_tolerance_minutes < 0 {
            return Err(ConfigError::InvalidTolerance {
                name: "timeTolMinutes",
                value: self.time_tolerance_minutes as f64,
            });
        }
        if !self.price_tolerance.is_finite() || self.price_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                name: "priceTolPct",
                value: self.price_tolerance,
            });
        }
        Ok(())
    }

    pub fn time_tolerance(&self) -> Duration {
        Duration::minutes(self.time_tolerance_minutes)
    }
}

/// Sizing parameters for the backtest driver.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub size_ratio: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1_000_000.0,
            size_ratio: 0.95,
        }
    }
}

impl BacktestConfig {
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            initial_capital: get_param_f64(parameters, "initialCapital", defaults.initial_capital),
            size_ratio: get_param_f64(parameters, "sizeRatio", defaults.size_ratio),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::InvalidMultiplier {
                name: "initialCapital",
                value: self.initial_capital,
            });
        }
        if !self.size_ratio.is_finite() || self.size_ratio <= 0.0 || self.size_ratio > 1.0 {
            return Err(ConfigError::InvalidMultiplier {
                name: "sizeRatio",
                value: self.size_ratio,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_defaults_are_valid() {
        StrategyConfig::default().validate().unwrap();
        MatcherConfig::default().validate().unwrap();
        BacktestConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_period_is_fatal_at_construction() {
        let mut params = HashMap::new();
        params.insert("fastMaPeriod".to_string(), 0.0);
        assert!(StrategyConfig::from_parameters(&params).is_err());
    }

    #[test]
    fn parameter_overrides_apply() {
        let mut params = HashMap::new();
        params.insert("fastMaPeriod".to_string(), 5.0);
        params.insert("atrMultiplierTp".to_string(), 4.0);
        let config = StrategyConfig::from_parameters(&params).unwrap();
        assert_eq!(config.fast_ma_period, 5);
        assert_eq!(config.atr_multiplier_tp, 4.0);
        assert_eq!(config.slow_ma_period, 21);
    }

    #[test]
    fn negative_price_tolerance_rejected() {
        let config = MatcherConfig {
            time_tolerance_minutes: 5,
            price_tolerance: -0.1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_fast_bars_covers_slow_ma_and_atr() {
        let config = StrategyConfig::default();
        assert_eq!(config.min_fast_bars(), 21);
        let wide_atr = StrategyConfig {
            atr_period: 30,
            ..StrategyConfig::default()
        };
        assert_eq!(wide_atr.min_fast_bars(), 31);
    }
}
