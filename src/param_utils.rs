use anyhow::{anyhow, Result};
use log::warn;
use serde_json::Value;
use std::collections::HashMap;

/// Extract a parameter as f64 with a default value
pub fn get_param_f64(params: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    let raw = params.get(key).copied().unwrap_or(default);
    if raw.is_finite() {
        raw
    } else {
        default
    }
}

/// Extract a parameter as usize, rounded, with a default value
pub fn get_param_usize(params: &HashMap<String, f64>, key: &str, default: usize) -> usize {
    let raw = params.get(key).copied().unwrap_or(default as f64);
    if !raw.is_finite() || raw < 0.0 {
        return default;
    }
    raw.round() as usize
}

/// Parses a flat JSON object into a numeric parameter map. Booleans map to
/// 0/1; null, strings, and composite values are skipped with a warning.
pub fn parse_parameter_map_from_json(json: &str) -> Result<HashMap<String, f64>> {
    let raw: HashMap<String, Value> =
        serde_json::from_str(json).map_err(|error| anyhow!("Invalid parameter JSON: {}", error))?;

    let mut cleaned = HashMap::with_capacity(raw.len());
    for (key, value) in raw.into_iter() {
        if let Some(num) = value.as_f64() {
            if num.is_finite() {
                cleaned.insert(key, num);
            } else {
                warn!("Skipping parameter `{}` due to non-finite value", key);
            }
            continue;
        }
        if let Some(boolean) = value.as_bool() {
            cleaned.insert(key, if boolean { 1.0 } else { 0.0 });
            continue;
        }
        warn!("Skipping parameter `{}` due to non-numeric value {}", key, value);
    }

    Ok(cleaned)
}
