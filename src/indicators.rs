//! Rolling indicator calculations over already-materialized price windows.
//!
//! Every function returns `None` when the window is shorter than the
//! requested period; callers treat that as "no signal", never as an error.

/// Simple moving average of the last `period` values.
pub fn latest_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Average True Range: arithmetic mean of the last `period` true ranges,
/// where TR = max(high - low, |high - prev_close|, |low - prev_close|).
///
/// Needs `period + 1` bars since the first TR consumes a previous close.
pub fn latest_atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let len = closes.len();
    if period == 0 || len < period + 1 || highs.len() != len || lows.len() != len {
        return None;
    }

    let mut tr_values = Vec::with_capacity(len - 1);
    for i in 1..len {
        let tr = (highs[i] - lows[i])
            .max((highs[i] - closes[i - 1]).abs())
            .max((lows[i] - closes[i - 1]).abs());
        tr_values.push(tr);
    }

    let window = &tr_values[tr_values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
