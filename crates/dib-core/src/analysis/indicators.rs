//! Price/volume indicators over plain `f64` series (oldest first).

use serde::Serialize;

use crate::{errors::Error, Result};

/// Retracement ratios, labelled the way traders quote them.
pub const FIBONACCI_RATIOS: [(&str, f64); 7] = [
    ("0.0%", 0.0),
    ("23.6%", 0.236),
    ("38.2%", 0.382),
    ("50.0%", 0.5),
    ("61.8%", 0.618),
    ("78.6%", 0.786),
    ("100.0%", 1.0),
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FibLevel {
    pub label: &'static str,
    pub ratio: f64,
    pub price: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Divergence {
    /// Price falling while RSI rises.
    Positive,
    /// Price rising while RSI falls.
    Negative,
    Absent,
}

impl Divergence {
    pub fn label(self) -> &'static str {
        match self {
            Divergence::Positive => "positiva",
            Divergence::Negative => "negativa",
            Divergence::Absent => "nessuna",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RsiAnalysis {
    pub value: f64,
    pub divergence: Divergence,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeAnalysis {
    pub above_ma_pct: f64,
    pub spike_pct: f64,
}

/// The last `n` items of `xs` (all of them when shorter).
pub(crate) fn tail<T>(xs: &[T], n: usize) -> &[T] {
    &xs[xs.len().saturating_sub(n)..]
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Fibonacci retracement levels between the max and min of the last `lookback` closes.
pub fn fibonacci_retracement(closes: &[f64], lookback: usize) -> Result<Vec<FibLevel>> {
    let closes = tail(closes, lookback);
    if closes.is_empty() {
        return Err(Error::InsufficientData(
            "no closes for fibonacci retracement".to_string(),
        ));
    }

    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let diff = max - min;

    Ok(FIBONACCI_RATIOS
        .iter()
        .map(|&(label, ratio)| {
            let price = if ratio >= 1.0 {
                min
            } else {
                max - ratio * diff
            };
            FibLevel {
                label,
                ratio,
                price,
            }
        })
        .collect())
}

/// Support levels where at least `min_touches` hourly lows of the last
/// `window_days` days sit within `tolerance` (relative) of each other.
///
/// Levels are rounded to the nearest hundred, deduplicated and sorted.
pub fn find_support_clusters(
    lows: &[f64],
    window_days: usize,
    min_touches: usize,
    tolerance: f64,
) -> Vec<f64> {
    let lows = tail(lows, window_days * 24);

    let mut clusters: Vec<f64> = lows
        .iter()
        .copied()
        .filter(|&price| {
            let touches = lows
                .iter()
                .filter(|&&l| (l - price).abs() < price * tolerance)
                .count();
            touches >= min_touches
        })
        .map(|price| (price / 100.0).round() * 100.0)
        .collect();

    clusters.sort_by(f64::total_cmp);
    clusters.dedup();
    clusters
}

/// Wilder RSI series. Entries before the first full `period` are `NaN`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    let p = period as f64;
    avg_gain /= p;
    avg_loss /= p;
    out[period] = rsi_value(avg_gain, avg_loss);

    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        0.0
    } else {
        100.0 * avg_gain / total
    }
}

/// Current RSI plus a divergence check between the last two 5-bar blocks.
pub fn rsi_analysis(closes: &[f64], period: usize) -> Result<RsiAnalysis> {
    if closes.len() < period + 10 {
        return Err(Error::InsufficientData(format!(
            "rsi needs at least {} closes, got {}",
            period + 10,
            closes.len()
        )));
    }

    let rsi = rsi_series(closes, period);
    let n = closes.len();
    let value = rsi[n - 1];

    let price_trend = mean(&closes[n - 5..]) - mean(&closes[n - 10..n - 5]);
    let rsi_trend = mean(&rsi[n - 5..]) - mean(&rsi[n - 10..n - 5]);

    let divergence = if price_trend < 0.0 && rsi_trend > 0.0 {
        Divergence::Positive
    } else if price_trend > 0.0 && rsi_trend < 0.0 {
        Divergence::Negative
    } else {
        Divergence::Absent
    };

    Ok(RsiAnalysis { value, divergence })
}

/// Rolling mean of width `width`; `None` until the window is full.
fn rolling_mean(xs: &[f64], width: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(xs.len());
    let mut sum = 0.0;
    for (i, x) in xs.iter().enumerate() {
        sum += x;
        if i >= width {
            sum -= xs[i - width];
        }
        if i + 1 >= width {
            out.push(Some(sum / width as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// Volume of the last bar against its moving average (width `window / 3`),
/// and the largest of the last 10 volumes against the recent average.
pub fn volume_analysis(volumes: &[f64], window: usize) -> Result<VolumeAnalysis> {
    let vol = tail(volumes, window);
    let Some(&current_vol) = vol.last() else {
        return Err(Error::InsufficientData(
            "no volumes for volume analysis".to_string(),
        ));
    };

    let ma = rolling_mean(vol, (window / 3).max(1));

    let above_ma_pct = match ma.last().copied().flatten() {
        Some(current_ma) if current_ma > 0.0 => 100.0 * (current_vol - current_ma) / current_ma,
        _ => 0.0,
    };

    let recent_vol = tail(vol, 10);
    let recent_ma: Option<Vec<f64>> = tail(&ma, 10).iter().copied().collect();
    let recent_max = recent_vol
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let spike_pct = match recent_ma.map(|m| mean(&m)) {
        Some(avg) if avg > 0.0 => 100.0 * (recent_max - avg) / avg,
        _ => 0.0,
    };

    Ok(VolumeAnalysis {
        above_ma_pct,
        spike_pct,
    })
}
