//! Automated technical analysis over an hourly candle series.
//!
//! `auto_ta_analysis` combines support levels (Fibonacci + clusters of lows),
//! RSI with divergence, volume anomalies and a Monte Carlo price forecast
//! into a single [`TaReport`]; [`feedback`] turns that report into a verdict.

use rand::Rng;
use serde::Serialize;

use crate::{
    config::Config,
    market::{closes, lows, volumes, Candle},
    Result,
};

pub mod feedback;
pub mod indicators;
pub mod montecarlo;

pub use feedback::{ta_report_feedback, SuggestedAction, TaFeedback};
pub use indicators::{Divergence, FibLevel};

/// Tunables of the analysis pipeline. Windows are in bars (hours).
#[derive(Clone, Debug)]
pub struct AnalysisParams {
    pub fibonacci_lookback: usize,
    pub support_window_days: usize,
    pub support_min_touches: usize,
    pub support_tolerance: f64,
    pub rsi_period: usize,
    pub volume_window: usize,
    pub monte_carlo_days: u32,
    pub monte_carlo_simulations: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            fibonacci_lookback: 60 * 24,
            support_window_days: 30,
            support_min_touches: 3,
            support_tolerance: 0.002,
            rsi_period: 14,
            volume_window: 30 * 24,
            monte_carlo_days: 30,
            monte_carlo_simulations: 1000,
        }
    }
}

impl AnalysisParams {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            monte_carlo_days: cfg.monte_carlo_days,
            monte_carlo_simulations: cfg.monte_carlo_simulations,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaReport {
    pub supports: SupportReport,
    pub rsi: RsiReport,
    pub volumes: VolumeReport,
    pub montecarlo: MonteCarloReport,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SupportReport {
    pub fibonacci: Vec<FibLevel>,
    pub clusters: Vec<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RsiReport {
    pub value: f64,
    pub divergence: Divergence,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VolumeReport {
    pub above_ma_pct: f64,
    pub spike_pct: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MonteCarloReport {
    /// Probability (percent) that the simulated price ends above the target.
    pub prob_above_target_pct: f64,
    pub bull_case: f64,
    pub base_case: f64,
    pub bear_case: f64,
    pub daily_volatility_pct: f64,
}

pub fn auto_ta_analysis<R: Rng + ?Sized>(
    candles: &[Candle],
    target: f64,
    params: &AnalysisParams,
    rng: &mut R,
) -> Result<TaReport> {
    let closes = closes(candles);
    let lows = lows(candles);
    let volumes = volumes(candles);

    let fibonacci = indicators::fibonacci_retracement(&closes, params.fibonacci_lookback)?;
    let clusters = indicators::find_support_clusters(
        &lows,
        params.support_window_days,
        params.support_min_touches,
        params.support_tolerance,
    );
    let rsi = indicators::rsi_analysis(&closes, params.rsi_period)?;
    let vol = indicators::volume_analysis(&volumes, params.volume_window)?;
    let mc = montecarlo::monte_carlo_forecast(
        &closes,
        params.monte_carlo_days,
        params.monte_carlo_simulations,
        target,
        rng,
    )?;

    Ok(TaReport {
        supports: SupportReport {
            fibonacci,
            clusters,
        },
        rsi: RsiReport {
            value: round_to(rsi.value, 2),
            divergence: rsi.divergence,
        },
        volumes: VolumeReport {
            above_ma_pct: round_to(vol.above_ma_pct, 2),
            spike_pct: round_to(vol.spike_pct, 2),
        },
        montecarlo: MonteCarloReport {
            prob_above_target_pct: round_to(100.0 * mc.prob_above_target, 1),
            bull_case: round_to(mc.bull, 2),
            base_case: round_to(mc.base, 2),
            bear_case: round_to(mc.bear, 2),
            daily_volatility_pct: round_to(100.0 * mc.sigma, 2),
        },
    })
}

pub(crate) fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}
