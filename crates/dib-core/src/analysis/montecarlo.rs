use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{errors::Error, Result};

/// Floor for the daily volatility so a flat series still produces a spread.
pub const MIN_SIGMA: f64 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonteCarloForecast {
    /// Share of simulated paths ending above the target, in `[0, 1]`.
    pub prob_above_target: f64,
    /// 80th percentile.
    pub bull: f64,
    /// Median.
    pub base: f64,
    /// 20th percentile.
    pub bear: f64,
    pub sigma: f64,
}

/// Geometric random walk on the historical log returns of `closes`.
///
/// Each of `n_sim` paths starts at the last close and compounds `days`
/// normally distributed log returns.
pub fn monte_carlo_forecast<R: Rng + ?Sized>(
    closes: &[f64],
    days: u32,
    n_sim: usize,
    target: f64,
    rng: &mut R,
) -> Result<MonteCarloForecast> {
    let log_returns: Vec<f64> = closes
        .windows(2)
        .map(|w| (w[1] / w[0]).ln())
        .filter(|r| r.is_finite())
        .collect();
    if log_returns.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "monte carlo needs at least 3 closes, got {}",
            closes.len()
        )));
    }
    let Some(&s0) = closes.last() else {
        return Err(Error::InsufficientData("no closes".to_string()));
    };

    let n = log_returns.len() as f64;
    let mu = log_returns.iter().sum::<f64>() / n;
    let variance = log_returns.iter().map(|r| (r - mu).powi(2)).sum::<f64>() / (n - 1.0);
    let mut sigma = variance.sqrt();
    if !(sigma >= MIN_SIGMA) {
        sigma = MIN_SIGMA;
    }

    let normal = Normal::new(mu, sigma)
        .map_err(|e| Error::InsufficientData(format!("invalid return distribution: {e}")))?;

    let n_sim = n_sim.max(1);
    let mut results: Vec<f64> = Vec::with_capacity(n_sim);
    for _ in 0..n_sim {
        let mut price = s0;
        for _ in 0..days {
            price *= normal.sample(&mut *rng).exp();
        }
        results.push(price);
    }

    let above = results.iter().filter(|&&p| p > target).count();
    let prob_above_target = above as f64 / n_sim as f64;

    results.sort_by(f64::total_cmp);
    Ok(MonteCarloForecast {
        prob_above_target,
        bull: percentile(&results, 80.0),
        base: percentile(&results, 50.0),
        bear: percentile(&results, 20.0),
        sigma,
    })
}

/// Percentile of an ascending, non-empty slice with linear interpolation.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
