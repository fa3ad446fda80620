//! Turn a [`TaReport`] into a score, warnings and a suggested action.

use serde::Serialize;

use crate::analysis::{round_to, Divergence, TaReport};

/// One point per filter: RSI, supports, volumes, Monte Carlo.
pub const MAX_SCORE: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    Enter,
    Wait,
    Avoid,
}

impl SuggestedAction {
    pub fn label(self) -> &'static str {
        match self {
            SuggestedAction::Enter => "entra",
            SuggestedAction::Wait => "aspetta",
            SuggestedAction::Avoid => "evita",
        }
    }

    fn feedback(self) -> &'static str {
        match self {
            SuggestedAction::Enter => {
                "Condizioni tecniche favorevoli: puoi considerare di entrare nel mercato."
            }
            SuggestedAction::Wait => {
                "Condizioni tecniche miste: valuta con cautela, potresti aspettare conferme."
            }
            SuggestedAction::Avoid => {
                "Condizioni tecniche sfavorevoli: meglio evitare l'ingresso ora."
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaFeedback {
    pub score: f64,
    pub max_score: f64,
    pub feedback: String,
    pub warnings: Vec<String>,
    pub suggested_action: SuggestedAction,
}

/// Score the report. `current_price` defaults to the Monte Carlo base case.
pub fn ta_report_feedback(report: &TaReport, current_price: Option<f64>) -> TaFeedback {
    let mut warnings = Vec::new();
    let mut score = 0.0;

    score += rsi_score(report, &mut warnings);
    score += support_score(report, current_price, &mut warnings);
    score += volume_score(report, &mut warnings);
    score += montecarlo_score(report, &mut warnings);

    let action = suggest(score);
    TaFeedback {
        score: round_to(score, 2),
        max_score: MAX_SCORE,
        feedback: action.feedback().to_string(),
        warnings,
        suggested_action: action,
    }
}

fn suggest(score: f64) -> SuggestedAction {
    let pct = score / MAX_SCORE * 100.0;
    if pct >= 75.0 {
        SuggestedAction::Enter
    } else if pct >= 50.0 {
        SuggestedAction::Wait
    } else {
        SuggestedAction::Avoid
    }
}

fn rsi_score(report: &TaReport, warnings: &mut Vec<String>) -> f64 {
    let mut score = 0.0;
    match report.rsi.divergence {
        Divergence::Absent => score += 1.0,
        Divergence::Positive => {
            score += 1.0;
            warnings.push("Divergenza RSI positiva: possibile inversione rialzista.".to_string());
        }
        Divergence::Negative => {
            warnings.push("Divergenza RSI negativa: possibile inversione ribassista.".to_string());
        }
    }

    let rsi = report.rsi.value;
    if rsi > 70.0 {
        warnings.push(format!("RSI molto alto ({rsi:?}): rischio ipercomprato."));
    } else if rsi < 30.0 {
        warnings.push(format!("RSI molto basso ({rsi:?}): possibile rimbalzo tecnico."));
        score += 0.5;
    }
    score
}

fn support_score(
    report: &TaReport,
    current_price: Option<f64>,
    warnings: &mut Vec<String>,
) -> f64 {
    let levels = &report.supports.fibonacci;
    if levels.is_empty() {
        return 0.0;
    }
    let min_support = levels.iter().map(|l| l.price).fold(f64::INFINITY, f64::min);
    let max_resistance = levels
        .iter()
        .map(|l| l.price)
        .fold(f64::NEG_INFINITY, f64::max);
    let price = current_price.unwrap_or(report.montecarlo.base_case);

    if price <= min_support * 1.02 {
        warnings.push("Prezzo vicino a un supporto chiave: rischio drawdown limitato.".to_string());
        1.0
    } else {
        if price >= max_resistance * 0.98 {
            warnings.push(
                "Prezzo vicino a una resistenza importante: attenzione a possibili ritracciamenti."
                    .to_string(),
            );
        }
        0.0
    }
}

fn volume_score(report: &TaReport, warnings: &mut Vec<String>) -> f64 {
    let mut score = 0.0;
    let above = report.volumes.above_ma_pct;
    if above > 10.0 {
        score += 1.0;
        warnings.push("Volumi sopra la media: conferma di interesse sul mercato.".to_string());
    } else if above < -10.0 {
        warnings.push("Volumi sotto la media: attenzione a segnali deboli.".to_string());
    }
    if report.volumes.spike_pct > 20.0 {
        warnings.push(
            "Spike di volume recente: possibile fase di accumulazione/distribuzione.".to_string(),
        );
    }
    score
}

fn montecarlo_score(report: &TaReport, warnings: &mut Vec<String>) -> f64 {
    let prob = report.montecarlo.prob_above_target_pct;
    if prob > 60.0 {
        warnings.push(format!(
            "Probabilità Monte Carlo di superare il target elevata: {prob:?}%."
        ));
        1.0
    } else {
        if prob < 30.0 {
            warnings.push(format!(
                "Probabilità Monte Carlo di superare il target bassa: {prob:?}%."
            ));
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        indicators::fibonacci_retracement, MonteCarloReport, RsiReport, SupportReport,
        VolumeReport,
    };

    fn report(
        rsi: f64,
        divergence: Divergence,
        above: f64,
        spike: f64,
        prob: f64,
        base: f64,
    ) -> TaReport {
        TaReport {
            supports: SupportReport {
                fibonacci: fibonacci_retracement(&[1000.0, 2000.0], 10).unwrap(),
                clusters: vec![],
            },
            rsi: RsiReport {
                value: rsi,
                divergence,
            },
            volumes: VolumeReport {
                above_ma_pct: above,
                spike_pct: spike,
            },
            montecarlo: MonteCarloReport {
                prob_above_target_pct: prob,
                bull_case: base * 1.1,
                base_case: base,
                bear_case: base * 0.9,
                daily_volatility_pct: 1.0,
            },
        }
    }

    #[test]
    fn all_filters_positive_suggests_entering() {
        let r = report(25.0, Divergence::Positive, 15.0, 25.0, 70.0, 1010.0);
        let fb = ta_report_feedback(&r, None);
        assert_eq!(fb.score, 4.5);
        assert_eq!(fb.max_score, MAX_SCORE);
        assert_eq!(fb.suggested_action, SuggestedAction::Enter);
        assert_eq!(fb.warnings.len(), 6);
        assert_eq!(
            fb.warnings[1],
            "RSI molto basso (25.0): possibile rimbalzo tecnico."
        );
        assert_eq!(
            fb.warnings.last().unwrap(),
            "Probabilità Monte Carlo di superare il target elevata: 70.0%."
        );
    }

    #[test]
    fn mixed_conditions_suggest_waiting() {
        // No divergence (+1), price mid-range, average volumes (0), high probability (+1).
        let r = report(50.0, Divergence::Absent, 0.0, 0.0, 65.0, 1500.0);
        let fb = ta_report_feedback(&r, None);
        assert_eq!(fb.score, 2.0);
        assert_eq!(fb.suggested_action, SuggestedAction::Wait);
        assert_eq!(fb.warnings.len(), 1);
    }

    #[test]
    fn bearish_conditions_suggest_avoiding() {
        let r = report(80.0, Divergence::Negative, -20.0, 0.0, 10.0, 1990.0);
        let fb = ta_report_feedback(&r, None);
        assert_eq!(fb.score, 0.0);
        assert_eq!(fb.suggested_action, SuggestedAction::Avoid);
        assert_eq!(fb.suggested_action.label(), "evita");
        assert!(fb.warnings.iter().any(|w| w.contains("resistenza")));
        assert!(fb.warnings.iter().any(|w| w.contains("ipercomprato")));
        assert!(fb.warnings.iter().any(|w| w.ends_with("bassa: 10.0%.")));
        assert!(fb.warnings.iter().any(|w| w.contains("(80.0)")));
    }

    #[test]
    fn explicit_current_price_overrides_base_case() {
        let r = report(50.0, Divergence::Absent, 0.0, 0.0, 50.0, 1990.0);
        let near_support = ta_report_feedback(&r, Some(1005.0));
        assert_eq!(near_support.score, 2.0);
        assert!(near_support.warnings[0].contains("supporto chiave"));
    }
}
