//! Telegram HTML rendering of calculation results.

use crate::calculator::{NetGainReport, QuickResult};

const RULE: &str = "---------------------------------------------------";

/// Upper bound on the length of an `&name;` entity, in chars.
const MAX_ENTITY_LEN: usize = 8;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn format_quick_result(r: &QuickResult) -> String {
    let p = r.params;
    [
        "📊 <b>Risultato del calcolo</b>".to_string(),
        String::new(),
        format!("💰 Importo investimento: {}", p.investment),
        format!("📈 APY: {}%", p.apy),
        format!("⌛ Periodo: {} giorni", p.days),
        RULE.to_string(),
        format!("💸 Interesse guadagnato: {:.2}", r.interest),
        format!("🎲 Perdita su acquisto (stima casuale): {:.2}", r.purchase_loss),
        RULE.to_string(),
        format!("💸 <b>Guadagno netto: {:.2}</b>", r.net_gain),
        RULE.to_string(),
    ]
    .join("\n")
}

pub fn format_net_gain_report(r: &NetGainReport) -> String {
    let p = &r.params;
    let fb = &r.feedback;

    let mut lines = vec![
        "📊 <b>Risultato del calcolo</b>".to_string(),
        String::new(),
        format!("💰 Importo investimento: {}", p.investment),
        format!("📈 APY: {}%", p.apy),
        format!("⌛ Periodo: {} giorni", p.days),
        format!(
            "🏷️ Prezzo target {}: {}",
            escape_html(&p.symbol),
            p.deal_price
        ),
        RULE.to_string(),
        format!("💸 Interesse guadagnato: {:.2}", r.interest),
        format!("🥂 Prezzo di break-even: {:.2}", r.breakeven_price),
        format!("🔍 Prezzo previsto: {:.2}", r.predicted_price),
        format!(
            "📉 RSI: {:.2} (divergenza {})",
            r.rsi.value,
            r.rsi.divergence.label()
        ),
        format!("❌ Perdita su acquisto: {:.2}", r.purchase_loss),
        RULE.to_string(),
        format!("💸 <b>Guadagno netto: {:.2}</b>", r.net_gain),
        RULE.to_string(),
        String::new(),
        "📊 <b>Feedback analisi tecnica:</b>".to_string(),
        format!("🎯 Score: {:.2}/{:.2}", fb.score, fb.max_score),
    ];
    lines.extend(fb.warnings.iter().map(|w| format!("⚠️ {}", escape_html(w))));
    lines.push(format!("🧠 Feedback: {}", escape_html(&fb.feedback)));
    lines.push(format!(
        "✨ Azioni suggerite: {}",
        fb.suggested_action.label()
    ));
    lines.join("\n")
}

/// Split `text` into chunks of at most `limit` bytes, preferring line boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    let mut chunk = String::new();
    for line in text.split('\n') {
        let needed = if chunk.is_empty() {
            line.len()
        } else {
            chunk.len() + 1 + line.len()
        };
        if needed <= limit {
            if !chunk.is_empty() {
                chunk.push('\n');
            }
            chunk.push_str(line);
            continue;
        }

        if !chunk.is_empty() {
            out.push(std::mem::take(&mut chunk));
        }
        if line.len() <= limit {
            chunk.push_str(line);
            continue;
        }

        // A single oversized line: hard-split on char boundaries, never inside an entity.
        for piece in html_pieces(line) {
            if !chunk.is_empty() && chunk.len() + piece.len() > limit {
                out.push(std::mem::take(&mut chunk));
            }
            chunk.push_str(piece);
        }
    }
    if !chunk.is_empty() {
        out.push(chunk);
    }
    out
}

/// Single chars of `line`, with each `&name;` entity kept as one piece.
fn html_pieces(line: &str) -> impl Iterator<Item = &str> {
    let mut rest = line;
    std::iter::from_fn(move || {
        let ch = rest.chars().next()?;
        let len = if ch == '&' {
            rest.char_indices()
                .take(MAX_ENTITY_LEN)
                .find(|&(_, c)| c == ';')
                .map_or(1, |(i, _)| i + 1)
        } else {
            ch.len_utf8()
        };
        let (piece, tail) = rest.split_at(len);
        rest = tail;
        Some(piece)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{Divergence, RsiReport, SuggestedAction, TaFeedback},
        calculator::{DealParams, QuickParams},
    };

    #[test]
    fn escapes_html() {
        assert_eq!(escape_html("<a&b>\""), "&lt;a&amp;b&gt;&quot;");
    }

    #[test]
    fn quick_result_lists_inputs_and_net_gain() {
        let r = QuickResult {
            params: QuickParams {
                investment: 1000,
                apy: 57,
                days: 3,
            },
            interest_rate: 0.0047,
            interest: 4.684,
            purchase_loss: 12.5,
            net_gain: -7.816,
        };
        let html = format_quick_result(&r);
        assert!(html.contains("💰 Importo investimento: 1000"));
        assert!(html.contains("📈 APY: 57%"));
        assert!(html.contains("⌛ Periodo: 3 giorni"));
        assert!(html.contains("Interesse guadagnato: 4.68"));
        assert!(html.contains("stima casuale): 12.50"));
        assert!(html.contains("<b>Guadagno netto: -7.82</b>"));
    }

    #[test]
    fn net_gain_report_includes_feedback_and_escapes_text() {
        let r = NetGainReport {
            params: DealParams {
                investment: 1000,
                apy: 57,
                days: 3,
                deal_price: 1800,
                symbol: "ETH<USD".to_string(),
            },
            interest_rate: 0.004685,
            interest: 4.6849,
            breakeven_price: 1791.57,
            predicted_price: 1795.123,
            purchase_loss: 2.7,
            net_gain: 1.9849,
            rsi: RsiReport {
                value: 28.456,
                divergence: Divergence::Positive,
            },
            feedback: TaFeedback {
                score: 2.5,
                max_score: 4.0,
                feedback: "Condizioni tecniche miste".to_string(),
                warnings: vec!["RSI molto basso (25): rimbalzo".to_string(), "a < b".to_string()],
                suggested_action: SuggestedAction::Wait,
            },
        };
        let html = format_net_gain_report(&r);
        assert!(html.contains("🏷️ Prezzo target ETH&lt;USD: 1800"));
        assert!(html.contains("🥂 Prezzo di break-even: 1791.57"));
        assert!(html.contains("🔍 Prezzo previsto: 1795.12"));
        assert!(html.contains("📉 RSI: 28.46 (divergenza positiva)"));
        assert!(html.contains("<b>Guadagno netto: 1.98</b>"));
        assert!(html.contains("🎯 Score: 2.50/4.00"));
        assert!(html.contains("⚠️ RSI molto basso (25): rimbalzo\n⚠️ a &lt; b"));
        assert!(html.ends_with("✨ Azioni suggerite: aspetta"));
    }

    #[test]
    fn split_keeps_short_text_whole() {
        assert_eq!(split_message("hello", 10), vec!["hello".to_string()]);
    }

    #[test]
    fn split_prefers_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(
            split_message(text, 9),
            vec!["aaaa\nbbbb".to_string(), "cccc".to_string()]
        );
    }

    #[test]
    fn split_hard_splits_long_lines_on_char_boundaries() {
        let text = "ééééé"; // 10 bytes
        let chunks = split_message(text, 4);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
        assert!(chunks.iter().all(|c| c.len() <= 4));
    }

    #[test]
    fn split_keeps_escaped_entities_whole() {
        let text = escape_html(&format!(
            "Errore: '{}' non è un numero intero",
            "&".repeat(1000)
        ));
        let chunks = split_message(&text, 4000);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), text);
        assert!(chunks[0].ends_with("&amp;"));
        for chunk in &chunks {
            assert!(chunk.len() <= 4000);
            assert_eq!(chunk.matches('&').count(), chunk.matches("&amp;").count());
        }
    }

    #[test]
    fn split_treats_bare_ampersand_as_a_char() {
        assert_eq!(split_message("a&bcdefghij", 3), vec!["a&b", "cde", "fgh", "ij"]);
    }
}
