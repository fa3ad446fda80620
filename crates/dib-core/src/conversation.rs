//! Per-chat `/calculate` dialog.
//!
//! ```text
//! Idle --/calculate--> AwaitingInvestment --S--> AwaitingApy --APY--> AwaitingDays --t--> Idle
//!                          |
//!                          +--"S,APY,t,deal,symbol"--> market analysis --> Idle
//! ```
//!
//! Transitions are pure; [`ConversationStore`] keeps the state per chat.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    calculator::{parse_positive_int, DealParams, QuickParams},
    domain::ChatId,
};

pub const PROMPT_INVESTMENT: &str = "Inserisci l'importo dell'investimento (S), ad esempio 1000.\n\
Oppure inserisci tutti i parametri nel formato: \
investimento,APY,giorni trattativa,prezzo trattato,simbolo\n\
Esempio: 1000,57,3,1800,ETH-USD\n\n\
Puoi annullare con /cancel";

pub const PROMPT_APY: &str = "Inserisci l'APY in percentuale (es. 57).";

pub const PROMPT_DAYS: &str = "Inserisci la durata della trattativa in giorni (t).";

pub const FULL_FORMAT_HINT: &str = "Per favore, inserisci i parametri nel formato corretto: \
S,APY,t,deal,symbol\nEsempio: 1000,5,30,500,SOL";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingInvestment,
    AwaitingApy {
        investment: u64,
    },
    AwaitingDays {
        investment: u64,
        apy: u64,
    },
}

impl DialogState {
    pub fn is_active(self) -> bool {
        self != DialogState::Idle
    }
}

/// What the service has to do after a text message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Ask the next question.
    Prompt(&'static str),
    /// The answer was rejected; the state is unchanged.
    Invalid { error: String, hint: &'static str },
    /// All three numbers collected.
    Quick(QuickParams),
    /// Full parameter line received.
    Market(DealParams),
    /// Text outside of a dialog.
    NotInDialog,
}

/// Advance the dialog with a plain text answer.
pub fn on_text(state: DialogState, text: &str) -> (DialogState, Step) {
    match state {
        DialogState::Idle => (DialogState::Idle, Step::NotInDialog),

        DialogState::AwaitingInvestment if text.contains(',') => match DealParams::parse(text) {
            Ok(params) => (DialogState::Idle, Step::Market(params)),
            Err(e) => (state, invalid(e, FULL_FORMAT_HINT)),
        },

        DialogState::AwaitingInvestment => match parse_positive_int(text) {
            Ok(investment) => (
                DialogState::AwaitingApy { investment },
                Step::Prompt(PROMPT_APY),
            ),
            Err(e) => (state, invalid(e, PROMPT_INVESTMENT)),
        },

        DialogState::AwaitingApy { investment } => match parse_positive_int(text) {
            Ok(apy) => (
                DialogState::AwaitingDays { investment, apy },
                Step::Prompt(PROMPT_DAYS),
            ),
            Err(e) => (state, invalid(e, PROMPT_APY)),
        },

        DialogState::AwaitingDays { investment, apy } => match parse_positive_int(text) {
            Ok(days) => (
                DialogState::Idle,
                Step::Quick(QuickParams {
                    investment,
                    apy,
                    days,
                }),
            ),
            Err(e) => (state, invalid(e, PROMPT_DAYS)),
        },
    }
}

fn invalid(e: crate::Error, hint: &'static str) -> Step {
    Step::Invalid {
        error: e.to_string(),
        hint,
    }
}

/// Dialog state per chat. Idle chats are not stored.
#[derive(Default)]
pub struct ConversationStore {
    inner: Mutex<HashMap<ChatId, DialogState>>,
}

impl ConversationStore {
    pub async fn get(&self, chat_id: ChatId) -> DialogState {
        self.inner
            .lock()
            .await
            .get(&chat_id)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set(&self, chat_id: ChatId, state: DialogState) {
        let mut map = self.inner.lock().await;
        if state.is_active() {
            map.insert(chat_id, state);
        } else {
            map.remove(&chat_id);
        }
    }

    /// Reset to idle; returns whether a dialog was in progress.
    pub async fn reset(&self, chat_id: ChatId) -> bool {
        self.inner.lock().await.remove(&chat_id).is_some()
    }

    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_answers_reach_quick_calculation() {
        let (s, step) = on_text(DialogState::AwaitingInvestment, "1000");
        assert_eq!(s, DialogState::AwaitingApy { investment: 1000 });
        assert_eq!(step, Step::Prompt(PROMPT_APY));

        let (s, step) = on_text(s, "57");
        assert_eq!(
            s,
            DialogState::AwaitingDays {
                investment: 1000,
                apy: 57
            }
        );
        assert_eq!(step, Step::Prompt(PROMPT_DAYS));

        let (s, step) = on_text(s, " 3 ");
        assert_eq!(s, DialogState::Idle);
        assert_eq!(
            step,
            Step::Quick(QuickParams {
                investment: 1000,
                apy: 57,
                days: 3
            })
        );
    }

    #[test]
    fn invalid_answer_keeps_state() {
        let state = DialogState::AwaitingApy { investment: 10 };
        let (s, step) = on_text(state, "-1");
        assert_eq!(s, state);
        assert!(matches!(step, Step::Invalid { hint, .. } if hint == PROMPT_APY));
    }

    #[test]
    fn full_line_runs_market_flow() {
        let (s, step) = on_text(DialogState::AwaitingInvestment, "1000,57,3,1800,ETH-USD");
        assert_eq!(s, DialogState::Idle);
        let Step::Market(params) = step else {
            panic!("expected market step, got {step:?}");
        };
        assert_eq!(params.symbol, "ETH-USD");
        assert_eq!(params.deal_price, 1800);
    }

    #[test]
    fn bad_full_line_reports_parameter_error() {
        let (s, step) = on_text(DialogState::AwaitingInvestment, "1000,57");
        assert_eq!(s, DialogState::AwaitingInvestment);
        assert_eq!(
            step,
            Step::Invalid {
                error: "Numero errato di parametri".to_string(),
                hint: FULL_FORMAT_HINT,
            }
        );
    }

    #[test]
    fn idle_text_is_not_part_of_a_dialog() {
        assert_eq!(
            on_text(DialogState::Idle, "1000"),
            (DialogState::Idle, Step::NotInDialog)
        );
    }

    #[tokio::test]
    async fn store_tracks_only_active_chats() {
        let store = ConversationStore::default();
        let a = ChatId(1);
        let b = ChatId(2);

        assert_eq!(store.get(a).await, DialogState::Idle);
        store.set(a, DialogState::AwaitingInvestment).await;
        store.set(b, DialogState::AwaitingApy { investment: 5 }).await;
        assert_eq!(store.active_count().await, 2);

        store.set(b, DialogState::Idle).await;
        assert_eq!(store.active_count().await, 1);

        assert!(store.reset(a).await);
        assert!(!store.reset(a).await);
        assert_eq!(store.get(a).await, DialogState::Idle);
    }
}
