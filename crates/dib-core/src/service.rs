use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    analysis::{auto_ta_analysis, ta_report_feedback, AnalysisParams},
    calculator::{calculate_net_gain, quick_net_gain, DealParams},
    config::Config,
    conversation::{on_text, ConversationStore, DialogState, Step, PROMPT_INVESTMENT},
    domain::ChatId,
    formatting::{escape_html, format_net_gain_report, format_quick_result, split_message},
    market::MarketDataPort,
    messaging::{
        port::MessagingPort,
        types::{BotCommandSpec, ChatAction, Command, IncomingUpdate, TextMessage},
    },
    Result,
};

const BOT_COMMANDS: [BotCommandSpec; 4] = [
    BotCommandSpec {
        name: "start",
        description: "Avvia il bot",
    },
    BotCommandSpec {
        name: "help",
        description: "Mostra aiuto",
    },
    BotCommandSpec {
        name: "calculate",
        description: "Calcola guadagno netto",
    },
    BotCommandSpec {
        name: "cancel",
        description: "Annulla l'operazione",
    },
];

const HELP_TEXT: &str = "Questo bot calcola il guadagno netto di una trattativa Nexo Dual \
investment, considerando gli interessi guadagnati e la possibile perdita di acquisto\n\n\
Comandi disponibili:\n\
/start - Avvia il bot\n\
/help - Mostra questo messaggio di aiuto\n\
/calculate - Calcola guadagno netto, come interessi guadagnati meno perdita di acquisto: G = I - P\n\
/cancel - Annulla l'operazione in corso";

const AGAIN_HINT: &str = "Puoi calcolare di nuovo usando il comando /calculate";
const CANCELLED: &str = "Operazione annullata.";
const NOT_IN_DIALOG: &str = "Usa /calculate per calcolare il guadagno netto, oppure /help.";
const UNKNOWN_COMMAND: &str = "Comando non riconosciuto. Usa /help per l'elenco dei comandi.";
const GENERIC_FAILURE: &str =
    "Si è verificato un errore durante l'elaborazione. Riprova con /calculate";

/// Commands advertised in the Telegram client menu.
pub fn bot_commands() -> &'static [BotCommandSpec] {
    &BOT_COMMANDS
}

/// Application service: routes updates through the dialog and runs calculations.
pub struct BotService {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    market: Arc<dyn MarketDataPort>,
    conversations: ConversationStore,
    rng: Mutex<StdRng>,
}

impl BotService {
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        market: Arc<dyn MarketDataPort>,
    ) -> Self {
        Self::with_rng(cfg, messenger, market, StdRng::from_entropy())
    }

    pub fn with_rng(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        market: Arc<dyn MarketDataPort>,
        rng: StdRng,
    ) -> Self {
        Self {
            cfg,
            messenger,
            market,
            conversations: ConversationStore::default(),
            rng: Mutex::new(rng),
        }
    }

    pub async fn dialog_state(&self, chat_id: ChatId) -> DialogState {
        self.conversations.get(chat_id).await
    }

    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        match update {
            IncomingUpdate::Command(cmd) => self.handle_command(cmd).await,
            IncomingUpdate::Text(msg) => self.handle_text(msg).await,
        }
    }

    async fn handle_command(&self, cmd: Command) -> Result<()> {
        info!(chat_id = cmd.chat_id.0, command = %cmd.name, "command received");
        let chat_id = cmd.chat_id;

        match cmd.name.as_str() {
            "start" => {
                let name = cmd.first_name.as_deref().unwrap_or("investitore");
                let text = format!(
                    "Ciao {}! Sono un bot per aiutarti a non farti fregare da Nexo Dual investment.\n\n\
                     Usa il comando /help per investire responsabilmente.",
                    escape_html(name)
                );
                self.send(chat_id, &text).await
            }
            "help" => self.send(chat_id, &escape_html(HELP_TEXT)).await,
            "calculate" => {
                self.conversations
                    .set(chat_id, DialogState::AwaitingInvestment)
                    .await;
                if cmd.args.is_empty() {
                    return self.send(chat_id, &escape_html(PROMPT_INVESTMENT)).await;
                }
                // `/calculate 1000,57,3,1800,ETH-USD` answers the first prompt directly.
                self.answer(chat_id, &cmd.args).await
            }
            "cancel" => {
                if self.conversations.reset(chat_id).await {
                    debug!(chat_id = chat_id.0, "dialog cancelled");
                }
                self.send(chat_id, CANCELLED).await
            }
            _ => self.send(chat_id, UNKNOWN_COMMAND).await,
        }
    }

    async fn handle_text(&self, msg: TextMessage) -> Result<()> {
        self.answer(msg.chat_id, &msg.text).await
    }

    async fn answer(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let state = self.conversations.get(chat_id).await;
        let (next, step) = on_text(state, text);
        self.conversations.set(chat_id, next).await;
        let active_dialogs = self.conversations.active_count().await;
        debug!(
            chat_id = chat_id.0,
            ?state,
            ?next,
            active_dialogs,
            "dialog step"
        );

        match step {
            Step::Prompt(prompt) => self.send(chat_id, &escape_html(prompt)).await,
            Step::Invalid { error, hint } => {
                let text = format!("Errore: {error}\n{hint}");
                self.send(chat_id, &escape_html(&text)).await
            }
            Step::Quick(params) => {
                let result = {
                    let mut rng = self.rng.lock().await;
                    quick_net_gain(params, &mut *rng)
                };
                info!(
                    chat_id = chat_id.0,
                    investment = params.investment,
                    apy = params.apy,
                    days = params.days,
                    net_gain = result.net_gain,
                    "quick calculation done"
                );
                self.send(chat_id, &format_quick_result(&result)).await?;
                self.send(chat_id, AGAIN_HINT).await
            }
            Step::Market(params) => match self.run_market(chat_id, params).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!(chat_id = chat_id.0, "error processing parameters: {e}");
                    self.send(chat_id, GENERIC_FAILURE).await
                }
            },
            Step::NotInDialog => self.send(chat_id, NOT_IN_DIALOG).await,
        }
    }

    async fn run_market(&self, chat_id: ChatId, params: DealParams) -> Result<()> {
        if let Err(e) = self
            .messenger
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
        {
            warn!("failed to send typing action: {e}");
        }

        let started = Instant::now();
        let lookback_days = u32::try_from(params.days.saturating_mul(2)).unwrap_or(u32::MAX);
        let candles = self
            .market
            .fetch_ohlcv(&params.symbol, &self.cfg.ta_timeframe, lookback_days)
            .await?;
        debug!(
            symbol = %params.symbol,
            candles = candles.len(),
            lookback_days,
            "market data fetched"
        );

        // Each analysis gets its own generator so the shared one is not held while simulating.
        let seed: u64 = self.rng.lock().await.gen();
        let mut rng = StdRng::seed_from_u64(seed);
        let analysis_params = AnalysisParams::from_config(&self.cfg);
        let report = auto_ta_analysis(
            &candles,
            params.deal_price as f64,
            &analysis_params,
            &mut rng,
        )?;
        debug!(report = %serde_json::to_string(&report)?, "technical analysis report");

        let feedback = ta_report_feedback(&report, None);
        let result = calculate_net_gain(params, &report, feedback);
        info!(
            chat_id = chat_id.0,
            symbol = %result.params.symbol,
            net_gain = result.net_gain,
            action = result.feedback.suggested_action.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "market calculation done"
        );

        self.send(chat_id, &format_net_gain_report(&result)).await?;
        self.send(chat_id, AGAIN_HINT).await
    }

    async fn send(&self, chat_id: ChatId, html: &str) -> Result<()> {
        for chunk in split_message(html, self.cfg.telegram_safe_limit) {
            self.messenger.send_html(chat_id, &chunk).await?;
        }
        Ok(())
    }
}
