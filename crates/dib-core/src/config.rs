use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub debug: bool,

    // Market data
    pub market_api_base: String,
    pub market_timeout: Duration,

    // Technical analysis
    pub ta_timeframe: String,
    pub monte_carlo_days: u32,
    pub monte_carlo_simulations: usize,

    // Telegram limits
    pub telegram_safe_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "No TELEGRAM_BOT_TOKEN found in environment variables. \
                 Create a .env file with your bot token."
                    .to_string(),
            ));
        }

        let debug = parse_bool(lookup("DEBUG")).unwrap_or(false);

        let market_api_base = lookup("MARKET_API_BASE")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://query1.finance.yahoo.com".to_string())
            .trim_end_matches('/')
            .to_string();
        let market_timeout =
            Duration::from_secs(parse_num::<u64>(lookup("MARKET_TIMEOUT_SECS")).unwrap_or(15));

        let ta_timeframe = lookup("TA_TIMEFRAME")
            .and_then(non_empty)
            .unwrap_or_else(|| "1h".to_string());
        let monte_carlo_days = parse_num::<u32>(lookup("MONTE_CARLO_DAYS"))
            .unwrap_or(30)
            .max(1);
        let monte_carlo_simulations = parse_num::<usize>(lookup("MONTE_CARLO_SIMULATIONS"))
            .unwrap_or(1000)
            .max(1);

        let telegram_safe_limit = parse_num::<usize>(lookup("TELEGRAM_SAFE_LIMIT"))
            .unwrap_or(4000)
            .clamp(200, 4096);

        Ok(Self {
            telegram_bot_token,
            debug,
            market_api_base,
            market_timeout,
            ta_timeframe,
            monte_carlo_days,
            monte_carlo_simulations,
            telegram_safe_limit,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_num<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("TELEGRAM_BOT_TOKEN")));

        let err = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "   ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(cfg.telegram_bot_token, "123:abc");
        assert!(!cfg.debug);
        assert_eq!(cfg.market_api_base, "https://query1.finance.yahoo.com");
        assert_eq!(cfg.market_timeout, Duration::from_secs(15));
        assert_eq!(cfg.ta_timeframe, "1h");
        assert_eq!(cfg.monte_carlo_days, 30);
        assert_eq!(cfg.monte_carlo_simulations, 1000);
        assert_eq!(cfg.telegram_safe_limit, 4000);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("DEBUG", "True"),
            ("MARKET_API_BASE", "http://localhost:9000/"),
            ("MONTE_CARLO_SIMULATIONS", "250"),
            ("MONTE_CARLO_DAYS", "0"),
            ("TELEGRAM_SAFE_LIMIT", "nope"),
        ]))
        .unwrap();
        assert!(cfg.debug);
        assert_eq!(cfg.market_api_base, "http://localhost:9000");
        assert_eq!(cfg.monte_carlo_simulations, 250);
        assert_eq!(cfg.monte_carlo_days, 1);
        assert_eq!(cfg.telegram_safe_limit, 4000);
    }

    #[test]
    fn dotenv_parsing_handles_quotes_and_comments() {
        let parsed = parse_dotenv(
            "# comment\n\nTELEGRAM_BOT_TOKEN=\"123:abc\"\nexport DEBUG='true'\nBROKEN\n=novalue\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("TELEGRAM_BOT_TOKEN".to_string(), "123:abc".to_string()),
                ("DEBUG".to_string(), "true".to_string()),
            ]
        );
    }
}
