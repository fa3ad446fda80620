//! Net gain of a dual investment deal: `G = I - P`
//! (interest earned minus the loss from being forced to buy).

use rand::Rng;

use crate::{
    analysis::{RsiReport, TaFeedback, TaReport},
    errors::Error,
    Result,
};

/// Upper bound of the placeholder purchase loss used by the quick flow.
pub const PLACEHOLDER_LOSS_MAX: f64 = 100.0;

const DAYS_PER_YEAR: f64 = 365.0;

/// Inputs collected one prompt at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuickParams {
    pub investment: u64,
    pub apy: u64,
    pub days: u64,
}

/// Full request: `S,APY,t,deal,symbol`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealParams {
    pub investment: u64,
    pub apy: u64,
    pub days: u64,
    pub deal_price: u64,
    pub symbol: String,
}

impl DealParams {
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(Error::InvalidInput("Numero errato di parametri".to_string()));
        }

        let number = |s: &str| -> Result<i64> {
            s.parse::<i64>()
                .map_err(|_| Error::InvalidInput(format!("valore non numerico: '{s}'")))
        };
        let investment = number(fields[0])?;
        let apy = number(fields[1])?;
        let days = number(fields[2])?;
        let deal_price = number(fields[3])?;
        let symbol = fields[4].to_uppercase();

        let numbers_ok = investment > 0 && apy > 0 && days > 0 && deal_price > 0;
        if !numbers_ok || symbol.chars().count() < 3 {
            return Err(Error::InvalidInput("I parametri non sono validi".to_string()));
        }

        Ok(Self {
            investment: investment as u64,
            apy: apy as u64,
            days: days as u64,
            deal_price: deal_price as u64,
            symbol,
        })
    }
}

/// Parse one answer of the sequential prompt: a strictly positive integer.
pub fn parse_positive_int(text: &str) -> Result<u64> {
    let text = text.trim();
    let value = text
        .parse::<i64>()
        .map_err(|_| Error::InvalidInput(format!("'{text}' non è un numero intero")))?;
    if value <= 0 {
        return Err(Error::InvalidInput(
            "Il valore deve essere maggiore di zero".to_string(),
        ));
    }
    Ok(value as u64)
}

/// Interest rate earned over `days`, as a fraction (`apy` is a percentage per year).
pub fn interest_rate(apy: u64, days: u64) -> f64 {
    (apy as f64 / 100.0) * (days as f64 / DAYS_PER_YEAR)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuickResult {
    pub params: QuickParams,
    pub interest_rate: f64,
    pub interest: f64,
    pub purchase_loss: f64,
    pub net_gain: f64,
}

/// Net gain with a random purchase loss in `[0, PLACEHOLDER_LOSS_MAX]`.
pub fn quick_net_gain<R: Rng + ?Sized>(params: QuickParams, rng: &mut R) -> QuickResult {
    let rate = interest_rate(params.apy, params.days);
    let interest = params.investment as f64 * rate;
    let purchase_loss = rng.gen_range(0.0..=PLACEHOLDER_LOSS_MAX);
    QuickResult {
        params,
        interest_rate: rate,
        interest,
        purchase_loss,
        net_gain: interest - purchase_loss,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NetGainReport {
    pub params: DealParams,
    pub interest_rate: f64,
    pub interest: f64,
    /// Price at which the interest exactly offsets buying at the deal price.
    pub breakeven_price: f64,
    pub predicted_price: f64,
    pub purchase_loss: f64,
    pub net_gain: f64,
    pub rsi: RsiReport,
    pub feedback: TaFeedback,
}

/// Net gain using the Monte Carlo base case as the expected settlement price.
///
/// If the predicted price ends at or below the deal price the deal converts
/// and the investment is valued at the predicted price.
pub fn calculate_net_gain(
    params: DealParams,
    report: &TaReport,
    feedback: TaFeedback,
) -> NetGainReport {
    let rate = interest_rate(params.apy, params.days);
    let s = params.investment as f64;
    let deal = params.deal_price as f64;

    let interest = s * rate;
    let breakeven_price = deal * (1.0 - rate);
    let predicted_price = report.montecarlo.base_case;
    let purchase_loss = if predicted_price <= deal {
        s * (1.0 - predicted_price / deal)
    } else {
        0.0
    };

    NetGainReport {
        params,
        interest_rate: rate,
        interest,
        breakeven_price,
        predicted_price,
        purchase_loss,
        net_gain: interest - purchase_loss,
        rsi: report.rsi,
        feedback,
    }
}
