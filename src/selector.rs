//! Iron condor leg selection.
//!
//! Every rule here is a pure query over the chain rows in file order:
//! - sold leg: premium inside the band, strike on the OTM side of the ATM,
//!   nearest the ATM wins (largest put strike / smallest call strike);
//! - hedge: strike beyond the sold strike, premium below `cap * sold`,
//!   premium closest to `target * sold` wins.
//!
//! Ties always go to the earlier row.

use thiserror::Error;
use tracing::{debug, warn};

use crate::chain::OptionChain;
use crate::config::StrategyCfg;
use crate::types::{ChainRow, Condor, Leg, LegRole, OptionSide};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("no {side} strike beyond ATM {atm} with premium in [{min}, {max}]")]
    NoSoldLeg {
        side: OptionSide,
        atm: f64,
        min: f64,
        max: f64,
    },
    #[error("no {side} hedge beyond {strike} priced below {cap:.2}")]
    NoHedge {
        side: OptionSide,
        strike: f64,
        cap: f64,
    },
}

/// Nearest-to-ATM in-band strike on `side`.
pub fn select_sold(
    rows: &[ChainRow],
    side: OptionSide,
    atm: f64,
    cfg: &StrategyCfg,
) -> Option<Leg> {
    let mut best: Option<Leg> = None;
    for row in rows {
        let (Some(strike), Some(premium)) = (row.strike, row.premium(side)) else {
            continue;
        };
        if !side.is_further_otm(strike, atm) || !cfg.premium_band.contains(premium) {
            continue;
        }
        // A candidate replaces the best only when strictly closer to the ATM.
        if best.map_or(true, |b| side.is_further_otm(b.strike, strike)) {
            best = Some(Leg::new(LegRole::sold(side), strike, premium));
        }
    }
    best
}

/// Hedge for `sold`: further OTM, cheaper than `cap * sold.premium`,
/// premium closest to `target * sold.premium`.
pub fn select_hedge(rows: &[ChainRow], sold: &Leg, cfg: &StrategyCfg) -> Option<Leg> {
    let side = sold.role.side();
    let cap = sold.premium * cfg.hedge_premium_cap;
    let target = sold.premium * cfg.hedge_premium_target;

    let mut best: Option<(f64, Leg)> = None;
    for row in rows {
        let (Some(strike), Some(premium)) = (row.strike, row.premium(side)) else {
            continue;
        };
        if !side.is_further_otm(strike, sold.strike) || premium >= cap {
            continue;
        }
        let diff = (premium - target).abs();
        if best.map_or(true, |(d, _)| diff < d) {
            best = Some((diff, Leg::new(LegRole::hedge(side), strike, premium)));
        }
    }
    best.map(|(_, leg)| leg)
}

/// Sold leg plus its hedge for one side of the condor.
pub fn select_spread(
    chain: &OptionChain,
    side: OptionSide,
    atm: f64,
    cfg: &StrategyCfg,
) -> Result<(Leg, Leg), SelectionError> {
    let sold = select_sold(chain.rows(), side, atm, cfg).ok_or(SelectionError::NoSoldLeg {
        side,
        atm,
        min: cfg.premium_band.min,
        max: cfg.premium_band.max,
    })?;
    let hedge = select_hedge(chain.rows(), &sold, cfg).ok_or(SelectionError::NoHedge {
        side,
        strike: sold.strike,
        cap: sold.premium * cfg.hedge_premium_cap,
    })?;
    debug!(
        %side,
        sold_strike = sold.strike,
        sold_premium = sold.premium,
        hedge_strike = hedge.strike,
        hedge_premium = hedge.premium,
        "Spread selected"
    );
    Ok((sold, hedge))
}

/// Four-leg suggestion around `atm`.
pub fn suggest_condor(
    chain: &OptionChain,
    atm: f64,
    cfg: &StrategyCfg,
) -> Result<Condor, SelectionError> {
    let suggestion = select_spread(chain, OptionSide::Call, atm, cfg).and_then(|call| {
        select_spread(chain, OptionSide::Put, atm, cfg).map(|put| (put, call))
    });
    match suggestion {
        Ok(((sell_put, buy_put), (sell_call, buy_call))) => Ok(Condor {
            sell_put,
            buy_put,
            sell_call,
            buy_call,
        }),
        Err(e) => {
            warn!("No iron condor suggestion: {}", e);
            Err(e)
        }
    }
}
