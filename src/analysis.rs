//! One full pass over an uploaded chain: ATM, suggestion, payoff and,
//! when a position is locked, the adjustment check.

use tracing::info;

use crate::adjust::{compare_live, detect, replacement_legs};
use crate::atm::detect_atm;
use crate::chain::{ChainError, OptionChain};
use crate::config::AppConfig;
use crate::payoff::{payoff_curve, PayoffSummary};
use crate::selector::{suggest_condor, SelectionError};
use crate::state::LockedPosition;
use crate::types::{AdjustmentFlag, Condor, Leg, LegComparison, PayoffPoint};

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub atm: f64,
    pub suggestion: Result<Condor, SelectionError>,
    pub payoff: Vec<PayoffPoint>,
    pub summary: Option<PayoffSummary>,
    pub monitor: Option<Monitor>,
}

/// Locked position checked against the live chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub locked: LockedPosition,
    pub comparison: Vec<LegComparison>,
    pub flags: Vec<AdjustmentFlag>,
    pub replacements: Vec<Leg>,
    pub replacement_payoff: Vec<PayoffPoint>,
    pub replacement_summary: Option<PayoffSummary>,
}

/// `atm_override` skips delta-based detection.
pub fn analyze(
    chain: &OptionChain,
    atm_override: Option<f64>,
    locked: Option<LockedPosition>,
    cfg: &AppConfig,
) -> Result<Analysis, ChainError> {
    let atm = match atm_override {
        Some(atm) => atm,
        None => detect_atm(chain, &cfg.strategy)?,
    };
    info!("ATM detected: {}", atm);

    let lot = cfg.strategy.lot_size;
    let suggestion = suggest_condor(chain, atm, &cfg.strategy);
    let (payoff, summary) = match &suggestion {
        Ok(condor) => curve_and_summary(&condor.legs(), lot, cfg),
        Err(_) => (Vec::new(), None),
    };

    let monitor = locked.map(|locked| {
        let comparison = compare_live(&locked.legs, chain);
        let flags = detect(&comparison, &cfg.adjustment);
        let replacements = if flags.is_empty() {
            info!("No adjustment needed");
            Vec::new()
        } else {
            replacement_legs(chain, &flags, atm, &cfg.strategy)
        };
        let (replacement_payoff, replacement_summary) = curve_and_summary(&replacements, lot, cfg);
        Monitor {
            locked,
            comparison,
            flags,
            replacements,
            replacement_payoff,
            replacement_summary,
        }
    });

    Ok(Analysis {
        atm,
        suggestion,
        payoff,
        summary,
        monitor,
    })
}

fn curve_and_summary(
    legs: &[Leg],
    lot: f64,
    cfg: &AppConfig,
) -> (Vec<PayoffPoint>, Option<PayoffSummary>) {
    let curve = payoff_curve(legs, lot, &cfg.payoff);
    let summary = PayoffSummary::new(legs, &curve, lot);
    (curve, summary)
}
