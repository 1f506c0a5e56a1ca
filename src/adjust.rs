//! Locked-vs-live premium comparison, sold-leg collapse detection and
//! single-sided replacement suggestions.

use tracing::{info, warn};

use crate::chain::OptionChain;
use crate::config::{AdjustmentCfg, StrategyCfg};
use crate::selector::select_spread;
use crate::types::{AdjustmentFlag, Leg, LegComparison, LegRole};

/// Looks up each locked leg's live premium by exact strike on the leg's side.
pub fn compare_live(locked: &[Leg], chain: &OptionChain) -> Vec<LegComparison> {
    locked
        .iter()
        .map(|leg| LegComparison {
            role: leg.role,
            strike: leg.strike,
            premium_locked: leg.premium,
            premium_now: chain.premium_at(leg.strike, leg.role.side()),
        })
        .collect()
}

/// Flags sold legs whose premium fell by more than `threshold` of the locked premium.
/// `current` legs are matched on role and strike; bought legs are never flagged.
pub fn check_adjustments(locked: &[Leg], current: &[Leg], threshold: f64) -> Vec<AdjustmentFlag> {
    let mut flags = Vec::new();
    for old in locked.iter().filter(|l| l.role.is_sold()) {
        let Some(now) = current
            .iter()
            .find(|c| c.role == old.role && c.strike == old.strike)
        else {
            continue;
        };
        let change = now.premium - old.premium;
        if change < 0.0 && change.abs() > old.premium * threshold {
            warn!(
                leg = %old.role,
                strike = old.strike,
                locked = old.premium,
                now = now.premium,
                "Premium deviation exceeded threshold"
            );
            flags.push(AdjustmentFlag {
                role: old.role,
                strike: old.strike,
            });
        }
    }
    flags
}

/// Runs [`check_adjustments`] over a comparison table. Rows without a live quote
/// are skipped unless `cfg.flag_missing_quotes` is set.
pub fn detect(comparison: &[LegComparison], cfg: &AdjustmentCfg) -> Vec<AdjustmentFlag> {
    let locked: Vec<Leg> = comparison
        .iter()
        .map(|c| Leg::new(c.role, c.strike, c.premium_locked))
        .collect();
    let current: Vec<Leg> = comparison.iter().filter_map(|c| c.current_leg()).collect();
    let mut flags = check_adjustments(&locked, &current, cfg.drop_threshold);

    if cfg.flag_missing_quotes {
        for c in comparison
            .iter()
            .filter(|c| c.role.is_sold() && c.premium_now.is_none())
        {
            warn!(leg = %c.role, strike = c.strike, "No live quote for locked leg");
            flags.push(AdjustmentFlag {
                role: c.role,
                strike: c.strike,
            });
        }
        // Keep the locked-leg order.
        flags.sort_by_key(|f| {
            comparison
                .iter()
                .position(|c| c.role == f.role && c.strike == f.strike)
        });
    }
    flags
}

/// New sold leg plus hedge on the flagged leg's side, or `None` when either
/// search comes up empty.
pub fn suggest_replacement(
    chain: &OptionChain,
    role: LegRole,
    atm: f64,
    cfg: &StrategyCfg,
) -> Option<(Leg, Leg)> {
    match select_spread(chain, role.side(), atm, cfg) {
        Ok(pair) => Some(pair),
        Err(e) => {
            warn!("No replacement for {}: {}", role, e);
            None
        }
    }
}

/// Replacement pairs for every flag, flattened in flag order.
pub fn replacement_legs(
    chain: &OptionChain,
    flags: &[AdjustmentFlag],
    atm: f64,
    cfg: &StrategyCfg,
) -> Vec<Leg> {
    let legs: Vec<Leg> = flags
        .iter()
        .filter_map(|f| suggest_replacement(chain, f.role, atm, cfg))
        .flat_map(|(sell, buy)| [sell, buy])
        .collect();
    if !legs.is_empty() {
        info!(legs = legs.len(), "Replacement legs suggested");
    }
    legs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::tests::{row, sample_chain};

    fn locked() -> Vec<Leg> {
        vec![
            Leg::new(LegRole::SellPut, 24400.0, 100.0),
            Leg::new(LegRole::BuyPut, 24200.0, 33.0),
            Leg::new(LegRole::SellCall, 24600.0, 105.0),
            Leg::new(LegRole::BuyCall, 24800.0, 34.0),
        ]
    }

    #[test]
    fn sixty_percent_drop_is_flagged_forty_is_not() {
        let old = vec![Leg::new(LegRole::SellPut, 24000.0, 100.0)];

        let now = vec![Leg::new(LegRole::SellPut, 24000.0, 40.0)];
        assert_eq!(
            check_adjustments(&old, &now, 0.5),
            vec![AdjustmentFlag {
                role: LegRole::SellPut,
                strike: 24000.0
            }]
        );

        let now = vec![Leg::new(LegRole::SellPut, 24000.0, 60.0)];
        assert!(check_adjustments(&old, &now, 0.5).is_empty());
    }

    #[test]
    fn exactly_threshold_is_not_flagged() {
        let old = vec![Leg::new(LegRole::SellCall, 24600.0, 100.0)];
        let now = vec![Leg::new(LegRole::SellCall, 24600.0, 50.0)];
        assert!(check_adjustments(&old, &now, 0.5).is_empty());
    }

    #[test]
    fn bought_legs_and_rises_are_ignored() {
        let old = vec![
            Leg::new(LegRole::BuyPut, 24200.0, 40.0),
            Leg::new(LegRole::SellCall, 24600.0, 100.0),
        ];
        let now = vec![
            Leg::new(LegRole::BuyPut, 24200.0, 1.0),
            Leg::new(LegRole::SellCall, 24600.0, 300.0),
        ];
        assert!(check_adjustments(&old, &now, 0.5).is_empty());
    }

    #[test]
    fn unchanged_chain_gives_zero_changes_and_no_flags() {
        let chain = sample_chain();
        let cmp = compare_live(&locked(), &chain);
        assert!(cmp.iter().all(|c| c.change() == Some(0.0)));
        assert!(detect(&cmp, &AdjustmentCfg::default()).is_empty());
    }

    #[test]
    fn missing_strike_is_no_data_and_optionally_flagged() {
        // 24400 quote gone from the live chain.
        let chain = OptionChain::new(vec![
            row(24200.0, 0.0, 33.0),
            row(24600.0, 105.0, 0.0),
            row(24800.0, 34.0, 0.0),
        ]);
        let cmp = compare_live(&locked(), &chain);
        assert_eq!(cmp[0].premium_now, None);
        assert_eq!(cmp[0].change(), None);
        assert!(detect(&cmp, &AdjustmentCfg::default()).is_empty());

        let cfg = AdjustmentCfg {
            flag_missing_quotes: true,
            ..AdjustmentCfg::default()
        };
        assert_eq!(
            detect(&cmp, &cfg),
            vec![AdjustmentFlag {
                role: LegRole::SellPut,
                strike: 24400.0
            }]
        );
    }

    #[test]
    fn collapsed_put_gets_a_put_side_replacement() {
        // Market rallied: the sold 24400 put collapsed from 100 to 30.
        let chain = OptionChain::new(vec![
            row(24400.0, 420.0, 30.0),
            row(24500.0, 340.0, 45.0),
            row(24600.0, 260.0, 62.0),
            row(24700.0, 190.0, 96.0),
            row(24800.0, 130.0, 140.0),
            row(24900.0, 102.0, 190.0),
            row(25000.0, 64.0, 250.0),
            row(25100.0, 36.0, 320.0),
            row(25200.0, 19.0, 400.0),
        ]);
        let cmp = compare_live(&locked(), &chain);
        let flags = detect(&cmp, &AdjustmentCfg::default());
        assert_eq!(
            flags,
            vec![AdjustmentFlag {
                role: LegRole::SellPut,
                strike: 24400.0
            }]
        );

        let legs = replacement_legs(&chain, &flags, 24800.0, &StrategyCfg::default());
        assert_eq!(
            legs,
            vec![
                Leg::new(LegRole::SellPut, 24700.0, 96.0),
                Leg::new(LegRole::BuyPut, 24400.0, 30.0),
            ]
        );
    }

    #[test]
    fn replacement_is_abandoned_without_hedge() {
        let chain = OptionChain::new(vec![row(24600.0, 100.0, 0.0), row(24700.0, 60.0, 0.0)]);
        let cfg = StrategyCfg::default();
        assert!(suggest_replacement(&chain, LegRole::SellCall, 24500.0, &cfg).is_none());
    }

    #[test]
    fn replacement_is_abandoned_without_band_candidate() {
        let chain = OptionChain::new(vec![row(24400.0, 0.0, 150.0)]);
        let cfg = StrategyCfg::default();
        assert!(suggest_replacement(&chain, LegRole::SellPut, 24500.0, &cfg).is_none());
    }
}
