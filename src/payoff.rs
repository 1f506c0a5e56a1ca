//! Expiry payoff of an arbitrary leg set over a spot-price grid.

use anyhow::{Context, Result};
use csv::Writer;
use std::{fs::File, path::Path};

use crate::config::PayoffCfg;
use crate::types::{net_credit, Leg, PayoffPoint};

/// Spots from `min_strike - padding` up to (excluding) `max_strike + padding`.
pub fn spot_grid(legs: &[Leg], cfg: &PayoffCfg) -> Vec<f64> {
    let Some(lo) = legs.iter().map(|l| l.strike).reduce(f64::min) else {
        return Vec::new();
    };
    let hi = legs.iter().map(|l| l.strike).fold(lo, f64::max);
    let start = lo - cfg.padding;
    let end = hi + cfg.padding;
    let n = ((end - start) / cfg.step).ceil().max(0.0) as usize;
    // Index-based so the grid does not drift with repeated float addition.
    (0..n).map(|i| start + i as f64 * cfg.step).collect()
}

/// Summed per-leg P/L scaled by `lot_size`, one point per grid spot.
pub fn payoff_curve(legs: &[Leg], lot_size: f64, cfg: &PayoffCfg) -> Vec<PayoffPoint> {
    spot_grid(legs, cfg)
        .into_iter()
        .map(|spot| PayoffPoint {
            spot,
            payoff: legs.iter().map(|l| l.payoff_at(spot)).sum::<f64>() * lot_size,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayoffSummary {
    /// Premium received minus paid, per unit.
    pub net_credit: f64,
    /// `net_credit` scaled by the lot size.
    pub net_credit_lot: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub breakevens: Vec<f64>,
}

impl PayoffSummary {
    pub fn new(legs: &[Leg], curve: &[PayoffPoint], lot_size: f64) -> Option<Self> {
        let first = curve.first()?;
        let (max_profit, max_loss) = curve
            .iter()
            .fold((first.payoff, first.payoff), |(hi, lo), p| {
                (hi.max(p.payoff), lo.min(p.payoff))
            });
        let credit = net_credit(legs);
        Some(Self {
            net_credit: credit,
            net_credit_lot: credit * lot_size,
            max_profit,
            max_loss,
            breakevens: breakevens(curve),
        })
    }
}

/// Spots where the curve crosses zero, linearly interpolated between grid points.
pub fn breakevens(curve: &[PayoffPoint]) -> Vec<f64> {
    let mut out = Vec::new();
    for pair in curve.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.payoff == 0.0 {
            out.push(a.spot);
        } else if a.payoff * b.payoff < 0.0 {
            let t = a.payoff / (a.payoff - b.payoff);
            out.push(a.spot + t * (b.spot - a.spot));
        }
    }
    if let Some(last) = curve.last() {
        if last.payoff == 0.0 {
            out.push(last.spot);
        }
    }
    out
}

/// Writes the curve as `spot,payoff` rows.
pub fn write_curve_csv(path: impl AsRef<Path>, curve: &[PayoffPoint]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(["spot", "payoff"])?;
    for p in curve {
        writer.write_record(&[p.spot.to_string(), format!("{:.2}", p.payoff)])?;
    }
    writer.flush()?;
    Ok(())
}
