//! At-the-money strike detection from call deltas.

use tracing::debug;

use crate::chain::{ChainError, OptionChain};
use crate::config::StrategyCfg;

/// Strike whose call delta sits closest to `cfg.atm_delta`, rounded half-to-even
/// to a multiple of `cfg.strike_rounding`. Equal distances keep the earliest row.
pub fn detect_atm(chain: &OptionChain, cfg: &StrategyCfg) -> Result<f64, ChainError> {
    if chain.is_empty() {
        return Err(ChainError::Empty);
    }

    let mut best: Option<(f64, f64)> = None; // (distance, strike)
    for row in chain.rows() {
        let (Some(strike), Some(delta)) = (row.strike, row.call_delta) else {
            continue;
        };
        let dist = (delta - cfg.atm_delta).abs();
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, strike));
        }
    }

    let (dist, strike) = best.ok_or(ChainError::NoDelta)?;
    let atm = round_to_increment(strike, cfg.strike_rounding);
    debug!(strike, dist, atm, "ATM row selected");
    Ok(atm)
}

pub fn round_to_increment(value: f64, increment: f64) -> f64 {
    (value / increment).round_ties_even() * increment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChainRow;

    fn row(strike: f64, delta: Option<f64>) -> ChainRow {
        ChainRow {
            strike: Some(strike),
            call_ltp: None,
            put_ltp: None,
            call_delta: delta,
        }
    }

    fn atm(rows: Vec<ChainRow>) -> Result<f64, ChainError> {
        detect_atm(&OptionChain::new(rows), &StrategyCfg::default())
    }

    #[test]
    fn exact_half_delta_rounds_to_hundred() {
        let rows = vec![
            row(24430.0, Some(0.61)),
            row(24480.0, Some(0.5)),
            row(24530.0, Some(0.42)),
        ];
        assert_eq!(atm(rows).unwrap(), 24500.0);
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_to_increment(24250.0, 100.0), 24200.0);
        assert_eq!(round_to_increment(24350.0, 100.0), 24400.0);
        assert_eq!(round_to_increment(24349.0, 100.0), 24300.0);
    }

    #[test]
    fn equal_distance_keeps_first_row() {
        let rows = vec![row(24400.0, Some(0.75)), row(24600.0, Some(0.25))];
        assert_eq!(atm(rows).unwrap(), 24400.0);
    }

    #[test]
    fn missing_deltas_are_skipped() {
        let rows = vec![row(24000.0, None), row(24700.0, Some(0.48))];
        assert_eq!(atm(rows).unwrap(), 24700.0);
    }

    #[test]
    fn fails_on_empty_or_deltaless_chain() {
        assert!(matches!(atm(vec![]), Err(ChainError::Empty)));
        assert!(matches!(
            atm(vec![row(24000.0, None)]),
            Err(ChainError::NoDelta)
        ));
    }
}
