//! Core domain types for chain rows, condor legs, payoff points and adjustment flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the uploaded option chain. `None` marks a missing/unparsable cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainRow {
    pub strike: Option<f64>,
    pub call_ltp: Option<f64>,
    pub put_ltp: Option<f64>,
    pub call_delta: Option<f64>,
}

impl ChainRow {
    pub fn premium(&self, side: OptionSide) -> Option<f64> {
        match side {
            OptionSide::Put => self.put_ltp,
            OptionSide::Call => self.call_ltp,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OptionSide {
    Put,
    Call,
}

impl OptionSide {
    /// Whether `strike` lies further out-of-the-money than `reference` on this side.
    pub fn is_further_otm(self, strike: f64, reference: f64) -> bool {
        match self {
            OptionSide::Put => strike < reference,
            OptionSide::Call => strike > reference,
        }
    }

    pub fn intrinsic(self, strike: f64, spot: f64) -> f64 {
        match self {
            OptionSide::Put => (strike - spot).max(0.0),
            OptionSide::Call => (spot - strike).max(0.0),
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSide::Put => write!(f, "PE"),
            OptionSide::Call => write!(f, "CE"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LegRole {
    #[serde(rename = "Sell PE")]
    SellPut,
    #[serde(rename = "Buy PE")]
    BuyPut,
    #[serde(rename = "Sell CE")]
    SellCall,
    #[serde(rename = "Buy CE")]
    BuyCall,
}

impl LegRole {
    pub fn side(self) -> OptionSide {
        match self {
            LegRole::SellPut | LegRole::BuyPut => OptionSide::Put,
            LegRole::SellCall | LegRole::BuyCall => OptionSide::Call,
        }
    }

    pub fn is_sold(self) -> bool {
        matches!(self, LegRole::SellPut | LegRole::SellCall)
    }

    pub fn sold(side: OptionSide) -> Self {
        match side {
            OptionSide::Put => LegRole::SellPut,
            OptionSide::Call => LegRole::SellCall,
        }
    }

    pub fn hedge(side: OptionSide) -> Self {
        match side {
            OptionSide::Put => LegRole::BuyPut,
            OptionSide::Call => LegRole::BuyCall,
        }
    }
}

impl fmt::Display for LegRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.is_sold() { "Sell" } else { "Buy" };
        write!(f, "{} {}", verb, self.side())
    }
}

/// A single option leg. Field names match the persisted record layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Leg {
    #[serde(rename = "Leg")]
    pub role: LegRole,
    #[serde(rename = "Strike")]
    pub strike: f64,
    #[serde(rename = "Premium")]
    pub premium: f64,
}

impl Leg {
    pub fn new(role: LegRole, strike: f64, premium: f64) -> Self {
        Self {
            role,
            strike,
            premium,
        }
    }

    /// Per-unit P/L of this leg at expiry for the given spot.
    pub fn payoff_at(&self, spot: f64) -> f64 {
        let intrinsic = self.role.side().intrinsic(self.strike, spot);
        if self.role.is_sold() {
            self.premium - intrinsic
        } else {
            intrinsic - self.premium
        }
    }
}

/// Four legs in the fixed order SellPut, BuyPut, SellCall, BuyCall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condor {
    pub sell_put: Leg,
    pub buy_put: Leg,
    pub sell_call: Leg,
    pub buy_call: Leg,
}

impl Condor {
    pub fn legs(&self) -> [Leg; 4] {
        [self.sell_put, self.buy_put, self.sell_call, self.buy_call]
    }
}

/// Premium received minus premium paid, per unit.
pub fn net_credit(legs: &[Leg]) -> f64 {
    legs.iter().fold(0.0, |acc, l| {
        if l.role.is_sold() {
            acc + l.premium
        } else {
            acc - l.premium
        }
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PayoffPoint {
    pub spot: f64,
    pub payoff: f64,
}

/// A sold leg whose premium collapsed past the drop threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentFlag {
    pub role: LegRole,
    pub strike: f64,
}

/// Locked premium next to the live one for a single leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegComparison {
    pub role: LegRole,
    pub strike: f64,
    pub premium_locked: f64,
    pub premium_now: Option<f64>,
}

impl LegComparison {
    pub fn change(&self) -> Option<f64> {
        self.premium_now.map(|now| now - self.premium_locked)
    }

    /// The comparison row viewed as a live leg; `None` when there is no quote.
    pub fn current_leg(&self) -> Option<Leg> {
        self.premium_now.map(|p| Leg::new(self.role, self.strike, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_match_record_layout() {
        assert_eq!(LegRole::SellPut.to_string(), "Sell PE");
        assert_eq!(LegRole::BuyCall.to_string(), "Buy CE");
        let s = serde_json::to_string(&Leg::new(LegRole::SellCall, 24600.0, 101.5)).unwrap();
        assert_eq!(s, r#"{"Leg":"Sell CE","Strike":24600.0,"Premium":101.5}"#);
    }

    #[test]
    fn leg_payoff_signs() {
        let sold_put = Leg::new(LegRole::SellPut, 100.0, 5.0);
        assert_eq!(sold_put.payoff_at(120.0), 5.0);
        assert_eq!(sold_put.payoff_at(90.0), -5.0);

        let bought_call = Leg::new(LegRole::BuyCall, 100.0, 2.0);
        assert_eq!(bought_call.payoff_at(90.0), -2.0);
        assert_eq!(bought_call.payoff_at(110.0), 8.0);
    }

    #[test]
    fn comparison_change_is_missing_without_quote() {
        let c = LegComparison {
            role: LegRole::SellPut,
            strike: 24000.0,
            premium_locked: 100.0,
            premium_now: None,
        };
        assert_eq!(c.change(), None);
        assert!(c.current_leg().is_none());
    }
}
