//! Load and validate runtime configuration.

use anyhow::Context;
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChainCfg {
    pub strike_column: String,
    pub call_ltp_column: String,
    pub put_ltp_column: String,
    pub call_delta_column: String,
    pub delimiter: char,
}

impl Default for ChainCfg {
    fn default() -> Self {
        Self {
            strike_column: "Strike".into(),
            call_ltp_column: "Call LTP".into(),
            put_ltp_column: "Put LTP".into(),
            call_delta_column: "Call Delta".into(),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct PremiumBand {
    pub min: f64,
    pub max: f64,
}

impl PremiumBand {
    /// Inclusive on both ends.
    pub fn contains(&self, premium: f64) -> bool {
        premium >= self.min && premium <= self.max
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyCfg {
    pub lot_size: f64,
    pub premium_band: PremiumBand,
    /// Hedge premium must stay strictly below `sold_premium * hedge_premium_cap`.
    pub hedge_premium_cap: f64,
    /// Preferred hedge premium as a fraction of the sold premium.
    pub hedge_premium_target: f64,
    pub atm_delta: f64,
    pub strike_rounding: f64,
}

impl Default for StrategyCfg {
    fn default() -> Self {
        Self {
            lot_size: 75.0,
            premium_band: PremiumBand {
                min: 90.0,
                max: 110.0,
            },
            hedge_premium_cap: 0.5,
            hedge_premium_target: 1.0 / 3.0,
            atm_delta: 0.5,
            strike_rounding: 100.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PayoffCfg {
    pub padding: f64,
    pub step: f64,
}

impl Default for PayoffCfg {
    fn default() -> Self {
        Self {
            padding: 200.0,
            step: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AdjustmentCfg {
    /// Fraction of the locked premium a sold leg may lose before it is flagged.
    pub drop_threshold: f64,
    /// Flag sold legs whose strike has no live quote.
    pub flag_missing_quotes: bool,
}

impl Default for AdjustmentCfg {
    fn default() -> Self {
        Self {
            drop_threshold: 0.5,
            flag_missing_quotes: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StateCfg {
    pub path: String,
}

impl Default for StateCfg {
    fn default() -> Self {
        Self {
            path: "locked_iron_condor.json".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub chain: ChainCfg,
    pub strategy: StrategyCfg,
    pub payoff: PayoffCfg,
    pub adjustment: AdjustmentCfg,
    pub state: StateCfg,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&s)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load`], but a missing file yields the built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        info!("No config at {}, using defaults", path.display());
        Ok(Self::default())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.strategy;
        if s.lot_size <= 0.0 {
            anyhow::bail!("strategy.lot_size must be positive, got {}", s.lot_size);
        }
        if s.premium_band.min > s.premium_band.max {
            anyhow::bail!(
                "strategy.premium_band min {} exceeds max {}",
                s.premium_band.min,
                s.premium_band.max
            );
        }
        if s.hedge_premium_cap <= 0.0 || s.hedge_premium_target <= 0.0 {
            anyhow::bail!("hedge premium ratios must be positive");
        }
        if s.hedge_premium_target >= s.hedge_premium_cap {
            anyhow::bail!(
                "strategy.hedge_premium_target {:.4} must be below hedge_premium_cap {:.4}",
                s.hedge_premium_target,
                s.hedge_premium_cap
            );
        }
        if s.strike_rounding <= 0.0 {
            anyhow::bail!("strategy.strike_rounding must be positive");
        }
        if self.payoff.step <= 0.0 || self.payoff.padding < 0.0 {
            anyhow::bail!("payoff.step must be positive and payoff.padding non-negative");
        }
        let t = self.adjustment.drop_threshold;
        if !(t > 0.0 && t <= 1.0) {
            anyhow::bail!("adjustment.drop_threshold must be in (0, 1], got {}", t);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_market_convention() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.strategy.lot_size, 75.0);
        assert_eq!(cfg.strategy.premium_band, PremiumBand { min: 90.0, max: 110.0 });
        assert_eq!(cfg.adjustment.drop_threshold, 0.5);
        assert_eq!(cfg.state.path, "locked_iron_condor.json");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "strategy:\n  lot_size: 50\nadjustment:\n  drop_threshold: 0.4\n";
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.strategy.lot_size, 50.0);
        assert_eq!(cfg.strategy.premium_band.max, 110.0);
        assert_eq!(cfg.adjustment.drop_threshold, 0.4);
        assert_eq!(cfg.chain.call_ltp_column, "Call LTP");
    }

    #[test]
    fn band_is_inclusive() {
        let band = StrategyCfg::default().premium_band;
        assert!(band.contains(90.0));
        assert!(band.contains(110.0));
        assert!(!band.contains(110.05));
    }

    #[test]
    fn rejects_bad_threshold_and_ratios() {
        let mut cfg = AppConfig::default();
        cfg.adjustment.drop_threshold = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.strategy.hedge_premium_target = 0.6;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_or_default(dir.path().join("nope.yaml")).unwrap();
        assert_eq!(cfg.payoff.step, 10.0);
    }
}
