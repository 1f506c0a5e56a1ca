//! Load an option chain CSV and coerce its numeric columns.
//! Unparsable cells become `None` and drop out of every numeric comparison.

use regex::Regex;
use std::{fs::File, io::Read, path::Path, sync::OnceLock};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ChainCfg;
use crate::types::{ChainRow, OptionSide};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("option chain is missing required column `{0}`")]
    MissingColumn(String),
    #[error("option chain has no rows")]
    Empty,
    #[error("no row carries both a strike and a call delta")]
    NoDelta,
    #[error("read option chain: {0}")]
    Csv(#[from] csv::Error),
}

/// In-memory chain; rows keep their file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionChain {
    rows: Vec<ChainRow>,
}

impl OptionChain {
    pub fn new(rows: Vec<ChainRow>) -> Self {
        Self { rows }
    }

    pub fn from_path(path: impl AsRef<Path>, cfg: &ChainCfg) -> Result<Self, ChainError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(csv::Error::from)?;
        let chain = Self::from_reader(file, cfg)?;
        info!(
            path = %path.display(),
            rows = chain.len(),
            "Option chain loaded"
        );
        Ok(chain)
    }

    pub fn from_reader<R: Read>(rdr: R, cfg: &ChainCfg) -> Result<Self, ChainError> {
        let mut reader = csv_builder(cfg).from_reader(rdr);
        let headers = reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| find(name).ok_or_else(|| ChainError::MissingColumn(name.into()));

        let strike_ix = required(&cfg.strike_column)?;
        let call_ix = required(&cfg.call_ltp_column)?;
        let put_ix = required(&cfg.put_ltp_column)?;
        let delta_ix = find(&cfg.call_delta_column);
        if delta_ix.is_none() {
            debug!("No `{}` column; ATM must be supplied", cfg.call_delta_column);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let cell = |ix: usize| record.get(ix).and_then(coerce_number);
            rows.push(ChainRow {
                strike: cell(strike_ix),
                call_ltp: cell(call_ix),
                put_ltp: cell(put_ix),
                call_delta: delta_ix.and_then(cell),
            });
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ChainRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Premium of the first row quoting exactly `strike`.
    pub fn premium_at(&self, strike: f64, side: OptionSide) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.strike == Some(strike))
            .and_then(|r| r.premium(side))
    }
}

fn csv_builder(cfg: &ChainCfg) -> csv::ReaderBuilder {
    let mut b = csv::ReaderBuilder::new();
    b.delimiter(cfg.delimiter as u8)
        .trim(csv::Trim::All)
        .flexible(true);
    b
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid number pattern")
    })
}

/// "1,234.50" -> 1234.5; "-", "", "NaN", "n/a" -> None.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if !number_re().is_match(&cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> OptionChain {
        OptionChain::from_reader(csv.as_bytes(), &ChainCfg::default()).expect("chain loads")
    }

    #[test]
    fn coerce_accepts_plain_and_grouped_numbers() {
        assert_eq!(coerce_number("24500"), Some(24500.0));
        assert_eq!(coerce_number(" 1,234.50 "), Some(1234.5));
        assert_eq!(coerce_number("-0.25"), Some(-0.25));
        assert_eq!(coerce_number(".5"), Some(0.5));
        assert_eq!(coerce_number("1e3"), Some(1000.0));
    }

    #[test]
    fn coerce_maps_junk_to_missing() {
        for junk in ["", "-", "NaN", "inf", "n/a", "12abc", "1.2.3"] {
            assert_eq!(coerce_number(junk), None, "{junk:?}");
        }
    }

    #[test]
    fn headers_are_trimmed_and_cells_coerced() {
        let c = load(" Strike ,Call LTP ,  Put LTP,Call Delta\n24500,120.5,-,0.52\nabc,1,2,x\n");
        assert_eq!(c.len(), 2);
        assert_eq!(
            c.rows()[0],
            ChainRow {
                strike: Some(24500.0),
                call_ltp: Some(120.5),
                put_ltp: None,
                call_delta: Some(0.52),
            }
        );
        assert_eq!(c.rows()[1].strike, None);
        assert_eq!(c.rows()[1].call_delta, None);
    }

    #[test]
    fn ragged_rows_get_missing_cells() {
        let c = load("Strike,Call LTP,Put LTP,Call Delta\n24500,100\n");
        assert_eq!(c.rows()[0].put_ltp, None);
        assert_eq!(c.rows()[0].call_ltp, Some(100.0));
    }

    #[test]
    fn delta_column_is_optional() {
        let c = load("Strike,Call LTP,Put LTP\n24500,100,90\n");
        assert_eq!(c.rows()[0].call_delta, None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = OptionChain::from_reader(
            "Strike,Call LTP\n24500,100\n".as_bytes(),
            &ChainCfg::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::MissingColumn(ref c) if c == "Put LTP"));
    }

    #[test]
    fn premium_lookup_uses_first_matching_strike() {
        let c = load("Strike,Call LTP,Put LTP\n24500,100,90\n24500,101,91\n24600,80,\n");
        assert_eq!(c.premium_at(24500.0, OptionSide::Call), Some(100.0));
        assert_eq!(c.premium_at(24600.0, OptionSide::Put), None);
        assert_eq!(c.premium_at(99999.0, OptionSide::Put), None);
    }
}
