//! Persisted locked position. The file's presence is the lock.
//!
//! Written as `{"locked_at", "atm", "legs": [{"Leg","Strike","Premium"}, ...]}`;
//! a bare `[{"Leg","Strike","Premium"}, ...]` list is read as well.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::types::Leg;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockedPosition {
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    /// ATM strike at lock time.
    #[serde(default)]
    pub atm: Option<f64>,
    pub legs: Vec<Leg>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Position(LockedPosition),
    Legs(Vec<Leg>),
}

impl From<StoredRecord> for LockedPosition {
    fn from(r: StoredRecord) -> Self {
        match r {
            StoredRecord::Position(p) => p,
            StoredRecord::Legs(legs) => LockedPosition {
                locked_at: None,
                atm: None,
                legs,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.path.exists()
    }

    /// `None` when nothing is locked. Unreadable or corrupt files are errors.
    pub fn load(&self) -> Result<Option<LockedPosition>> {
        if !self.is_locked() {
            return Ok(None);
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read locked position {}", self.path.display()))?;
        let record: StoredRecord = serde_json::from_str(&s)
            .with_context(|| format!("parse locked position {}", self.path.display()))?;
        let pos = LockedPosition::from(record);
        debug!(path = %self.path.display(), legs = pos.legs.len(), "Locked position loaded");
        Ok(Some(pos))
    }

    /// Persists `legs` as the locked position. Refuses when a lock already exists.
    pub fn lock(&self, legs: &[Leg], atm: Option<f64>) -> Result<LockedPosition> {
        if self.is_locked() {
            anyhow::bail!(
                "a position is already locked at {}; reset it first",
                self.path.display()
            );
        }
        let pos = LockedPosition {
            locked_at: Some(Utc::now()),
            atm,
            legs: legs.to_vec(),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string_pretty(&pos)?;
        fs::write(&self.path, s)
            .with_context(|| format!("write locked position {}", self.path.display()))?;
        info!(path = %self.path.display(), legs = legs.len(), "Position locked");
        Ok(pos)
    }

    /// Deletes the lock. Returns `false` when there was nothing to delete.
    pub fn reset(&self) -> Result<bool> {
        if !self.is_locked() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("remove locked position {}", self.path.display()))?;
        info!(path = %self.path.display(), "Locked position reset");
        Ok(true)
    }
}
