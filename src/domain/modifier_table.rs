//! Per-instrument price multipliers.

use std::collections::HashMap;
use tracing::info;

/// One row of the persisted modifier table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierRow {
    pub id: i64,
    pub name: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ModifierTable {
    multipliers: HashMap<String, f64>,
}

impl ModifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole table with `pairs`. Later duplicates win.
    pub fn load<I>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.multipliers = pairs.into_iter().collect();
        info!(modifiers = self.multipliers.len(), "price modifiers loaded");
        self.multipliers.len()
    }

    pub fn load_rows(&mut self, rows: Vec<ModifierRow>) -> usize {
        self.load(rows.into_iter().map(|r| (r.name, r.multiplier)))
    }

    pub fn lookup(&self, instrument_id: &str) -> Option<f64> {
        self.multipliers.get(instrument_id).copied()
    }

    pub fn len(&self) -> usize {
        self.multipliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }
}
