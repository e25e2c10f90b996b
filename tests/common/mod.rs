#![allow(dead_code)]

use chrono::NaiveDate;
use priceengine::domain::error::AnalyticsError;
use priceengine::domain::modifier_table::ModifierRow;
pub use priceengine::domain::price_record::{PriceRecord, RawRecord};
use priceengine::ports::modifier_port::ModifierSource;
use priceengine::ports::price_port::PriceSource;
use std::io::Write;
use std::path::Path;

pub struct MockPriceSource {
    pub rows: Vec<RawRecord>,
    pub error: Option<String>,
}

impl MockPriceSource {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl PriceSource for MockPriceSource {
    fn read_records(&self, _path: &Path) -> Result<Vec<RawRecord>, AnalyticsError> {
        if let Some(reason) = &self.error {
            return Err(AnalyticsError::Ingestion {
                line: 0,
                reason: reason.clone(),
            });
        }
        Ok(self.rows.clone())
    }
}

pub struct MockModifierSource {
    pub rows: Vec<ModifierRow>,
    pub error: Option<String>,
}

impl MockModifierSource {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        let rows = pairs
            .iter()
            .enumerate()
            .map(|(i, (name, multiplier))| ModifierRow {
                id: i as i64 + 1,
                name: name.to_string(),
                multiplier: *multiplier,
            })
            .collect();
        Self { rows, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl ModifierSource for MockModifierSource {
    fn fetch_modifiers(&self) -> Result<Vec<ModifierRow>, AnalyticsError> {
        if let Some(reason) = &self.error {
            return Err(AnalyticsError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.rows.clone())
    }
}

pub fn raw(instrument: &str, date: &str, value: f64) -> RawRecord {
    RawRecord::new(instrument, date, &value.to_string())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` consecutive daily rows starting at `start` (`DD-Mon-YYYY`), with
/// values `first, first + 1, ...`.
pub fn generate_rows(instrument: &str, start: &str, count: usize, first: f64) -> Vec<RawRecord> {
    let start = NaiveDate::parse_from_str(start, "%d-%b-%Y").unwrap();
    (0..count)
        .map(|i| {
            let d = start + chrono::Duration::days(i as i64);
            raw(instrument, &d.format("%d-%b-%Y").to_string(), first + i as f64)
        })
        .collect()
}

pub fn to_csv(rows: &[RawRecord]) -> String {
    rows.iter()
        .map(|r| format!("{},{},{}\n", r.instrument_id, r.date, r.value))
        .collect()
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
