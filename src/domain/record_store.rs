//! In-memory store of price observations.
//!
//! Records are loaded once, sorted once, and then only read. Filtering hands
//! out lazy iterators over borrowed records so any number of readers can scan
//! the store at the same time.

use crate::domain::error::AnalyticsError;
use crate::domain::price_record::{PriceRecord, RawRecord};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info};

/// Predicate over a [`PriceRecord`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub instrument_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub month: Option<(i32, u32)>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn instrument(instrument_id: &str) -> Self {
        Self {
            instrument_id: Some(instrument_id.to_string()),
            ..Self::default()
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Inclusive on both ends.
    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn in_month(mut self, year: i32, month: u32) -> Self {
        self.month = Some((year, month));
        self
    }

    pub fn matches(&self, record: &PriceRecord) -> bool {
        if let Some(id) = &self.instrument_id {
            if record.instrument_id != *id {
                return false;
            }
        }
        if let Some(date) = self.date {
            if record.date != date {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.date > to {
                return false;
            }
        }
        if let Some((year, month)) = self.month {
            if record.date.year() != year || record.date.month() != month {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<PriceRecord>,
    instruments: Vec<String>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with parsed `raw` records.
    ///
    /// Parsing is all-or-nothing: on the first malformed record the store is
    /// left as it was.
    pub fn load(&mut self, raw: &[RawRecord]) -> Result<usize, AnalyticsError> {
        let records = raw
            .iter()
            .enumerate()
            .map(|(i, r)| r.parse(i + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.load_parsed(records))
    }

    pub fn load_parsed(&mut self, records: Vec<PriceRecord>) -> usize {
        self.instruments = distinct_instruments(&records);
        self.records = records;
        info!(
            records = self.records.len(),
            instruments = self.instruments.len(),
            "price records loaded"
        );
        self.records.len()
    }

    /// Stable ascending sort by date.
    pub fn sort_by_date(&mut self) {
        self.records.sort_by_key(|r| r.date);
        debug!(records = self.records.len(), "records sorted by date");
    }

    pub fn filter<'a>(
        &'a self,
        predicate: &'a RecordFilter,
    ) -> impl Iterator<Item = &'a PriceRecord> + 'a {
        self.records.iter().filter(move |r| predicate.matches(r))
    }

    pub fn values(&self, predicate: &RecordFilter) -> Vec<f64> {
        self.filter(predicate).map(|r| r.value).collect()
    }

    /// Distinct instrument ids in first-seen order of the last load.
    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn distinct_instruments(records: &[PriceRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.instrument_id.as_str()))
        .map(|r| r.instrument_id.clone())
        .collect()
}
