//! Business-day gated price lookup with multiplier adjustment.

use crate::domain::error::AnalyticsError;
use crate::domain::modifier_table::ModifierTable;
use crate::domain::price_record::{is_business_day, parse_date};
use crate::domain::record_store::{RecordFilter, RecordStore};
use chrono::NaiveDate;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The date fell on a weekend; no lookup was made.
    NotBusinessDay { date: NaiveDate },
    /// Every matching value, adjusted. Empty when nothing matched.
    Values(Vec<f64>),
}

impl QueryOutcome {
    pub fn values(&self) -> Option<&[f64]> {
        match self {
            QueryOutcome::Values(v) => Some(v),
            QueryOutcome::NotBusinessDay { .. } => None,
        }
    }
}

/// Look up `instrument_id` on `date_str` (`DD-Mon-YYYY`) and scale each match
/// by the instrument's multiplier, if it has one.
pub fn calculate(
    store: &RecordStore,
    modifiers: &ModifierTable,
    instrument_id: &str,
    date_str: &str,
) -> Result<QueryOutcome, AnalyticsError> {
    let date = parse_date(date_str)?;
    Ok(calculate_on(store, modifiers, instrument_id, date))
}

pub fn calculate_on(
    store: &RecordStore,
    modifiers: &ModifierTable,
    instrument_id: &str,
    date: NaiveDate,
) -> QueryOutcome {
    if !is_business_day(date) {
        warn!(%date, "the selected date is not a business day (Mon-Fri)");
        return QueryOutcome::NotBusinessDay { date };
    }

    let filter = RecordFilter::instrument(instrument_id).on(date);
    let values = store.filter(&filter).map(|r| r.value);
    let adjusted: Vec<f64> = match modifiers.lookup(instrument_id) {
        Some(multiplier) => values.map(|v| v * multiplier).collect(),
        None => values.collect(),
    };
    debug!(
        instrument = instrument_id,
        %date,
        matches = adjusted.len(),
        "point query"
    );
    QueryOutcome::Values(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_record::RawRecord;

    fn store() -> RecordStore {
        let mut store = RecordStore::new();
        store
            .load(&[
                RawRecord::new("INSTRUMENT1", "03-Nov-2014", "10"),
                RawRecord::new("INSTRUMENT1", "01-Nov-2014", "7"),
                RawRecord::new("INSTRUMENT2", "03-Nov-2014", "4"),
                RawRecord::new("INSTRUMENT2", "03-Nov-2014", "6"),
            ])
            .unwrap();
        store
    }

    fn modifiers() -> ModifierTable {
        let mut table = ModifierTable::new();
        table.load([("INSTRUMENT1".to_string(), 2.0)]);
        table
    }

    #[test]
    fn applies_multiplier_on_business_day() {
        let out = calculate(&store(), &modifiers(), "INSTRUMENT1", "03-Nov-2014").unwrap();
        assert_eq!(out, QueryOutcome::Values(vec![20.0]));
    }

    #[test]
    fn no_multiplier_returns_raw_values_including_duplicates() {
        let out = calculate(&store(), &modifiers(), "INSTRUMENT2", "03-Nov-2014").unwrap();
        assert_eq!(out.values(), Some(&[4.0, 6.0][..]));
    }

    #[test]
    fn weekend_short_circuits_even_with_data() {
        let out = calculate(&store(), &modifiers(), "INSTRUMENT1", "01-Nov-2014").unwrap();
        assert_eq!(
            out,
            QueryOutcome::NotBusinessDay {
                date: NaiveDate::from_ymd_opt(2014, 11, 1).unwrap()
            }
        );
        assert_eq!(out.values(), None);
    }

    #[test]
    fn sunday_is_not_a_business_day() {
        let out = calculate(&store(), &modifiers(), "INSTRUMENT1", "02-Nov-2014").unwrap();
        assert!(matches!(out, QueryOutcome::NotBusinessDay { .. }));
    }

    #[test]
    fn no_match_is_empty() {
        let out = calculate(&store(), &modifiers(), "INSTRUMENT1", "04-Nov-2014").unwrap();
        assert_eq!(out, QueryOutcome::Values(vec![]));
    }

    #[test]
    fn invalid_date_is_an_error() {
        let err = calculate(&store(), &modifiers(), "INSTRUMENT1", "2014-11-03").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidDate { .. }));
    }
}
