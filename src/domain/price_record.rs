//! Price observation types and date handling.

use crate::domain::error::AnalyticsError;
use chrono::{Datelike, NaiveDate, Weekday};

/// Date format used by the price files and the point query, e.g. `01-Nov-2014`.
pub const DATE_FORMAT: &str = "%d-%b-%Y";

/// One `(instrument, date, value)` observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub instrument_id: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// A row as handed over by the ingestion collaborator, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub instrument_id: String,
    pub date: String,
    pub value: String,
}

impl RawRecord {
    pub fn new(instrument_id: &str, date: &str, value: &str) -> Self {
        Self {
            instrument_id: instrument_id.to_string(),
            date: date.to_string(),
            value: value.to_string(),
        }
    }

    /// Parse into a [`PriceRecord`]. `line` is 1-based and only used for error
    /// reporting.
    pub fn parse(&self, line: usize) -> Result<PriceRecord, AnalyticsError> {
        let instrument_id = self.instrument_id.trim();
        if instrument_id.is_empty() {
            return Err(AnalyticsError::Ingestion {
                line,
                reason: "missing instrument column".into(),
            });
        }

        let date_str = self.date.trim();
        if date_str.is_empty() {
            return Err(AnalyticsError::Ingestion {
                line,
                reason: "missing date column".into(),
            });
        }
        let date = parse_date(date_str).map_err(|_| AnalyticsError::Ingestion {
            line,
            reason: format!("invalid date {date_str:?} (expected DD-Mon-YYYY)"),
        })?;

        let value_str = self.value.trim();
        if value_str.is_empty() {
            return Err(AnalyticsError::Ingestion {
                line,
                reason: "missing value column".into(),
            });
        }
        let value: f64 = value_str.parse().map_err(|e| AnalyticsError::Ingestion {
            line,
            reason: format!("invalid value {value_str:?}: {e}"),
        })?;
        if !value.is_finite() {
            return Err(AnalyticsError::Ingestion {
                line,
                reason: format!("non-finite value {value_str:?}"),
            });
        }

        Ok(PriceRecord {
            instrument_id: instrument_id.to_string(),
            date,
            value,
        })
    }
}

/// Parse a `DD-Mon-YYYY` date. Month abbreviations are case-insensitive.
pub fn parse_date(input: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| {
        AnalyticsError::InvalidDate {
            input: input.to_string(),
        }
    })
}

/// Monday through Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_day_month_year() {
        let d = parse_date("01-Nov-2014").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2014, 11, 1).unwrap());
    }

    #[test]
    fn parse_date_ignores_month_case() {
        let d = parse_date("15-NOV-2014").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2014, 11, 15).unwrap());
    }

    #[test]
    fn parse_date_rejects_iso_format() {
        let err = parse_date("2014-11-01").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidDate { input } if input == "2014-11-01"));
    }

    #[test]
    fn parse_date_rejects_impossible_day() {
        assert!(parse_date("31-Nov-2014").is_err());
    }

    #[test]
    fn business_days() {
        // 03-Nov-2014 is a Monday
        assert!(is_business_day(NaiveDate::from_ymd_opt(2014, 11, 3).unwrap()));
        assert!(is_business_day(NaiveDate::from_ymd_opt(2014, 11, 7).unwrap()));
        assert!(!is_business_day(NaiveDate::from_ymd_opt(2014, 11, 1).unwrap()));
        assert!(!is_business_day(NaiveDate::from_ymd_opt(2014, 11, 2).unwrap()));
    }

    #[test]
    fn raw_record_parses_and_trims() {
        let rec = RawRecord::new(" INSTRUMENT1 ", " 03-Nov-2014", "10.5 ")
            .parse(1)
            .unwrap();
        assert_eq!(rec.instrument_id, "INSTRUMENT1");
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2014, 11, 3).unwrap());
        assert!((rec.value - 10.5).abs() < f64::EPSILON);
    }

    #[test]
    fn raw_record_missing_instrument() {
        let err = RawRecord::new("", "03-Nov-2014", "1").parse(7).unwrap_err();
        assert!(matches!(err, AnalyticsError::Ingestion { line: 7, .. }));
    }

    #[test]
    fn raw_record_bad_date() {
        let err = RawRecord::new("INSTRUMENT1", "2014/11/03", "1")
            .parse(2)
            .unwrap_err();
        match err {
            AnalyticsError::Ingestion { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("invalid date"));
            }
            other => panic!("expected Ingestion, got: {other}"),
        }
    }

    #[test]
    fn raw_record_bad_value() {
        let err = RawRecord::new("INSTRUMENT1", "03-Nov-2014", "abc")
            .parse(4)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Ingestion { line: 4, .. }));
    }

    #[test]
    fn raw_record_rejects_nan() {
        let err = RawRecord::new("INSTRUMENT1", "03-Nov-2014", "NaN")
            .parse(1)
            .unwrap_err();
        match err {
            AnalyticsError::Ingestion { reason, .. } => assert!(reason.contains("non-finite")),
            other => panic!("expected Ingestion, got: {other}"),
        }
    }
}
