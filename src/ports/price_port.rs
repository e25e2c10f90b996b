//! Price data ingestion port trait.

use crate::domain::error::AnalyticsError;
use crate::domain::price_record::RawRecord;
use std::path::Path;

pub trait PriceSource {
    /// Read every `(instrument, date, value)` row from `path`, unparsed.
    fn read_records(&self, path: &Path) -> Result<Vec<RawRecord>, AnalyticsError>;
}
