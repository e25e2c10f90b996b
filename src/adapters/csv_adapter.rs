//! CSV price file adapter.
//!
//! Files carry no header and exactly three columns per row:
//! `INSTRUMENT_NAME,DATE,VALUE`, e.g. `INSTRUMENT1,12-Mar-1996,2.3829`.

use crate::domain::error::AnalyticsError;
use crate::domain::price_record::RawRecord;
use crate::ports::price_port::PriceSource;
use std::fs::File;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvPriceSource;

impl CsvPriceSource {
    pub fn new() -> Self {
        Self
    }

    pub fn read_from<R: std::io::Read>(
        &self,
        reader: R,
    ) -> Result<Vec<RawRecord>, AnalyticsError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let line = i + 1;
            let record = result.map_err(|e| AnalyticsError::Ingestion {
                line,
                reason: format!("CSV parse error: {}", e),
            })?;

            if record.len() != 3 {
                return Err(AnalyticsError::Ingestion {
                    line,
                    reason: format!("expected 3 columns, found {}", record.len()),
                });
            }

            records.push(RawRecord {
                instrument_id: record[0].to_string(),
                date: record[1].to_string(),
                value: record[2].to_string(),
            });
        }

        debug!(rows = records.len(), "CSV rows read");
        Ok(records)
    }
}

impl PriceSource for CsvPriceSource {
    fn read_records(&self, path: &Path) -> Result<Vec<RawRecord>, AnalyticsError> {
        debug!(path = %path.display(), "opening price file");
        let file = File::open(path)?;
        self.read_from(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_headerless_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "prices.csv",
            "INSTRUMENT1,12-Mar-1996,2.3829\n\
             INSTRUMENT2, 01-Nov-2014 ,9.5\n",
        );

        let rows = CsvPriceSource::new().read_records(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RawRecord::new("INSTRUMENT1", "12-Mar-1996", "2.3829"));
        assert_eq!(rows[1].date, "01-Nov-2014");
    }

    #[test]
    fn empty_file_yields_no_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "empty.csv", "");
        assert!(CsvPriceSource::new().read_records(&path).unwrap().is_empty());
    }

    #[test]
    fn wrong_column_count_is_ingestion_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "bad.csv",
            "INSTRUMENT1,12-Mar-1996,2.3829\nINSTRUMENT1,13-Mar-1996\n",
        );
        let err = CsvPriceSource::new().read_records(&path).unwrap_err();
        match err {
            AnalyticsError::Ingestion { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("expected 3 columns"));
            }
            other => panic!("expected Ingestion, got: {other}"),
        }
    }

    #[test]
    fn missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = CsvPriceSource::new().read_records(&dir.path().join("nope.csv"));
        match result {
            Err(AnalyticsError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            Err(other) => panic!("expected Io, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn read_from_memory() {
        let rows = CsvPriceSource::new()
            .read_from("INSTRUMENT3,03-Nov-2014,1\n".as_bytes())
            .unwrap();
        assert_eq!(rows, vec![RawRecord::new("INSTRUMENT3", "03-Nov-2014", "1")]);
    }
}
