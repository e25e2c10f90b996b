//! Domain error types.

/// Failure of a single aggregate computation.
///
/// Stored alongside the engine results instead of aborting the run; the
/// matching result field stays unset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("aggregate task {task} failed: {reason}")]
pub struct AggregationTaskError {
    pub task: String,
    pub reason: String,
}

/// Top-level error type for priceengine.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("ingestion error at record {line}: {reason}")]
    Ingestion { line: usize, reason: String },

    #[error("invalid date {input:?} (expected DD-Mon-YYYY)")]
    InvalidDate { input: String },

    #[error(transparent)]
    AggregationTask(#[from] AggregationTaskError),

    #[error("no price data loaded")]
    NotLoaded,

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AnalyticsError> for std::process::ExitCode {
    fn from(err: &AnalyticsError) -> Self {
        let code: u8 = match err {
            AnalyticsError::Io(_) => 1,
            AnalyticsError::ConfigParse { .. }
            | AnalyticsError::ConfigMissing { .. }
            | AnalyticsError::ConfigInvalid { .. } => 2,
            AnalyticsError::Database { .. } | AnalyticsError::DatabaseQuery { .. } => 3,
            AnalyticsError::Ingestion { .. } | AnalyticsError::InvalidDate { .. } => 4,
            AnalyticsError::NotLoaded | AnalyticsError::AggregationTask(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingestion_error_message_names_record() {
        let err = AnalyticsError::Ingestion {
            line: 3,
            reason: "missing value column".into(),
        };
        assert_eq!(
            err.to_string(),
            "ingestion error at record 3: missing value column"
        );
    }

    #[test]
    fn aggregation_task_error_is_transparent() {
        let err: AnalyticsError = AggregationTaskError {
            task: "INSTRUMENT1_MEAN".into(),
            reason: "panicked".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "aggregate task INSTRUMENT1_MEAN failed: panicked"
        );
    }

    #[test]
    fn exit_codes_by_family() {
        let cases = [
            (
                AnalyticsError::InvalidDate {
                    input: "x".into(),
                },
                std::process::ExitCode::from(4),
            ),
            (
                AnalyticsError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                },
                std::process::ExitCode::from(2),
            ),
            (
                AnalyticsError::Database {
                    reason: "locked".into(),
                },
                std::process::ExitCode::from(3),
            ),
            (AnalyticsError::NotLoaded, std::process::ExitCode::from(5)),
            (
                std::io::Error::from(std::io::ErrorKind::NotFound).into(),
                std::process::ExitCode::from(1),
            ),
        ];
        for (err, expected) in &cases {
            assert_eq!(std::process::ExitCode::from(err), *expected);
        }
    }
}
