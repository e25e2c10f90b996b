//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::proc_probe::ProcProbe;
use crate::domain::aggregation::{EngineConfig, EngineResults};
use crate::domain::analytics::Analytics;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::error::AnalyticsError;
use crate::domain::instrumentation::Instrumentation;
use crate::domain::point_query::QueryOutcome;
use crate::domain::reducer::{BuiltinReducer, Reducer};
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "priceengine", about = "Instrument price analytics engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the price modifier table
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
        /// Seed INSTRUMENT1 = 1.5 and INSTRUMENT2 = 1.2
        #[arg(long)]
        mockup: bool,
    },
    /// Load prices and compute every aggregate
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Custom reducer for INSTRUMENT3 (sum, mean, median, min, max, stddev, last)
        #[arg(short, long)]
        reducer: Option<String>,
    },
    /// Adjusted value(s) of one instrument on one date
    Query {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: String,
        /// DD-Mon-YYYY, e.g. 03-Nov-2014
        #[arg(long)]
        date: String,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::InitDb { config, mockup } => run_init_db(&config, mockup),
        Command::Run {
            config,
            data,
            reducer,
        } => run_engine(&config, data.as_deref(), reducer.as_deref()),
        Command::Query {
            config,
            instrument,
            date,
            data,
        } => run_query(&config, &instrument, &date, data.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, AnalyticsError> {
    let window = config.get_int("engine", "trailing_window", 10);
    let trailing_window = usize::try_from(window)
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| AnalyticsError::ConfigInvalid {
            section: "engine".into(),
            key: "trailing_window".into(),
            reason: "trailing_window must be at least 1".into(),
        })?;
    Ok(EngineConfig { trailing_window })
}

/// The command-line name wins over `[engine] reducer`. `None` when neither
/// is set.
pub fn resolve_reducer(
    name_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Option<Reducer>, AnalyticsError> {
    let name = match name_override {
        Some(n) => Some(n.to_string()),
        None => config.get_string("engine", "reducer"),
    };
    name.map(|n| {
        n.parse::<BuiltinReducer>()
            .map(BuiltinReducer::reducer)
            .map_err(|e| AnalyticsError::ConfigInvalid {
                section: "engine".into(),
                key: "reducer".into(),
                reason: e.to_string(),
            })
    })
    .transpose()
}

pub fn resolve_data_path(
    path_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, AnalyticsError> {
    if let Some(p) = path_override {
        return Ok(p.to_path_buf());
    }
    config
        .get_string("data", "path")
        .map(PathBuf::from)
        .ok_or_else(|| AnalyticsError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

pub fn build_instrumentation(config: &dyn ConfigPort) -> Instrumentation {
    if config.get_bool("engine", "instrumentation", false) {
        Instrumentation::with_probe(Arc::new(ProcProbe::new()))
    } else {
        Instrumentation::disabled()
    }
}

/// Build a session, load the price file and refresh the modifier table.
pub fn load_session(
    config: &dyn ConfigPort,
    data_override: Option<&Path>,
) -> Result<Analytics, AnalyticsError> {
    let engine_config = build_engine_config(config)?;
    let mut session = Analytics::new(engine_config, build_instrumentation(config));

    let data_path = resolve_data_path(data_override, config)?;
    eprintln!("Loading prices from {}", data_path.display());
    let n = session.read_data(&CsvPriceSource::new(), &data_path)?;
    eprintln!(
        "Loaded {} records for {} instruments",
        n,
        session.instruments().len()
    );

    refresh_modifiers(&mut session, config)?;
    Ok(session)
}

#[cfg(feature = "sqlite")]
fn refresh_modifiers(
    session: &mut Analytics,
    config: &dyn ConfigPort,
) -> Result<(), AnalyticsError> {
    use crate::adapters::sqlite_adapter::SqliteModifierStore;

    if config.get_string("sqlite", "path").is_none() {
        eprintln!("No [sqlite] path configured; values are not adjusted");
        return Ok(());
    }
    let store = SqliteModifierStore::from_config(config)?;
    let n = session.update_price_modifier(&store)?;
    eprintln!("Loaded {} price modifiers", n);
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn refresh_modifiers(
    _session: &mut Analytics,
    _config: &dyn ConfigPort,
) -> Result<(), AnalyticsError> {
    eprintln!("sqlite feature disabled; values are not adjusted");
    Ok(())
}

/// One `KEY: value` line per result key, in key order.
pub fn format_results(results: &EngineResults) -> Vec<String> {
    results
        .to_map()
        .into_iter()
        .map(|(key, value)| match value {
            Some(v) => format!("{key}: {v}"),
            None => format!("{key}: none"),
        })
        .collect()
}

fn run_init_db(config_path: &Path, mockup: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteModifierStore;

        let result = SqliteModifierStore::from_config(&config)
            .and_then(|store| store.initialize_schema(mockup));
        match result {
            Ok(()) => {
                eprintln!("Modifier table ready");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (config, mockup);
        eprintln!("error: sqlite feature is required for init-db");
        ExitCode::from(1)
    }
}

fn run_engine(config_path: &Path, data: Option<&Path>, reducer_name: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let reducer = match resolve_reducer(reducer_name, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut session = match load_session(&config, data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let results = match session.run_engine(reducer.as_ref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for line in format_results(results) {
        println!("{line}");
    }
    for failure in &results.failures {
        eprintln!("warning: {failure}");
    }
    ExitCode::SUCCESS
}

fn run_query(config_path: &Path, instrument: &str, date: &str, data: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let session = match load_session(&config, data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match session.calculate(instrument, date) {
        Ok(QueryOutcome::NotBusinessDay { date }) => {
            eprintln!("{} is not a business day (Mon-Fri)", date.format("%d-%b-%Y"));
            ExitCode::SUCCESS
        }
        Ok(QueryOutcome::Values(values)) => {
            if values.is_empty() {
                eprintln!("No records for {} on {}", instrument, date);
            }
            for v in values {
                println!("{v}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match validate_engine_config(&config) {
        Ok(()) => {
            eprintln!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
