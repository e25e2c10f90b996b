//! Analytics session: one record store, one modifier table, and the results
//! of the most recent engine run.

use crate::domain::aggregation::{AggregationEngine, EngineConfig, EngineResults};
use crate::domain::error::AnalyticsError;
use crate::domain::instrumentation::Instrumentation;
use crate::domain::modifier_table::ModifierTable;
use crate::domain::point_query::{self, QueryOutcome};
use crate::domain::price_record::RawRecord;
use crate::domain::record_store::RecordStore;
use crate::domain::reducer::Reducer;
use crate::ports::modifier_port::ModifierSource;
use crate::ports::price_port::PriceSource;
use std::path::Path;

#[derive(Debug, Default)]
pub struct Analytics {
    store: RecordStore,
    modifiers: ModifierTable,
    engine: AggregationEngine,
    instrumentation: Instrumentation,
    loaded: bool,
    results: Option<EngineResults>,
}

impl Analytics {
    pub fn new(config: EngineConfig, instrumentation: Instrumentation) -> Self {
        Self {
            engine: AggregationEngine::new(config, instrumentation.clone()),
            instrumentation,
            ..Self::default()
        }
    }

    /// Read and parse the price file at `path`, replacing any loaded data.
    pub fn read_data(
        &mut self,
        source: &dyn PriceSource,
        path: &Path,
    ) -> Result<usize, AnalyticsError> {
        let instrumentation = self.instrumentation.clone();
        instrumentation.measure("read_data", || {
            let raw = source.read_records(path)?;
            self.load_records(&raw)
        })
    }

    pub fn load_records(&mut self, raw: &[RawRecord]) -> Result<usize, AnalyticsError> {
        let n = self.store.load(raw)?;
        self.loaded = true;
        self.results = None;
        Ok(n)
    }

    /// Rebuild the modifier table from a full snapshot of `source`.
    pub fn update_price_modifier(
        &mut self,
        source: &dyn ModifierSource,
    ) -> Result<usize, AnalyticsError> {
        let instrumentation = self.instrumentation.clone();
        instrumentation.measure("update_price_modifier", || {
            let rows = source.fetch_modifiers()?;
            Ok(self.modifiers.load_rows(rows))
        })
    }

    /// Sort, aggregate, and keep the results for [`results`](Self::results).
    pub fn run_engine(
        &mut self,
        reducer: Option<&Reducer>,
    ) -> Result<&EngineResults, AnalyticsError> {
        if !self.loaded {
            return Err(AnalyticsError::NotLoaded);
        }
        let engine = &self.engine;
        let store = &mut self.store;
        let results = self
            .instrumentation
            .measure("run_engine", || engine.run(store, reducer));
        Ok(self.results.insert(results))
    }

    pub fn calculate(
        &self,
        instrument_id: &str,
        date_str: &str,
    ) -> Result<QueryOutcome, AnalyticsError> {
        if !self.loaded {
            return Err(AnalyticsError::NotLoaded);
        }
        self.instrumentation.measure("calculate", || {
            point_query::calculate(&self.store, &self.modifiers, instrument_id, date_str)
        })
    }

    /// Results of the last engine run since the last load.
    pub fn results(&self) -> Option<&EngineResults> {
        self.results.as_ref()
    }

    pub fn instruments(&self) -> &[String] {
        self.store.instruments()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn modifiers(&self) -> &ModifierTable {
        &self.modifiers
    }
}
