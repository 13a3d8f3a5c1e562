use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use tracing::info;

use crate::config::ScraperConfig;
use crate::models::{PropertyRecord, ScrapeStats};

/// In-memory record accumulator with checkpointed persistence.
///
/// Every flush rewrites both output files with the full accumulated list;
/// record counts are tiny next to the network fetches that produce them,
/// so full rewrites keep the on-disk state trivially consistent with
/// memory at every checkpoint.
pub struct CheckpointStore {
    records: Vec<PropertyRecord>,
    csv_path: PathBuf,
    json_path: PathBuf,
    flush_threshold: usize,
    processed: usize,
    since_flush: usize,
}

impl CheckpointStore {
    /// Creates the data directory and derives the pair of run-stamped
    /// output paths.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let csv_path = config.data_dir.join(format!("properati_data_{timestamp}.csv"));
        let json_path = config.data_dir.join(format!("properati_data_{timestamp}.json"));
        info!("📁 Data files: {}", csv_path.display());

        Ok(Self {
            records: Vec::new(),
            csv_path,
            json_path,
            flush_threshold: config.checkpoint_interval.max(1),
            processed: 0,
            since_flush: 0,
        })
    }

    pub fn append(&mut self, record: PropertyRecord) {
        self.records.push(record);
        self.processed += 1;
        self.since_flush += 1;
    }

    pub fn extend(&mut self, records: Vec<PropertyRecord>) {
        for record in records {
            self.append(record);
        }
    }

    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Flush when forced or once enough records accumulated since the
    /// last flush. Returns whether a flush happened. A flush with no
    /// records at all is a no-op.
    pub fn maybe_flush(&mut self, force: bool) -> Result<bool> {
        if self.records.is_empty() {
            return Ok(false);
        }
        if !force && self.since_flush < self.flush_threshold {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Full rewrite of both output files. Idempotent for an unchanged
    /// record list.
    fn flush(&mut self) -> Result<()> {
        self.write_csv()?;
        self.write_json()?;
        self.since_flush = 0;
        info!("💾 Data saved: {} properties", self.records.len());
        info!("   📄 CSV: {}", self.csv_path.display());
        info!("   📋 JSON: {}", self.json_path.display());
        Ok(())
    }

    /// CSV columns are the union of all fields seen across the run, in
    /// first-seen order; cells for omitted fields are left empty.
    fn write_csv(&self) -> Result<()> {
        let rows: Vec<Value> = self
            .records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<_, _>>()
            .context("failed to serialize records")?;

        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            if let Some(object) = row.as_object() {
                for key in object.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut writer = csv::Writer::from_path(&self.csv_path)
            .with_context(|| format!("failed to open {}", self.csv_path.display()))?;
        writer.write_record(&columns)?;
        for row in &rows {
            let object = row.as_object();
            let cells: Vec<&str> = columns
                .iter()
                .map(|column| {
                    object
                        .and_then(|o| o.get(column))
                        .and_then(Value::as_str)
                        .unwrap_or("")
                })
                .collect();
            writer.write_record(&cells)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)
            .context("failed to serialize records")?;
        fs::write(&self.json_path, json)
            .with_context(|| format!("failed to write {}", self.json_path.display()))?;
        Ok(())
    }

    pub fn summarize(&self) -> ScrapeStats {
        ScrapeStats::from_records(&self.records)
    }

    pub fn log_stats(&self) {
        let stats = self.summarize();
        info!("📊 Final summary:");
        info!("   📈 Total records: {}", stats.total_records);
        info!("   ✅ Valid: {}", stats.valid_records);
        info!("   🏗️ Projects: {}", stats.projects);
        info!("   🏠 Project units: {}", stats.project_units);
        info!("   🏡 Individual properties: {}", stats.individual_properties);
        info!("   🏞️ Lots/Land: {}", stats.lots_land);
    }
}
