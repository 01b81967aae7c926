//! services/api/src/adapters/zip_csv.rs
//!
//! Reads ZIP code metadata from a CSV file. The file is read in full on every
//! call; it is small and rarely consulted.

use async_trait::async_trait;
use csv::StringRecord;
use outbreak_core::ports::{PortError, PortResult, ZipMetadataService};
use std::path::PathBuf;
use std::sync::Arc;

/// An adapter that implements `ZipMetadataService` over a CSV file with a header row.
#[derive(Clone)]
pub struct CsvZipMetadataAdapter {
    inner: Arc<CsvSource>,
}

struct CsvSource {
    path: PathBuf,
    zip_column: String,
    population_column: String,
}

struct CsvTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl CsvZipMetadataAdapter {
    pub fn new(path: PathBuf, zip_column: String, population_column: String) -> Self {
        Self {
            inner: Arc::new(CsvSource {
                path,
                zip_column,
                population_column,
            }),
        }
    }

    /// Runs `f` over the parsed file on the blocking thread pool.
    async fn with_table<T, F>(&self, f: F) -> PortResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&CsvSource, CsvTable) -> PortResult<T> + Send + 'static,
    {
        let source = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let table = source.read_table()?;
            f(&source, table)
        })
        .await
        .map_err(|e| PortError::Unexpected(format!("ZIP metadata task failed: {}", e)))?
    }
}

impl CsvSource {
    fn read_table(&self) -> PortResult<CsvTable> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            PortError::Unexpected(format!("Cannot open {}: {}", self.path.display(), e))
        })?;
        let headers = reader
            .headers()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .clone();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(CsvTable { headers, rows })
    }

    fn column(&self, headers: &StringRecord, name: &str) -> PortResult<usize> {
        headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| {
                PortError::Unexpected(format!(
                    "{} has no {} column",
                    self.path.display(),
                    name
                ))
            })
    }
}

/// Reads a population cell, tolerating thousands separators and decimal output.
fn parse_population(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().ok().filter(|value| *value >= 0).or_else(|| {
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value.round() as i64)
    })
}

#[async_trait]
impl ZipMetadataService for CsvZipMetadataAdapter {
    async fn describe_zip(&self, zip: &str) -> PortResult<String> {
        let zip = zip.to_string();
        self.with_table(move |source, table| {
            let zip_idx = source.column(&table.headers, &source.zip_column)?;

            // When a ZIP appears more than once, the last row wins.
            let row = table
                .rows
                .iter()
                .rev()
                .find(|row| row.get(zip_idx).map(str::trim) == Some(zip.as_str()))
                .ok_or_else(|| {
                    PortError::NotFound(format!("No data found for ZIP code '{}'", zip))
                })?;

            Ok(table
                .headers
                .iter()
                .zip(row.iter())
                .map(|(header, value)| format!("{} = {}", header, value))
                .collect::<Vec<_>>()
                .join(", "))
        })
        .await
    }

    async fn population_rows(&self) -> PortResult<Vec<(String, Option<i64>)>> {
        self.with_table(|source, table| {
            let zip_idx = source.column(&table.headers, &source.zip_column)?;
            let population_idx = source.column(&table.headers, &source.population_column).ok();

            Ok(table
                .rows
                .iter()
                .filter_map(|row| {
                    let zip = row.get(zip_idx)?.trim();
                    if zip.is_empty() {
                        return None;
                    }
                    let population = population_idx
                        .and_then(|idx| row.get(idx))
                        .and_then(parse_population);
                    Some((zip.to_string(), population))
                })
                .collect())
        })
        .await
    }
}
