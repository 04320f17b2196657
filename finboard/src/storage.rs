//! Flat-file persistence for raw fetches and generated summaries
//!
//! Layout under the base directory:
//! - `summaries/<YYYY-MM-DD>/<category>.md`
//! - `raw/<YYYY-MM-DD>/<source>_<unix millis>.json`

use anyhow::{Context, Result};
use chrono::NaiveDate;
use finboard_cache::{Clock, SystemClock};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One stored summary file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSummary {
    pub category: String,
    pub path: PathBuf,
    pub content: String,
}

pub struct FileStore {
    base_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(base_dir, Arc::new(SystemClock))
    }

    /// Store whose generated-at stamps and raw file names come from `clock`
    pub fn with_clock(base_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        // Subdirectories are created lazily on first write
        Self {
            base_dir: base_dir.into(),
            clock,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn summaries_dir(&self) -> PathBuf {
        self.base_dir.join("summaries")
    }

    fn raw_dir(&self) -> PathBuf {
        self.base_dir.join("raw")
    }

    /// Write a markdown summary for `category` on `date`, replacing any
    /// previous one
    pub fn save_summary(&self, date: NaiveDate, category: &str, content: &str) -> Result<PathBuf> {
        let date_dir = self.summaries_dir().join(date.format(DATE_FORMAT).to_string());
        fs::create_dir_all(&date_dir)
            .with_context(|| format!("Failed to create directory: {:?}", date_dir))?;

        let path = date_dir.join(format!("{}.md", file_stem(category)));
        let markdown = format!(
            "# {}\n\n**Date**: {}\n**Generated**: {}\n\n---\n\n{}",
            category,
            date.format(DATE_FORMAT),
            self.clock.now().to_rfc3339(),
            content
        );
        fs::write(&path, markdown).with_context(|| format!("Failed to write summary: {:?}", path))?;

        info!("Saved summary to {:?}", path);
        Ok(path)
    }

    /// `None` when no summary was stored for that date and category
    pub fn read_summary(&self, date: NaiveDate, category: &str) -> Result<Option<String>> {
        let path = self
            .summaries_dir()
            .join(date.format(DATE_FORMAT).to_string())
            .join(format!("{}.md", file_stem(category)));

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read summary: {:?}", path))?;
        Ok(Some(content))
    }

    /// Every summary stored for `date`, sorted by category
    pub fn summaries_for_date(&self, date: NaiveDate) -> Result<Vec<StoredSummary>> {
        let date_dir = self.summaries_dir().join(date.format(DATE_FORMAT).to_string());
        let mut summaries = vec![];

        if date_dir.exists() {
            for entry in fs::read_dir(&date_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "md") {
                    let category = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .replace('_', " ");
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read summary: {:?}", path))?;
                    summaries.push(StoredSummary {
                        category,
                        path,
                        content,
                    });
                }
            }
        }

        summaries.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(summaries)
    }

    /// Dates that have at least one summary directory, newest first
    pub fn list_dates(&self) -> Result<Vec<NaiveDate>> {
        let dir = self.summaries_dir();
        let mut dates = vec![];

        if dir.exists() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                if let Some(date) = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| NaiveDate::parse_from_str(name, DATE_FORMAT).ok())
                {
                    dates.push(date);
                }
            }
        }

        dates.sort_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    /// Serialize a raw fetch result as pretty JSON
    pub fn save_raw<T: Serialize + ?Sized>(&self, date: NaiveDate, source: &str, data: &T) -> Result<PathBuf> {
        let date_dir = self.raw_dir().join(date.format(DATE_FORMAT).to_string());
        fs::create_dir_all(&date_dir)
            .with_context(|| format!("Failed to create directory: {:?}", date_dir))?;

        let path = date_dir.join(format!(
            "{}_{}.json",
            file_stem(source),
            self.clock.now().timestamp_millis()
        ));
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&path, json).with_context(|| format!("Failed to write raw data: {:?}", path))?;

        Ok(path)
    }

    /// Remove summary directories older than `days_to_keep` days before
    /// `today`; returns how many were removed
    pub fn cleanup_older_than(&self, today: NaiveDate, days_to_keep: u32) -> Result<usize> {
        let Some(cutoff) = today.checked_sub_signed(chrono::Duration::days(i64::from(days_to_keep)))
        else {
            return Ok(0);
        };
        let mut removed = 0;

        for date in self.list_dates()? {
            if date < cutoff {
                let dir = self.summaries_dir().join(date.format(DATE_FORMAT).to_string());
                fs::remove_dir_all(&dir)
                    .with_context(|| format!("Failed to remove directory: {:?}", dir))?;
                info!("Removed old summaries for {}", date);
                removed += 1;
            }
        }

        Ok(removed)
    }
}

fn file_stem(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}
