//! Locating and loading the dashboard datasets.
//!
//! Each dataset is one CSV file under a common root, which is either a local
//! directory or the base URL of a static file host.

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::parser::parse_records;
use crate::record::Record;

/// The flat files the portals read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Students,
    Teachers,
    Attendance,
    Assessments,
    Results,
    Alerts,
    NepCompliance,
    LearningProgress,
    VocationalCourses,
}

impl Dataset {
    pub const ALL: [Dataset; 9] = [
        Dataset::Students,
        Dataset::Teachers,
        Dataset::Attendance,
        Dataset::Assessments,
        Dataset::Results,
        Dataset::Alerts,
        Dataset::NepCompliance,
        Dataset::LearningProgress,
        Dataset::VocationalCourses,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::Students => "students.csv",
            Dataset::Teachers => "teachers.csv",
            Dataset::Attendance => "attendance.csv",
            Dataset::Assessments => "assessments.csv",
            Dataset::Results => "results_termwise.csv",
            Dataset::Alerts => "alerts.csv",
            Dataset::NepCompliance => "nep_compliance.csv",
            Dataset::LearningProgress => "learning_progress.csv",
            Dataset::VocationalCourses => "vocational_courses.csv",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Where the dataset files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Dir(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` roots are fetched, anything else is a directory.
    pub fn parse(root: &str) -> Self {
        if root.starts_with("http://") || root.starts_with("https://") {
            DataSource::Url(root.trim_end_matches('/').to_string())
        } else {
            DataSource::Dir(PathBuf::from(root))
        }
    }

    /// Full path or URL of `dataset` under this root.
    pub fn locate(&self, dataset: Dataset) -> String {
        match self {
            DataSource::Dir(dir) => dir.join(dataset.file_name()).display().to_string(),
            DataSource::Url(base) => format!("{}/{}", base, dataset.file_name()),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Dir(dir) => write!(f, "{}", dir.display()),
            DataSource::Url(base) => f.write_str(base),
        }
    }
}

/// Reads `dataset` from a directory or fetches it from the base URL.
#[tracing::instrument(skip(client, source), fields(%source))]
pub async fn read_source<C: HttpClient>(
    client: &C,
    source: &DataSource,
    dataset: Dataset,
) -> Result<Vec<u8>> {
    let location = source.locate(dataset);
    let bytes = match source {
        DataSource::Url(_) => fetch_bytes(client, &location).await?,
        DataSource::Dir(_) => tokio::fs::read(&location)
            .await
            .with_context(|| format!("failed to read '{location}'"))?,
    };
    Ok(bytes)
}

/// Loads and parses one dataset.
///
/// # Errors
///
/// Fails if the file cannot be read or fetched, or is not valid CSV.
pub async fn load(source: &DataSource, dataset: Dataset) -> Result<Vec<Record>> {
    load_with(&BasicClient::new(), source, dataset).await
}

pub async fn load_with<C: HttpClient>(
    client: &C,
    source: &DataSource,
    dataset: Dataset,
) -> Result<Vec<Record>> {
    let bytes = read_source(client, source, dataset).await?;
    let records = parse_records(&bytes).with_context(|| format!("failed to parse {dataset}"))?;
    debug!(%dataset, rows = records.len(), "Dataset loaded");
    Ok(records)
}

/// Like [`load`], but a failure is logged and treated as an empty dataset.
/// Views always get something to render.
pub async fn load_or_empty(source: &DataSource, dataset: Dataset) -> Vec<Record> {
    load_or_empty_with(&BasicClient::new(), source, dataset).await
}

pub async fn load_or_empty_with<C: HttpClient>(
    client: &C,
    source: &DataSource,
    dataset: Dataset,
) -> Vec<Record> {
    match load_with(client, source, dataset).await {
        Ok(records) => records,
        Err(e) => {
            warn!(%dataset, %source, error = %e, "Dataset unavailable, using empty set");
            Vec::new()
        }
    }
}
