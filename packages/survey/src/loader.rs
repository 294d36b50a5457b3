//! Survey data source loading.
//!
//! A [`DataSource`] is either a local file or a URL. Loading is async so
//! the dashboard can keep rendering its empty state while the dataset is
//! still on its way.

use std::path::PathBuf;

use mobility_map_survey_models::SurveyDataset;
use serde::{Deserialize, Serialize};

use crate::parser::parse_dataset;
use crate::{SurveyError, SurveyFormat};

/// Where a delimited text file comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSource {
    /// A file on the local filesystem.
    File {
        /// Path to the file.
        path: PathBuf,
    },
    /// A file served over HTTP(S).
    Url {
        /// Full URL of the file.
        url: String,
    },
}

impl DataSource {
    /// Human-readable name for log and error messages.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::File { path } => path.display().to_string(),
            Self::Url { url } => url.clone(),
        }
    }

    /// Reads the whole source as text.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or the request fails
    /// * If the source is empty
    pub async fn fetch_text(&self, client: &reqwest::Client) -> Result<String, SurveyError> {
        let text = match self {
            Self::File { path } => tokio::fs::read_to_string(path).await?,
            Self::Url { url } => {
                client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };

        log::debug!("Read {} bytes from {}", text.len(), self.name());

        if text.trim().is_empty() {
            return Err(SurveyError::DataUnavailable {
                source_name: self.name(),
            });
        }

        Ok(text)
    }
}

/// The set of files making up one survey load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SurveySources {
    /// Visitor count export.
    pub visitors: DataSource,
    /// Layout of the visitor export.
    #[serde(default)]
    pub format: SurveyFormat,
    /// Income summary table.
    #[serde(default)]
    pub income: Option<DataSource>,
    /// Education summary table.
    #[serde(default)]
    pub education: Option<DataSource>,
}

/// Fetches and parses every configured source into one dataset.
///
/// # Errors
///
/// * If any source cannot be read or is empty
/// * If any source cannot be tokenized
pub async fn load_dataset(sources: &SurveySources) -> Result<SurveyDataset, SurveyError> {
    let client = reqwest::Client::new();

    log::info!(
        "Loading {} survey data from {}",
        sources.format,
        sources.visitors.name()
    );

    let visitors = sources.visitors.fetch_text(&client).await?;
    let income = match &sources.income {
        Some(source) => Some(source.fetch_text(&client).await?),
        None => None,
    };
    let education = match &sources.education {
        Some(source) => Some(source.fetch_text(&client).await?),
        None => None,
    };

    let dataset = parse_dataset(
        &visitors,
        sources.format,
        income.as_deref(),
        education.as_deref(),
    )?;

    log::info!(
        "Loaded {} visitor records, {} income rows, {} education rows",
        dataset.visitors.len(),
        dataset.income.len(),
        dataset.education.len()
    );

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// A file in the temp dir, deleted on drop.
    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str, contents: &str) -> Self {
            static NEXT: AtomicUsize = AtomicUsize::new(0);
            let path = std::env::temp_dir().join(format!(
                "mobility_map_survey_{}_{}_{name}",
                std::process::id(),
                NEXT.fetch_add(1, Ordering::Relaxed)
            ));
            std::fs::write(&path, contents).unwrap();
            Self(path)
        }

        fn source(&self) -> DataSource {
            DataSource::File {
                path: self.0.clone(),
            }
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            std::fs::remove_file(&self.0).ok();
        }
    }

    #[tokio::test]
    async fn loads_dataset_from_files() {
        let visitors = TempFile::new(
            "visitors.csv",
            "h\nA;2023;11;10;14;true;North;35-44;Resident;F;100;50;50\n\n",
        );
        let education = TempFile::new("education.csv", "h\nCity;2022;45-54;80;Bachelor\n\n");

        let dataset = load_dataset(&SurveySources {
            visitors: visitors.source(),
            format: SurveyFormat::Extended,
            income: None,
            education: Some(education.source()),
        })
        .await
        .unwrap();

        assert_eq!(dataset.visitors.len(), 1);
        assert_eq!(dataset.education.len(), 1);
        assert!(dataset.income.is_empty());
    }

    #[tokio::test]
    async fn empty_file_is_data_unavailable() {
        let file = TempFile::new("empty.csv", "");

        let err = file
            .source()
            .fetch_text(&reqwest::Client::new())
            .await
            .unwrap_err();
        match err {
            SurveyError::DataUnavailable { source_name } => {
                assert_eq!(source_name, file.0.display().to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn temp_files_are_distinct_and_cleaned_up() {
        let first = TempFile::new("same.csv", "a");
        let second = TempFile::new("same.csv", "b");
        assert_ne!(first.0, second.0);

        let path = first.0.clone();
        drop(first);
        assert!(!path.exists());
        assert!(second.0.exists());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let source = DataSource::File {
            path: PathBuf::from("/nonexistent/mobility_map/visitors.csv"),
        };
        assert!(matches!(
            source.fetch_text(&reqwest::Client::new()).await,
            Err(SurveyError::Io(_))
        ));
    }

    #[tokio::test]
    async fn invalid_url_is_http_error() {
        let source = DataSource::Url {
            url: "not a url".to_string(),
        };
        assert!(matches!(
            source.fetch_text(&reqwest::Client::new()).await,
            Err(SurveyError::Http(_))
        ));
    }
}
