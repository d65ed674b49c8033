//! Dataset loader for the single-file and manifest-based multi-file variants.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use aichar_core::defaults::{DATA_PATH, MANIFEST_FILE};
use aichar_core::{Dataset, Error, Result};

use crate::documents::{parse_document, parse_manifest, CharacterDocument, Manifest};

/// What to do when a manifest-listed file cannot be read or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Any unreadable file fails the whole load.
    #[default]
    Strict,
    /// Unreadable files are logged and skipped; the manifest itself is still
    /// required.
    Lenient,
}

impl FromStr for LoadPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(Error::InvalidInput(format!("unknown load policy '{other}'"))),
        }
    }
}

/// Configuration for the dataset loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// A directory holding `manifest.json`, a manifest file, or a single
    /// character document.
    pub data_path: PathBuf,
    pub policy: LoadPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DATA_PATH),
            policy: LoadPolicy::default(),
        }
    }
}

impl LoaderConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `AICHAR_DATA_PATH` | `data` | Dataset directory or file |
    /// | `AICHAR_LOAD_POLICY` | `strict` | `strict` or `lenient` |
    pub fn from_env() -> Self {
        let data_path = std::env::var("AICHAR_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DATA_PATH));

        let policy = std::env::var("AICHAR_LOAD_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self { data_path, policy }
    }

    /// Set the dataset location.
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Set the load policy.
    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Progress of a multi-file load, reported after every listed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
    /// Work type (or file name) of the file just processed.
    pub label: String,
}

impl LoadProgress {
    /// Rounded completion percentage.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.loaded * 100 + self.total / 2) / self.total).min(100) as u8
    }
}

/// Progress callback type for the loader.
pub type LoadProgressCallback = Box<dyn Fn(&LoadProgress) + Send + Sync>;

/// Loads a [`Dataset`] from disk.
pub struct DatasetLoader {
    config: LoaderConfig,
    progress_callback: Option<LoadProgressCallback>,
}

impl DatasetLoader {
    /// Create a new loader.
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LoadProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    fn report_progress(&self, progress: &LoadProgress) {
        if let Some(ref callback) = self.progress_callback {
            callback(progress);
        }
    }

    /// Load the configured dataset.
    ///
    /// A directory is read through its `manifest.json`; a file named
    /// `manifest.json` is read as a manifest; any other file is a single
    /// character document.
    pub async fn load(&self) -> Result<Dataset> {
        let path = self.config.data_path.as_path();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            error!(
                subsystem = "data",
                component = "loader",
                op = "load",
                path = %path.display(),
                error = %e,
                "Dataset path is not accessible"
            );
            Error::Load(format!("{}: {e}", path.display()))
        })?;

        if metadata.is_dir() {
            self.load_manifest(&path.join(MANIFEST_FILE)).await
        } else if path.file_name().and_then(|n| n.to_str()) == Some(MANIFEST_FILE) {
            self.load_manifest(path).await
        } else {
            self.load_document(path).await
        }
    }

    /// Load the single-file variant.
    #[instrument(
        skip(self),
        fields(subsystem = "data", component = "loader", op = "load_document")
    )]
    pub async fn load_document(&self, path: &Path) -> Result<Dataset> {
        let start = Instant::now();
        let document = read_document(path).await?;
        let dataset = Dataset {
            characters: document.characters,
            skipped_entries: document.skipped_entries,
            last_updated: document.metadata.last_updated,
        };
        info!(
            record_count = dataset.len(),
            skipped_count = dataset.skipped_entries.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Load the multi-file variant: every manifest-listed document,
    /// concatenated in manifest order.
    #[instrument(
        skip(self),
        fields(subsystem = "data", component = "loader", op = "load_manifest")
    )]
    pub async fn load_manifest(&self, manifest_path: &Path) -> Result<Dataset> {
        let start = Instant::now();
        let bytes = tokio::fs::read(manifest_path)
            .await
            .map_err(|e| Error::Manifest(format!("{}: {e}", manifest_path.display())))?;
        let manifest: Manifest = parse_manifest(&bytes)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        let total = manifest.work_types.len();

        debug!(file_count = total, "Manifest parsed");

        let mut dataset = Dataset {
            last_updated: manifest.metadata.last_updated.clone(),
            ..Dataset::default()
        };
        let mut failed = 0usize;

        for (i, entry) in manifest.work_types.iter().enumerate() {
            let path = base.join(&entry.filename);
            match read_document(&path).await {
                Ok(document) => {
                    dataset.characters.extend(document.characters);
                    dataset.skipped_entries.extend(document.skipped_entries);
                }
                Err(e) if self.config.policy == LoadPolicy::Lenient => {
                    failed += 1;
                    warn!(
                        path = %path.display(),
                        work_type = entry.label(),
                        error = %e,
                        "Skipping unreadable dataset file"
                    );
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Dataset file failed to load");
                    return Err(e);
                }
            }

            self.report_progress(&LoadProgress {
                loaded: i + 1,
                total,
                label: entry.label().to_string(),
            });
        }

        info!(
            record_count = dataset.len(),
            file_count = total,
            failed_count = failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Dataset loaded"
        );
        Ok(dataset)
    }
}

async fn read_document(path: &Path) -> Result<CharacterDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Load(format!("{}: {e}", path.display())))?;
    parse_document(&bytes).map_err(|e| Error::Load(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_progress_percentage() {
        let progress = LoadProgress {
            loaded: 1,
            total: 3,
            label: "Film".into(),
        };
        assert_eq!(progress.percentage(), 33);

        let done = LoadProgress {
            loaded: 0,
            total: 0,
            label: String::new(),
        };
        assert_eq!(done.percentage(), 100);
    }

    #[test]
    fn test_load_policy_parse() {
        assert_eq!("lenient".parse::<LoadPolicy>().unwrap(), LoadPolicy::Lenient);
        assert_eq!(" STRICT ".parse::<LoadPolicy>().unwrap(), LoadPolicy::Strict);
        assert!("relaxed".parse::<LoadPolicy>().is_err());
    }

    #[test]
    fn test_loader_config_builder() {
        let config = LoaderConfig::default()
            .with_data_path("/tmp/aichar")
            .with_policy(LoadPolicy::Lenient);
        assert_eq!(config.data_path, PathBuf::from("/tmp/aichar"));
        assert_eq!(config.policy, LoadPolicy::Lenient);
    }
}
