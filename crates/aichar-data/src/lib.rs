//! # aichar-data
//!
//! Loads the character dataset from disk.
//!
//! Two layouts are supported:
//! - a single JSON document exposing a `characters` array (and optionally
//!   `skipped_entries`), or
//! - a directory with a `manifest.json` listing one document per work type,
//!   merged by concatenation in manifest order.
//!
//! ## Example
//!
//! ```ignore
//! use aichar_data::{DatasetLoader, LoaderConfig};
//!
//! let loader = DatasetLoader::new(LoaderConfig::from_env())
//!     .with_progress_callback(|p| println!("{}% {}", p.percentage(), p.label));
//! let dataset = loader.load().await?;
//! ```

pub mod documents;
pub mod loader;

pub use documents::{CharacterDocument, DatasetMetadata, Manifest, ManifestEntry};
pub use loader::{DatasetLoader, LoadPolicy, LoadProgress, LoadProgressCallback, LoaderConfig};
