//! # aichar-core
//!
//! Core types for the AI character database browser.
//!
//! This crate provides the record model (characters and their resolved
//! ratings), the filter configuration value object shared by every pipeline
//! stage, and the error, logging and default conventions the other aichar
//! crates depend on.

pub mod defaults;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use filter::{
    CategoryToggles, ChartCell, DisplayFilter, FilterCategory, FilterConfiguration, FilterGroup,
    FilterScheme, QualificationToggles, Selector, ShuffleAxis, ShuffleState, SortBy,
};
pub use models::{
    AiQualification, Alignment, Benevolence, CharacterRecord, Dataset, RatingCategory,
    SkippedEntry,
};
