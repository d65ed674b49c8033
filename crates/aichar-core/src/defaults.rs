//! Centralized default constants for the aichar workspace.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers or literal strings.

// =============================================================================
// RECORD MODEL
// =============================================================================

/// Grouping key used when a record has no `work_type`.
pub const WORK_TYPE_FALLBACK: &str = "Other";

/// Display label of the not-applicable category.
pub const NOT_APPLICABLE_LABEL: &str = "N/A";

/// Body text of the description section when the record has none.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available";

/// Body text of an assessment section when the record has no explanation.
pub const EXPLANATION_PLACEHOLDER: &str = "No explanation provided";

/// Text shown instead of the listing when no record survives filtering.
pub const NO_RESULTS_MESSAGE: &str = "No entries found matching your criteria.";

/// Text shown instead of the listing when the record source failed to load.
pub const LOAD_ERROR_MESSAGE: &str =
    "Error loading data. Please ensure data files are available.";

/// Badge shown on entries flagged `needs_research`.
pub const NEEDS_RESEARCH_LABEL: &str = "Needs More Research";

// =============================================================================
// SCHEDULER
// =============================================================================

/// Debounce delay before a render pass starts after the last mutation.
pub const DEBOUNCE_MS: u64 = 350;

/// Pause before the extra pass that processes queued changes.
pub const QUEUED_PASS_PAUSE_MS: u64 = 100;

/// How long the finished progress indicator stays at 100% before hiding.
pub const COMPLETION_LINGER_MS: u64 = 200;

/// Capacity of the scheduler event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Capacity of the scheduler mutation channel.
pub const MUTATION_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// RENDER PASS PROGRESS
// =============================================================================

/// Progress reported when a pass starts.
pub const PROGRESS_START: u8 = 0;

/// Progress after the grouping stage; per-group planning starts here.
pub const PROGRESS_GROUPING: u8 = 30;

/// Share of the progress bar spent on per-group planning.
pub const PROGRESS_GROUP_SPAN: u8 = 60;

/// Progress of the commit stage.
pub const PROGRESS_COMMIT: u8 = 95;

/// Progress of a finished pass.
pub const PROGRESS_COMPLETE: u8 = 100;

// =============================================================================
// DATA
// =============================================================================

/// File name of the multi-file dataset manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Default dataset location when none is configured.
pub const DATA_PATH: &str = "data";
