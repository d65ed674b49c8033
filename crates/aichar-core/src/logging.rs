//! Structured logging schema and field name constants for aichar.
//!
//! All crates use these names for structured `tracing` fields so log output
//! can be filtered by the same keys across the loader, the pipeline and the
//! CLI host.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Load failure, abandoned render pass |
//! | WARN  | Recoverable issue, file skipped under the lenient load policy |
//! | INFO  | Lifecycle events (dataset loaded, scheduler started/stopped) |
//! | DEBUG | Pass boundaries, filter mutations, statistics recomputation |
//! | TRACE | Per-stage progress, per-group planning |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "data", "pipeline", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "loader", "stats", "select", "plan", "scheduler"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "load_manifest", "aggregate", "pass", "mutation"
pub const OPERATION: &str = "op";

/// Sequence number of a render pass (1-based, per scheduler).
pub const PASS_ID: &str = "pass_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records in the loaded collection.
pub const RECORD_COUNT: &str = "record_count";

/// Number of records that survived a filter stage.
pub const MATCH_COUNT: &str = "match_count";

/// Number of work-type groups in a plan.
pub const GROUP_COUNT: &str = "group_count";

/// Number of files listed in a manifest.
pub const FILE_COUNT: &str = "file_count";

/// Progress percentage (0–100) reported by a pass stage.
pub const PROGRESS: &str = "progress";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
