//! # aichar-pipeline
//!
//! The filter/aggregation/render pipeline:
//!
//! - [`stats`]: the benevolence × alignment table over the totals-filtered
//!   records.
//! - [`select`]: the display-filter predicate chain and work-type grouping.
//! - [`plan`]: the view-model tree a host paints.
//! - [`pass`]: selection, grouping and planning as a staged, resumable pass.
//! - [`scheduler`]: debounce/queue state machine and the tokio driver that
//!   runs passes, yields between stages and publishes results.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aichar_core::{FilterConfiguration, SortBy};
//! use aichar_pipeline::{RenderScheduler, SchedulerConfig};
//!
//! let handle = RenderScheduler::new(
//!     Arc::new(dataset),
//!     FilterConfiguration::multi_select(),
//!     SchedulerConfig::from_env(),
//! )
//! .start();
//! handle.set_sort_by(SortBy::Alignment)?;
//! let plan = handle.settled().await?;
//! ```

pub mod pass;
pub mod plan;
pub mod scheduler;
pub mod select;
pub mod stats;

pub use pass::{PassStep, Progress, RenderPass};
pub use plan::{
    source_list_label, CollapsibleSection, CountBadge, EntryTitle, EntryView, GroupView,
    RatingBadge, RenderPlan, SourceLink, WorkReference,
};
pub use scheduler::{
    FilterMutation, RenderScheduler, RenderState, RenderStateMachine, SchedulerConfig,
    SchedulerEvent, SchedulerHandle,
};
pub use select::{
    group_by_work_type, group_indices, matches, select, survivors, FilterStage, GroupedRecords,
    IndexGroup, RecordGroup,
};
pub use stats::{aggregate, aggregate_for, ContingencyTable};
