//! Staged render pass.
//!
//! A [`RenderPass`] runs selection, grouping and planning as a sequence of
//! small stages. Each call to [`RenderPass::step`] runs exactly one stage and
//! reports its progress, so a driver can yield to the runtime between stages.
//! The pass works on its own snapshot of the filter configuration; later
//! mutations never affect a pass in flight.

use std::sync::Arc;

use rand::rngs::StdRng;
use serde::Serialize;
use tracing::trace;

use aichar_core::defaults::{
    PROGRESS_COMMIT, PROGRESS_GROUPING, PROGRESS_GROUP_SPAN, PROGRESS_START,
};
use aichar_core::{Dataset, Error, FilterConfiguration, Result};

use crate::plan::{plan_group, EntryCounter, GroupView, RenderPlan};
use crate::select::{group_indices, shuffle_groups, shuffle_members, FilterStage, IndexGroup};

/// Label of the first stage of a pass.
pub const START_LABEL: &str = "Starting...";

/// Label of the first stage of a pass started for queued changes.
pub const QUEUED_LABEL: &str = "Processing queued changes...";

pub const GROUPING_LABEL: &str = "Grouping entries...";

pub const COMMIT_LABEL: &str = "Updating display...";

/// Label reported once the plan is published.
pub const COMPLETE_LABEL: &str = "Complete!";

/// Progress report of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub label: String,
}

impl Progress {
    fn new(percent: u8, label: impl Into<String>) -> Self {
        Self {
            percent,
            label: label.into(),
        }
    }
}

/// Result of one [`RenderPass::step`].
#[derive(Debug)]
pub enum PassStep {
    /// A stage ran; more follow.
    Advanced(Progress),
    /// The pass finished with this plan.
    Complete(RenderPlan),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    Filter(usize),
    Group,
    PlanGroup(usize),
    Commit,
    Finish,
    Done,
}

/// Failure forced at the grouping stage.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StageFault {
    Error,
    Panic,
}

/// One full render pass over a shared dataset.
pub struct RenderPass {
    dataset: Arc<Dataset>,
    config: FilterConfiguration,
    rng: StdRng,
    start_label: &'static str,
    stage: Stage,
    needle: Option<String>,
    survivors: Vec<usize>,
    groups: Vec<IndexGroup>,
    counter: EntryCounter,
    planned: Vec<GroupView>,
    #[cfg(test)]
    fault: Option<StageFault>,
}

impl RenderPass {
    /// Create a pass over `dataset` using a snapshot of `config`.
    pub fn new(dataset: Arc<Dataset>, config: FilterConfiguration, rng: StdRng) -> Self {
        let needle = config.search_needle();
        let survivors = (0..dataset.len()).collect();
        Self {
            dataset,
            config,
            rng,
            start_label: START_LABEL,
            stage: Stage::Start,
            needle,
            survivors,
            groups: Vec::new(),
            counter: EntryCounter::new(),
            planned: Vec::new(),
            #[cfg(test)]
            fault: None,
        }
    }

    /// Override the label of the first stage.
    pub fn with_start_label(mut self, label: &'static str) -> Self {
        self.start_label = label;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_fault(mut self, fault: StageFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// The configuration snapshot this pass renders.
    pub fn config(&self) -> &FilterConfiguration {
        &self.config
    }

    /// Whether the pass has returned its plan.
    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Run the next stage.
    pub fn step(&mut self) -> Result<PassStep> {
        let progress = match self.stage {
            Stage::Start => {
                self.stage = Stage::Filter(0);
                Progress::new(PROGRESS_START, self.start_label)
            }
            Stage::Filter(i) => {
                let stage = FilterStage::ORDER[i];
                stage.retain(
                    &mut self.survivors,
                    &self.dataset.characters,
                    &self.config,
                    self.needle.as_deref(),
                );
                trace!(stage = ?stage, remaining = self.survivors.len(), "Filter stage applied");
                self.stage = if i + 1 < FilterStage::ORDER.len() {
                    Stage::Filter(i + 1)
                } else {
                    Stage::Group
                };
                Progress::new(stage.progress(), stage.label())
            }
            Stage::Group => {
                #[cfg(test)]
                match self.fault {
                    Some(StageFault::Error) => return Err(Error::Render("grouping failed".into())),
                    Some(StageFault::Panic) => panic!("grouping failed"),
                    None => {}
                }
                self.group();
                self.stage = if self.groups.is_empty() {
                    Stage::Commit
                } else {
                    Stage::PlanGroup(0)
                };
                Progress::new(PROGRESS_GROUPING, GROUPING_LABEL)
            }
            Stage::PlanGroup(i) => {
                let progress = self.plan_group(i)?;
                self.stage = if i + 1 < self.groups.len() {
                    Stage::PlanGroup(i + 1)
                } else {
                    Stage::Commit
                };
                progress
            }
            Stage::Commit => {
                self.stage = Stage::Finish;
                Progress::new(PROGRESS_COMMIT, COMMIT_LABEL)
            }
            Stage::Finish => {
                self.stage = Stage::Done;
                let groups = std::mem::take(&mut self.planned);
                let total_entries = groups.iter().map(|g| g.total).sum();
                return Ok(PassStep::Complete(RenderPlan {
                    groups,
                    total_entries,
                }));
            }
            Stage::Done => {
                return Err(Error::Render("render pass already complete".into()));
            }
        };
        Ok(PassStep::Advanced(progress))
    }

    /// Drive the pass to completion without yielding.
    pub fn run_to_completion(mut self) -> Result<RenderPlan> {
        loop {
            if let PassStep::Complete(plan) = self.step()? {
                return Ok(plan);
            }
        }
    }

    fn group(&mut self) {
        let mut groups = group_indices(&self.dataset.characters, &self.survivors);
        shuffle_groups(&mut groups, &self.config, &mut self.rng);
        self.groups = groups;
    }

    fn plan_group(&mut self, i: usize) -> Result<Progress> {
        let total = self.groups.len();
        let group = self
            .groups
            .get_mut(i)
            .ok_or_else(|| Error::Internal(format!("group {i} out of range")))?;
        shuffle_members(&mut group.members, &self.config, &mut self.rng);

        let records = group.resolve(&self.dataset.characters);
        let view = plan_group(&records, &self.config, &mut self.counter);
        let label = format!("Generating entries for {}...", records.work_type);
        self.planned.push(view);

        let percent = PROGRESS_GROUPING as usize + PROGRESS_GROUP_SPAN as usize * i / total;
        Ok(Progress::new(percent as u8, label))
    }
}
