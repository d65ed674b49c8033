//! Incremental render scheduler.
//!
//! The scheduler owns the single writable [`FilterConfiguration`]. Hosts send
//! mutations through a [`SchedulerHandle`]; the driver task debounces them,
//! runs staged [`RenderPass`]es, yields to the runtime between stages, and
//! publishes progress events, the latest plan and the statistics table.
//!
//! The debounce/queue policy lives in [`RenderStateMachine`], a pure state
//! machine with no timers of its own:
//!
//! ```text
//! Idle ──mutation──▶ Debouncing ──debounce elapsed──▶ Rendering
//!   ▲                  │  ▲                              │   │
//!   │                  └──┘ mutation restarts timer      │   │ mutation
//!   │                                                    │   ▼
//!   └──────── linger elapsed, nothing queued ◀───────────┘ RenderingQueued
//!                                                            │
//!                     pass complete: run one more pass ◀─────┘
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument, warn};

use aichar_core::defaults::{
    COMPLETION_LINGER_MS, DEBOUNCE_MS, EVENT_BUS_CAPACITY, MUTATION_CHANNEL_CAPACITY,
    PROGRESS_COMPLETE, PROGRESS_START, QUEUED_PASS_PAUSE_MS,
};
use aichar_core::{
    ChartCell, Dataset, Error, FilterCategory, FilterConfiguration, FilterGroup, Result,
    ShuffleAxis, SortBy,
};

#[cfg(test)]
use crate::pass::StageFault;
use crate::pass::{PassStep, RenderPass, COMPLETE_LABEL, QUEUED_LABEL, START_LABEL};
use crate::plan::RenderPlan;
use crate::stats::{aggregate_for, ContingencyTable};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Timing and randomness configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Quiet period after the last mutation before a pass starts.
    pub debounce_ms: u64,
    /// Pause before the extra pass that processes queued changes.
    pub queued_pause_ms: u64,
    /// How long a finished pass stays at 100% before the scheduler goes idle.
    pub linger_ms: u64,
    /// Seed for shuffles. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            queued_pause_ms: QUEUED_PASS_PAUSE_MS,
            linger_ms: COMPLETION_LINGER_MS,
            seed: None,
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `AICHAR_DEBOUNCE_MS` | `350` | Debounce after the last mutation |
    /// | `AICHAR_QUEUED_PAUSE_MS` | `100` | Pause before a queued pass |
    /// | `AICHAR_LINGER_MS` | `200` | Linger at 100% before going idle |
    pub fn from_env() -> Self {
        fn ms(var: &str, default: u64) -> u64 {
            std::env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        }

        Self {
            debounce_ms: ms("AICHAR_DEBOUNCE_MS", DEBOUNCE_MS),
            queued_pause_ms: ms("AICHAR_QUEUED_PAUSE_MS", QUEUED_PASS_PAUSE_MS),
            linger_ms: ms("AICHAR_LINGER_MS", COMPLETION_LINGER_MS),
            seed: None,
        }
    }

    /// Set the debounce period.
    pub fn with_debounce(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the pause before a queued pass.
    pub fn with_queued_pause(mut self, ms: u64) -> Self {
        self.queued_pause_ms = ms;
        self
    }

    /// Set the completion linger.
    pub fn with_linger(mut self, ms: u64) -> Self {
        self.linger_ms = ms;
        self
    }

    /// Seed the shuffle generator for reproducible output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    #[default]
    Idle,
    Debouncing,
    Rendering,
    /// Rendering, with at least one mutation waiting for the next pass.
    RenderingQueued,
}

/// What a mutation did to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEffect {
    /// (Re)start the debounce timer.
    Debounce,
    /// A pass is in flight; the change waits for the next one.
    Queued,
}

/// What to do when a pass completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterPass {
    /// Run one more pass with this id for the queued changes.
    RunQueued(u64),
    /// Linger at 100%, then call [`RenderStateMachine::on_linger_elapsed`].
    Linger,
}

/// What to do once the completion linger is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterLinger {
    /// Changes arrived during the linger; run a pass with this id.
    RunQueued(u64),
    Idle,
}

/// Debounce/queue policy of the scheduler.
///
/// Pure: the driver feeds it events and acts on the returned decisions.
#[derive(Debug, Default)]
pub struct RenderStateMachine {
    state: RenderState,
    progress: u8,
    passes_started: u64,
}

impl RenderStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Progress of the pass in flight; 0 when none is.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Ids are assigned from 1 in start order.
    pub fn passes_started(&self) -> u64 {
        self.passes_started
    }

    /// Whether the "change pending" signal should be shown.
    pub fn is_change_pending(&self) -> bool {
        matches!(self.state, RenderState::Debouncing | RenderState::RenderingQueued)
    }

    pub fn on_mutation(&mut self) -> MutationEffect {
        match self.state {
            RenderState::Idle | RenderState::Debouncing => {
                self.state = RenderState::Debouncing;
                MutationEffect::Debounce
            }
            RenderState::Rendering | RenderState::RenderingQueued => {
                self.state = RenderState::RenderingQueued;
                MutationEffect::Queued
            }
        }
    }

    /// Start a pass straight from `Idle`, skipping the debounce.
    pub fn start_pass(&mut self) -> Option<u64> {
        (self.state == RenderState::Idle).then(|| self.begin_pass())
    }

    /// The debounce timer fired. Returns the id of the pass to run, if any.
    pub fn on_debounce_elapsed(&mut self) -> Option<u64> {
        (self.state == RenderState::Debouncing).then(|| self.begin_pass())
    }

    /// Record stage progress. Progress never moves backwards within a pass;
    /// the returned value is what should be reported.
    pub fn on_progress(&mut self, percent: u8) -> u8 {
        self.progress = self.progress.max(percent.min(PROGRESS_COMPLETE));
        self.progress
    }

    pub fn on_pass_complete(&mut self) -> AfterPass {
        match self.state {
            RenderState::RenderingQueued => AfterPass::RunQueued(self.begin_pass()),
            _ => AfterPass::Linger,
        }
    }

    pub fn on_linger_elapsed(&mut self) -> AfterLinger {
        match self.state {
            RenderState::RenderingQueued => AfterLinger::RunQueued(self.begin_pass()),
            _ => {
                self.finish();
                AfterLinger::Idle
            }
        }
    }

    /// A pass failed. The machine is forced to `Idle`; returns whether a
    /// change had been queued, which the driver treats as a fresh mutation.
    pub fn on_pass_failed(&mut self) -> bool {
        let queued = self.state == RenderState::RenderingQueued;
        self.finish();
        queued
    }

    fn begin_pass(&mut self) -> u64 {
        self.state = RenderState::Rendering;
        self.progress = PROGRESS_START;
        self.passes_started += 1;
        self.passes_started
    }

    fn finish(&mut self) {
        self.state = RenderState::Idle;
        self.progress = PROGRESS_START;
    }
}

// =============================================================================
// MUTATIONS AND EVENTS
// =============================================================================

/// A change to the filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterMutation {
    SetCategory {
        group: FilterGroup,
        category: FilterCategory,
        enabled: bool,
    },
    /// A button click: flip the category (or the group's `Any`).
    ToggleCategory {
        group: FilterGroup,
        category: FilterCategory,
    },
    SetSortBy {
        sort_by: SortBy,
    },
    SetSearch {
        text: String,
    },
    SetShuffle {
        axis: ShuffleAxis,
        enabled: bool,
    },
    SelectChartCell {
        cell: ChartCell,
    },
    Replace {
        filters: Box<FilterConfiguration>,
    },
}

impl FilterMutation {
    /// Apply to `filters`. Returns whether anything changed.
    pub fn apply(&self, filters: &mut FilterConfiguration) -> bool {
        match self {
            Self::SetCategory {
                group,
                category,
                enabled,
            } => filters.set_category(*group, *category, *enabled),
            Self::ToggleCategory { group, category } => filters.toggle_category(*group, *category),
            Self::SetSortBy { sort_by } => filters.set_sort_by(*sort_by),
            Self::SetSearch { text } => filters.set_search(text.as_str()),
            Self::SetShuffle { axis, enabled } => filters.set_shuffle(*axis, *enabled),
            Self::SelectChartCell { cell } => filters.select_chart_cell(*cell),
            Self::Replace { filters: next } => {
                let changed = **next != *filters;
                *filters = (**next).clone();
                changed
            }
        }
    }

    /// Whether the change can alter the listing. Totals-filter changes only
    /// touch the statistics table.
    pub fn affects_display(&self) -> bool {
        !self.targets_totals()
    }

    /// Whether the statistics table must be recomputed.
    pub fn affects_statistics(&self) -> bool {
        self.targets_totals() || matches!(self, Self::Replace { .. })
    }

    fn targets_totals(&self) -> bool {
        matches!(
            self,
            Self::SetCategory {
                group: FilterGroup::QualificationTotals,
                ..
            } | Self::ToggleCategory {
                group: FilterGroup::QualificationTotals,
                ..
            }
        )
    }
}

/// Event emitted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// A change is waiting for a pass (debouncing or queued).
    ChangePending,
    PassStarted {
        pass_id: u64,
    },
    Progress {
        pass_id: u64,
        percent: u8,
        label: String,
    },
    /// A new plan was published.
    PassCompleted {
        pass_id: u64,
        groups: usize,
        entries: usize,
    },
    /// The pass failed; the previous plan stays published.
    PassFailed {
        pass_id: u64,
        error: String,
    },
    StatisticsUpdated {
        grand_total: usize,
    },
    /// No pass in flight and nothing pending; the progress indicator hides.
    Idle,
}

enum Command {
    Mutate(FilterMutation),
    Settle(oneshot::Sender<()>),
}

// =============================================================================
// HANDLE
// =============================================================================

/// Handle for controlling a running scheduler.
///
/// Dropping the handle stops the scheduler.
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<SchedulerEvent>,
    plan_rx: watch::Receiver<Option<Arc<RenderPlan>>>,
    stats_rx: watch::Receiver<ContingencyTable>,
    filters_rx: watch::Receiver<FilterConfiguration>,
}

impl SchedulerHandle {
    /// Queue a mutation. Never blocks.
    pub fn mutate(&self, mutation: FilterMutation) -> Result<()> {
        self.send(Command::Mutate(mutation))
    }

    pub fn set_category(
        &self,
        group: FilterGroup,
        category: FilterCategory,
        enabled: bool,
    ) -> Result<()> {
        self.mutate(FilterMutation::SetCategory {
            group,
            category,
            enabled,
        })
    }

    pub fn toggle_category(&self, group: FilterGroup, category: FilterCategory) -> Result<()> {
        self.mutate(FilterMutation::ToggleCategory { group, category })
    }

    pub fn set_sort_by(&self, sort_by: SortBy) -> Result<()> {
        self.mutate(FilterMutation::SetSortBy { sort_by })
    }

    pub fn set_search(&self, text: impl Into<String>) -> Result<()> {
        self.mutate(FilterMutation::SetSearch { text: text.into() })
    }

    pub fn set_shuffle(&self, axis: ShuffleAxis, enabled: bool) -> Result<()> {
        self.mutate(FilterMutation::SetShuffle { axis, enabled })
    }

    pub fn select_chart_cell(&self, cell: ChartCell) -> Result<()> {
        self.mutate(FilterMutation::SelectChartCell { cell })
    }

    /// Replace the whole configuration.
    pub fn replace_filters(&self, filters: FilterConfiguration) -> Result<()> {
        self.mutate(FilterMutation::Replace {
            filters: Box::new(filters),
        })
    }

    /// Wait until every mutation sent so far has been rendered and the
    /// scheduler is idle, then return the latest plan.
    pub async fn settled(&self) -> Result<Option<Arc<RenderPlan>>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Settle(tx))?;
        rx.await
            .map_err(|_| Error::Scheduler("scheduler stopped before settling".into()))?;
        Ok(self.plan())
    }

    /// Signal the scheduler to shut down.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for scheduler events.
    pub fn events(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.event_rx.resubscribe()
    }

    /// The latest published plan; `None` before the first pass completes.
    pub fn plan(&self) -> Option<Arc<RenderPlan>> {
        self.plan_rx.borrow().clone()
    }

    /// Watch the published plan.
    pub fn watch_plan(&self) -> watch::Receiver<Option<Arc<RenderPlan>>> {
        self.plan_rx.clone()
    }

    /// The current statistics table.
    pub fn statistics(&self) -> ContingencyTable {
        *self.stats_rx.borrow()
    }

    /// The current filter configuration, including changes not yet rendered.
    pub fn filters(&self) -> FilterConfiguration {
        self.filters_rx.borrow().clone()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::Scheduler("mutation queue full".into()),
            mpsc::error::TrySendError::Closed(_) => Error::Scheduler("scheduler stopped".into()),
        })
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Render scheduler over a shared, immutable dataset.
pub struct RenderScheduler {
    dataset: Arc<Dataset>,
    filters: FilterConfiguration,
    config: SchedulerConfig,
    #[cfg(test)]
    fault: Option<(u64, StageFault)>,
}

impl RenderScheduler {
    pub fn new(
        dataset: Arc<Dataset>,
        filters: FilterConfiguration,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            dataset,
            filters,
            config,
            #[cfg(test)]
            fault: None,
        }
    }

    /// Make pass `pass_id` fail at its grouping stage.
    #[cfg(test)]
    fn with_fault(mut self, pass_id: u64, fault: StageFault) -> Self {
        self.fault = Some((pass_id, fault));
        self
    }

    /// Spawn the driver task and run the initial pass. Must be called from
    /// within a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (command_tx, command_rx) = mpsc::channel(MUTATION_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = broadcast::channel(EVENT_BUS_CAPACITY);
        let (plan_tx, plan_rx) = watch::channel(None);
        let statistics = aggregate_for(&self.dataset.characters, &self.filters);
        let (stats_tx, stats_rx) = watch::channel(statistics);
        let (filters_tx, filters_rx) = watch::channel(self.filters.clone());

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let driver = Driver {
            dataset: self.dataset,
            filters: self.filters,
            config: self.config,
            machine: RenderStateMachine::new(),
            commands: command_rx,
            shutdown_rx,
            events: event_tx,
            plan_tx,
            stats_tx,
            filters_tx,
            rng,
            debounce_deadline: Instant::now(),
            waiters: Vec::new(),
            stopping: false,
            #[cfg(test)]
            fault: self.fault,
        };
        tokio::spawn(driver.run());

        SchedulerHandle {
            commands: command_tx,
            shutdown_tx,
            event_rx,
            plan_rx,
            stats_rx,
            filters_rx,
        }
    }
}

struct Driver {
    dataset: Arc<Dataset>,
    filters: FilterConfiguration,
    config: SchedulerConfig,
    machine: RenderStateMachine,
    commands: mpsc::Receiver<Command>,
    shutdown_rx: mpsc::Receiver<()>,
    events: broadcast::Sender<SchedulerEvent>,
    plan_tx: watch::Sender<Option<Arc<RenderPlan>>>,
    stats_tx: watch::Sender<ContingencyTable>,
    filters_tx: watch::Sender<FilterConfiguration>,
    rng: StdRng,
    debounce_deadline: Instant,
    waiters: Vec<oneshot::Sender<()>>,
    stopping: bool,
    #[cfg(test)]
    fault: Option<(u64, StageFault)>,
}

impl Driver {
    #[instrument(skip(self), fields(subsystem = "pipeline", component = "scheduler"))]
    async fn run(mut self) {
        info!(
            record_count = self.dataset.len(),
            debounce_ms = self.config.debounce_ms,
            "Render scheduler started"
        );

        if let Some(pass_id) = self.machine.start_pass() {
            self.run_passes(pass_id, START_LABEL).await;
        }

        while !self.stopping {
            if self.machine.state() == RenderState::Debouncing {
                let deadline = self.debounce_deadline;
                tokio::select! {
                    _ = self.shutdown_rx.recv() => self.stopping = true,
                    command = self.commands.recv() => self.receive(command),
                    _ = sleep_until(deadline) => {
                        if let Some(pass_id) = self.machine.on_debounce_elapsed() {
                            self.run_passes(pass_id, START_LABEL).await;
                        }
                    }
                }
            } else {
                tokio::select! {
                    _ = self.shutdown_rx.recv() => self.stopping = true,
                    command = self.commands.recv() => self.receive(command),
                }
            }
        }

        // Nothing more will be rendered; release anyone waiting.
        self.waiters.clear();
        info!(passes = self.machine.passes_started(), "Render scheduler stopped");
    }

    fn receive(&mut self, command: Option<Command>) {
        match command {
            Some(command) => self.handle(command),
            None => self.stopping = true,
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Mutate(mutation) => self.apply(mutation),
            Command::Settle(waiter) => {
                if self.machine.state() == RenderState::Idle {
                    let _ = waiter.send(());
                } else {
                    self.waiters.push(waiter);
                }
            }
        }
    }

    fn apply(&mut self, mutation: FilterMutation) {
        if !mutation.apply(&mut self.filters) {
            debug!(?mutation, "Mutation left filters unchanged");
            return;
        }
        self.filters_tx.send_replace(self.filters.clone());

        if mutation.affects_statistics() {
            self.publish_statistics();
        }
        if !mutation.affects_display() {
            return;
        }

        match self.machine.on_mutation() {
            MutationEffect::Debounce => {
                self.debounce_deadline =
                    Instant::now() + Duration::from_millis(self.config.debounce_ms);
                debug!(?mutation, "Mutation debounced");
            }
            MutationEffect::Queued => debug!(?mutation, "Mutation queued behind pass"),
        }
        self.emit(SchedulerEvent::ChangePending);
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.handle(command);
        }
    }

    fn publish_statistics(&mut self) {
        let table = aggregate_for(&self.dataset.characters, &self.filters);
        debug!(grand_total = table.grand_total(), "Statistics recomputed");
        self.stats_tx.send_replace(table);
        self.emit(SchedulerEvent::StatisticsUpdated {
            grand_total: table.grand_total(),
        });
    }

    fn emit(&self, event: SchedulerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn go_idle(&mut self) {
        self.emit(SchedulerEvent::Idle);
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Run passes until nothing is queued.
    async fn run_passes(&mut self, mut pass_id: u64, mut label: &'static str) {
        loop {
            match self.run_pass(pass_id, label).await {
                Ok(plan) => {
                    self.emit(SchedulerEvent::PassCompleted {
                        pass_id,
                        groups: plan.groups.len(),
                        entries: plan.total_entries,
                    });
                    self.plan_tx.send_replace(Some(Arc::new(plan)));

                    match self.machine.on_pass_complete() {
                        AfterPass::RunQueued(next) => {
                            self.pause(self.config.queued_pause_ms).await;
                            pass_id = next;
                            label = QUEUED_LABEL;
                        }
                        AfterPass::Linger => {
                            self.pause(self.config.linger_ms).await;
                            match self.machine.on_linger_elapsed() {
                                AfterLinger::RunQueued(next) => {
                                    pass_id = next;
                                    label = QUEUED_LABEL;
                                }
                                AfterLinger::Idle => {
                                    self.go_idle();
                                    return;
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(pass_id, error = %e, "Render pass failed");
                    self.emit(SchedulerEvent::PassFailed {
                        pass_id,
                        error: e.to_string(),
                    });
                    if self.machine.on_pass_failed() {
                        warn!(pass_id, "Queued changes will render in a fresh pass");
                        self.machine.on_mutation();
                        self.debounce_deadline =
                            Instant::now() + Duration::from_millis(self.config.debounce_ms);
                        self.emit(SchedulerEvent::ChangePending);
                    } else {
                        self.go_idle();
                    }
                    return;
                }
            }
        }
    }

    /// Run one pass to completion, yielding between stages. Errors and panics
    /// inside a stage end the pass.
    async fn run_pass(&mut self, pass_id: u64, label: &'static str) -> Result<RenderPlan> {
        let start = std::time::Instant::now();
        let rng = StdRng::seed_from_u64(self.rng.gen());
        let pass = RenderPass::new(self.dataset.clone(), self.filters.clone(), rng)
            .with_start_label(label);
        #[cfg(test)]
        let pass = match self.fault {
            Some((id, fault)) if id == pass_id => pass.with_fault(fault),
            _ => pass,
        };
        let mut pass = pass;

        debug!(pass_id, "Render pass started");
        self.emit(SchedulerEvent::PassStarted { pass_id });

        loop {
            let step = panic::catch_unwind(AssertUnwindSafe(|| pass.step()))
                .unwrap_or_else(|payload| Err(Error::Render(panic_message(payload.as_ref()))))?;

            match step {
                PassStep::Advanced(progress) => {
                    let percent = self.machine.on_progress(progress.percent);
                    self.emit(SchedulerEvent::Progress {
                        pass_id,
                        percent,
                        label: progress.label,
                    });
                    tokio::task::yield_now().await;
                    self.drain_commands();
                }
                PassStep::Complete(plan) => {
                    let percent = self.machine.on_progress(PROGRESS_COMPLETE);
                    self.emit(SchedulerEvent::Progress {
                        pass_id,
                        percent,
                        label: COMPLETE_LABEL.to_string(),
                    });
                    info!(
                        pass_id,
                        group_count = plan.groups.len(),
                        match_count = plan.total_entries,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Render pass complete"
                    );
                    return Ok(plan);
                }
            }
        }
    }

    /// Sleep while still accepting commands.
    async fn pause(&mut self, ms: u64) {
        let deadline = Instant::now() + Duration::from_millis(ms);
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return,
                _ = self.shutdown_rx.recv(), if !self.stopping => self.stopping = true,
                command = self.commands.recv(), if !self.stopping => self.receive(command),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("render stage panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("render stage panicked: {s}")
    } else {
        "render stage panicked".to_string()
    }
}
