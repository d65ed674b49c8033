//! Filter configuration for the character listing and the statistics table.
//!
//! [`FilterConfiguration`] is a plain value object. The host owns the single
//! writable instance and passes it by reference into every pipeline function;
//! nothing in the core closes over ambient filter state.
//!
//! Two schemes are supported and kept apart by [`DisplayFilter`]:
//!
//! - **Multi-select**: every category is an independent toggle. The
//!   qualification group carries an extra `unresearched` axis, and a separate
//!   totals filter governs the statistics table only.
//! - **Single-select**: every group holds exactly one [`Selector`], either
//!   `Any` or one concrete category. There is no unresearched axis and no
//!   totals filter.
//!
//! # Example
//!
//! ```
//! use aichar_core::{FilterCategory, FilterConfiguration, FilterGroup};
//!
//! let mut filters = FilterConfiguration::multi_select();
//! assert!(filters.is_any_active(FilterGroup::Benevolence));
//!
//! filters.set_category(FilterGroup::Benevolence, FilterCategory::Malevolent, false);
//! assert!(!filters.is_any_active(FilterGroup::Benevolence));
//!
//! filters.toggle_any(FilterGroup::Benevolence);
//! assert!(filters.is_any_active(FilterGroup::Benevolence));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AiQualification, Alignment, Benevolence, CharacterRecord, RatingCategory};

// =============================================================================
// SCHEME, SORT MODE, SHUFFLE
// =============================================================================

/// Which filter scheme the dataset/UI uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterScheme {
    #[default]
    MultiSelect,
    SingleSelect,
}

impl FromStr for FilterScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multi" | "multi-select" | "multi_select" => Ok(Self::MultiSelect),
            "single" | "single-select" | "single_select" => Ok(Self::SingleSelect),
            other => Err(Error::InvalidInput(format!("unknown filter scheme '{other}'"))),
        }
    }
}

/// Which resolved rating drives entry badges, group tri-counts and chart colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Benevolence,
    Alignment,
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "benevolence" => Ok(Self::Benevolence),
            "alignment" => Ok(Self::Alignment),
            other => Err(Error::InvalidInput(format!("unknown sort mode '{other}'"))),
        }
    }
}

/// One of the two independent randomization toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleAxis {
    /// Entry order within each work-type group.
    Characters,
    /// Order of the work-type groups.
    WorkTypes,
}

/// Current shuffle toggles. Both off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShuffleState {
    pub characters: bool,
    pub work_types: bool,
}

impl ShuffleState {
    /// Whether the given axis is enabled.
    pub fn is_enabled(&self, axis: ShuffleAxis) -> bool {
        match axis {
            ShuffleAxis::Characters => self.characters,
            ShuffleAxis::WorkTypes => self.work_types,
        }
    }
}

// =============================================================================
// GROUPS AND CATEGORIES
// =============================================================================

/// A filter button group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterGroup {
    /// Display filter on AI qualification (plus the unresearched axis).
    Qualification,
    /// Statistics-only filter on AI qualification (multi-select only).
    QualificationTotals,
    Benevolence,
    Alignment,
}

impl FromStr for FilterGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai-qualification" | "qualification" => Ok(Self::Qualification),
            "ai-qualification-totals" | "totals" => Ok(Self::QualificationTotals),
            "benevolence" => Ok(Self::Benevolence),
            "alignment" => Ok(Self::Alignment),
            other => Err(Error::InvalidInput(format!("unknown filter group '{other}'"))),
        }
    }
}

/// A button inside a filter group, including the derived `Any` button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    Any,
    Pass,
    Fail,
    Ambiguous,
    NotApplicable,
    Unresearched,
    Benevolent,
    Malevolent,
    Aligned,
    Misaligned,
}

impl FilterCategory {
    fn qualification(self) -> Option<AiQualification> {
        match self {
            Self::Pass => Some(AiQualification::Pass),
            Self::Ambiguous => Some(AiQualification::Ambiguous),
            Self::Fail => Some(AiQualification::Fail),
            Self::NotApplicable => Some(AiQualification::NotApplicable),
            _ => None,
        }
    }

    fn benevolence(self) -> Option<Benevolence> {
        match self {
            Self::Benevolent => Some(Benevolence::Benevolent),
            Self::Ambiguous => Some(Benevolence::Ambiguous),
            Self::Malevolent => Some(Benevolence::Malevolent),
            Self::NotApplicable => Some(Benevolence::NotApplicable),
            _ => None,
        }
    }

    fn alignment(self) -> Option<Alignment> {
        match self {
            Self::Aligned => Some(Alignment::Aligned),
            Self::Ambiguous => Some(Alignment::Ambiguous),
            Self::Misaligned => Some(Alignment::Misaligned),
            Self::NotApplicable => Some(Alignment::NotApplicable),
            _ => None,
        }
    }
}

impl FromStr for FilterCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "ambiguous" | "ambiguous-only" => Ok(Self::Ambiguous),
            "na" | "n/a" => Ok(Self::NotApplicable),
            "unresearched" => Ok(Self::Unresearched),
            "benevolent" => Ok(Self::Benevolent),
            "malevolent" => Ok(Self::Malevolent),
            "aligned" => Ok(Self::Aligned),
            "misaligned" => Ok(Self::Misaligned),
            other => Err(Error::InvalidInput(format!("unknown filter category '{other}'"))),
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::Any => "any",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Ambiguous => "ambiguous",
            Self::NotApplicable => "na",
            Self::Unresearched => "unresearched",
            Self::Benevolent => "benevolent",
            Self::Malevolent => "malevolent",
            Self::Aligned => "aligned",
            Self::Misaligned => "misaligned",
        };
        f.write_str(key)
    }
}

// =============================================================================
// MULTI-SELECT TOGGLES
// =============================================================================

/// Independent on/off toggle per category of one rating axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct CategoryToggles<C: RatingCategory> {
    enabled: [bool; 4],
    #[serde(skip)]
    marker: PhantomData<C>,
}

impl<C: RatingCategory> CategoryToggles<C> {
    /// Every category enabled.
    pub fn all() -> Self {
        Self::uniform(true)
    }

    /// Every category disabled.
    pub fn none() -> Self {
        Self::uniform(false)
    }

    /// Only `category` enabled.
    pub fn only(category: C) -> Self {
        let mut toggles = Self::none();
        toggles.set(category, true);
        toggles
    }

    fn uniform(enabled: bool) -> Self {
        Self {
            enabled: [enabled; 4],
            marker: PhantomData,
        }
    }

    /// Whether a resolved category passes.
    pub fn allows(&self, category: C) -> bool {
        self.enabled[category.index()]
    }

    /// Set one category.
    pub fn set(&mut self, category: C, enabled: bool) {
        self.enabled[category.index()] = enabled;
    }

    /// Set every category to the same value.
    pub fn set_all(&mut self, enabled: bool) {
        self.enabled = [enabled; 4];
    }

    /// Derived `Any` state: every category enabled.
    pub fn all_enabled(&self) -> bool {
        self.enabled.iter().all(|&e| e)
    }
}

impl<C: RatingCategory> Default for CategoryToggles<C> {
    fn default() -> Self {
        Self::all()
    }
}

/// AI-qualification toggles plus the unresearched axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationToggles {
    pub categories: CategoryToggles<AiQualification>,
    /// When off, records flagged `needs_research` are excluded.
    pub unresearched: bool,
}

impl QualificationToggles {
    /// Every category and the unresearched axis enabled.
    pub fn all() -> Self {
        Self {
            categories: CategoryToggles::all(),
            unresearched: true,
        }
    }

    /// Default totals filter: Pass and unresearched only.
    pub fn totals_default() -> Self {
        Self {
            categories: CategoryToggles::only(AiQualification::Pass),
            unresearched: true,
        }
    }

    /// Whether the record's qualification passes.
    pub fn allows_qualification(&self, record: &CharacterRecord) -> bool {
        self.categories.allows(record.resolved_qualification())
    }

    /// Whether the record's research state passes.
    pub fn allows_research_state(&self, record: &CharacterRecord) -> bool {
        !record.needs_research || self.unresearched
    }

    /// Both qualification and research state pass.
    pub fn allows(&self, record: &CharacterRecord) -> bool {
        self.allows_qualification(record) && self.allows_research_state(record)
    }

    /// Derived `Any` state: every category and the unresearched axis enabled.
    pub fn all_enabled(&self) -> bool {
        self.categories.all_enabled() && self.unresearched
    }

    fn set_all(&mut self, enabled: bool) {
        self.categories.set_all(enabled);
        self.unresearched = enabled;
    }

    fn set(&mut self, category: FilterCategory, enabled: bool) -> bool {
        if category == FilterCategory::Unresearched {
            self.unresearched = enabled;
            return true;
        }
        match category.qualification() {
            Some(q) => {
                self.categories.set(q, enabled);
                true
            }
            None => false,
        }
    }

    fn is_active(&self, category: FilterCategory) -> Option<bool> {
        if category == FilterCategory::Unresearched {
            return Some(self.unresearched);
        }
        category.qualification().map(|q| self.categories.allows(q))
    }
}

impl Default for QualificationToggles {
    fn default() -> Self {
        Self::all()
    }
}

// =============================================================================
// SINGLE-SELECT SELECTORS
// =============================================================================

/// Exactly one active choice for a single-select group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector<C> {
    Any,
    Exactly(C),
}

impl<C: RatingCategory> Selector<C> {
    /// Whether a resolved category passes.
    pub fn allows(&self, category: C) -> bool {
        match self {
            Selector::Any => true,
            Selector::Exactly(wanted) => *wanted == category,
        }
    }

    fn apply(&mut self, category: Option<C>, enabled: bool) {
        match (category, enabled) {
            (None, _) => *self = Selector::Any,
            (Some(c), true) => *self = Selector::Exactly(c),
            (Some(c), false) if *self == Selector::Exactly(c) => *self = Selector::Any,
            (Some(_), false) => {}
        }
    }
}

// =============================================================================
// DISPLAY FILTER
// =============================================================================

/// The listing filter, tagged by scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum DisplayFilter {
    MultiSelect {
        qualification: QualificationToggles,
        benevolence: CategoryToggles<Benevolence>,
        alignment: CategoryToggles<Alignment>,
    },
    SingleSelect {
        qualification: Selector<AiQualification>,
        benevolence: Selector<Benevolence>,
        alignment: Selector<Alignment>,
    },
}

impl DisplayFilter {
    /// The scheme tag.
    pub fn scheme(&self) -> FilterScheme {
        match self {
            Self::MultiSelect { .. } => FilterScheme::MultiSelect,
            Self::SingleSelect { .. } => FilterScheme::SingleSelect,
        }
    }

    /// Stage 1: AI-qualification inclusion.
    ///
    /// Absent qualification is compared as N/A in both schemes.
    pub fn passes_qualification(&self, record: &CharacterRecord) -> bool {
        match self {
            Self::MultiSelect { qualification, .. } => qualification.allows_qualification(record),
            Self::SingleSelect { qualification, .. } => {
                qualification.allows(record.resolved_qualification())
            }
        }
    }

    /// Stage 2: unresearched inclusion. Always passes in single-select.
    pub fn passes_research_state(&self, record: &CharacterRecord) -> bool {
        match self {
            Self::MultiSelect { qualification, .. } => {
                qualification.allows_research_state(record)
            }
            Self::SingleSelect { .. } => true,
        }
    }

    /// Stage 3: benevolence inclusion.
    pub fn passes_benevolence(&self, record: &CharacterRecord) -> bool {
        self.allows_benevolence(record.resolved_benevolence())
    }

    /// Stage 4: alignment inclusion.
    pub fn passes_alignment(&self, record: &CharacterRecord) -> bool {
        self.allows_alignment(record.resolved_alignment())
    }

    fn allows_benevolence(&self, category: Benevolence) -> bool {
        match self {
            Self::MultiSelect { benevolence, .. } => benevolence.allows(category),
            Self::SingleSelect { benevolence, .. } => benevolence.allows(category),
        }
    }

    fn allows_alignment(&self, category: Alignment) -> bool {
        match self {
            Self::MultiSelect { alignment, .. } => alignment.allows(category),
            Self::SingleSelect { alignment, .. } => alignment.allows(category),
        }
    }
}

// =============================================================================
// CHART CELLS
// =============================================================================

/// A cell of the statistics chart. `None` on an axis is the "any" total
/// row/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChartCell {
    pub benevolence: Option<Benevolence>,
    pub alignment: Option<Alignment>,
}

impl ChartCell {
    /// A body cell for one benevolence/alignment combination.
    pub fn new(benevolence: Benevolence, alignment: Alignment) -> Self {
        Self {
            benevolence: Some(benevolence),
            alignment: Some(alignment),
        }
    }

    /// The grand-total cell.
    pub fn grand_total() -> Self {
        Self::default()
    }
}

// =============================================================================
// FILTER CONFIGURATION
// =============================================================================

/// Complete filter, sort and shuffle state for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    pub sort_by: SortBy,
    pub display: DisplayFilter,
    /// Statistics-only qualification filter. `Some` only in multi-select.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<QualificationToggles>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub shuffle: ShuffleState,
}

impl Default for FilterConfiguration {
    fn default() -> Self {
        Self::multi_select()
    }
}

impl FilterConfiguration {
    /// Multi-select defaults: everything displayed, totals count Pass only.
    pub fn multi_select() -> Self {
        Self {
            sort_by: SortBy::default(),
            display: DisplayFilter::MultiSelect {
                qualification: QualificationToggles::all(),
                benevolence: CategoryToggles::all(),
                alignment: CategoryToggles::all(),
            },
            totals: Some(QualificationToggles::totals_default()),
            search: String::new(),
            shuffle: ShuffleState::default(),
        }
    }

    /// Single-select defaults: every group on `Any`.
    pub fn single_select() -> Self {
        Self {
            sort_by: SortBy::default(),
            display: DisplayFilter::SingleSelect {
                qualification: Selector::Any,
                benevolence: Selector::Any,
                alignment: Selector::Any,
            },
            totals: None,
            search: String::new(),
            shuffle: ShuffleState::default(),
        }
    }

    /// Defaults for the given scheme.
    pub fn for_scheme(scheme: FilterScheme) -> Self {
        match scheme {
            FilterScheme::MultiSelect => Self::multi_select(),
            FilterScheme::SingleSelect => Self::single_select(),
        }
    }

    /// The scheme tag.
    pub fn scheme(&self) -> FilterScheme {
        self.display.scheme()
    }

    /// Lower-cased search needle, or `None` when the search is empty.
    pub fn search_needle(&self) -> Option<String> {
        if self.search.is_empty() {
            None
        } else {
            Some(self.search.to_lowercase())
        }
    }

    /// Whether a record passes the statistics filter.
    ///
    /// Without a totals filter (single-select) every record counts.
    pub fn passes_totals(&self, record: &CharacterRecord) -> bool {
        self.totals.map_or(true, |t| t.allows(record))
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Set one category of a group. Returns whether anything changed.
    ///
    /// `FilterCategory::Any` sets every concrete category of the group to
    /// `enabled`. Categories that do not belong to the group or scheme are
    /// ignored.
    pub fn set_category(
        &mut self,
        group: FilterGroup,
        category: FilterCategory,
        enabled: bool,
    ) -> bool {
        let before = self.clone();
        let applied = match group {
            FilterGroup::QualificationTotals => match self.totals.as_mut() {
                Some(totals) if category == FilterCategory::Any => {
                    totals.set_all(enabled);
                    true
                }
                Some(totals) => totals.set(category, enabled),
                None => false,
            },
            _ => self.set_display_category(group, category, enabled),
        };
        if !applied {
            debug!(
                subsystem = "core",
                component = "filter",
                op = "set_category",
                ?group,
                %category,
                scheme = ?self.scheme(),
                "Ignoring category outside group"
            );
        }
        *self != before
    }

    fn set_display_category(
        &mut self,
        group: FilterGroup,
        category: FilterCategory,
        enabled: bool,
    ) -> bool {
        let any = category == FilterCategory::Any;
        match &mut self.display {
            DisplayFilter::MultiSelect {
                qualification,
                benevolence,
                alignment,
            } => match group {
                FilterGroup::Qualification if any => {
                    qualification.set_all(enabled);
                    true
                }
                FilterGroup::Qualification => qualification.set(category, enabled),
                FilterGroup::Benevolence => {
                    set_toggle(benevolence, category.benevolence(), any, enabled)
                }
                FilterGroup::Alignment => {
                    set_toggle(alignment, category.alignment(), any, enabled)
                }
                FilterGroup::QualificationTotals => false,
            },
            DisplayFilter::SingleSelect {
                qualification,
                benevolence,
                alignment,
            } => match group {
                FilterGroup::Qualification => {
                    set_selector(qualification, category.qualification(), any, enabled)
                }
                FilterGroup::Benevolence => {
                    set_selector(benevolence, category.benevolence(), any, enabled)
                }
                FilterGroup::Alignment => {
                    set_selector(alignment, category.alignment(), any, enabled)
                }
                FilterGroup::QualificationTotals => false,
            },
        }
    }

    /// Click on a group's `Any` button: all off if all were on, else all on.
    ///
    /// In single-select this always selects `Any`.
    pub fn toggle_any(&mut self, group: FilterGroup) -> bool {
        let enable = match self.scheme() {
            FilterScheme::MultiSelect => !self.is_any_active(group),
            FilterScheme::SingleSelect => true,
        };
        self.set_category(group, FilterCategory::Any, enable)
    }

    /// Click on a concrete category button: flip its state.
    pub fn toggle_category(&mut self, group: FilterGroup, category: FilterCategory) -> bool {
        if category == FilterCategory::Any {
            return self.toggle_any(group);
        }
        let enable = !self.is_category_active(group, category);
        self.set_category(group, category, enable)
    }

    /// Switch the rating that drives badges and tri-counts.
    pub fn set_sort_by(&mut self, sort_by: SortBy) -> bool {
        let changed = self.sort_by != sort_by;
        self.sort_by = sort_by;
        changed
    }

    /// Replace the free-text search.
    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let changed = self.search != text;
        self.search = text;
        changed
    }

    /// Enable or disable one shuffle axis.
    pub fn set_shuffle(&mut self, axis: ShuffleAxis, enabled: bool) -> bool {
        let slot = match axis {
            ShuffleAxis::Characters => &mut self.shuffle.characters,
            ShuffleAxis::WorkTypes => &mut self.shuffle.work_types,
        };
        let changed = *slot != enabled;
        *slot = enabled;
        changed
    }

    // =========================================================================
    // DERIVED BUTTON STATE
    // =========================================================================

    /// Derived state of a group's `Any` button.
    pub fn is_any_active(&self, group: FilterGroup) -> bool {
        match (&self.display, group) {
            (_, FilterGroup::QualificationTotals) => {
                self.totals.map_or(false, |t| t.all_enabled())
            }
            (DisplayFilter::MultiSelect { qualification, .. }, FilterGroup::Qualification) => {
                qualification.all_enabled()
            }
            (DisplayFilter::MultiSelect { benevolence, .. }, FilterGroup::Benevolence) => {
                benevolence.all_enabled()
            }
            (DisplayFilter::MultiSelect { alignment, .. }, FilterGroup::Alignment) => {
                alignment.all_enabled()
            }
            (DisplayFilter::SingleSelect { qualification, .. }, FilterGroup::Qualification) => {
                *qualification == Selector::Any
            }
            (DisplayFilter::SingleSelect { benevolence, .. }, FilterGroup::Benevolence) => {
                *benevolence == Selector::Any
            }
            (DisplayFilter::SingleSelect { alignment, .. }, FilterGroup::Alignment) => {
                *alignment == Selector::Any
            }
        }
    }

    /// Whether a category button is active. `Any` defers to
    /// [`Self::is_any_active`]; categories outside the group are inactive.
    pub fn is_category_active(&self, group: FilterGroup, category: FilterCategory) -> bool {
        if category == FilterCategory::Any {
            return self.is_any_active(group);
        }
        match (&self.display, group) {
            (_, FilterGroup::QualificationTotals) => self
                .totals
                .and_then(|t| t.is_active(category))
                .unwrap_or(false),
            (DisplayFilter::MultiSelect { qualification, .. }, FilterGroup::Qualification) => {
                qualification.is_active(category).unwrap_or(false)
            }
            (DisplayFilter::MultiSelect { benevolence, .. }, FilterGroup::Benevolence) => category
                .benevolence()
                .map_or(false, |b| benevolence.allows(b)),
            (DisplayFilter::MultiSelect { alignment, .. }, FilterGroup::Alignment) => category
                .alignment()
                .map_or(false, |a| alignment.allows(a)),
            (DisplayFilter::SingleSelect { qualification, .. }, FilterGroup::Qualification) => {
                category
                    .qualification()
                    .map_or(false, |q| *qualification == Selector::Exactly(q))
            }
            (DisplayFilter::SingleSelect { benevolence, .. }, FilterGroup::Benevolence) => category
                .benevolence()
                .map_or(false, |b| *benevolence == Selector::Exactly(b)),
            (DisplayFilter::SingleSelect { alignment, .. }, FilterGroup::Alignment) => category
                .alignment()
                .map_or(false, |a| *alignment == Selector::Exactly(a)),
        }
    }

    // =========================================================================
    // CHART INTERACTION
    // =========================================================================

    /// Narrow the display filter to a chart cell.
    ///
    /// A concrete axis value enables only that category; an `any` axis
    /// enables every category of that axis.
    pub fn select_chart_cell(&mut self, cell: ChartCell) -> bool {
        let before = self.clone();
        match &mut self.display {
            DisplayFilter::MultiSelect {
                benevolence,
                alignment,
                ..
            } => {
                *benevolence = cell
                    .benevolence
                    .map_or_else(CategoryToggles::all, CategoryToggles::only);
                *alignment = cell
                    .alignment
                    .map_or_else(CategoryToggles::all, CategoryToggles::only);
            }
            DisplayFilter::SingleSelect {
                benevolence,
                alignment,
                ..
            } => {
                *benevolence = cell.benevolence.map_or(Selector::Any, Selector::Exactly);
                *alignment = cell.alignment.map_or(Selector::Any, Selector::Exactly);
            }
        }
        *self != before
    }

    /// Whether a chart cell's categories are excluded by the display filter.
    pub fn is_chart_cell_filtered_out(&self, cell: ChartCell) -> bool {
        let benevolence_out = cell
            .benevolence
            .map_or(false, |b| !self.display.allows_benevolence(b));
        let alignment_out = cell
            .alignment
            .map_or(false, |a| !self.display.allows_alignment(a));
        benevolence_out || alignment_out
    }

    /// Colour class of a chart body cell under the current sort mode.
    ///
    /// Total cells (an `any` axis under the active sort mode) carry no colour.
    pub fn chart_cell_class(&self, cell: ChartCell) -> Option<String> {
        let key = match self.sort_by {
            SortBy::Benevolence => cell.benevolence.map(|b| b.filter_key()),
            SortBy::Alignment => cell.alignment.map(|a| a.filter_key()),
        };
        key.map(|k| format!("chart-cell-{k}"))
    }
}

fn set_toggle<C: RatingCategory>(
    toggles: &mut CategoryToggles<C>,
    category: Option<C>,
    any: bool,
    enabled: bool,
) -> bool {
    if any {
        toggles.set_all(enabled);
        return true;
    }
    match category {
        Some(c) => {
            toggles.set(c, enabled);
            true
        }
        None => false,
    }
}

fn set_selector<C: RatingCategory>(
    selector: &mut Selector<C>,
    category: Option<C>,
    any: bool,
    enabled: bool,
) -> bool {
    if any {
        // Disabling `Any` has no meaning with exactly one active selector.
        if enabled {
            selector.apply(None, true);
        }
        return true;
    }
    match category {
        Some(c) => {
            selector.apply(Some(c), enabled);
            true
        }
        None => false,
    }
}
