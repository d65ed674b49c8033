//! Render plan: the view-model tree a host paints.
//!
//! Planning is a pure function of the grouped records and the filter
//! configuration. Entry ids come from an [`EntryCounter`] that the render pass
//! resets at the start of every pass, so ids are positional and must not be
//! used as persistent keys.

use std::fmt;

use serde::Serialize;

use aichar_core::defaults::{
    DESCRIPTION_PLACEHOLDER, EXPLANATION_PLACEHOLDER, NOT_APPLICABLE_LABEL, NO_RESULTS_MESSAGE,
};
use aichar_core::{CharacterRecord, FilterConfiguration, RatingCategory, SortBy};

use crate::select::{GroupedRecords, RecordGroup};

/// A rating badge: label plus presentation class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingBadge {
    pub value: &'static str,
    pub css_class: &'static str,
}

impl RatingBadge {
    fn of<C: RatingCategory>(category: C) -> Self {
        Self {
            value: category.label(),
            css_class: category.css_class(),
        }
    }
}

/// One tri-count badge of a group header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBadge {
    pub label: &'static str,
    pub css_class: &'static str,
    pub count: usize,
}

/// Entry title: the name and the optional character type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryTitle {
    pub name: String,
    pub character_type: Option<String>,
}

impl fmt::Display for EntryTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.character_type {
            Some(kind) => write!(f, "{} ({kind})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Reference to the work a character appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkReference {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub url: Option<String>,
}

impl fmt::Display for WorkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or_default();
        match self.year {
            Some(year) if name.is_empty() => write!(f, "({year})"),
            Some(year) => write!(f, "{name} ({year})"),
            None => f.write_str(name),
        }
    }
}

/// A numbered source link. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLink {
    pub index: usize,
    pub url: String,
}

/// Render a source list the way the listing shows it: `1, 2, 3`, or `N/A`.
pub fn source_list_label(sources: &[SourceLink]) -> String {
    if sources.is_empty() {
        return NOT_APPLICABLE_LABEL.to_string();
    }
    sources
        .iter()
        .map(|s| s.index.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A collapsible entry section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollapsibleSection {
    /// `desc-N`, `aiqual-N`, `benev-N` or `align-N`.
    pub section_id: String,
    pub title: &'static str,
    pub rating: Option<RatingBadge>,
    pub body: String,
    pub collapsed: bool,
}

impl CollapsibleSection {
    fn new(
        prefix: &str,
        entry_id: usize,
        title: &'static str,
        body: Option<&str>,
        placeholder: &str,
    ) -> Self {
        Self {
            section_id: format!("{prefix}-{entry_id}"),
            title,
            rating: None,
            body: body
                .filter(|b| !b.is_empty())
                .unwrap_or(placeholder)
                .to_string(),
            collapsed: false,
        }
    }

    fn rated<C: RatingCategory>(mut self, category: C) -> Self {
        self.rating = Some(RatingBadge::of(category));
        self
    }
}

/// View-model of one listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub entry_id: usize,
    pub title: EntryTitle,
    pub needs_research: bool,
    /// Badge of the rating selected by the sort mode.
    pub badge: RatingBadge,
    pub work: WorkReference,
    pub sources: Vec<SourceLink>,
    pub description: CollapsibleSection,
    pub ai_qualification: CollapsibleSection,
    pub benevolence: CollapsibleSection,
    pub alignment: CollapsibleSection,
}

impl EntryView {
    /// The four sections in display order.
    pub fn sections(&self) -> [&CollapsibleSection; 4] {
        [
            &self.description,
            &self.ai_qualification,
            &self.benevolence,
            &self.alignment,
        ]
    }

    fn sections_mut(&mut self) -> [&mut CollapsibleSection; 4] {
        [
            &mut self.description,
            &mut self.ai_qualification,
            &mut self.benevolence,
            &mut self.alignment,
        ]
    }
}

/// View-model of one work-type group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub work_type: String,
    /// Work type with every non-alphanumeric character replaced by `_`.
    pub dom_id: String,
    /// Counts of the three applicable categories of the sort-mode rating.
    pub tri_counts: [CountBadge; 3],
    pub total: usize,
    pub collapsed: bool,
    pub entries: Vec<EntryView>,
}

/// The ordered view-model tree of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    pub groups: Vec<GroupView>,
    pub total_entries: usize,
}

impl RenderPlan {
    /// Whether no record survived filtering.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The "no results" message, present only for an empty plan.
    pub fn no_results(&self) -> Option<&'static str> {
        self.is_empty().then_some(NO_RESULTS_MESSAGE)
    }

    pub fn expand_all_sections(&mut self) {
        self.set_all_sections(false);
    }

    pub fn collapse_all_sections(&mut self) {
        self.set_all_sections(true);
    }

    pub fn expand_all_groups(&mut self) {
        self.groups.iter_mut().for_each(|g| g.collapsed = false);
    }

    pub fn collapse_all_groups(&mut self) {
        self.groups.iter_mut().for_each(|g| g.collapsed = true);
    }

    /// Flip one group's collapsed state. Returns `false` for an unknown id.
    pub fn toggle_group(&mut self, dom_id: &str) -> bool {
        match self.groups.iter_mut().find(|g| g.dom_id == dom_id) {
            Some(group) => {
                group.collapsed = !group.collapsed;
                true
            }
            None => false,
        }
    }

    /// Flip one section's collapsed state. Returns `false` for an unknown id.
    pub fn toggle_section(&mut self, section_id: &str) -> bool {
        let section = self
            .groups
            .iter_mut()
            .flat_map(|g| g.entries.iter_mut())
            .flat_map(|e| e.sections_mut())
            .find(|s| s.section_id == section_id);
        match section {
            Some(section) => {
                section.collapsed = !section.collapsed;
                true
            }
            None => false,
        }
    }

    fn set_all_sections(&mut self, collapsed: bool) {
        for entry in self.groups.iter_mut().flat_map(|g| g.entries.iter_mut()) {
            for section in entry.sections_mut() {
                section.collapsed = collapsed;
            }
        }
    }
}

/// Positional entry-id source, reset at the start of every pass.
#[derive(Debug, Default)]
pub struct EntryCounter(usize);

impl EntryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> usize {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// DOM-safe id of a work-type group.
pub fn group_dom_id(work_type: &str) -> String {
    work_type
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Plan one entry.
pub fn plan_entry(
    record: &CharacterRecord,
    config: &FilterConfiguration,
    counter: &mut EntryCounter,
) -> EntryView {
    let entry_id = counter.next();
    let benevolence = record.resolved_benevolence();
    let alignment = record.resolved_alignment();
    let badge = match config.sort_by {
        SortBy::Benevolence => RatingBadge::of(benevolence),
        SortBy::Alignment => RatingBadge::of(alignment),
    };

    EntryView {
        entry_id,
        title: EntryTitle {
            name: record.character_name.clone(),
            character_type: record.character_type.clone().filter(|t| !t.is_empty()),
        },
        needs_research: record.needs_research,
        badge,
        work: WorkReference {
            name: record.work_name.clone(),
            year: record.publication_year,
            url: record.work_url.clone().filter(|u| !u.is_empty()),
        },
        sources: record
            .source_urls
            .iter()
            .enumerate()
            .map(|(i, url)| SourceLink {
                index: i + 1,
                url: url.clone(),
            })
            .collect(),
        description: CollapsibleSection::new(
            "desc",
            entry_id,
            "Description",
            record.character_description.as_deref(),
            DESCRIPTION_PLACEHOLDER,
        ),
        ai_qualification: CollapsibleSection::new(
            "aiqual",
            entry_id,
            "AI Qualification",
            record.ai_qualification_explanation.as_deref(),
            EXPLANATION_PLACEHOLDER,
        )
        .rated(record.resolved_qualification()),
        benevolence: CollapsibleSection::new(
            "benev",
            entry_id,
            "Benevolence Rating",
            record.benevolence_rating_explanation.as_deref(),
            EXPLANATION_PLACEHOLDER,
        )
        .rated(benevolence),
        alignment: CollapsibleSection::new(
            "align",
            entry_id,
            "Alignment Rating",
            record.alignment_rating_explanation.as_deref(),
            EXPLANATION_PLACEHOLDER,
        )
        .rated(alignment),
    }
}

fn tri_counts<C: RatingCategory>(
    records: &[&CharacterRecord],
    resolve: impl Fn(&CharacterRecord) -> C,
) -> [CountBadge; 3] {
    C::applicable().map(|category| CountBadge {
        label: category.label(),
        css_class: category.css_class(),
        count: records.iter().filter(|r| resolve(**r) == category).count(),
    })
}

/// Plan one group, consuming entry ids in entry order.
pub fn plan_group(
    group: &RecordGroup<'_>,
    config: &FilterConfiguration,
    counter: &mut EntryCounter,
) -> GroupView {
    let tri_counts = match config.sort_by {
        SortBy::Benevolence => tri_counts(&group.records, |r| r.resolved_benevolence()),
        SortBy::Alignment => tri_counts(&group.records, |r| r.resolved_alignment()),
    };

    GroupView {
        work_type: group.work_type.to_string(),
        dom_id: group_dom_id(group.work_type),
        tri_counts,
        total: group.records.len(),
        collapsed: false,
        entries: group
            .records
            .iter()
            .map(|record| plan_entry(record, config, counter))
            .collect(),
    }
}

/// Plan every group with a fresh entry counter.
pub fn plan(grouped: &GroupedRecords<'_>, config: &FilterConfiguration) -> RenderPlan {
    let mut counter = EntryCounter::new();
    let groups: Vec<GroupView> = grouped
        .groups
        .iter()
        .map(|group| plan_group(group, config, &mut counter))
        .collect();
    let total_entries = groups.iter().map(|g| g.total).sum();
    RenderPlan {
        groups,
        total_entries,
    }
}
