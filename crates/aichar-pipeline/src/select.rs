//! Record selection and work-type grouping.
//!
//! Selection is a chain of five predicate stages whose combined result is the
//! AND of all of them. The stages are exposed individually so the render pass
//! can report progress and yield between them; [`select`] runs the whole
//! chain at once.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use aichar_core::defaults::WORK_TYPE_FALLBACK;
use aichar_core::{CharacterRecord, FilterConfiguration};

/// One predicate stage of the selection chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Qualification,
    Unresearched,
    Benevolence,
    Alignment,
    Search,
}

impl FilterStage {
    /// Stages in evaluation order.
    pub const ORDER: [FilterStage; 5] = [
        FilterStage::Qualification,
        FilterStage::Unresearched,
        FilterStage::Benevolence,
        FilterStage::Alignment,
        FilterStage::Search,
    ];

    /// Progress label reported when the stage runs.
    pub fn label(self) -> &'static str {
        match self {
            FilterStage::Qualification => "Filtering by AI qualification...",
            FilterStage::Unresearched => "Filtering unresearched entries...",
            FilterStage::Benevolence => "Filtering by benevolence...",
            FilterStage::Alignment => "Filtering by alignment...",
            FilterStage::Search => "Applying search filter...",
        }
    }

    /// Progress percentage reported once the stage has run.
    pub fn progress(self) -> u8 {
        match self {
            FilterStage::Qualification => 5,
            FilterStage::Unresearched => 10,
            FilterStage::Benevolence => 15,
            FilterStage::Alignment => 20,
            FilterStage::Search => 25,
        }
    }

    /// Whether `record` passes this stage. `needle` is the lower-cased search
    /// text, `None` when the search is empty.
    pub fn passes(
        self,
        record: &CharacterRecord,
        config: &FilterConfiguration,
        needle: Option<&str>,
    ) -> bool {
        match self {
            FilterStage::Qualification => config.display.passes_qualification(record),
            FilterStage::Unresearched => config.display.passes_research_state(record),
            FilterStage::Benevolence => config.display.passes_benevolence(record),
            FilterStage::Alignment => config.display.passes_alignment(record),
            FilterStage::Search => needle.map_or(true, |n| matches_search(record, n)),
        }
    }

    /// Keep only the indices of `records` that pass this stage.
    pub fn retain(
        self,
        survivors: &mut Vec<usize>,
        records: &[CharacterRecord],
        config: &FilterConfiguration,
        needle: Option<&str>,
    ) {
        survivors.retain(|&i| self.passes(&records[i], config, needle));
    }
}

/// Case-insensitive substring match over the searchable fields.
///
/// `needle` must already be lower-cased.
pub fn matches_search(record: &CharacterRecord, needle: &str) -> bool {
    let text_fields = [
        Some(record.character_name.as_str()),
        record.work_name.as_deref(),
        record.character_description.as_deref(),
        record.work_type.as_deref(),
        record.character_type.as_deref(),
    ];
    text_fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
        || record
            .publication_year
            .is_some_and(|year| year.to_string().contains(needle))
}

/// Whether a record passes every stage.
pub fn matches(record: &CharacterRecord, config: &FilterConfiguration) -> bool {
    let needle = config.search_needle();
    FilterStage::ORDER
        .iter()
        .all(|stage| stage.passes(record, config, needle.as_deref()))
}

/// Indices of the records of one work type, in display order.
///
/// Built only by [`group_indices`], so `members` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGroup {
    pub members: Vec<usize>,
}

impl IndexGroup {
    /// Group key, taken from the first member.
    pub fn work_type<'a>(&self, records: &'a [CharacterRecord]) -> &'a str {
        self.members
            .first()
            .map_or(WORK_TYPE_FALLBACK, |&i| records[i].work_type_key())
    }

    /// Borrow the member records out of `records`.
    pub fn resolve<'a>(&self, records: &'a [CharacterRecord]) -> RecordGroup<'a> {
        RecordGroup {
            work_type: self.work_type(records),
            records: self.members.iter().map(|&i| &records[i]).collect(),
        }
    }
}

/// Records of one work type, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordGroup<'a> {
    pub work_type: &'a str,
    pub records: Vec<&'a CharacterRecord>,
}

/// Surviving records grouped by work type, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedRecords<'a> {
    pub groups: Vec<RecordGroup<'a>>,
}

impl<'a> GroupedRecords<'a> {
    /// Whether no record survived.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of surviving records across all groups.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    /// Apply the enabled shuffles: group order, then each group's entries.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, config: &FilterConfiguration, rng: &mut R) {
        shuffle_groups(&mut self.groups, config, rng);
        for group in &mut self.groups {
            shuffle_members(&mut group.records, config, rng);
        }
    }
}

/// Indices of `records` that pass every stage, in dataset order.
pub fn survivors(records: &[CharacterRecord], config: &FilterConfiguration) -> Vec<usize> {
    let needle = config.search_needle();
    let mut survivors: Vec<usize> = (0..records.len()).collect();
    for stage in FilterStage::ORDER {
        stage.retain(&mut survivors, records, config, needle.as_deref());
    }
    survivors
}

/// Group `survivors` by [`CharacterRecord::work_type_key`].
///
/// Keys come out in ascending order; indices keep their input order within a
/// group.
pub fn group_indices(records: &[CharacterRecord], survivors: &[usize]) -> Vec<IndexGroup> {
    let mut by_key: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &i in survivors {
        by_key.entry(records[i].work_type_key()).or_default().push(i);
    }
    by_key
        .into_values()
        .map(|members| IndexGroup { members })
        .collect()
}

/// Shuffle group order when the work-type shuffle is on.
pub fn shuffle_groups<T, R: Rng + ?Sized>(
    groups: &mut [T],
    config: &FilterConfiguration,
    rng: &mut R,
) {
    if config.shuffle.work_types {
        groups.shuffle(rng);
    }
}

/// Shuffle one group's entries when the character shuffle is on.
pub fn shuffle_members<T, R: Rng + ?Sized>(
    members: &mut [T],
    config: &FilterConfiguration,
    rng: &mut R,
) {
    if config.shuffle.characters {
        members.shuffle(rng);
    }
}

/// Group every record by work type, without filtering.
pub fn group_by_work_type(records: &[CharacterRecord]) -> GroupedRecords<'_> {
    let all: Vec<usize> = (0..records.len()).collect();
    GroupedRecords {
        groups: group_indices(records, &all)
            .iter()
            .map(|group| group.resolve(records))
            .collect(),
    }
}

/// Run the whole selection chain, group the survivors and apply the enabled
/// shuffles.
pub fn select<'a, R: Rng + ?Sized>(
    records: &'a [CharacterRecord],
    config: &FilterConfiguration,
    rng: &mut R,
) -> GroupedRecords<'a> {
    let mut groups = group_indices(records, &survivors(records, config));
    shuffle_groups(&mut groups, config, rng);
    GroupedRecords {
        groups: groups
            .iter_mut()
            .map(|group| {
                shuffle_members(&mut group.members, config, rng);
                group.resolve(records)
            })
            .collect(),
    }
}
