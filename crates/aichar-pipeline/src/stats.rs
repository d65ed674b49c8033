//! Benevolence × alignment contingency table.

use serde::{Deserialize, Serialize};

use aichar_core::{
    Alignment, Benevolence, CharacterRecord, FilterConfiguration, QualificationToggles,
    RatingCategory,
};

/// 4×4 count matrix indexed `[benevolence][alignment]`, in display order.
///
/// Margins are always derived from the body, so they cannot disagree with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    counts: [[usize; 4]; 4],
}

impl ContingencyTable {
    /// Count in one body cell.
    pub fn get(&self, benevolence: Benevolence, alignment: Alignment) -> usize {
        self.counts[benevolence.index()][alignment.index()]
    }

    /// Row sum for a benevolence category.
    pub fn row_total(&self, benevolence: Benevolence) -> usize {
        self.counts[benevolence.index()].iter().sum()
    }

    /// Column sum for an alignment category.
    pub fn column_total(&self, alignment: Alignment) -> usize {
        self.counts.iter().map(|row| row[alignment.index()]).sum()
    }

    /// Sum of every cell.
    pub fn grand_total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Raw matrix.
    pub fn counts(&self) -> &[[usize; 4]; 4] {
        &self.counts
    }

    fn record(&mut self, record: &CharacterRecord) {
        let b = record.resolved_benevolence().index();
        let a = record.resolved_alignment().index();
        self.counts[b][a] += 1;
    }
}

/// Count the records that pass the totals filter.
///
/// Only qualification and research state are filtered; benevolence and
/// alignment toggles never affect the table.
pub fn aggregate<'a, I>(records: I, totals: &QualificationToggles) -> ContingencyTable
where
    I: IntoIterator<Item = &'a CharacterRecord>,
{
    let mut table = ContingencyTable::default();
    for record in records.into_iter().filter(|r| totals.allows(r)) {
        table.record(record);
    }
    table
}

/// Count under a full configuration. Without a totals filter every record
/// counts.
pub fn aggregate_for<'a, I>(records: I, config: &FilterConfiguration) -> ContingencyTable
where
    I: IntoIterator<Item = &'a CharacterRecord>,
{
    let mut table = ContingencyTable::default();
    for record in records.into_iter().filter(|r| config.passes_totals(r)) {
        table.record(record);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use aichar_core::{FilterCategory, FilterGroup};

    fn sample() -> Vec<CharacterRecord> {
        vec![
            CharacterRecord::new("A")
                .with_qualification("Pass")
                .with_benevolence("Benevolent")
                .with_alignment("Aligned"),
            CharacterRecord::new("B")
                .with_qualification("Pass")
                .with_benevolence("Malevolent")
                .with_alignment("Misaligned"),
            CharacterRecord::new("C")
                .with_qualification("Fail")
                .with_benevolence("Benevolent")
                .with_alignment("N/A"),
        ]
    }

    #[test]
    fn test_default_totals_count_pass_only() {
        let records = sample();
        let table = aggregate(&records, &QualificationToggles::totals_default());

        assert_eq!(table.get(Benevolence::Benevolent, Alignment::Aligned), 1);
        assert_eq!(table.get(Benevolence::Malevolent, Alignment::Misaligned), 1);
        assert_eq!(table.get(Benevolence::Benevolent, Alignment::NotApplicable), 0);
        assert_eq!(table.grand_total(), 2);
    }

    #[test]
    fn test_enabling_fail_adds_record() {
        let records = sample();
        let mut config = FilterConfiguration::multi_select();
        config.set_category(FilterGroup::QualificationTotals, FilterCategory::Fail, true);

        let table = aggregate_for(&records, &config);
        assert_eq!(table.get(Benevolence::Benevolent, Alignment::NotApplicable), 1);
        assert_eq!(table.row_total(Benevolence::Benevolent), 2);
        assert_eq!(table.grand_total(), 3);
    }

    #[test]
    fn test_margins_agree_with_body() {
        let records = sample();
        let table = aggregate(&records, &QualificationToggles::all());

        let rows: usize = Benevolence::ALL.iter().map(|&b| table.row_total(b)).sum();
        let cols: usize = Alignment::ALL.iter().map(|&a| table.column_total(a)).sum();
        assert_eq!(rows, table.grand_total());
        assert_eq!(cols, table.grand_total());
        assert_eq!(table.grand_total(), records.len());
    }

    #[test]
    fn test_unresearched_off_excludes_flagged_records() {
        let records = vec![
            CharacterRecord::new("x")
                .with_qualification("Pass")
                .with_needs_research(true),
            CharacterRecord::new("y").with_qualification("Pass"),
        ];
        let mut totals = QualificationToggles::totals_default();
        assert_eq!(aggregate(&records, &totals).grand_total(), 2);

        totals.unresearched = false;
        assert_eq!(aggregate(&records, &totals).grand_total(), 1);
    }

    #[test]
    fn test_display_filter_does_not_affect_table() {
        let records = sample();
        let mut config = FilterConfiguration::multi_select();
        config.toggle_any(FilterGroup::Benevolence);
        assert_eq!(aggregate_for(&records, &config).grand_total(), 2);
    }

    #[test]
    fn test_single_select_counts_every_record() {
        let records = sample();
        let config = FilterConfiguration::single_select();
        assert_eq!(aggregate_for(&records, &config).grand_total(), 3);
    }

    #[test]
    fn test_empty_collection() {
        let table = aggregate(&Vec::<CharacterRecord>::new(), &QualificationToggles::all());
        assert_eq!(table.grand_total(), 0);
        assert_eq!(table.column_total(Alignment::Aligned), 0);
    }
}
