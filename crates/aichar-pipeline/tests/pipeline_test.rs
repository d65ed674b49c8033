//! End-to-end selection, statistics and planning over small datasets.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use aichar_core::{
    Alignment, Benevolence, CharacterRecord, Dataset, FilterCategory, FilterConfiguration,
    FilterGroup, QualificationToggles, RatingCategory, ShuffleAxis,
};
use aichar_pipeline::{aggregate, aggregate_for, plan, select, RenderPass};

fn rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

/// Three records: A passes and is benevolent/aligned, B passes and is
/// malevolent/misaligned, C fails and is benevolent with no alignment.
fn matrix_records() -> Vec<CharacterRecord> {
    vec![
        CharacterRecord::new("A")
            .with_work("Work A", "Film")
            .with_qualification("Pass")
            .with_benevolence("Benevolent")
            .with_alignment("Aligned"),
        CharacterRecord::new("B")
            .with_work("Work B", "Film")
            .with_qualification("Pass")
            .with_benevolence("Malevolent")
            .with_alignment("Misaligned"),
        CharacterRecord::new("C")
            .with_work("Work C", "Novel")
            .with_qualification("Fail")
            .with_benevolence("Benevolent"),
    ]
}

fn entry_names(plan: &aichar_pipeline::RenderPlan) -> Vec<String> {
    plan.groups
        .iter()
        .flat_map(|g| g.entries.iter().map(|e| e.title.name.clone()))
        .collect()
}

#[test]
fn test_statistics_matrix_default_totals() {
    let records = matrix_records();
    let table = aggregate_for(&records, &FilterConfiguration::multi_select());

    assert_eq!(table.get(Benevolence::Benevolent, Alignment::Aligned), 1);
    assert_eq!(table.get(Benevolence::Malevolent, Alignment::Misaligned), 1);
    assert_eq!(table.get(Benevolence::Benevolent, Alignment::NotApplicable), 0);
    assert_eq!(table.row_total(Benevolence::Benevolent), 1);
    assert_eq!(table.column_total(Alignment::Misaligned), 1);
    assert_eq!(table.grand_total(), 2);
}

#[test]
fn test_statistics_matrix_with_fail_enabled() {
    let records = matrix_records();
    let mut filters = FilterConfiguration::multi_select();
    filters.set_category(FilterGroup::QualificationTotals, FilterCategory::Fail, true);
    let table = aggregate_for(&records, &filters);

    assert_eq!(table.get(Benevolence::Benevolent, Alignment::NotApplicable), 1);
    assert_eq!(table.row_total(Benevolence::Benevolent), 2);
    assert_eq!(table.column_total(Alignment::NotApplicable), 1);
    assert_eq!(table.grand_total(), 3);

    let row_sum: usize = Benevolence::ALL.iter().map(|&b| table.row_total(b)).sum();
    let col_sum: usize = Alignment::ALL.iter().map(|&a| table.column_total(a)).sum();
    assert_eq!(row_sum, 3);
    assert_eq!(col_sum, 3);
}

#[test]
fn test_search_robot_matches_any_field() {
    let records = vec![
        CharacterRecord::new("Marvin").with_character_type("Robot"),
        CharacterRecord::new("Bender").with_description("A bending robot"),
        CharacterRecord::new("Robotnik"),
        CharacterRecord::new("Samantha").with_work("Her", "Film"),
    ];
    let mut filters = FilterConfiguration::multi_select();
    filters.set_search("ROBOT");

    let grouped = select(&records, &filters, &mut rng());
    let plan = plan::plan(&grouped, &filters);
    let mut names = entry_names(&plan);
    names.sort();
    assert_eq!(names, vec!["Bender", "Marvin", "Robotnik"]);
}

#[test]
fn test_missing_work_type_groups_under_other() {
    let mut blank = CharacterRecord::new("Blank");
    blank.work_type = Some(String::new());
    let records = vec![
        CharacterRecord::new("Loose"),
        blank,
        CharacterRecord::new("Ava").with_work("Ex Machina", "Film"),
    ];
    let filters = FilterConfiguration::multi_select();
    let plan = plan::plan(&select(&records, &filters, &mut rng()), &filters);

    let keys: Vec<_> = plan.groups.iter().map(|g| g.work_type.as_str()).collect();
    assert_eq!(keys, vec!["Film", "Other"]);
    assert_eq!(plan.groups[1].total, 2);
}

#[test]
fn test_needs_research_excluded_when_unresearched_off() {
    let records = vec![
        CharacterRecord::new("Known").with_qualification("Pass"),
        CharacterRecord::new("Unknown")
            .with_qualification("Pass")
            .with_needs_research(true),
    ];
    let mut filters = FilterConfiguration::multi_select();
    filters.set_category(FilterGroup::Qualification, FilterCategory::Unresearched, false);

    let plan = plan::plan(&select(&records, &filters, &mut rng()), &filters);
    assert_eq!(entry_names(&plan), vec!["Known"]);

    filters.set_category(FilterGroup::Qualification, FilterCategory::Unresearched, true);
    let plan = plan::plan(&select(&records, &filters, &mut rng()), &filters);
    assert!(plan.groups[0].entries[1].needs_research);
}

#[test]
fn test_rendering_is_idempotent_without_shuffle() {
    let dataset = Arc::new(Dataset::from_records(matrix_records()));
    let filters = FilterConfiguration::multi_select();

    let first = RenderPass::new(dataset.clone(), filters.clone(), StdRng::seed_from_u64(1))
        .run_to_completion()
        .unwrap();
    let second = RenderPass::new(dataset, filters, StdRng::seed_from_u64(99))
        .run_to_completion()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_shuffle_preserves_entries_and_groups() {
    let records: Vec<_> = (0..30)
        .map(|i| CharacterRecord::new(format!("c{i:02}")).with_work("W", format!("T{}", i % 5)))
        .collect();
    let dataset = Arc::new(Dataset::from_records(records));

    let mut filters = FilterConfiguration::multi_select();
    filters.set_shuffle(ShuffleAxis::Characters, true);
    filters.set_shuffle(ShuffleAxis::WorkTypes, true);

    let shuffled = RenderPass::new(dataset.clone(), filters, rng())
        .run_to_completion()
        .unwrap();
    let plain = RenderPass::new(dataset, FilterConfiguration::multi_select(), rng())
        .run_to_completion()
        .unwrap();

    let mut shuffled_groups: Vec<_> = shuffled.groups.iter().map(|g| g.work_type.clone()).collect();
    let plain_groups: Vec<_> = plain.groups.iter().map(|g| g.work_type.clone()).collect();
    shuffled_groups.sort();
    assert_eq!(shuffled_groups, plain_groups);

    let mut shuffled_names = entry_names(&shuffled);
    let mut plain_names = entry_names(&plain);
    shuffled_names.sort();
    plain_names.sort();
    assert_eq!(shuffled_names, plain_names);
    assert_eq!(shuffled.total_entries, 30);
}

#[test]
fn test_single_select_ambiguous_only() {
    let records = vec![
        CharacterRecord::new("Murky").with_benevolence("Ambiguous"),
        CharacterRecord::new("Kind").with_benevolence("Benevolent"),
    ];
    let mut filters = FilterConfiguration::single_select();
    filters.set_category(
        FilterGroup::Benevolence,
        "ambiguous-only".parse().unwrap(),
        true,
    );

    let plan = plan::plan(&select(&records, &filters, &mut rng()), &filters);
    assert_eq!(entry_names(&plan), vec!["Murky"]);
    assert_eq!(aggregate_for(&records, &filters).grand_total(), 2);
}

#[test]
fn test_chart_cell_selection_filters_listing() {
    let records = matrix_records();
    let mut filters = FilterConfiguration::multi_select();
    filters.select_chart_cell(aichar_core::ChartCell::new(
        Benevolence::Malevolent,
        Alignment::Misaligned,
    ));

    let plan = plan::plan(&select(&records, &filters, &mut rng()), &filters);
    assert_eq!(entry_names(&plan), vec!["B"]);
}

#[test]
fn test_matrix_counts_ambiguous_alignment_column() {
    let records = vec![
        CharacterRecord::new("Guide")
            .with_benevolence("Benevolent")
            .with_alignment("Aligned"),
        CharacterRecord::new("Drifter")
            .with_benevolence("Benevolent")
            .with_alignment("Ambiguous"),
        CharacterRecord::new("Skynet")
            .with_benevolence("Malevolent")
            .with_alignment("Misaligned"),
    ];
    let table = aggregate(&records, &QualificationToggles::all());

    let expected = [
        (Benevolence::Benevolent, Alignment::Aligned),
        (Benevolence::Benevolent, Alignment::Ambiguous),
        (Benevolence::Malevolent, Alignment::Misaligned),
    ];
    for b in Benevolence::ALL {
        for a in Alignment::ALL {
            let want = usize::from(expected.contains(&(b, a)));
            assert_eq!(table.get(b, a), want, "cell {b:?}/{a:?}");
        }
    }
    assert_eq!(table.column_total(Alignment::Ambiguous), 1);
    assert_eq!(table.grand_total(), 3);
}
