//! Text and JSON rendering for the terminal.

use std::io::{self, Write};

use serde_json::{json, Value};

use aichar_core::defaults::{NEEDS_RESEARCH_LABEL, NOT_APPLICABLE_LABEL};
use aichar_core::{
    Alignment, Benevolence, ChartCell, FilterConfiguration, RatingCategory, SkippedEntry,
};
use aichar_pipeline::{source_list_label, CollapsibleSection, ContingencyTable, RenderPlan};

const ROW_LABEL_WIDTH: usize = 12;
const COLUMN_WIDTH: usize = 12;

/// Write the statistics table. Cells the display filters hide are shown in
/// parentheses.
pub fn write_stats(
    out: &mut impl Write,
    table: &ContingencyTable,
    config: &FilterConfiguration,
    show_na: bool,
) -> io::Result<()> {
    let columns: Vec<Alignment> = Alignment::ALL
        .into_iter()
        .filter(|&a| show_na || a != Alignment::NOT_APPLICABLE)
        .collect();
    let rows = Benevolence::ALL
        .into_iter()
        .filter(|&b| show_na || b != Benevolence::NOT_APPLICABLE);

    write!(out, "{:<ROW_LABEL_WIDTH$}", "")?;
    for alignment in &columns {
        write!(out, "{:>COLUMN_WIDTH$}", alignment.label())?;
    }
    writeln!(out, "{:>COLUMN_WIDTH$}", "Total")?;

    let mut any_hidden = false;
    for benevolence in rows {
        write!(out, "{:<ROW_LABEL_WIDTH$}", benevolence.label())?;
        for &alignment in &columns {
            let count = table.get(benevolence, alignment);
            let cell = if config.is_chart_cell_filtered_out(ChartCell::new(benevolence, alignment))
            {
                any_hidden = true;
                format!("({count})")
            } else {
                count.to_string()
            };
            write!(out, "{cell:>COLUMN_WIDTH$}")?;
        }
        writeln!(out, "{:>COLUMN_WIDTH$}", table.row_total(benevolence))?;
    }

    write!(out, "{:<ROW_LABEL_WIDTH$}", "Total")?;
    for &alignment in &columns {
        write!(out, "{:>COLUMN_WIDTH$}", table.column_total(alignment))?;
    }
    writeln!(out, "{:>COLUMN_WIDTH$}", table.grand_total())?;

    if any_hidden {
        writeln!(out)?;
        writeln!(out, "(n) hidden by the current display filters")?;
    }
    Ok(())
}

/// The statistics table with each cell's presentation class and filter state.
pub fn stats_json(table: &ContingencyTable, config: &FilterConfiguration) -> Value {
    let rows: Vec<Value> = Benevolence::ALL
        .into_iter()
        .map(|benevolence| {
            let cells: Vec<Value> = Alignment::ALL
                .into_iter()
                .map(|alignment| {
                    let cell = ChartCell::new(benevolence, alignment);
                    json!({
                        "alignment": alignment.filter_key(),
                        "count": table.get(benevolence, alignment),
                        "class": config.chart_cell_class(cell),
                        "filtered_out": config.is_chart_cell_filtered_out(cell),
                    })
                })
                .collect();
            json!({
                "benevolence": benevolence.filter_key(),
                "cells": cells,
                "total": table.row_total(benevolence),
            })
        })
        .collect();
    let column_totals: Vec<Value> = Alignment::ALL
        .into_iter()
        .map(|a| json!({ "alignment": a.filter_key(), "total": table.column_total(a) }))
        .collect();

    json!({
        "rows": rows,
        "column_totals": column_totals,
        "grand_total": table.grand_total(),
    })
}

/// Write the grouped listing.
pub fn write_plan(out: &mut impl Write, plan: &RenderPlan) -> io::Result<()> {
    if let Some(message) = plan.no_results() {
        return writeln!(out, "{message}");
    }

    for (i, group) in plan.groups.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let counts: Vec<String> = group
            .tri_counts
            .iter()
            .map(|b| format!("{} {}", b.label, b.count))
            .collect();
        writeln!(
            out,
            "== {} ({}) [{}]",
            group.work_type,
            group.total,
            counts.join(" | ")
        )?;
        if group.collapsed {
            continue;
        }

        for entry in &group.entries {
            write!(out, "  {} [{}]", entry.title, entry.badge.value)?;
            if entry.needs_research {
                write!(out, " {NEEDS_RESEARCH_LABEL}")?;
            }
            writeln!(out)?;

            let work = entry.work.to_string();
            if !work.is_empty() {
                match &entry.work.url {
                    Some(url) => writeln!(out, "    Work: {work} <{url}>")?,
                    None => writeln!(out, "    Work: {work}")?,
                }
            }
            writeln!(out, "    Sources: {}", source_list_label(&entry.sources))?;
            for section in entry.sections() {
                write_section(out, section)?;
            }
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} entries in {} work types",
        plan.total_entries,
        plan.groups.len()
    )
}

fn write_section(out: &mut impl Write, section: &CollapsibleSection) -> io::Result<()> {
    let marker = if section.collapsed { '+' } else { '-' };
    write!(out, "    {marker} {}", section.title)?;
    if let Some(rating) = &section.rating {
        write!(out, " [{}]", rating.value)?;
    }
    writeln!(out)?;
    if !section.collapsed {
        writeln!(out, "      {}", section.body)?;
    }
    Ok(())
}

/// Write the skipped-entries list.
pub fn write_skipped(out: &mut impl Write, skipped: &[SkippedEntry]) -> io::Result<()> {
    if skipped.is_empty() {
        return writeln!(out, "No skipped entries.");
    }

    let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_APPLICABLE_LABEL.into());
    for entry in skipped {
        writeln!(
            out,
            "{} ({}): {}",
            or_na(&entry.character_name),
            or_na(&entry.work_name),
            or_na(&entry.reason)
        )?;
        if let Some(page) = &entry.source_page {
            match &entry.source_section {
                Some(section) => writeln!(out, "    source: {page}#{section}")?,
                None => writeln!(out, "    source: {page}")?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aichar_core::{CharacterRecord, FilterCategory, FilterGroup};
    use aichar_pipeline::{aggregate_for, plan, select};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn records() -> Vec<CharacterRecord> {
        vec![
            CharacterRecord::new("HAL 9000")
                .with_character_type("Computer")
                .with_work("2001: A Space Odyssey", "Film")
                .with_qualification("Pass")
                .with_benevolence("Malevolent")
                .with_alignment("Misaligned"),
            CharacterRecord::new("Robbie")
                .with_work("I, Robot", "Novel")
                .with_qualification("Pass")
                .with_benevolence("Benevolent")
                .with_alignment("Aligned")
                .with_needs_research(true),
        ]
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_stats_table_hides_na_by_default() {
        let config = FilterConfiguration::multi_select();
        let table = aggregate_for(&records(), &config);

        let text = render(|out| write_stats(out, &table, &config, false));
        assert!(text.contains("Misaligned"));
        assert!(!text.contains("N/A"));
        assert!(!text.contains("hidden"));
        let last = text.lines().last().unwrap();
        assert!(last.starts_with("Total"));
        assert!(last.trim_end().ends_with('2'));

        let text = render(|out| write_stats(out, &table, &config, true));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn test_stats_table_marks_filtered_cells() {
        let mut config = FilterConfiguration::multi_select();
        config.set_category(FilterGroup::Benevolence, FilterCategory::Any, false);
        config.set_category(FilterGroup::Benevolence, FilterCategory::Benevolent, true);
        let table = aggregate_for(&records(), &config);

        let text = render(|out| write_stats(out, &table, &config, false));
        assert!(text.contains("(1)"));
        assert!(text.contains("hidden by the current display filters"));

        let value = stats_json(&table, &config);
        assert_eq!(value["grand_total"], 2);
        assert_eq!(value["rows"][2]["benevolence"], "malevolent");
        assert_eq!(value["rows"][2]["cells"][2]["filtered_out"], true);
        assert_eq!(value["rows"][0]["cells"][0]["filtered_out"], false);
    }

    #[test]
    fn test_plan_listing() {
        let records = records();
        let config = FilterConfiguration::multi_select();
        let grouped = select(&records, &config, &mut StdRng::seed_from_u64(0));
        let mut plan = plan::plan(&grouped, &config);

        let text = render(|out| write_plan(out, &plan));
        assert!(text.contains("== Film (1) [Benevolent 0 | Ambiguous 0 | Malevolent 1]"));
        assert!(text.contains("  HAL 9000 (Computer) [Malevolent]"));
        assert!(text.contains("  Robbie [Benevolent] Needs More Research"));
        assert!(text.contains("    Sources: N/A"));
        assert!(text.contains("      No description available"));
        assert!(text.ends_with("2 entries in 2 work types\n"));

        plan.collapse_all_sections();
        let text = render(|out| write_plan(out, &plan));
        assert!(text.contains("    + AI Qualification [Pass]"));
        assert!(!text.contains("No description available"));
    }

    #[test]
    fn test_empty_plan_prints_no_results() {
        let text = render(|out| write_plan(out, &RenderPlan::default()));
        assert_eq!(text, "No entries found matching your criteria.\n");
    }

    #[test]
    fn test_skipped_entries() {
        let skipped = vec![SkippedEntry {
            character_name: Some("Skynet".into()),
            work_name: Some("The Terminator".into()),
            source_page: Some("List_of_AI".into()),
            source_section: Some("Film".into()),
            reason: Some("Duplicate".into()),
        }];
        let text = render(|out| write_skipped(out, &skipped));
        assert_eq!(
            text,
            "Skynet (The Terminator): Duplicate\n    source: List_of_AI#Film\n"
        );
        assert_eq!(
            render(|out| write_skipped(out, &[])),
            "No skipped entries.\n"
        );
    }
}
