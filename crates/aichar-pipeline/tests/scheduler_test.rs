//! Time-driven scheduler tests. Time is paused, so debounce and linger
//! periods elapse instantly but in order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use aichar_core::{
    CharacterRecord, Dataset, FilterCategory, FilterConfiguration, FilterGroup, SortBy,
};
use aichar_pipeline::{RenderScheduler, SchedulerConfig, SchedulerEvent, SchedulerHandle};

fn dataset() -> Arc<Dataset> {
    Arc::new(Dataset::from_records(vec![
        CharacterRecord::new("Ash")
            .with_work("Alien", "Film")
            .with_qualification("Pass")
            .with_benevolence("Malevolent"),
        CharacterRecord::new("Bishop")
            .with_work("Aliens", "Film")
            .with_qualification("Pass")
            .with_benevolence("Benevolent"),
        CharacterRecord::new("Wintermute")
            .with_work("Neuromancer", "Novel")
            .with_qualification("Fail"),
    ]))
}

fn start() -> SchedulerHandle {
    RenderScheduler::new(
        dataset(),
        FilterConfiguration::multi_select(),
        SchedulerConfig::default().with_seed(5),
    )
    .start()
}

fn drain(events: &mut broadcast::Receiver<SchedulerEvent>) -> Vec<SchedulerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn passes_started(events: &[SchedulerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SchedulerEvent::PassStarted { .. }))
        .count()
}

fn names(handle: &SchedulerHandle) -> Vec<String> {
    handle
        .plan()
        .expect("plan published")
        .groups
        .iter()
        .flat_map(|g| g.entries.iter().map(|e| e.title.name.clone()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_initial_pass_publishes_plan() {
    let handle = start();
    let mut events = handle.events();

    let plan = handle.settled().await.unwrap().expect("initial plan");
    assert_eq!(plan.total_entries, 3);

    let events = drain(&mut events);
    assert_eq!(passes_started(&events), 1);
    assert!(matches!(events.last(), Some(SchedulerEvent::Idle)));

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            SchedulerEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents.first(), Some(&0));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_burst_renders_once_with_final_configuration() {
    let handle = start();
    handle.settled().await.unwrap();
    let mut events = handle.events();

    let sent_at = Instant::now();
    handle.set_search("b").unwrap();
    handle.set_search("bi").unwrap();
    handle.set_search("bis").unwrap();

    // Wait for the pass to start; it must honour the debounce.
    loop {
        if let SchedulerEvent::PassStarted { .. } = events.recv().await.unwrap() {
            break;
        }
    }
    assert!(sent_at.elapsed() >= Duration::from_millis(350));

    handle.settled().await.unwrap();
    let rest = drain(&mut events);
    assert_eq!(passes_started(&rest), 0);
    assert_eq!(names(&handle), vec!["Bishop"]);
}

#[tokio::test(start_paused = true)]
async fn test_mutations_during_pass_run_exactly_one_more_pass() {
    let handle = start();
    handle.settled().await.unwrap();
    let mut events = handle.events();

    handle.set_sort_by(SortBy::Alignment).unwrap();
    loop {
        if let SchedulerEvent::PassStarted { .. } = events.recv().await.unwrap() {
            break;
        }
    }

    // The pass is in flight: these queue behind it.
    handle.set_search("w").unwrap();
    handle.set_search("win").unwrap();

    handle.settled().await.unwrap();
    let rest = drain(&mut events);
    assert_eq!(passes_started(&rest), 1);
    assert!(rest.iter().any(|e| matches!(
        e,
        SchedulerEvent::Progress { label, .. } if label == "Processing queued changes..."
    )));
    assert_eq!(names(&handle), vec!["Wintermute"]);
    assert_eq!(handle.filters().sort_by, SortBy::Alignment);
}

#[tokio::test(start_paused = true)]
async fn test_totals_mutation_updates_statistics_without_pass() {
    let handle = start();
    handle.settled().await.unwrap();
    assert_eq!(handle.statistics().grand_total(), 2);
    let mut events = handle.events();

    handle
        .set_category(FilterGroup::QualificationTotals, FilterCategory::Fail, true)
        .unwrap();
    handle.settled().await.unwrap();

    assert_eq!(handle.statistics().grand_total(), 3);
    let events = drain(&mut events);
    assert_eq!(passes_started(&events), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, SchedulerEvent::StatisticsUpdated { grand_total: 3 })));
    assert!(!events.contains(&SchedulerEvent::ChangePending));
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_mutation_is_ignored() {
    let handle = start();
    handle.settled().await.unwrap();
    let mut events = handle.events();

    handle.set_sort_by(SortBy::Benevolence).unwrap();
    handle.settled().await.unwrap();
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_replace_filters_switches_scheme() {
    let handle = start();
    handle.settled().await.unwrap();

    let mut single = FilterConfiguration::single_select();
    single.set_category(FilterGroup::Benevolence, FilterCategory::Benevolent, true);
    handle.replace_filters(single).unwrap();
    handle.settled().await.unwrap();

    assert_eq!(names(&handle), vec!["Bishop"]);
    // Single-select statistics cover every record.
    assert_eq!(handle.statistics().grand_total(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_scheduler() {
    let handle = start();
    handle.settled().await.unwrap();
    handle.shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(handle.set_search("x").is_err());
}
