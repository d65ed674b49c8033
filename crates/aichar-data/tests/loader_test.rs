//! Loader integration tests against temporary dataset directories.

use std::path::Path;
use std::sync::{Arc, Mutex};

use aichar_core::{Benevolence, Error};
use aichar_data::{DatasetLoader, LoadPolicy, LoaderConfig};

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write fixture");
}

fn write_multi_file_dataset(dir: &Path) {
    write(
        dir,
        "manifest.json",
        r#"{
            "metadata": {"last_updated": "2025-06-01"},
            "total_characters": 3,
            "work_types": [
                {"work_type": "Novel", "filename": "novel.json", "character_count": 1},
                {"work_type": "Film", "filename": "film.json", "character_count": 2}
            ]
        }"#,
    );
    write(
        dir,
        "novel.json",
        r#"{"characters": [{"character_name": "Robbie", "work_type": "Novel"}]}"#,
    );
    write(
        dir,
        "film.json",
        r#"{
            "characters": [
                {"character_name": "HAL 9000", "work_type": "Film", "benevolence_rating": "Malevolent"},
                {"character_name": "Ash", "work_type": "Film"}
            ],
            "skipped_entries": [{"character_name": "Gort", "reason": "robot, not AI"}]
        }"#,
    );
}

#[tokio::test]
async fn test_load_directory_concatenates_in_manifest_order() {
    let dir = tempfile::tempdir().unwrap();
    write_multi_file_dataset(dir.path());

    let loader = DatasetLoader::new(LoaderConfig::default().with_data_path(dir.path()));
    let dataset = loader.load().await.unwrap();

    let names: Vec<_> = dataset
        .characters
        .iter()
        .map(|c| c.character_name.as_str())
        .collect();
    assert_eq!(names, vec!["Robbie", "HAL 9000", "Ash"]);
    assert_eq!(dataset.skipped_entries.len(), 1);
    assert_eq!(dataset.last_updated.as_deref(), Some("2025-06-01"));
    assert_eq!(
        dataset.characters[1].resolved_benevolence(),
        Benevolence::Malevolent
    );
}

#[tokio::test]
async fn test_load_manifest_path_directly() {
    let dir = tempfile::tempdir().unwrap();
    write_multi_file_dataset(dir.path());

    let loader = DatasetLoader::new(
        LoaderConfig::default().with_data_path(dir.path().join("manifest.json")),
    );
    assert_eq!(loader.load().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_load_single_document() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "characters.json",
        r#"{
            "metadata": {"last_updated": "2024-12-31"},
            "characters": [
                {"character_name": "Data", "publication_year": 1987},
                {"character_name": "Skynet"}
            ]
        }"#,
    );

    let loader = DatasetLoader::new(
        LoaderConfig::default().with_data_path(dir.path().join("characters.json")),
    );
    let dataset = loader.load().await.unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.characters[0].publication_year, Some(1987));
    assert_eq!(dataset.last_updated.as_deref(), Some("2024-12-31"));
}

#[tokio::test]
async fn test_progress_reported_per_file() {
    let dir = tempfile::tempdir().unwrap();
    write_multi_file_dataset(dir.path());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let loader = DatasetLoader::new(LoaderConfig::default().with_data_path(dir.path()))
        .with_progress_callback(move |p| {
            sink.lock().unwrap().push((p.label.clone(), p.percentage()));
        });
    loader.load().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![("Novel".to_string(), 50), ("Film".to_string(), 100)]
    );
}

#[tokio::test]
async fn test_strict_policy_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    write_multi_file_dataset(dir.path());
    std::fs::remove_file(dir.path().join("film.json")).unwrap();

    let loader = DatasetLoader::new(LoaderConfig::default().with_data_path(dir.path()));
    let err = loader.load().await.unwrap_err();
    assert!(matches!(err, Error::Load(_)));
}

#[tokio::test]
async fn test_lenient_policy_skips_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    write_multi_file_dataset(dir.path());
    write(dir.path(), "film.json", "{ this is not json");

    let loader = DatasetLoader::new(
        LoaderConfig::default()
            .with_data_path(dir.path())
            .with_policy(LoadPolicy::Lenient),
    );
    let dataset = loader.load().await.unwrap();
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.characters[0].character_name, "Robbie");
}

#[tokio::test]
async fn test_missing_manifest_is_fatal_even_when_lenient() {
    let dir = tempfile::tempdir().unwrap();

    let loader = DatasetLoader::new(
        LoaderConfig::default()
            .with_data_path(dir.path())
            .with_policy(LoadPolicy::Lenient),
    );
    let err = loader.load().await.unwrap_err();
    assert!(matches!(err, Error::Manifest(_)));
}

#[tokio::test]
async fn test_missing_path_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DatasetLoader::new(
        LoaderConfig::default().with_data_path(dir.path().join("nowhere.json")),
    );
    assert!(matches!(loader.load().await.unwrap_err(), Error::Load(_)));
}
