//! On-disk document shapes: the manifest and the character documents it lists.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use aichar_core::{CharacterRecord, Error, Result, SkippedEntry};

/// Free-form dataset metadata. Only `last_updated` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// One file listed by a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Work type the file holds; used for progress labels only.
    #[serde(default)]
    pub work_type: Option<String>,
    /// File name relative to the manifest's directory.
    pub filename: String,
    #[serde(default)]
    pub character_count: Option<u64>,
    /// Content hash written by the splitter.
    #[serde(default)]
    pub hash: Option<String>,
}

impl ManifestEntry {
    /// Label for progress reporting: the work type, else the file name.
    pub fn label(&self) -> &str {
        self.work_type.as_deref().unwrap_or(&self.filename)
    }
}

/// `manifest.json` of the multi-file dataset variant.
///
/// Files are merged by concatenation in `work_types` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub metadata: DatasetMetadata,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub total_characters: Option<u64>,
    #[serde(default)]
    pub work_types: Vec<ManifestEntry>,
}

/// A document exposing a `characters` array.
///
/// Used both for the single-file variant and for each manifest-listed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDocument {
    #[serde(default)]
    pub metadata: DatasetMetadata,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub character_count: Option<u64>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub characters: Vec<CharacterRecord>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub skipped_entries: Vec<SkippedEntry>,
}

/// An array decodes element by element; `null` or any other shape is empty.
fn array_or_empty<'de, D, T>(d: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(d)? {
        items @ Value::Array(_) => serde_json::from_value(items).map_err(D::Error::custom),
        _ => Ok(Vec::new()),
    }
}

/// Parse a manifest.
pub fn parse_manifest(bytes: &[u8]) -> Result<Manifest> {
    serde_json::from_slice(bytes).map_err(|e| Error::Manifest(e.to_string()))
}

/// Parse a character document.
pub fn parse_document(bytes: &[u8]) -> Result<CharacterDocument> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(
            br#"{
                "metadata": {"last_updated": "2025-06-01", "curator": "x"},
                "generated_at": "2025-06-01T10:00:00",
                "total_characters": 3,
                "work_types": [
                    {"work_type": "Film", "filename": "film.json", "character_count": 2, "hash": "ab12cd34"},
                    {"filename": "novel.json"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.metadata.last_updated.as_deref(), Some("2025-06-01"));
        assert_eq!(manifest.work_types.len(), 2);
        assert_eq!(manifest.work_types[0].label(), "Film");
        assert_eq!(manifest.work_types[1].label(), "novel.json");
    }

    #[test]
    fn test_parse_manifest_rejects_invalid_json() {
        let err = parse_manifest(b"{ not json").unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn test_parse_document_without_characters() {
        let doc = parse_document(br#"{"work_type": "Film"}"#).unwrap();
        assert!(doc.characters.is_empty());
        assert!(doc.skipped_entries.is_empty());
    }

    #[test]
    fn test_parse_document_null_lists_are_empty() {
        let doc = parse_document(br#"{"characters": null, "skipped_entries": "none"}"#).unwrap();
        assert!(doc.characters.is_empty());
        assert!(doc.skipped_entries.is_empty());
    }

    #[test]
    fn test_parse_document_with_skipped_entries() {
        let doc = parse_document(
            br#"{
                "characters": [{"character_name": "Robby"}],
                "skipped_entries": [{"character_name": "Gort", "reason": "not an AI"}]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.characters.len(), 1);
        assert_eq!(doc.skipped_entries[0].reason.as_deref(), Some("not an AI"));
        assert_eq!(doc.skipped_entries[0].source_page, None);
    }

    #[test]
    fn test_parse_document_rejects_nameless_record() {
        let err = parse_document(br#"{"characters": [{"work_name": "Alien"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
