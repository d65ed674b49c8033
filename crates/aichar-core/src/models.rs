//! Record model: character entries, their rating categories, and the dataset.
//!
//! Raw rating fields are private to [`CharacterRecord`]. Every consumer goes
//! through [`CharacterRecord::resolved_benevolence`],
//! [`CharacterRecord::resolved_alignment`] and
//! [`CharacterRecord::resolved_qualification`], which collapse absent, empty
//! and unrecognized values to the not-applicable category.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults::{NOT_APPLICABLE_LABEL, WORK_TYPE_FALLBACK};

// =============================================================================
// RATING CATEGORIES
// =============================================================================

/// Shared behaviour of the three four-valued rating axes.
///
/// `ALL` is in display order: primary, ambiguous, negative, not-applicable.
pub trait RatingCategory: Copy + Eq + fmt::Debug + 'static {
    /// Every category in display order.
    const ALL: [Self; 4];

    /// The category absent or unrecognized raw values resolve to.
    const NOT_APPLICABLE: Self;

    /// Display label, identical to the canonical raw value (`"N/A"` for NA).
    fn label(self) -> &'static str;

    /// Filter key used by toggle groups and chart cells (`"na"` for NA).
    fn filter_key(self) -> &'static str;

    /// Position in [`Self::ALL`].
    fn index(self) -> usize;

    /// Presentation class: lower-cased label with `/` replaced by `-`.
    fn css_class(self) -> &'static str {
        if self == Self::NOT_APPLICABLE {
            "n-a"
        } else {
            self.filter_key()
        }
    }

    /// The three applicable categories, used for per-group tri-counts.
    fn applicable() -> [Self; 3] {
        [Self::ALL[0], Self::ALL[1], Self::ALL[2]]
    }

    /// Resolve a raw value. Total: never fails.
    ///
    /// Matching is case-insensitive after trimming.
    fn resolve(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::NOT_APPLICABLE;
        };
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(raw))
            .unwrap_or(Self::NOT_APPLICABLE)
    }

    /// Look a category up by its filter key (`"benevolent"`, `"na"`, ...).
    fn from_filter_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.filter_key().eq_ignore_ascii_case(key.trim()))
    }
}

/// Resolved benevolence rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Benevolence {
    Benevolent,
    Ambiguous,
    Malevolent,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl RatingCategory for Benevolence {
    const ALL: [Self; 4] = [
        Self::Benevolent,
        Self::Ambiguous,
        Self::Malevolent,
        Self::NotApplicable,
    ];
    const NOT_APPLICABLE: Self = Self::NotApplicable;

    fn label(self) -> &'static str {
        match self {
            Self::Benevolent => "Benevolent",
            Self::Ambiguous => "Ambiguous",
            Self::Malevolent => "Malevolent",
            Self::NotApplicable => NOT_APPLICABLE_LABEL,
        }
    }

    fn filter_key(self) -> &'static str {
        match self {
            Self::Benevolent => "benevolent",
            Self::Ambiguous => "ambiguous",
            Self::Malevolent => "malevolent",
            Self::NotApplicable => "na",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Resolved alignment rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    Aligned,
    Ambiguous,
    Misaligned,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl RatingCategory for Alignment {
    const ALL: [Self; 4] = [
        Self::Aligned,
        Self::Ambiguous,
        Self::Misaligned,
        Self::NotApplicable,
    ];
    const NOT_APPLICABLE: Self = Self::NotApplicable;

    fn label(self) -> &'static str {
        match self {
            Self::Aligned => "Aligned",
            Self::Ambiguous => "Ambiguous",
            Self::Misaligned => "Misaligned",
            Self::NotApplicable => NOT_APPLICABLE_LABEL,
        }
    }

    fn filter_key(self) -> &'static str {
        match self {
            Self::Aligned => "aligned",
            Self::Ambiguous => "ambiguous",
            Self::Misaligned => "misaligned",
            Self::NotApplicable => "na",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Resolved AI-qualification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiQualification {
    Pass,
    Ambiguous,
    Fail,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl RatingCategory for AiQualification {
    const ALL: [Self; 4] = [Self::Pass, Self::Ambiguous, Self::Fail, Self::NotApplicable];
    const NOT_APPLICABLE: Self = Self::NotApplicable;

    fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Ambiguous => "Ambiguous",
            Self::Fail => "Fail",
            Self::NotApplicable => NOT_APPLICABLE_LABEL,
        }
    }

    fn filter_key(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Ambiguous => "ambiguous",
            Self::Fail => "fail",
            Self::NotApplicable => "na",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

macro_rules! display_by_label {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

display_by_label!(Benevolence, Alignment, AiQualification);

// =============================================================================
// CHARACTER RECORD
// =============================================================================

/// One assessed character, as supplied by the dataset.
///
/// Optional fields decode leniently: wrong JSON types resolve to the
/// documented defaults instead of failing the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub character_name: String,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub character_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub work_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub work_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::year", skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i64>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub source_urls: Vec<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub character_description: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    ai_qualification: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub ai_qualification_explanation: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    benevolence_rating: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub benevolence_rating_explanation: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    alignment_rating: Option<String>,

    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub alignment_rating_explanation: Option<String>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub needs_research: bool,
}

impl CharacterRecord {
    /// Create a record with only a name; every other field is absent.
    pub fn new(character_name: impl Into<String>) -> Self {
        Self {
            character_name: character_name.into(),
            ..Self::default()
        }
    }

    // =========================================================================
    // BUILDER METHODS
    // =========================================================================

    /// Set the character type shown after the name.
    pub fn with_character_type(mut self, character_type: impl Into<String>) -> Self {
        self.character_type = Some(character_type.into());
        self
    }

    /// Set the work name and type.
    pub fn with_work(mut self, work_name: impl Into<String>, work_type: impl Into<String>) -> Self {
        self.work_name = Some(work_name.into());
        self.work_type = Some(work_type.into());
        self
    }

    /// Set the work URL.
    pub fn with_work_url(mut self, url: impl Into<String>) -> Self {
        self.work_url = Some(url.into());
        self
    }

    /// Set the publication year.
    pub fn with_publication_year(mut self, year: i64) -> Self {
        self.publication_year = Some(year);
        self
    }

    /// Append a source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_urls.push(url.into());
        self
    }

    /// Set the narrative description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.character_description = Some(description.into());
        self
    }

    /// Set the raw AI-qualification value.
    pub fn with_qualification(mut self, raw: impl Into<String>) -> Self {
        self.ai_qualification = Some(raw.into());
        self
    }

    /// Set the raw benevolence rating.
    pub fn with_benevolence(mut self, raw: impl Into<String>) -> Self {
        self.benevolence_rating = Some(raw.into());
        self
    }

    /// Set the raw alignment rating.
    pub fn with_alignment(mut self, raw: impl Into<String>) -> Self {
        self.alignment_rating = Some(raw.into());
        self
    }

    /// Flag the record as needing more research.
    pub fn with_needs_research(mut self, needs_research: bool) -> Self {
        self.needs_research = needs_research;
        self
    }

    // =========================================================================
    // RESOLVED ACCESSORS
    // =========================================================================

    /// Benevolence rating with absent/empty/unrecognized values as N/A.
    pub fn resolved_benevolence(&self) -> Benevolence {
        Benevolence::resolve(self.benevolence_rating.as_deref())
    }

    /// Alignment rating with absent/empty/unrecognized values as N/A.
    pub fn resolved_alignment(&self) -> Alignment {
        Alignment::resolve(self.alignment_rating.as_deref())
    }

    /// AI-qualification status with absent/empty/unrecognized values as N/A.
    pub fn resolved_qualification(&self) -> AiQualification {
        AiQualification::resolve(self.ai_qualification.as_deref())
    }

    /// Grouping key: `work_type`, or `"Other"` when absent or empty.
    pub fn work_type_key(&self) -> &str {
        self.work_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(WORK_TYPE_FALLBACK)
    }
}

/// An entry the curators skipped, with the reason. Display-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntry {
    #[serde(default, deserialize_with = "lenient::string")]
    pub character_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub work_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source_page: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source_section: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub reason: Option<String>,
}

/// The loaded record collection. Immutable after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Records in manifest order (multi-file) or document order (single file).
    pub characters: Vec<CharacterRecord>,
    /// Display-only list of skipped entries.
    #[serde(default)]
    pub skipped_entries: Vec<SkippedEntry>,
    /// `metadata.last_updated` from the manifest or document, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Dataset {
    /// Wrap a record collection with no skipped entries or metadata.
    pub fn from_records(characters: Vec<CharacterRecord>) -> Self {
        Self {
            characters,
            ..Self::default()
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

// =============================================================================
// LENIENT DECODING
// =============================================================================

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn year<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Value::String(s) if !s.is_empty() => vec![s],
            _ => Vec::new(),
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
    }
}
