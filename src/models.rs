//! Core data models for variant linking.
//!
//! This module contains the dataset record shape, the candidate outcome
//! enums, the report row and the run statistics.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Dataset Constants
// ============================================================================

/// `modelType` of raw geometry records (potential donors)
pub const MODEL_TYPE_RAW_P3D: &str = "Raw P3D";

/// `modelType` of config-derived records
pub const MODEL_TYPE_CONFIG: &str = "Config";

/// `dimensionsSource` marking a config record already linked upstream
pub const DIMENSIONS_SOURCE_LINKED: &str = "bbox_linked_p3d";

// ============================================================================
// Dataset Record
// ============================================================================

/// Accepts a string or a number; anything else (missing, null, bool, array,
/// object) becomes the empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// One object record from the dataset. Read-only after loading.
///
/// Interpreted fields are flattened to strings; pass-through fields keep
/// their raw JSON value so reports reproduce them untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub object_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dimensions_source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bbox_linked_from_id: String,

    #[serde(default)]
    pub bbox_min_visual: Value,
    #[serde(default)]
    pub bbox_max_visual: Value,

    // Pass-through
    #[serde(default)]
    pub dimensions_visual: Value,
    #[serde(default)]
    pub image: Value,
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub search_tags: Value,
}

fn is_triple(value: &Value) -> bool {
    value.as_array().is_some_and(|a| a.len() == 3)
}

impl Record {
    /// Both visual bounding-box corners are present as 3-element arrays.
    pub fn has_bbox(&self) -> bool {
        is_triple(&self.bbox_min_visual) && is_triple(&self.bbox_max_visual)
    }

    /// Raw geometry record with a usable bounding box.
    pub fn is_donor(&self) -> bool {
        self.model_type == MODEL_TYPE_RAW_P3D && self.has_bbox()
    }

    /// Config record already resolved by the upstream linking pass.
    pub fn is_linked_config(&self) -> bool {
        self.model_type == MODEL_TYPE_CONFIG && self.dimensions_source == DIMENSIONS_SOURCE_LINKED
    }

    pub fn is_unresolved_config(&self) -> bool {
        self.model_type == MODEL_TYPE_CONFIG && self.dimensions_source != DIMENSIONS_SOURCE_LINKED
    }

    /// Donor id recorded on a linked config, trimmed.
    pub fn linked_donor_id(&self) -> &str {
        self.bbox_linked_from_id.trim()
    }
}

// ============================================================================
// Candidate Outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CandidateStatus {
    Candidate,
    Ambiguous,
    NoCandidate,
}

impl CandidateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::Candidate => "candidate",
            CandidateStatus::Ambiguous => "ambiguous",
            CandidateStatus::NoCandidate => "no_candidate",
        }
    }

    /// Fixed reviewer note for the report row.
    pub fn notes(self) -> &'static str {
        match self {
            CandidateStatus::Ambiguous => "Multiple donor candidates. Manual review needed.",
            CandidateStatus::NoCandidate => "No raw p3d donor found by variant-base heuristics.",
            CandidateStatus::Candidate => "Candidate generated by variant-base linking heuristics.",
        }
    }
}

/// Which tier produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateMethod {
    /// A linked sibling config shares the base key
    SiblingLinkedBase,
    /// Linked siblings disagree on the donor (conflict detection only)
    SiblingLinkedConflict,
    /// Exactly one donor with same base key and path family
    BaseKeyPathFamily,
    /// Exactly one donor with same base key
    BaseKeyUnique,
    BaseKeyPathFamilyAmbiguous,
    BaseKeyAmbiguous,
}

impl CandidateMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateMethod::SiblingLinkedBase => "sibling_linked_base",
            CandidateMethod::SiblingLinkedConflict => "sibling_linked_conflict",
            CandidateMethod::BaseKeyPathFamily => "base_key_path_family",
            CandidateMethod::BaseKeyUnique => "base_key_unique",
            CandidateMethod::BaseKeyPathFamilyAmbiguous => "base_key_path_family_ambiguous",
            CandidateMethod::BaseKeyAmbiguous => "base_key_ambiguous",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateConfidence {
    High,
    Medium,
    /// Ambiguous, needs a human
    Review,
}

impl CandidateConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateConfidence::High => "high",
            CandidateConfidence::Medium => "medium",
            CandidateConfidence::Review => "review",
        }
    }
}

// ============================================================================
// Output Models
// ============================================================================

/// One report row per unresolved config record.
///
/// Field order is the CSV column order.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRow {
    pub id: String,
    pub object_name: String,
    pub model_type: String,
    pub path: String,
    pub image: Value,
    pub category: Value,
    pub search_tags: Value,
    pub dimensions_source: String,
    pub base_variant_key: String,
    pub path_family: String,
    pub candidate_status: &'static str,
    pub candidate_method: &'static str,
    pub candidate_confidence: &'static str,
    pub candidate_count: usize,
    pub donor_id: String,
    pub donor_object_name: String,
    pub donor_path: String,
    pub donor_image: Value,
    pub donor_dimensions_visual: Value,
    pub notes: &'static str,
}

/// CSV header, same order as `CandidateRow` fields.
pub const CANDIDATE_COLUMNS: [&str; 20] = [
    "id",
    "objectName",
    "modelType",
    "path",
    "image",
    "category",
    "searchTags",
    "dimensionsSource",
    "baseVariantKey",
    "pathFamily",
    "candidateStatus",
    "candidateMethod",
    "candidateConfidence",
    "candidateCount",
    "donorId",
    "donorObjectName",
    "donorPath",
    "donorImage",
    "donorDimensionsVisual",
    "notes",
];

// ============================================================================
// Statistics
// ============================================================================

/// Run summary: status counts plus partition sizes.
#[derive(Default, Debug, Clone, Serialize)]
pub struct CandidateStats {
    pub total: usize,
    pub candidate: usize,
    pub ambiguous: usize,
    pub no_candidate: usize,
    pub by_method: BTreeMap<String, usize>,

    // Dataset partition
    pub donors: usize,
    pub linked_configs: usize,
    pub unresolved_configs: usize,

    // Data-quality warnings
    pub duplicate_donor_ids: usize,
    pub conflicting_sibling_links: usize,
    pub records_without_id: usize,

    pub elapsed_seconds: f64,
}

impl CandidateStats {
    /// Count one emitted row.
    pub fn record(&mut self, row: &CandidateRow) {
        self.total += 1;
        match row.candidate_status {
            "candidate" => self.candidate += 1,
            "ambiguous" => self.ambiguous += 1,
            _ => self.no_candidate += 1,
        }
        if !row.candidate_method.is_empty() {
            *self
                .by_method
                .entry(row.candidate_method.to_string())
                .or_default() += 1;
        }
    }

    pub fn from_rows(rows: &[CandidateRow]) -> Self {
        let mut stats = Self::default();
        for row in rows {
            stats.record(row);
        }
        stats
    }

    /// Share of rows with a proposed donor, as a percentage
    pub fn candidate_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.candidate as f64 / self.total as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file, creating its directory if needed
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        crate::report::ensure_parent(path)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
