//! Dataset loading.
//!
//! The dataset is a JSON document whose top level is an array of record
//! objects. Anything else is a fatal error: no report is produced from a
//! partially readable dataset.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::models::Record;

/// Loaded records plus the number of array elements that were not objects.
#[derive(Debug, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub skipped: usize,
}

/// Parse a dataset from JSON text.
pub fn parse_dataset(text: &str) -> Result<Dataset> {
    let root: Value = serde_json::from_str(text).context("Dataset is not valid JSON")?;
    let Value::Array(items) = root else {
        bail!("Dataset top-level value must be an array of records");
    };

    let mut dataset = Dataset {
        records: Vec::with_capacity(items.len()),
        skipped: 0,
    };
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            dataset.skipped += 1;
            continue;
        }
        let record: Record = serde_json::from_value(item)
            .with_context(|| format!("Failed to decode record at index {}", idx))?;
        dataset.records.push(record);
    }
    Ok(dataset)
}

/// Read and parse a dataset file.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {:?}", path))?;
    parse_dataset(&text).with_context(|| format!("Failed to parse dataset {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_records() {
        let text = r#"[
            {"id": "D1", "objectName": "land_tent_green.p3d", "modelType": "Raw P3D",
             "path": "structures/camp/tent", "bboxMinVisual": [0,0,0], "bboxMaxVisual": [2,2,1],
             "unknownField": {"nested": true}},
            {"id": "C1", "objectName": "Tent_Blue", "modelType": "Config"}
        ]"#;
        let dataset = parse_dataset(text).unwrap();
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.skipped, 0);
        assert!(dataset.records[0].is_donor());
        assert!(dataset.records[1].is_unresolved_config());
    }

    #[test]
    fn test_non_object_elements_skipped() {
        let dataset = parse_dataset(r#"[1, "x", null, {"id": "A"}]"#).unwrap();
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.skipped, 3);
    }

    #[test]
    fn test_malformed_dataset_is_error() {
        assert!(parse_dataset("{not json").is_err());
        assert!(parse_dataset(r#"{"id": "A"}"#).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_dataset(Path::new("/nonexistent/dayz_objects.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read dataset"));
    }
}
