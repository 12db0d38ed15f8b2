//! Report rows and emitters.
//!
//! Turns resolutions into `CandidateRow`s, sorts them by
//! `(objectName, id)` and writes the CSV and JSON reports.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde_json::Value;
use std::path::Path;

use crate::models::{CandidateRow, Record, CANDIDATE_COLUMNS};
use crate::progress::log_progress;
use crate::resolver::{Resolution, Resolver};

/// Log interval for log-only mode
const LOG_INTERVAL: u64 = 10_000;

/// Null, false, zero and the empty string all count as "no value".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Blank pass-through values are reported as "".
fn or_empty(value: &Value) -> Value {
    if is_blank(value) {
        Value::String(String::new())
    } else {
        value.clone()
    }
}

/// Build the report row for one unresolved record.
pub fn build_row(record: &Record, resolution: &Resolution<'_>) -> CandidateRow {
    let donor = resolution.donor;
    CandidateRow {
        id: record.id.clone(),
        object_name: record.object_name.clone(),
        model_type: record.model_type.clone(),
        path: record.path.clone(),
        image: or_empty(&record.image),
        category: or_empty(&record.category),
        search_tags: or_empty(&record.search_tags),
        dimensions_source: record.dimensions_source.clone(),
        base_variant_key: resolution.base_key.clone(),
        path_family: resolution.path_family.clone(),
        candidate_status: resolution.status.as_str(),
        candidate_method: resolution.method.map(|m| m.as_str()).unwrap_or(""),
        candidate_confidence: resolution.confidence.map(|c| c.as_str()).unwrap_or(""),
        candidate_count: resolution.candidate_count,
        donor_id: donor.map(|d| d.id.clone()).unwrap_or_default(),
        donor_object_name: donor.map(|d| d.object_name.clone()).unwrap_or_default(),
        donor_path: donor.map(|d| d.path.clone()).unwrap_or_default(),
        donor_image: donor
            .map(|d| or_empty(&d.image))
            .unwrap_or_else(|| Value::String(String::new())),
        donor_dimensions_visual: donor
            .filter(|d| !is_blank(&d.dimensions_visual))
            .map(|d| d.dimensions_visual.clone())
            .unwrap_or(Value::Null),
        notes: resolution.status.notes(),
    }
}

/// Deterministic report order: objectName, then id (byte-wise).
pub fn sort_rows(rows: &mut [CandidateRow]) {
    rows.sort_by(|a, b| {
        a.object_name
            .cmp(&b.object_name)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Resolve every unresolved record in parallel and return sorted rows.
pub fn build_rows(
    unresolved: &[&Record],
    resolver: &Resolver<'_, '_>,
    pb: &ProgressBar,
) -> Vec<CandidateRow> {
    let total = unresolved.len() as u64;
    let mut rows: Vec<CandidateRow> = unresolved
        .par_iter()
        .map(|record| {
            let row = build_row(record, &resolver.resolve(record));
            pb.inc(1);
            log_progress("Resolving", pb.position(), total, LOG_INTERVAL);
            row
        })
        .collect();
    sort_rows(&mut rows);
    rows
}

// ============================================================================
// CSV
// ============================================================================

/// Largest magnitude printed as a plain integer when a float has no fraction
const MAX_INTEGRAL_FLOAT: f64 = 1e15;

/// Numbers print in their shortest form: `2.0` becomes `2`.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_INTEGRAL_FLOAT => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Text form of a JSON value for a CSV cell: null is empty, strings are
/// raw, arrays and objects are compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Quote a CSV field if it contains a quote, comma or newline.
pub fn csv_escape(field: &str) -> String {
    if field.contains(['"', ',', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn row_fields(row: &CandidateRow) -> [String; 20] {
    [
        row.id.clone(),
        row.object_name.clone(),
        row.model_type.clone(),
        row.path.clone(),
        value_text(&row.image),
        value_text(&row.category),
        value_text(&row.search_tags),
        row.dimensions_source.clone(),
        row.base_variant_key.clone(),
        row.path_family.clone(),
        row.candidate_status.to_string(),
        row.candidate_method.to_string(),
        row.candidate_confidence.to_string(),
        row.candidate_count.to_string(),
        row.donor_id.clone(),
        row.donor_object_name.clone(),
        row.donor_path.clone(),
        value_text(&row.donor_image),
        value_text(&row.donor_dimensions_visual),
        row.notes.to_string(),
    ]
}

/// Render rows as CSV text with header, one line per row, trailing newline.
pub fn render_csv(rows: &[CandidateRow]) -> String {
    let mut out = CANDIDATE_COLUMNS.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row_fields(row).iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

// ============================================================================
// Writers
// ============================================================================

/// Create the parent directory of an output file if it is missing.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    Ok(())
}

pub fn write_csv(path: &Path, rows: &[CandidateRow]) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, render_csv(rows))
        .with_context(|| format!("Failed to write CSV report {:?}", path))
}

/// Pretty JSON array with trailing newline.
pub fn write_json(path: &Path, rows: &[CandidateRow]) -> Result<()> {
    ensure_parent(path)?;
    let mut json = serde_json::to_string_pretty(rows)?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("Failed to write JSON report {:?}", path))
}
