//! Safety checks before report files are overwritten.
//!
//! Reports are rewritten on every run; these checks keep a mistyped output
//! path from clobbering the input dataset.

use anyhow::{bail, Result};
use std::path::Path;

/// Pattern every report file name must contain
pub const REPORT_PATTERN: &str = "candidates";

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output filename must contain `required_pattern`
/// - Output cannot be the same as any of the provided source paths
pub fn validate_output_path(
    output: &Path,
    required_pattern: &str,
    source_paths: &[&Path],
) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if !output_name.contains(required_pattern) {
        bail!(
            "Safety check failed: output file '{}' must contain '{}' in the name",
            output.display(),
            required_pattern
        );
    }

    for source in source_paths {
        if output == *source {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

/// Validate a set of report outputs against the dataset path, and against
/// each other.
pub fn validate_report_outputs(outputs: &[&Path], dataset: &Path) -> Result<()> {
    for (i, output) in outputs.iter().enumerate() {
        validate_output_path(output, REPORT_PATTERN, &[dataset])?;
        if outputs[..i].contains(output) {
            bail!(
                "Safety check failed: output '{}' is used for more than one report",
                output.display()
            );
        }
    }
    Ok(())
}

/// The stats file has no naming rule, but it must not overwrite the dataset
/// or one of the reports.
pub fn validate_stats_output(stats: &Path, reports: &[&Path], dataset: &Path) -> Result<()> {
    if stats == dataset {
        bail!(
            "Safety check failed: stats output '{}' cannot be the same as source",
            stats.display()
        );
    }
    if reports.contains(&stats) {
        bail!(
            "Safety check failed: stats output '{}' is also a report output",
            stats.display()
        );
    }
    Ok(())
}
