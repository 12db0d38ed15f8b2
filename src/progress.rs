//! Progress bars and run logging.
//!
//! Phase progress is shown with indicatif bars and spinners. In log-only
//! mode bars are hidden and periodic `[phase] n/total` lines go to stderr
//! instead, for tail-friendly output from background runs.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})";
const SPINNER_TEMPLATE: &str = "{msg} {spinner} [{elapsed_precise}]";

/// Set once from `--log-only` before any phase starts
static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Data-quality warning line, skipped when nothing was counted.
pub fn warn_count(count: usize, what: &str) {
    if let Some(line) = warning_line(count, what) {
        eprintln!("{}", line);
    }
}

fn warning_line(count: usize, what: &str) -> Option<String> {
    (count > 0).then(|| format!("warning: {} {}", count, what))
}

/// `[phase] n/total (pct%)` every `interval` items and on the last one.
fn progress_line(phase: &str, current: u64, total: u64, interval: u64) -> Option<String> {
    if total == 0 || (current % interval != 0 && current != total) {
        return None;
    }
    let pct = 100.0 * current as f64 / total as f64;
    Some(format!("[{}] {}/{} ({:.1}%)", phase, current, total, pct))
}

/// Periodic progress line for log-only mode; silent otherwise.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64) {
    if !is_log_only() {
        return;
    }
    if let Some(line) = progress_line(phase, current, total, interval) {
        eprintln!("{}", line);
    }
}

/// Hide `pb` in log-only mode, otherwise apply `template`.
fn decorate(
    pb: ProgressBar,
    template: &str,
    fallback: ProgressStyle,
    msg: &str,
) -> ProgressBar {
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        let style = fallback.clone().template(template).unwrap_or(fallback);
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}

pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    decorate(
        ProgressBar::new(len),
        BAR_TEMPLATE,
        ProgressStyle::default_bar().progress_chars("=> "),
        msg,
    )
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = decorate(
        ProgressBar::new_spinner(),
        SPINNER_TEMPLATE,
        ProgressStyle::default_spinner(),
        msg,
    );
    if !is_log_only() {
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb
}
