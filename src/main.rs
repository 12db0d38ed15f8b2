use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use variant_link::config::load_variant_tokens;
use variant_link::index::{partition, DonorIndex, Partition};
use variant_link::loader::load_dataset;
use variant_link::models::{CandidateStats, Record};
use variant_link::normalize::{normalize_tokens, path_family, VariantTokens};
use variant_link::progress::{
    create_progress_bar, create_spinner, format_duration, set_log_only, warn_count,
};
use variant_link::report::{build_rows, write_csv, write_json};
use variant_link::resolver::{Resolver, SiblingLinkPolicy};
use variant_link::safety::{validate_report_outputs, validate_stats_output};

#[derive(Parser)]
#[command(name = "variant-link")]
#[command(about = "Propose raw p3d bounding-box donors for config objects via variant-base heuristics")]
struct Args {
    /// Dataset JSON (top-level array of object records)
    input: PathBuf,

    #[arg(long, default_value = "reports/config_variant_link_candidates.csv")]
    csv: PathBuf,

    #[arg(long, default_value = "reports/config_variant_link_candidates.json")]
    json: PathBuf,

    /// Write run statistics JSON to this file
    #[arg(long)]
    stats: Option<PathBuf>,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide progress bars, print periodic log lines instead
    #[arg(long)]
    log_only: bool,

    /// Replace the built-in variant tokens (one token per line, # comments)
    #[arg(long)]
    variant_tokens: Option<PathBuf>,

    /// Extra variant tokens (comma-separated)
    #[arg(long)]
    extra_variant_tokens: Option<String>,

    /// Treat linked siblings naming different donors as ambiguous
    #[arg(long)]
    sibling_conflicts: bool,

    /// Print the matching trace for one object name after the run
    #[arg(long)]
    explain: Option<String>,
}

/// Trace the first unresolved config named `name`, or a bare name when the
/// dataset has none (no path, so no path family).
fn explain(
    name: &str,
    parts: &Partition,
    variants: &VariantTokens,
    index: &DonorIndex,
    resolver: &Resolver,
) {
    println!("\nMatching trace for '{}':", name);
    println!("{:-<80}", "");

    let bare;
    let record = match parts.unresolved_named(name) {
        Some(record) => {
            println!("  record:      [{}] {}", record.id, record.path);
            record
        }
        None => {
            println!("  record:      not an unresolved config, tracing name only");
            bare = Record {
                object_name: name.to_string(),
                ..Default::default()
            };
            &bare
        }
    };
    let res = resolver.resolve(record);

    println!("  tokens:      {:?}", normalize_tokens(name));
    println!("  base key:    {:?}", variants.base_key(name));
    if res.path_family.is_empty() {
        println!("  family:      (empty)");
    } else {
        println!("  family:      {}", res.path_family);
    }
    match index.linked_donors(&res.base_key) {
        Some(linked) => println!(
            "  linked ids:  {:?} (last: {})",
            linked.distinct, linked.last
        ),
        None => println!("  linked ids:  none"),
    }

    let same_base = index.same_base(&res.base_key);
    println!("  donors:      {}", same_base.len());
    for donor in same_base.iter().take(10) {
        println!(
            "    [{}] {} ({})",
            donor.id,
            donor.object_name,
            path_family(&donor.path)
        );
    }

    println!(
        "  outcome:     {} {} (count={})",
        res.status.as_str(),
        res.method.map(|m| m.as_str()).unwrap_or("-"),
        res.candidate_count
    );
    if let Some(donor) = res.donor {
        println!("  donor:       [{}] {}", donor.id, donor.object_name);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    validate_report_outputs(&[&args.csv, &args.json], &args.input)?;
    if let Some(ref stats_path) = args.stats {
        validate_stats_output(stats_path, &[&args.csv, &args.json], &args.input)?;
    }

    let variants = load_variant_tokens(
        args.variant_tokens.as_deref(),
        args.extra_variant_tokens.as_deref(),
    )?;
    let policy = if args.sibling_conflicts {
        SiblingLinkPolicy::DetectConflicts
    } else {
        SiblingLinkPolicy::LastWriteWins
    };

    let start = Instant::now();

    // Phase 1: load. Any failure here aborts before reports are touched.
    println!("Opening dataset: {:?}", args.input);
    let spinner = create_spinner("Phase 1: Loading dataset");
    let dataset = load_dataset(&args.input)?;
    spinner.finish_with_message(format!(
        "Phase 1: Loaded {} records",
        dataset.records.len()
    ));
    warn_count(dataset.skipped, "non-object entries skipped");

    // Phase 2: partition and index
    let spinner = create_spinner("Phase 2: Indexing donors");
    let parts = partition(&dataset.records);
    let index = DonorIndex::build(&parts, &variants);
    spinner.finish_with_message(format!(
        "Phase 2: Indexed {} donors under {} base keys",
        index.donor_count(),
        index.base_key_count()
    ));
    println!(
        "Found {} donors, {} linked configs ({} base keys), {} unresolved configs",
        parts.donors.len(),
        parts.linked_configs.len(),
        index.linked_base_key_count(),
        parts.unresolved_configs.len()
    );
    println!("Variant tokens: {}", variants.len());
    warn_count(parts.missing_ids, "records without an id");
    warn_count(index.duplicate_donor_ids, "duplicate donor ids (last one wins)");
    warn_count(
        index.conflicting_base_keys,
        "base keys with conflicting sibling links",
    );

    // Phase 3: resolve
    let resolver = Resolver::new(&index, &variants).with_policy(policy);
    let pb = create_progress_bar(
        parts.unresolved_configs.len() as u64,
        "Phase 3: Resolving",
    );
    let rows = build_rows(&parts.unresolved_configs, &resolver, &pb);
    pb.finish_with_message(format!("Phase 3: Resolved {} configs", rows.len()));

    // Phase 4: write
    let spinner = create_spinner("Phase 4: Writing reports");
    write_csv(&args.csv, &rows)?;
    write_json(&args.json, &rows)?;
    spinner.finish_with_message("Phase 4: Reports written");
    println!("wrote {}", args.csv.display());
    println!("wrote {}", args.json.display());

    let mut stats = CandidateStats::from_rows(&rows);
    stats.donors = parts.donors.len();
    stats.linked_configs = parts.linked_configs.len();
    stats.unresolved_configs = parts.unresolved_configs.len();
    stats.duplicate_donor_ids = index.duplicate_donor_ids;
    stats.conflicting_sibling_links = index.conflicting_base_keys;
    stats.records_without_id = parts.missing_ids;
    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    stats.log_phase("final");
    if let Some(ref stats_path) = args.stats {
        stats
            .write_to_file(stats_path)
            .with_context(|| format!("Failed to write stats {:?}", stats_path))?;
    }

    println!("\n{:=<60}", "");
    println!("Variant linking complete!");
    println!("  Configs:    {}", stats.total);
    println!(
        "  Candidates: {} ({:.1}%)",
        stats.candidate,
        stats.candidate_rate()
    );
    println!("  Ambiguous:  {}", stats.ambiguous);
    println!("  No donor:   {}", stats.no_candidate);
    println!("  Elapsed:    {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    if let Some(name) = args.explain {
        explain(&name, &parts, &variants, &index, &resolver);
    }

    Ok(())
}
