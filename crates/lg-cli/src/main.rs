//! ListGuard CLI
//!
//! CLI tool for compiling filter lists and checking requests against them.

mod bench;
mod lists;

use std::collections::BTreeMap;
use std::fs;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use lg_core::{EngineDecision, ListMetadata, TableId, TraceEvent, TraceLog};

#[derive(Parser)]
#[command(name = "lg-cli")]
#[command(about = "ListGuard filter list compiler and tools")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile filter lists and report table counts
    Compile {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the compiled entries of a list
    Dump {
        /// Filter list file
        #[arg(short, long)]
        input: String,

        /// Only this table (camelCase name, e.g. mainBlackList)
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Decide a single request
    Check {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// URL of the page issuing the request
        #[arg(long)]
        page: String,

        /// Resource URL
        #[arg(long)]
        url: String,

        /// Print every table consulted
        #[arg(long)]
        trace: bool,
    },

    /// Decide every request of a JSONL file
    Batch {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// JSONL file of {"page": ..., "url": ...} objects
        #[arg(short, long)]
        requests: String,
    },

    /// Measure match latency on a synthetic request mix
    Bench {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Passes over each request set
        #[arg(long, default_value_t = 100)]
        iterations: usize,

        /// Rule entries sampled per list to build requests from
        #[arg(long, default_value_t = 1_000)]
        sample: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compile { input, json } => cmd_compile(&input, json, cli.verbose),
        Commands::Dump { input, table } => cmd_dump(&input, table.as_deref()),
        Commands::Check {
            input,
            page,
            url,
            trace,
        } => cmd_check(&input, &page, &url, trace),
        Commands::Batch { input, requests } => cmd_batch(&input, &requests),
        Commands::Bench {
            input,
            iterations,
            sample,
        } => bench::run(bench::BenchOptions {
            input_paths: input,
            iterations,
            sample,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// compile
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListReport<'a> {
    path: &'a str,
    metadata: &'a ListMetadata,
    lines: usize,
    blank: usize,
    comments: usize,
    cosmetic: usize,
    dropped: usize,
    accepted: usize,
    entries: usize,
    deduped: usize,
    compile_ms: f64,
    tables: BTreeMap<&'static str, usize>,
}

fn cmd_compile(inputs: &[String], json: bool, verbose: bool) -> Result<(), String> {
    let loaded = lists::load_lists(inputs)?;

    if json {
        let reports: Vec<ListReport<'_>> = loaded
            .iter()
            .map(|list| ListReport {
                path: &list.path,
                metadata: &list.rules.metadata,
                lines: list.stats.lines,
                blank: list.stats.blank,
                comments: list.stats.comments,
                cosmetic: list.stats.cosmetic,
                dropped: list.stats.dropped,
                accepted: list.stats.accepted,
                entries: list.stats.entries,
                deduped: list.optimize.deduped,
                compile_ms: list.compile_ms,
                tables: list
                    .rules
                    .counts()
                    .into_iter()
                    .map(|(id, count)| (id.name(), count))
                    .collect(),
            })
            .collect();
        let text = serde_json::to_string_pretty(&reports)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        println!("{text}");
        return Ok(());
    }

    for list in &loaded {
        println!("{} ({})", list.rules.label(), lists::file_name(&list.path));
        if let Some(version) = &list.rules.metadata.version {
            println!("  Version:  {}", version);
        }
        println!(
            "  Lines:    {} ({} blank, {} comments, {} cosmetic)",
            list.stats.lines, list.stats.blank, list.stats.comments, list.stats.cosmetic
        );
        println!(
            "  Filters:  {} accepted, {} dropped",
            list.stats.accepted, list.stats.dropped
        );
        println!(
            "  Entries:  {} -> {} (dedupe removed {})",
            list.optimize.before, list.optimize.after, list.optimize.deduped
        );
        println!("  Time:     {:.1}ms", list.compile_ms);

        for (id, count) in list.rules.counts() {
            if count > 0 || verbose {
                println!("    {:<45} {}", id.name(), count);
            }
        }
    }

    Ok(())
}

// =============================================================================
// dump
// =============================================================================

fn cmd_dump(input: &str, table: Option<&str>) -> Result<(), String> {
    let tables: Vec<TableId> = match table {
        Some(name) => vec![name.parse::<TableId>().map_err(|e| e.to_string())?],
        None => TableId::ALL.to_vec(),
    };

    let list = lists::load_list(input)?;
    for id in tables {
        let entries = list.rules.table(id);
        if entries.is_empty() && table.is_none() {
            continue;
        }
        println!("{} ({})", id, entries.len());
        for entry in entries {
            println!("  {}", entry);
        }
    }

    Ok(())
}

// =============================================================================
// check
// =============================================================================

fn cmd_check(inputs: &[String], page: &str, url: &str, trace: bool) -> Result<(), String> {
    let engine = lists::load_engine(inputs)?;

    let mut log = TraceLog::new();
    let result = engine.is_blocked_traced(page, url, &mut log);

    if trace {
        for event in &log.events {
            match event {
                TraceEvent::Skipped { table, reason } => {
                    println!("  skip    {} ({:?})", table, reason)
                }
                TraceEvent::Checked { table, entries } => {
                    println!("  check   {} ({} entries)", table, entries)
                }
                TraceEvent::Matched { table, entry } => println!("  match   {} [{}]", table, entry),
            }
        }
    }

    match &result.list {
        Some(list) => println!("{} ({})", result.decision, list),
        None => println!("{}", result.decision),
    }

    Ok(())
}

// =============================================================================
// batch
// =============================================================================

#[derive(Deserialize)]
struct BatchRequest {
    page: String,
    url: String,
}

#[derive(Serialize)]
struct BatchVerdict<'a> {
    page: &'a str,
    url: &'a str,
    #[serde(flatten)]
    result: EngineDecision,
}

fn cmd_batch(inputs: &[String], requests_path: &str) -> Result<(), String> {
    let engine = lists::load_engine(inputs)?;
    let text = fs::read_to_string(requests_path)
        .map_err(|e| format!("Failed to read '{}': {}", requests_path, e))?;

    let mut total = 0usize;
    let mut blocked = 0usize;
    let mut malformed = 0usize;

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let request: BatchRequest = match serde_json::from_str(trimmed) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("{}:{}: skipping malformed request: {}", requests_path, idx + 1, e);
                malformed += 1;
                continue;
            }
        };

        let result = engine.is_blocked(&request.page, &request.url);
        total += 1;
        if result.is_blocked() {
            blocked += 1;
        }

        let verdict = BatchVerdict {
            page: &request.page,
            url: &request.url,
            result,
        };
        let out = serde_json::to_string(&verdict)
            .map_err(|e| format!("Failed to serialize verdict: {}", e))?;
        println!("{out}");
    }

    eprintln!(
        "{} requests: {} blocked, {} allowed, {} malformed lines skipped",
        total,
        blocked,
        total - blocked,
        malformed
    );

    Ok(())
}
