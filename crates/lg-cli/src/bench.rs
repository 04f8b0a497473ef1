use std::cmp::Ordering;
use std::time::Instant;

use lg_core::types::{Anchor, Scope};
use lg_core::{Engine, RuleEntry, RuleSet, TableId};

use crate::lists;

const BENCH_PAGE: &str = "https://page.bench.test/";
const BENCH_CDN: &str = "https://cdn.bench.test";

pub struct BenchOptions {
    pub input_paths: Vec<String>,
    pub iterations: usize,
    pub sample: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BenchRequest {
    page: String,
    url: String,
}

struct BenchResult {
    ops: usize,
    blocked: usize,
    total_ms: f64,
    avg_us: f64,
    p50_us: f64,
    p95_us: f64,
    p99_us: f64,
    ops_per_sec: u64,
}

pub fn run(opts: BenchOptions) -> Result<(), String> {
    println!("============================================================");
    println!("ListGuard Benchmark");
    println!("============================================================");

    let loaded = lists::load_lists(&opts.input_paths)?;
    for list in &loaded {
        println!(
            "  {} - {} entries ({:.1}ms to compile)",
            list.rules.label(),
            list.rules.len(),
            list.compile_ms
        );
    }

    let mut hits = Vec::new();
    for list in &loaded {
        hits.extend(requests_from_rules(&list.rules, opts.sample));
    }
    let misses = clean_requests(opts.sample.max(1));
    let engine = Engine::from_lists(loaded.into_iter().map(|list| list.rules));

    if hits.is_empty() {
        log::warn!("lists have no pattern entries, only clean requests are measured");
    }

    println!("Warmup...");
    warmup(&engine, &hits);
    warmup(&engine, &misses);

    let mut summary = Vec::new();
    for (name, requests) in [("Rule-shaped requests", &hits), ("Clean requests", &misses)] {
        if requests.is_empty() {
            continue;
        }
        println!("------------------------------------------------------------");
        println!(
            "Benchmark: {} ({} requests, {} iterations)",
            name,
            requests.len(),
            opts.iterations
        );
        println!("------------------------------------------------------------");
        let result = run_benchmark(&engine, requests, opts.iterations);
        println!("{}", format_result(name, &result));
        summary.push((name, result));
    }

    println!("============================================================");
    println!("Summary");
    println!("============================================================");
    for (name, result) in &summary {
        println!("{:<22} P50 {:.2}μs  P99 {:.2}μs", name, result.p50_us, result.p99_us);
    }

    Ok(())
}

/// One request per sampled pattern entry, shaped so that the entry fires.
fn requests_from_rules(rules: &RuleSet, sample: usize) -> Vec<BenchRequest> {
    let shaped: Vec<(TableId, &RuleEntry)> = TableId::ALL
        .iter()
        .flat_map(|&table| rules.table(table).iter().map(move |entry| (table, entry)))
        .filter(|(_, entry)| !entry.is_regex())
        .collect();

    let stride = (shaped.len() / sample.max(1)).max(1);
    shaped
        .iter()
        .step_by(stride)
        .take(sample)
        .filter_map(|&(table, entry)| request_for_entry(table, entry))
        .collect()
}

fn request_for_entry(table: TableId, entry: &RuleEntry) -> Option<BenchRequest> {
    let segments = entry.segments()?.as_slice();

    let url = match table.anchor() {
        Anchor::Initial => segments.join("/"),
        Anchor::Final => format!("{}/{}", BENCH_CDN, segments.join("/")),
        Anchor::Contains => format!("{}/{}/x", BENCH_CDN, segments.join("/")),
        Anchor::Regex => return None,
    };

    let page = match entry.domain() {
        Some(domain) if table.scope().contains(Scope::DOMAIN) => format!("https://{}/", domain),
        _ => BENCH_PAGE.to_string(),
    };

    Some(BenchRequest { page, url })
}

/// First-party asset requests that lists normally let through.
fn clean_requests(count: usize) -> Vec<BenchRequest> {
    const PATHS: &[&str] = &["/app.js", "/style.css", "/logo.png", "/api/data", "/font.woff2"];

    (0..count)
        .map(|i| BenchRequest {
            page: BENCH_PAGE.to_string(),
            url: format!("{}static{}{}?v={}", BENCH_PAGE, i % 7, PATHS[i % PATHS.len()], i),
        })
        .collect()
}

fn run_benchmark(engine: &Engine, requests: &[BenchRequest], iterations: usize) -> BenchResult {
    let mut latencies = Vec::with_capacity(requests.len() * iterations);
    let mut blocked = 0usize;

    for _ in 0..iterations {
        for req in requests {
            let start = Instant::now();
            let decision = engine.is_blocked(&req.page, &req.url);
            latencies.push(start.elapsed().as_secs_f64() * 1_000_000.0);
            if decision.is_blocked() {
                blocked += 1;
            }
        }
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let total_us: f64 = latencies.iter().sum();
    let avg_us = if latencies.is_empty() {
        0.0
    } else {
        total_us / latencies.len() as f64
    };
    let ops_per_sec = if total_us > 0.0 {
        (latencies.len() as f64 / (total_us / 1_000_000.0)) as u64
    } else {
        0
    };

    BenchResult {
        ops: latencies.len(),
        blocked,
        total_ms: total_us / 1000.0,
        avg_us,
        p50_us: percentile(&latencies, 0.50),
        p95_us: percentile(&latencies, 0.95),
        p99_us: percentile(&latencies, 0.99),
        ops_per_sec,
    }
}

fn format_result(name: &str, result: &BenchResult) -> String {
    format!(
        "{}:\n  Operations:  {} ({} blocked)\n  Total time:  {:.2}ms\n  Avg latency: {:.2}μs\n  \
         P50 latency: {:.2}μs\n  P95 latency: {:.2}μs\n  P99 latency: {:.2}μs\n  \
         Throughput:  {} ops/sec",
        name,
        result.ops,
        result.blocked,
        result.total_ms,
        result.avg_us,
        result.p50_us,
        result.p95_us,
        result.p99_us,
        result.ops_per_sec,
    )
}

/// Nearest-rank percentile of a sorted slice.
fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let idx = ((values.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(values.len() - 1);
    values[idx]
}

fn warmup(engine: &Engine, requests: &[BenchRequest]) {
    for _ in 0..100 {
        for req in requests {
            let _ = engine.is_blocked(&req.page, &req.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::Segments;

    #[test]
    fn test_percentile_nearest_rank() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&values, 0.50), 50.0);
        assert_eq!(percentile(&values, 0.99), 99.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_rule_shaped_requests_hit_their_entries() {
        let mut rules = RuleSet::new();
        rules.push(TableId::MainBlackList, RuleEntry::double("/ads/", "banner"));
        rules.push(TableId::InitialBlackList, RuleEntry::single("https://px."));
        rules.push(TableId::FinalBlackList, RuleEntry::single(".gif"));
        rules.push(
            TableId::DomainBlackList,
            RuleEntry::domain_scoped("news.test", Segments::single("/tracker.js")),
        );
        rules.push(TableId::ThirdPartyBlackList, RuleEntry::single("tracker.test"));
        rules.push(TableId::RegularExpressionBlackList, RuleEntry::regex(r"https://x\.test/\d+"));

        let requests = requests_from_rules(&rules, 100);
        assert_eq!(requests.len(), 5);

        let engine = Engine::from_lists([rules]);
        for req in &requests {
            assert!(engine.is_blocked(&req.page, &req.url).is_blocked(), "{req:?}");
        }
        for req in clean_requests(10) {
            assert!(!engine.is_blocked(&req.page, &req.url).is_blocked(), "{req:?}");
        }
    }

    #[test]
    fn test_sample_caps_request_count() {
        let mut rules = RuleSet::new();
        for i in 0..50 {
            rules.push(TableId::MainBlackList, RuleEntry::single(&format!("/ad{i}/")));
        }
        assert_eq!(requests_from_rules(&rules, 10).len(), 10);
        assert_eq!(requests_from_rules(&rules, 0).len(), 0);
    }
}
