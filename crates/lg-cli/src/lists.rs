use std::fs;
use std::path::Path;
use std::time::Instant;

use lg_compiler::{compile_with_stats, decode_list, optimize_rules, CompileStats, OptimizeStats};
use lg_core::{Engine, RuleSet};

/// A filter list read from disk and compiled.
pub struct LoadedList {
    pub path: String,
    pub rules: RuleSet,
    pub stats: CompileStats,
    pub optimize: OptimizeStats,
    pub compile_ms: f64,
}

pub fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

pub fn load_list(path: &str) -> Result<LoadedList, String> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;

    let start = Instant::now();
    let text = decode_list(&bytes);
    let (mut rules, stats) = compile_with_stats(text.lines());
    let optimize = optimize_rules(&mut rules);
    let compile_ms = start.elapsed().as_secs_f64() * 1000.0;

    // Lists without a `! Title:` header are labelled by file name
    if rules.metadata.title.is_none() {
        rules.metadata.title = Some(file_name(path));
    }

    log::info!(
        "loaded {} ({} lines, {} entries, {:.1}ms)",
        path,
        stats.lines,
        rules.len(),
        compile_ms
    );

    Ok(LoadedList {
        path: path.to_string(),
        rules,
        stats,
        optimize,
        compile_ms,
    })
}

pub fn load_lists(inputs: &[String]) -> Result<Vec<LoadedList>, String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }
    inputs.iter().map(|path| load_list(path)).collect()
}

pub fn load_engine(inputs: &[String]) -> Result<Engine, String> {
    let lists = load_lists(inputs)?;
    Ok(Engine::from_lists(lists.into_iter().map(|list| list.rules)))
}
