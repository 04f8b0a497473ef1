//! ListGuard Filter List Compiler
//!
//! This crate compiles Adblock-style filter lists into the rule tables of
//! an `lg_core::RuleSet`.

pub mod optimizer;
pub mod parser;

pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{
    compile, compile_bytes, compile_str, compile_with_stats, decode_list, split_domains,
    split_segments, CompileStats, Rejection,
};
