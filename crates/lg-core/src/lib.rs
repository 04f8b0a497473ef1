//! ListGuard Core Library
//!
//! This crate provides the rule tables and the request matching engine for
//! the ListGuard content blocker.
//!
//! # Architecture
//!
//! A filter list is compiled (by `lg-compiler`) into a [`RuleSet`]: 22
//! ordered tables of [`RuleEntry`] values, split by whitelist/blacklist,
//! anchoring and scoping. The matcher walks those tables in a fixed order
//! for each `(page URL, resource URL)` pair and returns the first decisive
//! verdict. A `RuleSet` is never mutated after construction, so it can be
//! shared across threads without locking.
//!
//! # Modules
//!
//! - `types`: rule entries, table identifiers, rule sets and decisions
//! - `url`: allocation-free host extraction and domain suffix tests
//! - `matcher`: table evaluation and entry matching
//! - `engine`: several lists evaluated together

pub mod engine;
pub mod matcher;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use engine::{Engine, EngineDecision};
pub use matcher::{is_blocked, is_blocked_traced, MatchTrace, NoTrace, TraceEvent, TraceLog};
pub use types::{
    Decision, ListMetadata, RegexPattern, RequestContext, RuleEntry, RuleSet, Segments, TableId,
};
