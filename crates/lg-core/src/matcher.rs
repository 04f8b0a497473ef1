//! Core Matching Engine
//!
//! Every subresource load goes through here. Tables are scanned linearly in
//! a fixed order and the first decisive entry wins: whitelist tables are all
//! consulted before any blacklist table.

use crate::types::{Anchor, Decision, RequestContext, RuleEntry, RuleSet, TableId};
use crate::url::domain_matches;

// =============================================================================
// Evaluation order
// =============================================================================

/// Whitelist phase, in evaluation order.
pub const WHITELIST_ORDER: [TableId; 8] = [
    // Unscoped
    TableId::MainWhiteList,
    TableId::FinalWhiteList,
    // Page domain known
    TableId::DomainWhiteList,
    TableId::DomainInitialWhiteList,
    TableId::DomainFinalWhiteList,
    // Third-party requests
    TableId::ThirdPartyWhiteList,
    TableId::ThirdPartyDomainWhiteList,
    TableId::ThirdPartyDomainInitialWhiteList,
];

/// Blacklist phase, in evaluation order.
pub const BLACKLIST_ORDER: [TableId; 14] = [
    TableId::MainBlackList,
    TableId::InitialBlackList,
    TableId::FinalBlackList,
    // Page domain known
    TableId::DomainBlackList,
    TableId::DomainInitialBlackList,
    TableId::DomainFinalBlackList,
    TableId::DomainRegularExpressionBlackList,
    // Third-party requests
    TableId::ThirdPartyBlackList,
    TableId::ThirdPartyInitialBlackList,
    TableId::ThirdPartyDomainBlackList,
    TableId::ThirdPartyDomainInitialBlackList,
    TableId::ThirdPartyRegularExpressionBlackList,
    TableId::ThirdPartyDomainRegularExpressionBlackList,
    // Always last
    TableId::RegularExpressionBlackList,
];

// =============================================================================
// Trace sink
// =============================================================================

/// Why a table was not consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SkipReason {
    /// The page URL has no host
    NoPageDomain,
    /// Page and resource share a host (or one is unknown)
    FirstParty,
}

/// Observer for a single evaluation. Has no effect on the verdict.
pub trait MatchTrace {
    fn table_skipped(&mut self, _table: TableId, _reason: SkipReason) {}

    fn table_checked(&mut self, _table: TableId, _entries: usize) {}

    fn matched(&mut self, _table: TableId, _entry: &RuleEntry) {}
}

/// Sink that discards everything.
pub struct NoTrace;

impl MatchTrace for NoTrace {}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "camelCase"))]
pub enum TraceEvent {
    Skipped { table: TableId, reason: SkipReason },
    Checked { table: TableId, entries: usize },
    Matched { table: TableId, entry: RuleEntry },
}

/// Sink that records every event in order.
#[derive(Debug, Default)]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchTrace for TraceLog {
    fn table_skipped(&mut self, table: TableId, reason: SkipReason) {
        self.events.push(TraceEvent::Skipped { table, reason });
    }

    fn table_checked(&mut self, table: TableId, entries: usize) {
        self.events.push(TraceEvent::Checked { table, entries });
    }

    fn matched(&mut self, table: TableId, entry: &RuleEntry) {
        self.events.push(TraceEvent::Matched {
            table,
            entry: entry.clone(),
        });
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Decide whether `resource_url`, loaded by `page_url`, is blocked.
pub fn is_blocked(page_url: &str, resource_url: &str, rules: &RuleSet) -> Decision {
    is_blocked_traced(page_url, resource_url, rules, &mut NoTrace)
}

/// [`is_blocked`] reporting each consulted table to `sink`.
pub fn is_blocked_traced(
    page_url: &str,
    resource_url: &str,
    rules: &RuleSet,
    sink: &mut dyn MatchTrace,
) -> Decision {
    let ctx = RequestContext::new(page_url, resource_url);
    match_request(&ctx, rules, sink)
}

/// Evaluate an already prepared request.
pub fn match_request(
    ctx: &RequestContext<'_>,
    rules: &RuleSet,
    sink: &mut dyn MatchTrace,
) -> Decision {
    if let Some(decision) = find_whitelist(ctx, rules, sink) {
        return decision;
    }
    find_blacklist(ctx, rules, sink).unwrap_or_default()
}

/// Whitelist phase: `Some` with an allow verdict on the first hit.
pub fn find_whitelist(
    ctx: &RequestContext<'_>,
    rules: &RuleSet,
    sink: &mut dyn MatchTrace,
) -> Option<Decision> {
    scan_tables(&WHITELIST_ORDER, ctx, rules, sink)
}

/// Blacklist phase: `Some` with a block verdict on the first hit.
pub fn find_blacklist(
    ctx: &RequestContext<'_>,
    rules: &RuleSet,
    sink: &mut dyn MatchTrace,
) -> Option<Decision> {
    scan_tables(&BLACKLIST_ORDER, ctx, rules, sink)
}

fn scan_tables(
    order: &[TableId],
    ctx: &RequestContext<'_>,
    rules: &RuleSet,
    sink: &mut dyn MatchTrace,
) -> Option<Decision> {
    for &table in order {
        if !ctx.admits(table.scope()) {
            let reason = if ctx.page_domain.is_none() {
                SkipReason::NoPageDomain
            } else {
                SkipReason::FirstParty
            };
            sink.table_skipped(table, reason);
            continue;
        }

        let entries = rules.table(table);
        sink.table_checked(table, entries.len());

        let anchor = table.anchor();
        if let Some(entry) = entries.iter().find(|entry| entry_matches(entry, anchor, ctx)) {
            log::debug!(
                "{}: {} {} by {} [{}]",
                rules.label(),
                ctx.resource_url,
                if table.is_whitelist() { "allowed" } else { "blocked" },
                table,
                entry
            );
            sink.matched(table, entry);
            return Some(Decision::matched(table, entry));
        }
    }

    None
}

// =============================================================================
// Entry matching
// =============================================================================

/// Whether one entry of a table with the given anchor fires for `ctx`.
pub fn entry_matches(entry: &RuleEntry, anchor: Anchor, ctx: &RequestContext<'_>) -> bool {
    if let Some(domain) = entry.domain() {
        match ctx.page_domain {
            Some(page_domain) if domain_matches(page_domain, domain) => {}
            _ => return false,
        }
    }

    let url = ctx.resource_url;
    let segments = match entry {
        RuleEntry::Regex { regex } | RuleEntry::DomainRegex { regex, .. } => {
            return anchor == Anchor::Regex && regex.is_full_match(url);
        }
        RuleEntry::Pattern { segments } | RuleEntry::Domain { segments, .. } => segments.as_slice(),
    };

    match anchor {
        Anchor::Contains => matches_unanchored(url, segments),
        Anchor::Initial => matches_initial(url, segments),
        Anchor::Final => matches_final(url, segments),
        Anchor::Regex => false,
    }
}

/// Every segment occurs somewhere in `url`, in any order.
#[inline]
pub fn matches_unanchored(url: &str, segments: &[String]) -> bool {
    segments.iter().all(|segment| url.contains(segment.as_str()))
}

/// First segment is a prefix of `url`; the rest occur anywhere.
#[inline]
pub fn matches_initial(url: &str, segments: &[String]) -> bool {
    match segments.split_first() {
        Some((first, rest)) => url.starts_with(first.as_str()) && matches_unanchored(url, rest),
        None => false,
    }
}

/// Last segment is a suffix of `url`; the rest occur anywhere.
#[inline]
pub fn matches_final(url: &str, segments: &[String]) -> bool {
    match segments.split_last() {
        Some((last, rest)) => url.ends_with(last.as_str()) && matches_unanchored(url, rest),
        None => false,
    }
}
