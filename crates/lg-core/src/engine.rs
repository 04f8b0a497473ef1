//! Multi-list engine
//!
//! Holds the active rule sets of every enabled filter list. A whitelist hit
//! in any list beats a blacklist hit in every list. Replacing a list means
//! building a new `Engine` (or swapping the `Arc`), never mutating one that
//! requests are being matched against.

use std::sync::Arc;

use crate::matcher::{find_blacklist, find_whitelist, MatchTrace, NoTrace};
use crate::types::{Decision, RequestContext, RuleSet};

/// Decision plus the label of the list that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EngineDecision {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub decision: Decision,
    pub list: Option<String>,
}

impl EngineDecision {
    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.decision.blocked
    }
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    lists: Vec<Arc<RuleSet>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lists(lists: impl IntoIterator<Item = RuleSet>) -> Self {
        Self {
            lists: lists.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn add_list(&mut self, rules: RuleSet) {
        self.lists.push(Arc::new(rules));
    }

    pub fn add_shared_list(&mut self, rules: Arc<RuleSet>) {
        self.lists.push(rules);
    }

    pub fn lists(&self) -> &[Arc<RuleSet>] {
        &self.lists
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn is_blocked(&self, page_url: &str, resource_url: &str) -> EngineDecision {
        self.is_blocked_traced(page_url, resource_url, &mut NoTrace)
    }

    pub fn is_blocked_traced(
        &self,
        page_url: &str,
        resource_url: &str,
        sink: &mut dyn MatchTrace,
    ) -> EngineDecision {
        let ctx = RequestContext::new(page_url, resource_url);

        for rules in &self.lists {
            if let Some(decision) = find_whitelist(&ctx, rules, sink) {
                return EngineDecision {
                    decision,
                    list: Some(rules.label().to_string()),
                };
            }
        }

        for rules in &self.lists {
            if let Some(decision) = find_blacklist(&ctx, rules, sink) {
                return EngineDecision {
                    decision,
                    list: Some(rules.label().to_string()),
                };
            }
        }

        EngineDecision {
            decision: Decision::allow(),
            list: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RuleEntry, TableId};

    fn list(title: &str, entries: &[(TableId, RuleEntry)]) -> RuleSet {
        let mut rules = RuleSet::new();
        rules.metadata.title = Some(title.to_string());
        for (table, entry) in entries {
            rules.push(*table, entry.clone());
        }
        rules
    }

    #[test]
    fn test_whitelist_in_later_list_beats_earlier_blacklist() {
        let engine = Engine::from_lists([
            list("EasyList", &[(TableId::MainBlackList, RuleEntry::single("/ads/"))]),
            list("Allow", &[(TableId::MainWhiteList, RuleEntry::single("/ads/ok"))]),
        ]);

        let decision = engine.is_blocked("https://a.test", "https://b.test/ads/ok.js");
        assert!(!decision.is_blocked());
        assert_eq!(decision.list.as_deref(), Some("Allow"));

        let decision = engine.is_blocked("https://a.test", "https://b.test/ads/bad.js");
        assert!(decision.is_blocked());
        assert_eq!(decision.list.as_deref(), Some("EasyList"));
    }

    #[test]
    fn test_first_blocking_list_is_reported() {
        let engine = Engine::from_lists([
            list("One", &[(TableId::MainBlackList, RuleEntry::single("track"))]),
            list("Two", &[(TableId::MainBlackList, RuleEntry::single("track"))]),
        ]);
        let decision = engine.is_blocked("https://a.test", "https://b.test/track");
        assert_eq!(decision.list.as_deref(), Some("One"));
    }

    #[test]
    fn test_empty_engine_allows() {
        let engine = Engine::new();
        assert!(engine.is_empty());
        let decision = engine.is_blocked("https://a.test", "https://b.test/x");
        assert_eq!(decision.decision, Decision::allow());
        assert_eq!(decision.list, None);
    }

    #[test]
    fn test_shared_lists_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
        assert_send_sync::<RuleSet>();
    }
}
