use std::collections::HashSet;

use lg_core::types::{RuleEntry, RuleSet, TableId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
}

/// Drop repeated entries inside each table, keeping the first occurrence.
///
/// Source order of the surviving entries is preserved, so diagnostics stay
/// reproducible and no verdict changes.
pub fn optimize_rules(rules: &mut RuleSet) -> OptimizeStats {
    let before = rules.len();

    for table in TableId::ALL {
        let entries = rules.table_mut(table);
        let mut seen: HashSet<RuleEntry> = HashSet::with_capacity(entries.len());
        entries.retain(|entry| seen.insert(entry.clone()));
    }

    let after = rules.len();
    log::debug!("optimized {}: {} -> {} entries", rules.label(), before, after);

    OptimizeStats {
        before,
        after,
        deduped: before - after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile_str;

    #[test]
    fn test_removes_duplicates_within_a_table() {
        let mut rules = compile_str("||ads.test^\n/pixel.gif\nads.test\n@@ads.test\n/pixel.gif");
        let stats = optimize_rules(&mut rules);

        assert_eq!(stats.before, 5);
        assert_eq!(stats.after, 3);
        assert_eq!(stats.deduped, 2);
        assert_eq!(
            rules.main_black_list,
            vec![RuleEntry::single("ads.test"), RuleEntry::single("/pixel.gif")]
        );
        assert_eq!(rules.main_white_list, vec![RuleEntry::single("ads.test")]);
    }

    #[test]
    fn test_mixed_domain_lists_collapse_repeated_exemptions() {
        let mut rules = compile_str(
            "/s.js$third-party,domain=a.test|~b.test\n/s.js$third-party,domain=c.test|~d.test",
        );
        assert_eq!(rules.third_party_black_list.len(), 2);
        optimize_rules(&mut rules);
        assert_eq!(rules.third_party_black_list.len(), 1);
        assert_eq!(rules.third_party_domain_black_list.len(), 2);
        assert_eq!(rules.third_party_domain_white_list.len(), 2);
    }

    #[test]
    fn test_empty_rule_set_is_untouched() {
        let mut rules = RuleSet::new();
        assert_eq!(optimize_rules(&mut rules), OptimizeStats::default());
    }
}
