//! Core type definitions for ListGuard
//!
//! These types are the contract between the filter compiler (which builds a
//! [`RuleSet`]) and the matching engine (which only reads it).

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::url::{extract_host, hosts_equal};

/// Maximum number of literal segments a wildcard pattern can carry.
pub const MAX_SEGMENTS: usize = 5;

// =============================================================================
// Segments
// =============================================================================

/// Literal chunks of a pattern after splitting on `*`.
///
/// Always holds between 1 and [`MAX_SEGMENTS`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Segments(Vec<String>);

impl Segments {
    /// Build from a list of literal segments. Returns `None` for 0 or more
    /// than [`MAX_SEGMENTS`] segments.
    pub fn new(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() || segments.len() > MAX_SEGMENTS {
            return None;
        }
        Some(Self(segments))
    }

    pub fn single(pattern: &str) -> Self {
        Self(vec![pattern.to_string()])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    #[inline]
    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Segments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("*"))
    }
}

// =============================================================================
// Regular expressions
// =============================================================================

/// Error raised when a filter-list regex does not compile.
#[derive(Debug, thiserror::Error)]
#[error("Invalid regex pattern '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A regex rule. Matching is anchored to the whole URL.
#[derive(Clone)]
pub struct RegexPattern {
    source: String,
    compiled: Option<Regex>,
}

impl RegexPattern {
    /// Compile `source` for full-string matching.
    pub fn try_new(source: &str) -> Result<Self, PatternError> {
        let compiled = Regex::new(&format!("^(?:{source})$")).map_err(|e| PatternError {
            pattern: source.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: source.to_string(),
            compiled: Some(compiled),
        })
    }

    /// Compile `source`; a broken pattern is kept but never matches.
    pub fn new(source: &str) -> Self {
        match Self::try_new(source) {
            Ok(pattern) => pattern,
            Err(e) => {
                log::debug!("{e}; rule will never match");
                Self {
                    source: source.to_string(),
                    compiled: None,
                }
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_some()
    }

    #[inline]
    pub fn is_full_match(&self, url: &str) -> bool {
        self.compiled.as_ref().is_some_and(|re| re.is_match(url))
    }
}

impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexPattern")
            .field("source", &self.source)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RegexPattern {}

impl std::hash::Hash for RegexPattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RegexPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

// =============================================================================
// Rule entries
// =============================================================================

/// One compiled rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "camelCase"))]
pub enum RuleEntry {
    /// Plain wildcard pattern (Single .. Quintuple).
    Pattern { segments: Segments },
    /// Pattern that only applies when the page domain ends with `domain`.
    Domain { domain: String, segments: Segments },
    /// Regex tested against the full resource URL.
    Regex { regex: RegexPattern },
    /// Regex that only applies when the page domain ends with `domain`.
    DomainRegex { domain: String, regex: RegexPattern },
}

impl RuleEntry {
    pub fn single(pattern: &str) -> Self {
        Self::Pattern {
            segments: Segments::single(pattern),
        }
    }

    pub fn double(pre: &str, post: &str) -> Self {
        Self::from_literals(&[pre, post])
    }

    pub fn triple(a: &str, b: &str, c: &str) -> Self {
        Self::from_literals(&[a, b, c])
    }

    pub fn quadruple(a: &str, b: &str, c: &str, d: &str) -> Self {
        Self::from_literals(&[a, b, c, d])
    }

    pub fn quintuple(a: &str, b: &str, c: &str, d: &str, e: &str) -> Self {
        Self::from_literals(&[a, b, c, d, e])
    }

    pub fn domain_scoped(domain: &str, segments: Segments) -> Self {
        Self::Domain {
            domain: domain.to_string(),
            segments,
        }
    }

    pub fn regex(pattern: &str) -> Self {
        Self::Regex {
            regex: RegexPattern::new(pattern),
        }
    }

    pub fn domain_regex(domain: &str, pattern: &str) -> Self {
        Self::DomainRegex {
            domain: domain.to_string(),
            regex: RegexPattern::new(pattern),
        }
    }

    fn from_literals(parts: &[&str]) -> Self {
        Self::Pattern {
            segments: Segments(parts.iter().map(|p| p.to_string()).collect()),
        }
    }

    /// Page domain this entry is scoped to, if any.
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::Domain { domain, .. } | Self::DomainRegex { domain, .. } => Some(domain),
            Self::Pattern { .. } | Self::Regex { .. } => None,
        }
    }

    pub fn segments(&self) -> Option<&Segments> {
        match self {
            Self::Pattern { segments } | Self::Domain { segments, .. } => Some(segments),
            Self::Regex { .. } | Self::DomainRegex { .. } => None,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex { .. } | Self::DomainRegex { .. })
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { segments } => write!(f, "{segments}"),
            Self::Domain { domain, segments } => write!(f, "{domain}: {segments}"),
            Self::Regex { regex } => write!(f, "/{}/", regex.source()),
            Self::DomainRegex { domain, regex } => write!(f, "{domain}: /{}/", regex.source()),
        }
    }
}

// =============================================================================
// Table identifiers
// =============================================================================

bitflags::bitflags! {
    /// Preconditions a request must meet before a table is consulted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Scope: u8 {
        /// Page domain must be known
        const DOMAIN = 1 << 0;
        /// Request must be third-party
        const THIRD_PARTY = 1 << 1;
    }
}

/// Which part of the URL a table pins its segments to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Every segment is a substring.
    Contains,
    /// First segment must be a prefix.
    Initial,
    /// Last segment must be a suffix.
    Final,
    /// Entries are regexes matched against the whole URL.
    Regex,
}

/// Raised when parsing an unknown table name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rule table: {0}")]
pub struct UnknownTable(pub String);

/// The 22 rule tables, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum TableId {
    MainWhiteList,
    FinalWhiteList,
    DomainWhiteList,
    DomainInitialWhiteList,
    DomainFinalWhiteList,
    ThirdPartyWhiteList,
    ThirdPartyDomainWhiteList,
    ThirdPartyDomainInitialWhiteList,
    MainBlackList,
    InitialBlackList,
    FinalBlackList,
    DomainBlackList,
    DomainInitialBlackList,
    DomainFinalBlackList,
    DomainRegularExpressionBlackList,
    ThirdPartyBlackList,
    ThirdPartyInitialBlackList,
    ThirdPartyDomainBlackList,
    ThirdPartyDomainInitialBlackList,
    ThirdPartyRegularExpressionBlackList,
    ThirdPartyDomainRegularExpressionBlackList,
    RegularExpressionBlackList,
}

impl TableId {
    /// All tables in the order the matcher consults them.
    pub const ALL: [TableId; 22] = [
        TableId::MainWhiteList,
        TableId::FinalWhiteList,
        TableId::DomainWhiteList,
        TableId::DomainInitialWhiteList,
        TableId::DomainFinalWhiteList,
        TableId::ThirdPartyWhiteList,
        TableId::ThirdPartyDomainWhiteList,
        TableId::ThirdPartyDomainInitialWhiteList,
        TableId::MainBlackList,
        TableId::InitialBlackList,
        TableId::FinalBlackList,
        TableId::DomainBlackList,
        TableId::DomainInitialBlackList,
        TableId::DomainFinalBlackList,
        TableId::DomainRegularExpressionBlackList,
        TableId::ThirdPartyBlackList,
        TableId::ThirdPartyInitialBlackList,
        TableId::ThirdPartyDomainBlackList,
        TableId::ThirdPartyDomainInitialBlackList,
        TableId::ThirdPartyRegularExpressionBlackList,
        TableId::ThirdPartyDomainRegularExpressionBlackList,
        TableId::RegularExpressionBlackList,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MainWhiteList => "mainWhiteList",
            Self::FinalWhiteList => "finalWhiteList",
            Self::DomainWhiteList => "domainWhiteList",
            Self::DomainInitialWhiteList => "domainInitialWhiteList",
            Self::DomainFinalWhiteList => "domainFinalWhiteList",
            Self::ThirdPartyWhiteList => "thirdPartyWhiteList",
            Self::ThirdPartyDomainWhiteList => "thirdPartyDomainWhiteList",
            Self::ThirdPartyDomainInitialWhiteList => "thirdPartyDomainInitialWhiteList",
            Self::MainBlackList => "mainBlackList",
            Self::InitialBlackList => "initialBlackList",
            Self::FinalBlackList => "finalBlackList",
            Self::DomainBlackList => "domainBlackList",
            Self::DomainInitialBlackList => "domainInitialBlackList",
            Self::DomainFinalBlackList => "domainFinalBlackList",
            Self::DomainRegularExpressionBlackList => "domainRegularExpressionBlackList",
            Self::ThirdPartyBlackList => "thirdPartyBlackList",
            Self::ThirdPartyInitialBlackList => "thirdPartyInitialBlackList",
            Self::ThirdPartyDomainBlackList => "thirdPartyDomainBlackList",
            Self::ThirdPartyDomainInitialBlackList => "thirdPartyDomainInitialBlackList",
            Self::ThirdPartyRegularExpressionBlackList => "thirdPartyRegularExpressionBlackList",
            Self::ThirdPartyDomainRegularExpressionBlackList => {
                "thirdPartyDomainRegularExpressionBlackList"
            }
            Self::RegularExpressionBlackList => "regularExpressionBlackList",
        }
    }

    pub fn is_whitelist(self) -> bool {
        matches!(
            self,
            Self::MainWhiteList
                | Self::FinalWhiteList
                | Self::DomainWhiteList
                | Self::DomainInitialWhiteList
                | Self::DomainFinalWhiteList
                | Self::ThirdPartyWhiteList
                | Self::ThirdPartyDomainWhiteList
                | Self::ThirdPartyDomainInitialWhiteList
        )
    }

    pub fn anchor(self) -> Anchor {
        match self {
            Self::FinalWhiteList
            | Self::DomainFinalWhiteList
            | Self::FinalBlackList
            | Self::DomainFinalBlackList => Anchor::Final,
            Self::DomainInitialWhiteList
            | Self::ThirdPartyDomainInitialWhiteList
            | Self::InitialBlackList
            | Self::DomainInitialBlackList
            | Self::ThirdPartyInitialBlackList
            | Self::ThirdPartyDomainInitialBlackList => Anchor::Initial,
            Self::DomainRegularExpressionBlackList
            | Self::ThirdPartyRegularExpressionBlackList
            | Self::ThirdPartyDomainRegularExpressionBlackList
            | Self::RegularExpressionBlackList => Anchor::Regex,
            _ => Anchor::Contains,
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            Self::DomainWhiteList
            | Self::DomainInitialWhiteList
            | Self::DomainFinalWhiteList
            | Self::DomainBlackList
            | Self::DomainInitialBlackList
            | Self::DomainFinalBlackList
            | Self::DomainRegularExpressionBlackList => Scope::DOMAIN,
            Self::ThirdPartyWhiteList
            | Self::ThirdPartyBlackList
            | Self::ThirdPartyInitialBlackList
            | Self::ThirdPartyRegularExpressionBlackList => Scope::THIRD_PARTY,
            Self::ThirdPartyDomainWhiteList
            | Self::ThirdPartyDomainInitialWhiteList
            | Self::ThirdPartyDomainBlackList
            | Self::ThirdPartyDomainInitialBlackList
            | Self::ThirdPartyDomainRegularExpressionBlackList => {
                Scope::DOMAIN | Scope::THIRD_PARTY
            }
            _ => Scope::empty(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableId {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|table| table.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTable(s.to_string()))
    }
}

// =============================================================================
// Rule set
// =============================================================================

/// `! Title:` / `! Version:` header values captured from a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListMetadata {
    pub title: Option<String>,
    pub version: Option<String>,
}

/// The compiled form of one filter list. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RuleSet {
    pub metadata: ListMetadata,

    pub main_white_list: Vec<RuleEntry>,
    pub final_white_list: Vec<RuleEntry>,
    pub domain_white_list: Vec<RuleEntry>,
    pub domain_initial_white_list: Vec<RuleEntry>,
    pub domain_final_white_list: Vec<RuleEntry>,
    pub third_party_white_list: Vec<RuleEntry>,
    pub third_party_domain_white_list: Vec<RuleEntry>,
    pub third_party_domain_initial_white_list: Vec<RuleEntry>,

    pub main_black_list: Vec<RuleEntry>,
    pub initial_black_list: Vec<RuleEntry>,
    pub final_black_list: Vec<RuleEntry>,
    pub domain_black_list: Vec<RuleEntry>,
    pub domain_initial_black_list: Vec<RuleEntry>,
    pub domain_final_black_list: Vec<RuleEntry>,
    pub domain_regular_expression_black_list: Vec<RuleEntry>,
    pub third_party_black_list: Vec<RuleEntry>,
    pub third_party_initial_black_list: Vec<RuleEntry>,
    pub third_party_domain_black_list: Vec<RuleEntry>,
    pub third_party_domain_initial_black_list: Vec<RuleEntry>,
    pub third_party_regular_expression_black_list: Vec<RuleEntry>,
    pub third_party_domain_regular_expression_black_list: Vec<RuleEntry>,
    pub regular_expression_black_list: Vec<RuleEntry>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, id: TableId) -> &[RuleEntry] {
        match id {
            TableId::MainWhiteList => &self.main_white_list,
            TableId::FinalWhiteList => &self.final_white_list,
            TableId::DomainWhiteList => &self.domain_white_list,
            TableId::DomainInitialWhiteList => &self.domain_initial_white_list,
            TableId::DomainFinalWhiteList => &self.domain_final_white_list,
            TableId::ThirdPartyWhiteList => &self.third_party_white_list,
            TableId::ThirdPartyDomainWhiteList => &self.third_party_domain_white_list,
            TableId::ThirdPartyDomainInitialWhiteList => {
                &self.third_party_domain_initial_white_list
            }
            TableId::MainBlackList => &self.main_black_list,
            TableId::InitialBlackList => &self.initial_black_list,
            TableId::FinalBlackList => &self.final_black_list,
            TableId::DomainBlackList => &self.domain_black_list,
            TableId::DomainInitialBlackList => &self.domain_initial_black_list,
            TableId::DomainFinalBlackList => &self.domain_final_black_list,
            TableId::DomainRegularExpressionBlackList => &self.domain_regular_expression_black_list,
            TableId::ThirdPartyBlackList => &self.third_party_black_list,
            TableId::ThirdPartyInitialBlackList => &self.third_party_initial_black_list,
            TableId::ThirdPartyDomainBlackList => &self.third_party_domain_black_list,
            TableId::ThirdPartyDomainInitialBlackList => {
                &self.third_party_domain_initial_black_list
            }
            TableId::ThirdPartyRegularExpressionBlackList => {
                &self.third_party_regular_expression_black_list
            }
            TableId::ThirdPartyDomainRegularExpressionBlackList => {
                &self.third_party_domain_regular_expression_black_list
            }
            TableId::RegularExpressionBlackList => &self.regular_expression_black_list,
        }
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut Vec<RuleEntry> {
        match id {
            TableId::MainWhiteList => &mut self.main_white_list,
            TableId::FinalWhiteList => &mut self.final_white_list,
            TableId::DomainWhiteList => &mut self.domain_white_list,
            TableId::DomainInitialWhiteList => &mut self.domain_initial_white_list,
            TableId::DomainFinalWhiteList => &mut self.domain_final_white_list,
            TableId::ThirdPartyWhiteList => &mut self.third_party_white_list,
            TableId::ThirdPartyDomainWhiteList => &mut self.third_party_domain_white_list,
            TableId::ThirdPartyDomainInitialWhiteList => {
                &mut self.third_party_domain_initial_white_list
            }
            TableId::MainBlackList => &mut self.main_black_list,
            TableId::InitialBlackList => &mut self.initial_black_list,
            TableId::FinalBlackList => &mut self.final_black_list,
            TableId::DomainBlackList => &mut self.domain_black_list,
            TableId::DomainInitialBlackList => &mut self.domain_initial_black_list,
            TableId::DomainFinalBlackList => &mut self.domain_final_black_list,
            TableId::DomainRegularExpressionBlackList => {
                &mut self.domain_regular_expression_black_list
            }
            TableId::ThirdPartyBlackList => &mut self.third_party_black_list,
            TableId::ThirdPartyInitialBlackList => &mut self.third_party_initial_black_list,
            TableId::ThirdPartyDomainBlackList => &mut self.third_party_domain_black_list,
            TableId::ThirdPartyDomainInitialBlackList => {
                &mut self.third_party_domain_initial_black_list
            }
            TableId::ThirdPartyRegularExpressionBlackList => {
                &mut self.third_party_regular_expression_black_list
            }
            TableId::ThirdPartyDomainRegularExpressionBlackList => {
                &mut self.third_party_domain_regular_expression_black_list
            }
            TableId::RegularExpressionBlackList => &mut self.regular_expression_black_list,
        }
    }

    /// Append an entry to the end of a table.
    pub fn push(&mut self, id: TableId, entry: RuleEntry) {
        self.table_mut(id).push(entry);
    }

    /// Total number of entries across all tables.
    pub fn len(&self) -> usize {
        TableId::ALL.iter().map(|&id| self.table(id).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> Vec<(TableId, usize)> {
        TableId::ALL.iter().map(|&id| (id, self.table(id).len())).collect()
    }

    /// Label used when reporting verdicts.
    pub fn label(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or("unnamed list")
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// A request being matched, with hosts already extracted.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// URL of the page that issued the request
    pub page_url: &'a str,
    /// Full resource URL
    pub resource_url: &'a str,
    /// Page host, absent for `about:blank`, `data:` and unparseable URLs
    pub page_domain: Option<&'a str>,
    /// Resource host
    pub resource_domain: Option<&'a str>,
    /// Both hosts known and different
    pub third_party: bool,
}

impl<'a> RequestContext<'a> {
    pub fn new(page_url: &'a str, resource_url: &'a str) -> Self {
        let page_domain = extract_host(page_url);
        let resource_domain = extract_host(resource_url);
        let third_party = match (page_domain, resource_domain) {
            (Some(page), Some(resource)) => !hosts_equal(page, resource),
            _ => false,
        };

        Self {
            page_url,
            resource_url,
            page_domain,
            resource_domain,
            third_party,
        }
    }

    /// Whether a table with the given scope applies to this request.
    pub fn admits(&self, scope: Scope) -> bool {
        if scope.contains(Scope::DOMAIN) && self.page_domain.is_none() {
            return false;
        }
        if scope.contains(Scope::THIRD_PARTY) && !self.third_party {
            return false;
        }
        true
    }
}

// =============================================================================
// Decision
// =============================================================================

/// Verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Decision {
    pub blocked: bool,
    /// Table whose entry decided the verdict
    pub matched_table: Option<TableId>,
    /// Entry that decided the verdict
    pub matched_entry: Option<RuleEntry>,
}

impl Decision {
    /// No rule matched.
    pub fn allow() -> Self {
        Self {
            blocked: false,
            matched_table: None,
            matched_entry: None,
        }
    }

    pub fn matched(table: TableId, entry: &RuleEntry) -> Self {
        Self {
            blocked: !table.is_whitelist(),
            matched_table: Some(table),
            matched_entry: Some(entry.clone()),
        }
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::allow()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.blocked { "blocked" } else { "allowed" };
        match (&self.matched_table, &self.matched_entry) {
            (Some(table), Some(entry)) => write!(f, "{verdict} by {table} [{entry}]"),
            _ => f.write_str("no rule matched"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_bounds() {
        assert!(Segments::new(Vec::new()).is_none());
        assert!(Segments::new(vec!["a".into(); 6]).is_none());
        let segments = Segments::new(vec!["ads/".into(), "banner.js".into()]).unwrap();
        assert_eq!(segments.first(), "ads/");
        assert_eq!(segments.last(), "banner.js");
        assert_eq!(segments.to_string(), "ads/*banner.js");
    }

    #[test]
    fn test_table_names_round_trip() {
        for table in TableId::ALL {
            assert_eq!(table.name().parse::<TableId>(), Ok(table));
        }
        assert_eq!(
            "nopeList".parse::<TableId>(),
            Err(UnknownTable("nopeList".to_string()))
        );
    }

    #[test]
    fn test_table_partition() {
        let white = TableId::ALL.iter().filter(|t| t.is_whitelist()).count();
        assert_eq!(white, 8);
        assert_eq!(TableId::ALL.len() - white, 14);
        assert_eq!(TableId::ThirdPartyDomainWhiteList.scope(), Scope::DOMAIN | Scope::THIRD_PARTY);
        assert_eq!(TableId::RegularExpressionBlackList.scope(), Scope::empty());
        assert_eq!(TableId::DomainFinalWhiteList.anchor(), Anchor::Final);
    }

    #[test]
    fn test_regex_pattern_is_anchored() {
        let pattern = RegexPattern::new(r"https://ads\.test/.*");
        assert!(pattern.is_full_match("https://ads.test/x"));
        assert!(!pattern.is_full_match("https://notads.test/https://ads.test/x"));
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        assert!(RegexPattern::try_new("ads(").is_err());
        let pattern = RegexPattern::new("ads(");
        assert!(!pattern.is_valid());
        assert!(!pattern.is_full_match("ads("));
    }

    #[test]
    fn test_request_context_third_party() {
        let ctx = RequestContext::new("https://news.test/a", "https://tracker.test/p");
        assert!(ctx.third_party);
        assert!(ctx.admits(Scope::DOMAIN | Scope::THIRD_PARTY));

        let ctx = RequestContext::new("https://News.test/a", "https://news.test/p");
        assert!(!ctx.third_party);

        let ctx = RequestContext::new("about:blank", "https://tracker.test/p");
        assert_eq!(ctx.page_domain, None);
        assert!(!ctx.third_party);
        assert!(!ctx.admits(Scope::DOMAIN));
        assert!(ctx.admits(Scope::empty()));
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(Decision::allow().to_string(), "no rule matched");
        let entry = RuleEntry::single("ads.example.com");
        let decision = Decision::matched(TableId::MainBlackList, &entry);
        assert!(decision.is_blocked());
        assert_eq!(decision.to_string(), "blocked by mainBlackList [ads.example.com]");
        let decision = Decision::matched(
            TableId::DomainWhiteList,
            &RuleEntry::domain_scoped("news.test", Segments::single("/ok.js")),
        );
        assert!(!decision.is_blocked());
        assert_eq!(decision.to_string(), "allowed by domainWhiteList [news.test: /ok.js]");
    }
}
