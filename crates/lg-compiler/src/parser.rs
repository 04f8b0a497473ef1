//! Filter list parser
//!
//! Turns Adblock-style filter list text into the 22 tables of a [`RuleSet`].
//! Parsing never fails: lines that are cosmetic, unsupported or malformed
//! are dropped and counted.

use std::borrow::Cow;

use lg_core::types::{ListMetadata, RuleEntry, RuleSet, Segments, TableId, MAX_SEGMENTS};

/// Per-list counters collected while compiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Lines read, including blank ones
    pub lines: usize,
    pub blank: usize,
    /// `!` comments and header lines
    pub comments: usize,
    /// Element hiding rules and `[...]` headers
    pub cosmetic: usize,
    /// Network rules that could not be used
    pub dropped: usize,
    /// Network rules that produced at least one entry
    pub accepted: usize,
    /// Entries emitted; one line may emit several
    pub entries: usize,
}

/// Reason a network rule line was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("~third-party is not supported")]
    NegatedThirdParty,
    #[error("filter options are neither domain= nor third-party")]
    UnsupportedOptions,
    #[error("negated domain in a domain whitelist")]
    NegatedDomain,
    #[error("no usable domain in domain= list")]
    NoUsableDomain,
    #[error("pattern would match every URL of a scheme")]
    BareScheme,
    #[error("pattern has more than {0} wildcard segments")]
    TooManySegments(usize),
    #[error("empty pattern")]
    EmptyPattern,
    #[error("end-anchored $object rule")]
    ObjectRule,
}

enum LineKind {
    Blank,
    Comment,
    Cosmetic,
    Network(Result<usize, Rejection>),
}

// =============================================================================
// Entry points
// =============================================================================

/// Compile a sequence of filter list lines.
pub fn compile<I, S>(lines: I) -> RuleSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    compile_with_stats(lines).0
}

/// Compile a sequence of lines and report what happened to them.
pub fn compile_with_stats<I, S>(lines: I) -> (RuleSet, CompileStats)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut compiler = Compiler::default();
    for line in lines {
        compiler.feed(line.as_ref());
    }

    let stats = compiler.stats;
    log::debug!(
        "compiled {}: {} lines, {} entries, {} dropped",
        compiler.rules.label(),
        stats.lines,
        stats.entries,
        stats.dropped
    );
    (compiler.rules, stats)
}

/// Compile a whole filter list document.
pub fn compile_str(text: &str) -> RuleSet {
    compile(text.lines())
}

/// Compile raw list bytes. Invalid UTF-8 is replaced, a BOM is skipped.
pub fn compile_bytes(bytes: &[u8]) -> RuleSet {
    compile_str(&decode_list(bytes))
}

/// Decode list bytes the way [`compile_bytes`] does.
pub fn decode_list(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}

// =============================================================================
// Compiler state
// =============================================================================

#[derive(Default)]
struct Compiler {
    rules: RuleSet,
    stats: CompileStats,
}

impl Compiler {
    fn feed(&mut self, raw_line: &str) {
        self.stats.lines += 1;

        // `^` separators carry no meaning for this engine
        let line = raw_line.trim().replace('^', "");

        match self.classify(&line) {
            LineKind::Blank => self.stats.blank += 1,
            LineKind::Comment => self.stats.comments += 1,
            LineKind::Cosmetic => self.stats.cosmetic += 1,
            LineKind::Network(Ok(emitted)) => {
                self.stats.accepted += 1;
                self.stats.entries += emitted;
            }
            LineKind::Network(Err(reason)) => {
                log::trace!("dropped filter '{}': {}", raw_line.trim(), reason);
                self.stats.dropped += 1;
            }
        }
    }

    fn classify(&mut self, line: &str) -> LineKind {
        if line.is_empty() {
            return LineKind::Blank;
        }

        if is_cosmetic_line(line) {
            return LineKind::Cosmetic;
        }

        if line.starts_with('!') || line.starts_with('#') {
            capture_metadata(&mut self.rules.metadata, line);
            return LineKind::Comment;
        }

        match line.strip_prefix("@@") {
            Some(entry) => LineKind::Network(self.compile_whitelist(entry)),
            None => LineKind::Network(self.compile_blacklist(line)),
        }
    }

    fn emit(&mut self, table: TableId, entry: RuleEntry) -> usize {
        self.rules.push(table, entry);
        1
    }

    fn emit_pattern(
        &mut self,
        table: TableId,
        pattern: &str,
        max: usize,
    ) -> Result<usize, Rejection> {
        let segments = classify_segments(pattern, max)?;
        Ok(self.emit(table, RuleEntry::Pattern { segments }))
    }

    /// One entry per domain; negated (`~`) domains are skipped.
    fn emit_for_domains(
        &mut self,
        table: TableId,
        domains: &str,
        segments: &Segments,
    ) -> Result<usize, Rejection> {
        let mut emitted = 0;
        for domain in split_domains(domains) {
            if domain.starts_with('~') {
                continue;
            }
            emitted += self.emit(table, RuleEntry::domain_scoped(domain, segments.clone()));
        }
        non_empty(emitted)
    }

    fn emit_regex_for_domains(
        &mut self,
        table: TableId,
        domains: &str,
        source: &str,
    ) -> Result<usize, Rejection> {
        if source.is_empty() {
            return Err(Rejection::EmptyPattern);
        }
        let mut emitted = 0;
        for domain in split_domains(domains) {
            if domain.starts_with('~') {
                continue;
            }
            emitted += self.emit(table, RuleEntry::domain_regex(domain, source));
        }
        non_empty(emitted)
    }

    // =========================================================================
    // Whitelist (`@@`)
    // =========================================================================

    fn compile_whitelist(&mut self, entry: &str) -> Result<usize, Rejection> {
        let entry = entry.strip_prefix("||").unwrap_or(entry);
        let (base, options) = split_options(entry);

        let Some(options) = options else {
            if let Some(pattern) = entry.strip_suffix('|') {
                return self.emit_pattern(TableId::FinalWhiteList, pattern, 2);
            }
            return self.emit_pattern(TableId::MainWhiteList, entry, 3);
        };

        let options = FilterOptions::parse(options);
        if options.negated_third_party {
            return Err(Rejection::NegatedThirdParty);
        }

        if options.third_party {
            let Some(domains) = options.domains else {
                return self.emit_pattern(TableId::ThirdPartyWhiteList, base, MAX_SEGMENTS);
            };
            let (table, pattern) = match base.strip_prefix('|') {
                Some(rest) => (TableId::ThirdPartyDomainInitialWhiteList, rest),
                None => (TableId::ThirdPartyDomainWhiteList, base),
            };
            let segments = classify_segments(pattern, MAX_SEGMENTS)?;
            return self.emit_for_domains(table, domains, &segments);
        }

        let Some(domains) = options.domains else {
            return Err(Rejection::UnsupportedOptions);
        };

        if let Some(rest) = base.strip_prefix('|') {
            reject_bare_scheme(rest)?;
            let segments = classify_segments(rest, MAX_SEGMENTS)?;
            return self.emit_for_domains(TableId::DomainInitialWhiteList, domains, &segments);
        }

        if let Some(rest) = base.strip_suffix('|') {
            let segments = classify_segments(rest, MAX_SEGMENTS)?;
            return self.emit_for_domains(TableId::DomainFinalWhiteList, domains, &segments);
        }

        if split_domains(domains).any(|d| d.starts_with('~')) {
            return Err(Rejection::NegatedDomain);
        }

        let segments = classify_segments(base, 4)?;
        self.emit_for_domains(TableId::DomainWhiteList, domains, &segments)
    }

    // =========================================================================
    // Blacklist
    // =========================================================================

    fn compile_blacklist(&mut self, line: &str) -> Result<usize, Rejection> {
        let entry = line.strip_prefix("||").unwrap_or(line);

        if let Some(rest) = entry.strip_suffix('|') {
            let rest = rest.strip_prefix("||").unwrap_or(rest);
            return self.emit_pattern(TableId::FinalBlackList, rest, 2);
        }

        let (base, options_text) = split_options(entry);
        let options = options_text.map(FilterOptions::parse).unwrap_or_default();

        if options.is_scoping() {
            let base = base.strip_prefix("||").unwrap_or(base);
            if options.negated_third_party {
                return Err(Rejection::NegatedThirdParty);
            }
            if options.third_party {
                return self.compile_third_party(base, options.domains);
            }
            if let Some(domains) = options.domains {
                return self.compile_domain_blacklist(base, domains);
            }
        }

        // Any `~` in a line with options (e.g. `$~script`) exempts the pattern
        if options_text.is_some() && entry.contains('~') {
            let pattern = base.trim_end_matches('*');
            return self.emit_pattern(TableId::MainWhiteList, pattern, MAX_SEGMENTS);
        }

        if entry.contains('\\') {
            let source = regex_source(base);
            if source.is_empty() {
                return Err(Rejection::EmptyPattern);
            }
            return Ok(self.emit(TableId::RegularExpressionBlackList, RuleEntry::regex(source)));
        }

        match options_text {
            // EasyPrivacy writes some literal URLs ending in `$file`
            Some("file") => self.compile_plain_blacklist(line, entry.trim_end_matches('*'), 3),
            Some(_) => self.compile_plain_blacklist(line, base.trim_end_matches('*'), 3),
            None => {
                let pattern = entry.strip_prefix('*').unwrap_or(entry);
                let pattern = pattern.strip_suffix('*').unwrap_or(pattern);
                self.compile_plain_blacklist(line, pattern, MAX_SEGMENTS)
            }
        }
    }

    /// Unscoped blacklist leaves, routed by `|` anchors.
    fn compile_plain_blacklist(
        &mut self,
        line: &str,
        pattern: &str,
        final_max: usize,
    ) -> Result<usize, Rejection> {
        if let Some(rest) = pattern.strip_prefix('|') {
            return self.emit_pattern(TableId::InitialBlackList, rest, MAX_SEGMENTS);
        }

        if let Some(rest) = pattern.strip_suffix('|') {
            if line.contains("$object") {
                return Err(Rejection::ObjectRule);
            }
            return self.emit_pattern(TableId::FinalBlackList, rest, final_max);
        }

        self.emit_pattern(TableId::MainBlackList, pattern, MAX_SEGMENTS)
    }

    fn compile_third_party(
        &mut self,
        base: &str,
        domains: Option<&str>,
    ) -> Result<usize, Rejection> {
        let Some(domains) = domains else {
            if let Some(rest) = base.strip_prefix('|') {
                return self.emit_pattern(TableId::ThirdPartyInitialBlackList, rest, MAX_SEGMENTS);
            }
            if base.contains('\\') {
                let source = regex_source(base);
                if source.is_empty() {
                    return Err(Rejection::EmptyPattern);
                }
                return Ok(self.emit(
                    TableId::ThirdPartyRegularExpressionBlackList,
                    RuleEntry::regex(source),
                ));
            }
            return self.emit_pattern(TableId::ThirdPartyBlackList, base.trim_end_matches('*'), 4);
        };

        if let Some(rest) = base.strip_prefix('|') {
            reject_bare_scheme(rest)?;
            let segments = classify_segments(rest, MAX_SEGMENTS)?;
            return self.emit_for_domains(
                TableId::ThirdPartyDomainInitialBlackList,
                domains,
                &segments,
            );
        }

        if base.contains('\\') {
            return self.emit_regex_for_domains(
                TableId::ThirdPartyDomainRegularExpressionBlackList,
                domains,
                regex_source(base),
            );
        }

        // Mixed lists block everywhere except the `~` domains
        let segments = classify_segments(base, MAX_SEGMENTS)?;
        let mut emitted = 0;
        let mut has_exemption = false;
        for domain in split_domains(domains) {
            match domain.strip_prefix('~') {
                Some(exempt) if !exempt.is_empty() => {
                    has_exemption = true;
                    emitted += self.emit(
                        TableId::ThirdPartyDomainWhiteList,
                        RuleEntry::domain_scoped(exempt, segments.clone()),
                    );
                }
                Some(_) => {}
                None => {
                    emitted += self.emit(
                        TableId::ThirdPartyDomainBlackList,
                        RuleEntry::domain_scoped(domain, segments.clone()),
                    );
                }
            }
        }
        if has_exemption {
            emitted += self.emit(TableId::ThirdPartyBlackList, RuleEntry::Pattern { segments });
        }
        non_empty(emitted)
    }

    fn compile_domain_blacklist(&mut self, base: &str, domains: &str) -> Result<usize, Rejection> {
        // A negated domain turns the whole group into exceptions
        if domains.contains('~') {
            let segments = classify_segments(base.trim_end_matches('*'), 3)?;
            let mut emitted = 0;
            for domain in split_domains(domains) {
                let domain = domain.trim_start_matches('~');
                if domain.is_empty() {
                    continue;
                }
                emitted += self.emit(
                    TableId::DomainWhiteList,
                    RuleEntry::domain_scoped(domain, segments.clone()),
                );
            }
            return non_empty(emitted);
        }

        if base.is_empty() {
            return Err(Rejection::EmptyPattern);
        }

        if let Some(rest) = base.strip_prefix('|') {
            reject_bare_scheme(rest)?;
            let segments = classify_segments(rest, MAX_SEGMENTS)?;
            return self.emit_for_domains(TableId::DomainInitialBlackList, domains, &segments);
        }

        if let Some(rest) = base.strip_suffix('|') {
            let segments = classify_segments(rest, MAX_SEGMENTS)?;
            return self.emit_for_domains(TableId::DomainFinalBlackList, domains, &segments);
        }

        if base.contains('\\') {
            return self.emit_regex_for_domains(
                TableId::DomainRegularExpressionBlackList,
                domains,
                regex_source(base),
            );
        }

        let segments = classify_segments(base, 3)?;
        self.emit_for_domains(TableId::DomainBlackList, domains, &segments)
    }
}

// =============================================================================
// Filter options
// =============================================================================

/// The `$` options this engine understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FilterOptions<'a> {
    third_party: bool,
    negated_third_party: bool,
    domains: Option<&'a str>,
}

impl<'a> FilterOptions<'a> {
    fn parse(text: &'a str) -> Self {
        let mut options = Self::default();
        for raw in text.split(',') {
            let raw = raw.trim();
            match raw {
                "third-party" => options.third_party = true,
                "~third-party" => options.negated_third_party = true,
                _ => {
                    if let Some(value) = raw.strip_prefix("domain=") {
                        options.domains = Some(value);
                    }
                }
            }
        }
        options
    }

    fn is_scoping(&self) -> bool {
        self.third_party || self.negated_third_party || self.domains.is_some()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Split a rule into its pattern and the text after `$`.
///
/// For `/regex/$options` rules the split happens after the closing slash,
/// so a `$` inside the regex is kept. A `/regex/` with no options is
/// returned whole.
pub fn split_options(entry: &str) -> (&str, Option<&str>) {
    if entry.starts_with('/') && entry.contains('\\') {
        if let Some(pos) = entry.rfind("/$") {
            if pos > 0 {
                return (&entry[..pos + 1], Some(&entry[pos + 2..]));
            }
        }
        if entry.len() > 1 && entry.ends_with('/') {
            return (entry, None);
        }
    }

    match entry.find('$') {
        Some(pos) => (&entry[..pos], Some(&entry[pos + 1..])),
        None => (entry, None),
    }
}

/// Split a pattern on `*` into at most `max` literal segments.
///
/// Returns `None` when the pattern has more segments than allowed.
pub fn split_segments(pattern: &str, max: usize) -> Option<Segments> {
    let max = max.min(MAX_SEGMENTS);
    let parts: Vec<String> = pattern.splitn(max + 1, '*').map(str::to_string).collect();
    if parts.len() > max {
        return None;
    }
    Segments::new(parts)
}

/// Entries of a `domain=a.com|~b.com` value, in order.
pub fn split_domains(value: &str) -> impl Iterator<Item = &str> {
    value.split('|').map(str::trim).filter(|d| !d.is_empty())
}

/// Regex body with the `/.../` delimiters removed.
pub fn regex_source(pattern: &str) -> &str {
    if pattern.len() >= 2 {
        if let Some(inner) = pattern.strip_prefix('/').and_then(|p| p.strip_suffix('/')) {
            return inner;
        }
    }
    pattern
}

fn classify_segments(pattern: &str, max: usize) -> Result<Segments, Rejection> {
    if pattern.chars().all(|c| c == '*') {
        return Err(Rejection::EmptyPattern);
    }
    split_segments(pattern, max).ok_or(Rejection::TooManySegments(max))
}

fn reject_bare_scheme(pattern: &str) -> Result<(), Rejection> {
    match pattern {
        "http://" | "https://" | "http:" | "https:" => Err(Rejection::BareScheme),
        _ => Ok(()),
    }
}

fn non_empty(emitted: usize) -> Result<usize, Rejection> {
    if emitted == 0 {
        Err(Rejection::NoUsableDomain)
    } else {
        Ok(emitted)
    }
}

fn is_cosmetic_line(line: &str) -> bool {
    line.starts_with('[') || line.contains("##") || line.contains("#@#") || line.contains("#?#")
}

fn capture_metadata(metadata: &mut ListMetadata, line: &str) {
    if let Some(version) = line.strip_prefix("! Version:") {
        metadata.version.get_or_insert_with(|| version.trim().to_string());
    } else if let Some(title) = line.strip_prefix("! Title:") {
        metadata.title.get_or_insert_with(|| title.trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::is_blocked;

    fn entries(rules: &RuleSet, table: TableId) -> Vec<String> {
        rules.table(table).iter().map(|e| e.to_string()).collect()
    }

    fn only_table(rules: &RuleSet) -> Vec<TableId> {
        TableId::ALL.iter().copied().filter(|&t| !rules.table(t).is_empty()).collect()
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(split_segments("ads", 5).unwrap().as_slice(), ["ads"]);
        assert_eq!(split_segments("a*b*c", 3).unwrap().as_slice(), ["a", "b", "c"]);
        assert_eq!(split_segments("a*b*c*d*e", 5).unwrap().len(), 5);
        assert!(split_segments("a*b*c", 2).is_none());
        assert!(split_segments("a*b*c*d*e*f", 5).is_none());
        assert!(split_segments("a*b*c*d*e*f", 9).is_none());
    }

    #[test]
    fn test_split_options() {
        assert_eq!(split_options("/ads.js$domain=a.com"), ("/ads.js", Some("domain=a.com")));
        assert_eq!(split_options("ads.js"), ("ads.js", None));
        assert_eq!(
            split_options(r"/ads\d+$/$third-party"),
            (r"/ads\d+$/", Some("third-party"))
        );
        assert_eq!(split_options(r"/ads\d+\.js$/"), (r"/ads\d+\.js$/", None));
    }

    #[test]
    fn test_split_domains() {
        let domains: Vec<&str> = split_domains("a.com|~b.com||c.com").collect();
        assert_eq!(domains, ["a.com", "~b.com", "c.com"]);
    }

    #[test]
    fn test_regex_source() {
        assert_eq!(regex_source(r"/ads\d/"), r"ads\d");
        assert_eq!(regex_source(r"ads\d"), r"ads\d");
        assert_eq!(regex_source("/"), "/");
    }

    #[test]
    fn test_skips_comments_and_cosmetics() {
        let (rules, stats) = compile_with_stats([
            "[Adblock Plus 2.0]",
            "! Title: EasyList",
            "! Version: 202610190000",
            "! just a comment",
            "",
            "example.com##.ad",
            "example.com#@#.ad",
            "example.com#?#div:has(.ad)",
        ]);
        assert!(rules.is_empty());
        assert_eq!(rules.metadata.title.as_deref(), Some("EasyList"));
        assert_eq!(rules.metadata.version.as_deref(), Some("202610190000"));
        assert_eq!(stats.lines, 8);
        assert_eq!(stats.blank, 1);
        assert_eq!(stats.comments, 3);
        assert_eq!(stats.cosmetic, 4);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_host_anchor_and_separator_are_stripped() {
        let rules = compile_str("||ads.example.com^");
        assert_eq!(rules.main_black_list, vec![RuleEntry::single("ads.example.com")]);
        assert_eq!(only_table(&rules), [TableId::MainBlackList]);
    }

    #[test]
    fn test_plain_blacklist_shapes() {
        let rules = compile_str("*/ads/*banner*\n|https://ads.\n.gif|\n/a*b*c*d*e\n/a*b*c*d*e*f");
        assert_eq!(entries(&rules, TableId::MainBlackList), ["/ads/*banner", "/a*b*c*d*e"]);
        assert_eq!(entries(&rules, TableId::InitialBlackList), ["https://ads."]);
        assert_eq!(entries(&rules, TableId::FinalBlackList), [".gif"]);
    }

    #[test]
    fn test_plain_blacklist_with_ignored_options() {
        let rules = compile_str(
            "/pixel.gif$image\n|https://t.test/$script\n.swf|$object\n/count.php|$xmlhttprequest",
        );
        assert_eq!(entries(&rules, TableId::MainBlackList), ["/pixel.gif"]);
        assert_eq!(entries(&rules, TableId::InitialBlackList), ["https://t.test/"]);
        assert_eq!(entries(&rules, TableId::FinalBlackList), ["/count.php"]);
    }

    #[test]
    fn test_file_option_is_kept_literally() {
        let rules = compile_str("/track.php$file");
        assert_eq!(entries(&rules, TableId::MainBlackList), ["/track.php$file"]);
    }

    #[test]
    fn test_whitelist_shapes() {
        let rules = compile_str("@@||ads.example.com/safe.js\n@@/ok/*.js|\n@@a*b*c*d");
        assert_eq!(entries(&rules, TableId::MainWhiteList), ["ads.example.com/safe.js"]);
        assert_eq!(entries(&rules, TableId::FinalWhiteList), ["/ok/*.js"]);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_whitelist_third_party() {
        let rules = compile_str(
            "@@||cdn.test/lib.js$third-party\n\
             @@/widget.js$third-party,domain=a.test|~b.test\n\
             @@|https://api.test/$third-party,domain=c.test\n\
             @@/x.js$~third-party",
        );
        assert_eq!(entries(&rules, TableId::ThirdPartyWhiteList), ["cdn.test/lib.js"]);
        assert_eq!(entries(&rules, TableId::ThirdPartyDomainWhiteList), ["a.test: /widget.js"]);
        assert_eq!(
            entries(&rules, TableId::ThirdPartyDomainInitialWhiteList),
            ["c.test: https://api.test/"]
        );
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_whitelist_domain_scoped() {
        let rules = compile_str(
            "@@|https://cdn.test/$domain=a.test\n\
             @@|https://$domain=a.test\n\
             @@/ok.js|$domain=b.test|c.test\n\
             @@/ads/*$domain=d.test\n\
             @@/ads/$domain=e.test|~f.test\n\
             @@/ads/$image",
        );
        assert_eq!(entries(&rules, TableId::DomainInitialWhiteList), ["a.test: https://cdn.test/"]);
        assert_eq!(
            entries(&rules, TableId::DomainFinalWhiteList),
            ["b.test: /ok.js", "c.test: /ok.js"]
        );
        assert_eq!(entries(&rules, TableId::DomainWhiteList), ["d.test: /ads/*"]);
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_blacklist_third_party_variants() {
        let rules = compile_str(
            "||tracker.test^$third-party\n\
             |https://px.$third-party\n\
             /banner*ad*$third-party\n\
             /ads\\d+/$third-party\n\
             /x.js$~third-party",
        );
        assert_eq!(entries(&rules, TableId::ThirdPartyBlackList), ["tracker.test", "/banner*ad"]);
        assert_eq!(entries(&rules, TableId::ThirdPartyInitialBlackList), ["https://px."]);
        assert_eq!(entries(&rules, TableId::ThirdPartyRegularExpressionBlackList), [r"/ads\d+/"]);
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_blacklist_third_party_domain_variants() {
        let rules = compile_str(
            "/px.js$third-party,domain=a.test|b.test\n\
             |https://cdn.$third-party,domain=c.test\n\
             |https://$third-party,domain=c.test\n\
             /track\\d/$third-party,domain=d.test",
        );
        assert_eq!(
            entries(&rules, TableId::ThirdPartyDomainBlackList),
            ["a.test: /px.js", "b.test: /px.js"]
        );
        assert_eq!(
            entries(&rules, TableId::ThirdPartyDomainInitialBlackList),
            ["c.test: https://cdn."]
        );
        assert_eq!(
            entries(&rules, TableId::ThirdPartyDomainRegularExpressionBlackList),
            [r"d.test: /track\d/"]
        );
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_mixed_third_party_domain_list_exempts_tilde_domains() {
        let rules = compile_str("/social.js$third-party,domain=a.test|~b.test");
        assert_eq!(entries(&rules, TableId::ThirdPartyDomainBlackList), ["a.test: /social.js"]);
        assert_eq!(entries(&rules, TableId::ThirdPartyDomainWhiteList), ["b.test: /social.js"]);
        assert_eq!(entries(&rules, TableId::ThirdPartyBlackList), ["/social.js"]);
    }

    #[test]
    fn test_blacklist_domain_variants() {
        let rules = compile_str(
            "/tracker.js$domain=news.test\n\
             |https://ads.$domain=a.test\n\
             |http://$domain=a.test\n\
             /end.js|$domain=b.test\n\
             /ad\\d+\\.js/$domain=c.test\n\
             $websocket,domain=d.test",
        );
        assert_eq!(entries(&rules, TableId::DomainBlackList), ["news.test: /tracker.js"]);
        assert_eq!(entries(&rules, TableId::DomainInitialBlackList), ["a.test: https://ads."]);
        assert_eq!(entries(&rules, TableId::DomainFinalBlackList), ["b.test: /end.js"]);
        assert_eq!(
            entries(&rules, TableId::DomainRegularExpressionBlackList),
            [r"c.test: /ad\d+\.js/"]
        );
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_negated_domains_become_domain_exceptions() {
        let rules = compile_str("/ads.js*$domain=~a.test|b.test");
        assert_eq!(
            entries(&rules, TableId::DomainWhiteList),
            ["a.test: /ads.js", "b.test: /ads.js"]
        );
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_negated_option_becomes_main_exception() {
        let rules = compile_str("/promo.js$~script");
        assert_eq!(entries(&rules, TableId::MainWhiteList), ["/promo.js"]);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_tilde_in_pattern_with_options_is_exception() {
        let rules = compile_str("/~ads/$image
/~user/ads");
        assert_eq!(entries(&rules, TableId::MainWhiteList), ["/~ads/"]);
        assert_eq!(entries(&rules, TableId::MainBlackList), ["/~user/ads"]);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_regex_rules() {
        let rules = compile_str(r"/banner\d+\.gif/");
        assert_eq!(rules.regular_expression_black_list, vec![RuleEntry::regex(r"banner\d+\.gif")]);
    }

    #[test]
    fn test_regex_rule_with_end_anchor() {
        let rules = compile_str(r"/https://x\.test/ad\d+\.js$/");
        assert_eq!(
            rules.regular_expression_black_list,
            vec![RuleEntry::regex(r"https://x\.test/ad\d+\.js$")]
        );
        assert_eq!(rules.len(), 1);
        assert!(is_blocked("https://news.test/", "https://x.test/ad1.js", &rules).blocked);
        assert!(!is_blocked("https://news.test/", "https://x.test/ad1.js?x", &rules).blocked);
    }

    #[test]
    fn test_drops_are_counted_not_fatal() {
        let (rules, stats) = compile_with_stats([
            "@@/x.js$~third-party",
            "@@/x.js$script",
            "/x.js$third-party,domain=~a.test|",
            "*",
            "/a*b*c*d*e*f",
            "|https://$domain=a.test",
            "\u{0}\u{fffd}$$$||@@",
        ]);
        assert_eq!(stats.dropped + stats.accepted, 7);
        assert!(stats.dropped >= 5);
        assert_eq!(stats.entries, rules.len());
    }

    #[test]
    fn test_compile_bytes_handles_bom_and_invalid_utf8() {
        let mut bytes = b"\xEF\xBB\xBF! Title: Bytes\n".to_vec();
        bytes.extend_from_slice(b"/ads/\xFF\n||tracker.test^\r\n");
        let rules = compile_bytes(&bytes);
        assert_eq!(rules.metadata.title.as_deref(), Some("Bytes"));
        assert_eq!(rules.main_black_list.len(), 2);
        assert_eq!(rules.main_black_list[1], RuleEntry::single("tracker.test"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let text = "||a.test^\n@@/ok.js\n/x$domain=b.test\n/y$third-party";
        assert_eq!(compile_str(text), compile_str(text));
    }
}
