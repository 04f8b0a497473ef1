//! Fast URL helpers for the hot path
//!
//! These functions avoid allocations and work directly on string slices.
//! Anything that does not look like `scheme://host...` has no host.

// =============================================================================
// Scheme
// =============================================================================

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();

    let colon_pos = bytes.iter().position(|&b| b == b':')?;
    if colon_pos == 0 {
        return None;
    }

    if !bytes[..colon_pos]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    {
        return None;
    }

    if bytes.len() > colon_pos + 2 && bytes[colon_pos + 1] == b'/' && bytes[colon_pos + 2] == b'/' {
        return Some(colon_pos + 3);
    }

    // about:blank, data:, javascript: and friends carry no authority
    None
}

// =============================================================================
// Host Extraction
// =============================================================================

/// Get the start and end positions of the hostname in a URL.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Authority ends at the first path, query or fragment delimiter
    let mut authority_end = bytes.len();
    for (i, &b) in bytes[scheme_end..].iter().enumerate() {
        if b == b'/' || b == b'?' || b == b'#' {
            authority_end = scheme_end + i;
            break;
        }
    }

    // Skip userinfo
    let host_start = match bytes[scheme_end..authority_end].iter().rposition(|&b| b == b'@') {
        Some(at) => scheme_end + at + 1,
        None => scheme_end,
    };

    // Bracketed IPv6 literal; the port colon comes after `]`
    if bytes.get(host_start) == Some(&b'[') {
        let close = bytes[host_start..authority_end].iter().position(|&b| b == b']')?;
        let host_end = host_start + close + 1;
        if host_end < authority_end && bytes[host_end] != b':' {
            return None;
        }
        return Some((host_start, host_end));
    }

    let mut host_end = authority_end;
    for (i, &b) in bytes[host_start..authority_end].iter().enumerate() {
        if b == b':' {
            host_end = host_start + i;
            break;
        }
    }

    if host_end == host_start {
        return None;
    }

    Some((host_start, host_end))
}

/// Host of `url` as a slice of the original string.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    Some(&url[host_start..host_end])
}

// =============================================================================
// Domain Comparison
// =============================================================================

#[inline]
pub fn hosts_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Whether `page_domain` is `rule_domain` or one of its subdomains.
///
/// `sub.example.com` and `example.com` match `example.com`;
/// `notexample.com` does not.
#[inline]
pub fn domain_matches(page_domain: &str, rule_domain: &str) -> bool {
    let rule_domain = rule_domain.strip_prefix('.').unwrap_or(rule_domain);
    if rule_domain.is_empty() || rule_domain.len() > page_domain.len() {
        return false;
    }

    let split = page_domain.len() - rule_domain.len();
    if !page_domain.is_char_boundary(split) {
        return false;
    }

    let (head, tail) = page_domain.split_at(split);
    tail.eq_ignore_ascii_case(rule_domain) && (head.is_empty() || head.ends_with('.'))
}
