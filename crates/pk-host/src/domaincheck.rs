//! Host-side domain comparison used on every credential read and write.
//!
//! This is the cheap gate: resolve the runtime host's eTLD+1 via the Public
//! Suffix List and require equality with the eTLD+1 stored alongside the
//! credential. The full phishing evaluator (see `phishing`) runs on top of
//! the same primitives.

/// Normalise a host for comparison: trim whitespace and a trailing dot,
/// strip any `:port`, lowercase.
pub fn sanitize_host(host: &str) -> String {
    let mut clean = host.trim();
    clean = clean.strip_suffix('.').unwrap_or(clean);
    if let Some(colon) = clean.find(':') {
        clean = &clean[..colon];
    }
    clean.to_lowercase()
}

/// Resolve the registrable domain (eTLD+1) for a host, lowercased.
/// Hosts whose suffix is not on the Public Suffix List (IP addresses,
/// `localhost`, made-up TLDs) yield `None`.
pub fn etld_plus_one(host: &str) -> Option<String> {
    let canonical = sanitize_host(host);
    if canonical.is_empty() {
        return None;
    }
    let domain = psl::domain(canonical.as_bytes())?;
    if !domain.suffix().is_known() {
        return None;
    }
    std::str::from_utf8(domain.as_bytes())
        .ok()
        .map(|d| d.to_lowercase())
}

/// Decide whether saved credentials may be used for `host`.
///
/// The runtime host's eTLD+1 must match the stored one case-insensitively;
/// with `require_exact_host` set, the sanitized hostnames must match too.
pub fn allow_autofill(
    saved_etld1: &str,
    host: &str,
    require_exact_host: bool,
    exact_host: &str,
) -> bool {
    let host_etld1 = match etld_plus_one(host) {
        Some(d) => d,
        None => return false,
    };
    if !host_etld1.eq_ignore_ascii_case(saved_etld1) {
        return false;
    }
    if require_exact_host {
        if exact_host.is_empty() {
            return false;
        }
        if sanitize_host(host) != sanitize_host(exact_host) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_port_dot_and_case() {
        assert_eq!(sanitize_host(" Login.Example.COM. "), "login.example.com");
        assert_eq!(sanitize_host("example.com:8443"), "example.com");
        assert_eq!(sanitize_host("example.com."), "example.com");
    }

    #[test]
    fn etld_plus_one_resolves_subdomains() {
        assert_eq!(etld_plus_one("login.example.com").as_deref(), Some("example.com"));
        assert_eq!(etld_plus_one("example.com").as_deref(), Some("example.com"));
        assert_eq!(etld_plus_one("a.b.example.co.uk").as_deref(), Some("example.co.uk"));
    }

    #[test]
    fn etld_plus_one_rejects_invalid_hosts() {
        assert_eq!(etld_plus_one(""), None);
        assert_eq!(etld_plus_one("localhost"), None);
        assert_eq!(etld_plus_one("192.168.0.10"), None);
    }

    #[test]
    fn autofill_allows_same_registrable_domain() {
        assert!(allow_autofill("example.com", "login.example.com", false, ""));
        assert!(allow_autofill("Example.COM", "login.example.com", false, ""));
    }

    #[test]
    fn autofill_rejects_different_domain() {
        assert!(!allow_autofill("example.com", "evil.example.org", false, ""));
        assert!(!allow_autofill("example.com", "examp1e.com", false, ""));
    }

    #[test]
    fn exact_host_requirement() {
        assert!(allow_autofill(
            "example.com",
            "login.example.com",
            true,
            "login.example.com"
        ));
        // Port and case differences are tolerated by sanitisation.
        assert!(allow_autofill(
            "example.com",
            "Login.Example.com:443",
            true,
            "login.example.com"
        ));
        assert!(!allow_autofill(
            "example.com",
            "other.example.com",
            true,
            "login.example.com"
        ));
        // Exact matching demands a stored host to compare against.
        assert!(!allow_autofill("example.com", "login.example.com", true, ""));
    }
}
