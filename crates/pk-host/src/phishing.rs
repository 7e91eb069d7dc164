//! Full phishing evaluation for a page URL against stored site metadata.
//!
//! The browser extension runs its own copy of this policy, but the verdict
//! computed here is the authoritative one: the host never trusts a
//! client-side result. Reason codes accumulate; a URL is OK only when no
//! reason fired. (The `IFRAME` reason is appended by the browser-side
//! caller, which is the only party that knows the frame context.)

use std::collections::HashSet;

use serde::Serialize;
use unicode_script::{Script, UnicodeScript};

use crate::confusables;

pub const REASON_URL_PARSE_ERROR: &str = "URL_PARSE_ERROR";
pub const REASON_HTTP: &str = "HTTP";
pub const REASON_ETLD_INVALID: &str = "ETLD_INVALID";
pub const REASON_ETLD_MISMATCH: &str = "ETLD_MISMATCH";
pub const REASON_HOST_MISMATCH: &str = "HOST_MISMATCH";
pub const REASON_PUNYCODE: &str = "PUNYCODE";
pub const REASON_MIXED_SCRIPT: &str = "MIXED_SCRIPT";
pub const REASON_CONFUSABLE: &str = "CONFUSABLE";

#[derive(Debug, Serialize)]
pub struct Verdict {
    pub ok: bool,
    pub reasons: Vec<&'static str>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub etld1: String,
}

/// Evaluate a URL for phishing indicators.
///
/// `saved_etld1` and `exact_host` are the values stored with the credential
/// the page is asking about; either may be empty when nothing is stored.
pub fn evaluate(raw_url: &str, saved_etld1: &str, exact_host: &str) -> Verdict {
    let mut reasons: Vec<&'static str> = Vec::new();

    let parsed = match url::Url::parse(raw_url) {
        Ok(u) => u,
        Err(_) => return parse_failure(),
    };
    let host = match parsed.host_str() {
        Some(h) if !h.is_empty() => h.to_lowercase(),
        _ => return parse_failure(),
    };

    if parsed.scheme() != "https" {
        reasons.push(REASON_HTTP);
    }

    // Canonical ASCII and Unicode forms of the hostname.
    let ascii_host = match idna::domain_to_ascii(&host) {
        Ok(converted) if !converted.is_empty() => converted,
        _ => host.clone(),
    };
    let unicode_host = {
        let (converted, result) = idna::domain_to_unicode(&host);
        if result.is_ok() && !converted.is_empty() {
            converted
        } else {
            host.clone()
        }
    };

    // Registrable domain: prefer the ASCII form, fall back to Unicode.
    let etld1 = crate::domaincheck::etld_plus_one(&ascii_host)
        .or_else(|| crate::domaincheck::etld_plus_one(&unicode_host))
        .unwrap_or_default();
    if etld1.is_empty() {
        reasons.push(REASON_ETLD_INVALID);
    }

    let saved = saved_etld1.trim().to_lowercase();
    if !saved.is_empty() && !etld1.is_empty() && !saved.eq_ignore_ascii_case(&etld1) {
        reasons.push(REASON_ETLD_MISMATCH);
    }

    let exact = exact_host.trim();
    if !exact.is_empty() && !exact.eq_ignore_ascii_case(&host) {
        reasons.push(REASON_HOST_MISMATCH);
    }

    if ascii_host.contains("xn--") {
        reasons.push(REASON_PUNYCODE);
    }

    if has_mixed_script(&unicode_host) {
        reasons.push(REASON_MIXED_SCRIPT);
    }

    // Compare the saved domain against both forms of the runtime domain;
    // the homograph only surfaces in the Unicode form.
    if !saved.is_empty() && !etld1.is_empty() {
        let unicode_etld1 = crate::domaincheck::etld_plus_one(&unicode_host).unwrap_or_default();
        if confusables::looks_confusable(&saved, &etld1)
            || confusables::looks_confusable(&saved, &unicode_etld1)
        {
            reasons.push(REASON_CONFUSABLE);
        }
    }

    Verdict {
        ok: reasons.is_empty(),
        reasons,
        etld1,
    }
}

fn parse_failure() -> Verdict {
    Verdict {
        ok: false,
        reasons: vec![REASON_URL_PARSE_ERROR],
        etld1: String::new(),
    }
}

/// True when labels of the host mix two or more of the detected scripts.
fn has_mixed_script(host: &str) -> bool {
    let mut seen: HashSet<&'static str> = HashSet::new();
    for label in host.split('.') {
        for c in label.chars() {
            let script = match c.script() {
                Script::Latin => "latin",
                Script::Cyrillic => "cyrillic",
                Script::Greek => "greek",
                Script::Hiragana => "hiragana",
                Script::Katakana => "katakana",
                Script::Han => "han",
                _ => continue,
            };
            seen.insert(script);
            if seen.len() >= 2 {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reasons(v: &Verdict) -> HashSet<&'static str> {
        v.reasons.iter().copied().collect()
    }

    #[test]
    fn clean_https_url_passes() {
        let v = evaluate("https://login.example.com/signin", "example.com", "");
        assert!(v.ok, "unexpected reasons: {:?}", v.reasons);
        assert_eq!(v.etld1, "example.com");
    }

    #[test]
    fn unparsable_url() {
        let v = evaluate("not a url", "", "");
        assert!(!v.ok);
        assert_eq!(v.reasons, vec![REASON_URL_PARSE_ERROR]);
    }

    #[test]
    fn plain_http_flagged() {
        let v = evaluate("http://login.example.com/", "example.com", "");
        assert!(!v.ok);
        assert_eq!(reasons(&v), HashSet::from([REASON_HTTP]));
    }

    #[test]
    fn ip_address_has_no_registrable_domain() {
        let v = evaluate("https://192.168.0.10/login", "", "");
        assert!(!v.ok);
        assert!(reasons(&v).contains(REASON_ETLD_INVALID));
    }

    #[test]
    fn etld_mismatch_flagged() {
        let v = evaluate("https://login.evil.org/", "example.com", "");
        assert!(!v.ok);
        assert_eq!(reasons(&v), HashSet::from([REASON_ETLD_MISMATCH]));
    }

    #[test]
    fn exact_host_mismatch_flagged() {
        let v = evaluate(
            "https://other.example.com/",
            "example.com",
            "login.example.com",
        );
        assert!(!v.ok);
        assert_eq!(reasons(&v), HashSet::from([REASON_HOST_MISMATCH]));
    }

    #[test]
    fn saved_etld1_comparison_is_case_insensitive() {
        let v = evaluate("https://login.example.com/", "Example.COM", "");
        assert!(v.ok, "unexpected reasons: {:?}", v.reasons);
    }

    // The classic apple.com homograph: xn--pple-43d decodes to a host whose
    // first letter is a Cyrillic а.
    #[test]
    fn punycode_homograph_attack_detected() {
        let v = evaluate("https://www.xn--pple-43d.com/login", "apple.com", "");
        assert!(!v.ok);
        let r = reasons(&v);
        assert!(r.contains(REASON_PUNYCODE), "reasons: {r:?}");
        assert!(
            r.contains(REASON_CONFUSABLE) || r.contains(REASON_MIXED_SCRIPT),
            "reasons: {r:?}"
        );
        assert_eq!(v.etld1, "xn--pple-43d.com");
    }

    #[test]
    fn mixed_script_detected_across_labels() {
        // "раypal" with Cyrillic р and а in an otherwise Latin host.
        let v = evaluate("https://www.раypal.com/", "", "");
        assert!(!v.ok);
        assert!(reasons(&v).contains(REASON_MIXED_SCRIPT));
    }

    #[test]
    fn single_script_idn_is_not_mixed() {
        assert!(!has_mixed_script("пример.рф"));
        assert!(!has_mixed_script("example.com"));
        assert!(has_mixed_script("аpple.com"));
    }

    #[test]
    fn ok_iff_reasons_empty() {
        for (url, saved) in [
            ("https://login.example.com/", "example.com"),
            ("http://login.example.com/", "example.com"),
            ("https://www.xn--pple-43d.com/", "apple.com"),
        ] {
            let v = evaluate(url, saved, "");
            assert_eq!(v.ok, v.reasons.is_empty());
        }
    }
}
