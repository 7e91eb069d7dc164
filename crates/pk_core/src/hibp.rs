//! Have I Been Pwned range lookup (k-anonymity).
//!
//! Only the first 5 hex characters of SHA-1(password) ever leave the
//! machine; the 35-character suffix is matched locally against the
//! `SUFFIX:COUNT` lines of the range response. Network failures degrade to
//! `Unknown` so an offline machine can still initialise a vault.

use sha1::{Digest, Sha1};

use crate::oracle::{BreachCheck, BreachOracle};

const RANGE_URL: &str = "https://api.pwnedpasswords.com/range/";
const USER_AGENT: &str = concat!("passkeep/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(4);

pub struct HibpClient {
    http: reqwest::blocking::Client,
}

impl HibpClient {
    pub fn new() -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { http }
    }
}

impl Default for HibpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BreachOracle for HibpClient {
    fn check(&self, password: &str) -> BreachCheck {
        let digest = Sha1::digest(password.as_bytes());
        let hash_hex = hex_upper(&digest);
        let (prefix, suffix) = hash_hex.split_at(5);

        let body = match self
            .http
            .get(format!("{RANGE_URL}{prefix}"))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
        {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "hibp range lookup failed");
                return BreachCheck::Unknown;
            }
        };

        match find_suffix(&body, suffix) {
            Some(count) => BreachCheck::Found(count),
            None => BreachCheck::Clear,
        }
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Scan `SUFFIX:COUNT` lines for a case-insensitive suffix match.
fn find_suffix(body: &str, suffix: &str) -> Option<u32> {
    for line in body.lines() {
        let line = line.trim();
        let (line_suffix, count) = match line.split_once(':') {
            Some(parts) => parts,
            None => continue,
        };
        if line_suffix.eq_ignore_ascii_case(suffix) {
            return Some(count.trim().parse().unwrap_or(0));
        }
    }
    None
}
