//! Thin CSPRNG wrapper for salts, nonces, and tokens.

use rand::rngs::OsRng;
use rand::RngCore;

/// Fill a fixed-size array from the OS CSPRNG.
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    OsRng.fill_bytes(&mut out);
    out
}

/// Draw `n` random bytes from the OS CSPRNG.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    OsRng.fill_bytes(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_are_not_constant() {
        let a: [u8; 16] = random_array();
        let b: [u8; 16] = random_array();
        assert_ne!(a, b);
    }

    #[test]
    fn requested_length_is_honoured() {
        assert_eq!(random_bytes(12).len(), 12);
        assert_eq!(random_bytes(0).len(), 0);
    }
}
