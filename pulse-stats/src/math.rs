//! Hashing helpers used to fingerprint record subsets for memoization.

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 14695981039346656037;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 1099511628211;

/// FNV-1a hash for deterministic cache keys.
pub fn fnv1a_hash(data: &[u8]) -> u64 {
    let mut fp = Fingerprint::new();
    fp.write(data);
    fp.finish()
}

/// Incremental FNV-1a hasher.
///
/// Unlike `std::collections::hash_map::DefaultHasher` the output is stable
/// across processes and Rust versions, so fingerprints can be logged and
/// compared between runs.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprint {
    state: u64,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    pub fn write(&mut self, data: &[u8]) {
        for &byte in data {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    pub fn write_str(&mut self, value: &str) {
        self.write(value.as_bytes());
        // Separator so ("ab", "c") and ("a", "bc") differ.
        self.write(&[0xff]);
    }

    pub fn finish(&self) -> u64 {
        self.state
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_is_deterministic() {
        let h1 = fnv1a_hash(b"region=East");
        let h2 = fnv1a_hash(b"region=East");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_inputs_produce_different_hashes() {
        let h1 = fnv1a_hash(b"region=East");
        let h2 = fnv1a_hash(b"region=West");
        assert_ne!(h1, h2);
    }

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(fnv1a_hash(b""), FNV_OFFSET);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut fp = Fingerprint::new();
        fp.write(b"order");
        fp.write(b"-42");
        assert_eq!(fp.finish(), fnv1a_hash(b"order-42"));
    }

    #[test]
    fn string_separator_prevents_concatenation_collisions() {
        let mut a = Fingerprint::new();
        a.write_str("ab");
        a.write_str("c");
        let mut b = Fingerprint::new();
        b.write_str("a");
        b.write_str("bc");
        assert_ne!(a.finish(), b.finish());
    }
}
