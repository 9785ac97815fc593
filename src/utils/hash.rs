//! Fast, non-cryptographic hashing for short names and paths.

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// A `HashMap` using a fast, non-cryptographic hash algorithm.
pub type FastHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;
/// A `HashSet` using a fast, non-cryptographic hash algorithm.
pub type FastHashSet<K> = HashSet<K, BuildHasherDefault<FxHasher>>;

/// Hashes an arbitrary value with `FxHasher`.
pub fn hash64<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut state = FxHasher::default();
    v.hash(&mut state);
    state.finish()
}

const SEED: u64 = 0x51_7c_c1_b7_27_22_0a_95;

/// The fowler-noll-vo flavoured hasher used in rustc. It performs much
/// better than the default `SipHasher` on short keys like the uniform and
/// parameter names we deal with, at the cost of collision resistance we do
/// not need.
#[derive(Debug, Default)]
pub struct FxHasher {
    hash: u64,
}

impl FxHasher {
    #[inline]
    fn add(&mut self, word: u64) {
        self.hash = (self.hash.rotate_left(5) ^ word).wrapping_mul(SEED);
    }
}

impl Hasher for FxHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.add(u64::from(*byte));
        }
    }

    #[inline]
    fn write_u64(&mut self, v: u64) {
        self.add(v);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }
}
