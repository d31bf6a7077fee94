use std::fmt::Debug;
/**
 * rust-kad
 * Address-space identifier definitions
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use std::hash::Hash;

use num::bigint::BigUint;

/// Id trait must be implemented for points in the Kademlia address space.
///
/// Bits are numbered from the most significant bit of the first byte, so the
/// common prefix of two ids is the run of leading bits they share.
pub trait DatabaseId: Hash + Default + PartialEq + Eq + Ord + Clone + Send + Debug {
    /// Exclusive or two IDs to calculate distance.
    /// The result has the length of `a`, bytes of `a` beyond the end of `b` are kept as-is.
    fn xor(a: &Self, b: &Self) -> Self;

    /// Count number of bits required to express a given ID
    fn bits(&self) -> usize;

    /// Bit length of the ID type
    fn max_bits(&self) -> usize;

    /// Number of leading bits shared by two IDs
    fn common_prefix_len(a: &Self, b: &Self) -> usize {
        let d = Self::xor(a, b);
        d.max_bits() - d.bits()
    }
}

/// DatabaseId implementation for arbitrary types around &[u8]
impl<T> DatabaseId for T
where
    T: AsRef<[u8]>
        + AsMut<[u8]>
        + Hash
        + Default
        + PartialEq
        + Eq
        + Ord
        + Clone
        + Sync
        + Send
        + Debug,
{
    fn xor(a: &T, b: &T) -> Self {
        let mut c = a.clone();

        for (c, b) in c.as_mut().iter_mut().zip(b.as_ref()) {
            *c ^= b;
        }

        c
    }

    fn bits(&self) -> usize {
        let a = BigUint::from_bytes_be(self.as_ref());
        a.bits() as usize
    }

    fn max_bits(&self) -> usize {
        self.as_ref().len() * 8
    }
}
