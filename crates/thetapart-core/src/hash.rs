//! Stable hashing for matrices and run reports.

use blake3::Hasher;
use serde::Serialize;

use crate::error::Result;
use crate::matrix::JoinMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    Hash256(h.finalize().into())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256> {
    let bytes = serde_json::to_vec(v)?;
    Ok(hash_bytes(&bytes))
}

/// Digest of the grid and both histograms, streamed without an intermediate
/// JSON document (matrices can be large).
pub fn hash_matrix(m: &JoinMatrix) -> Hash256 {
    let mut h = Hasher::new();
    h.update(&(m.buckets_s() as u64).to_le_bytes());
    h.update(&(m.buckets_t() as u64).to_le_bytes());
    for i in 0..m.buckets_s() {
        for v in m.row(i) {
            h.update(&v.to_le_bytes());
        }
    }
    for c in m.counts_s().iter().chain(m.counts_t()) {
        h.update(&c.to_le_bytes());
    }
    for b in m.bounds_s().iter().chain(m.bounds_t()) {
        h.update(&b.from.to_le_bytes());
        h.update(&b.to.to_le_bytes());
    }
    Hash256(h.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_digest_tracks_counts() {
        let a = JoinMatrix::with_unit_bounds(vec![vec![1, 0], vec![0, 1]], vec![1, 1], vec![1, 1])
            .unwrap();
        let b = JoinMatrix::with_unit_bounds(vec![vec![1, 0], vec![0, 1]], vec![1, 2], vec![1, 1])
            .unwrap();
        assert_eq!(hash_matrix(&a), hash_matrix(&a.clone()));
        assert_ne!(hash_matrix(&a), hash_matrix(&b));
        assert_eq!(hash_matrix(&a).to_hex().len(), 64);
    }
}
