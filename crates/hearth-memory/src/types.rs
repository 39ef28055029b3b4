// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search candidates and vector helpers.

/// A transient search hit produced by one index, before fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Message row id, or `None` for a memory chunk.
    pub row_id: Option<i64>,
    pub content: String,
    /// Message role, or the chunk's source label.
    pub source: String,
    pub created_at: String,
    /// Cosine distance (`1 - similarity`) when produced by vector search.
    pub distance: Option<f64>,
}

/// Encode an f32 vector as a little-endian BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode a little-endian BLOB into an f32 vector. Trailing partial bytes are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity; `None` when lengths differ or either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return None;
    }
    Some(dot / (na.sqrt() * nb.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_round_trip_preserves_values() {
        let original = vec![0.1_f32, -0.5, 1.0, 3.25];
        assert_eq!(blob_to_vec(&vec_to_blob(&original)), original);
    }

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = [0.3_f32, 0.4, 0.5];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-9);
    }

    #[test]
    fn mismatched_or_zero_vectors_have_no_similarity() {
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_none());
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_none());
    }
}
