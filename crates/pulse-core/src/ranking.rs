//! Similarity ranking over embedding vectors.
//!
//! Pure functions: no state, no I/O. The same inputs always produce the
//! same scores in the same order.

use std::num::NonZeroUsize;

use serde::Serialize;

use crate::error::DomainError;

/// A candidate key with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<K> {
    pub key: K,
    pub score: f64,
}

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// If either vector has a norm of exactly zero the result is `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, DomainError> {
    if a.len() != b.len() {
        return Err(DomainError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Score every candidate against `query` and return the best `limit`.
///
/// With `min_score` set, candidates scoring `<= min_score` are dropped.
/// Ordering is by descending score; equal scores keep their input order.
pub fn rank<K, V>(
    query: &[f32],
    candidates: impl IntoIterator<Item = (K, V)>,
    limit: NonZeroUsize,
    min_score: Option<f64>,
) -> Result<Vec<Ranked<K>>, DomainError>
where
    V: AsRef<[f32]>,
{
    let mut scored = Vec::new();
    for (key, vector) in candidates {
        let score = cosine_similarity(query, vector.as_ref())?;
        if min_score.is_some_and(|min| score <= min) {
            continue;
        }
        scored.push(Ranked { key, score });
    }

    // sort_by is stable, which gives the input-order tie-break.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit.get());
    Ok(scored)
}
