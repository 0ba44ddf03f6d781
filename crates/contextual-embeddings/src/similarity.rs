//! Cosine similarity over extracted keyword vectors.

use crate::error::{Error, Result};
use serde::Serialize;

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Compute cosine similarity between two vectors.
///
/// Fails with [`Error::DegenerateVector`] when either vector has zero norm;
/// `index` is 0 for the first argument, 1 for the second. A degenerate input
/// is a hard error here: silently returning 0.0 would corrupt an analysis
/// that reads the resulting matrix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let norm_a = l2_norm(a);
    if norm_a == 0.0 {
        return Err(Error::DegenerateVector { index: 0 });
    }
    let norm_b = l2_norm(b);
    if norm_b == 0.0 {
        return Err(Error::DegenerateVector { index: 1 });
    }

    Ok(dot(a, b) / (norm_a * norm_b))
}

/// Compute the full (N, N) pairwise cosine similarity matrix.
///
/// Symmetric by construction, with unit diagonal (within floating-point
/// tolerance). Fails with [`Error::DegenerateVector`] naming the first
/// zero-norm row, and with [`Error::DimensionMismatch`] if the rows disagree
/// on width.
pub fn pairwise_similarities(vectors: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
    let n = vectors.len();

    let mut norms = Vec::with_capacity(n);
    for (index, v) in vectors.iter().enumerate() {
        if v.len() != vectors[0].len() {
            return Err(Error::DimensionMismatch {
                left: vectors[0].len(),
                right: v.len(),
            });
        }
        let norm = l2_norm(v);
        if norm == 0.0 {
            return Err(Error::DegenerateVector { index });
        }
        norms.push(norm);
    }

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let sim = dot(&vectors[i], &vectors[j]) / (norms[i] * norms[j]);
            matrix[i][j] = sim;
            matrix[j][i] = sim;
        }
    }

    Ok(matrix)
}

/// One-vs-many: similarity of every vector to a single reference vector.
///
/// A zero-norm reference fails with [`Error::DegenerateReference`]; a
/// zero-norm candidate fails with [`Error::DegenerateVector`] naming its
/// index in `vectors`.
pub fn similarities_to_reference(reference: &[f32], vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    let norm_ref = l2_norm(reference);
    if norm_ref == 0.0 {
        return Err(Error::DegenerateReference);
    }

    vectors
        .iter()
        .enumerate()
        .map(|(index, v)| {
            if v.len() != reference.len() {
                return Err(Error::DimensionMismatch {
                    left: reference.len(),
                    right: v.len(),
                });
            }
            let norm = l2_norm(v);
            if norm == 0.0 {
                return Err(Error::DegenerateVector { index });
            }
            Ok(dot(reference, v) / (norm_ref * norm))
        })
        .collect()
}

/// Labeled pairwise comparison, ready to print or dump as JSON.
#[derive(Debug, Serialize)]
pub struct SimilarityReport {
    /// One label per compared vector, e.g. the source sentences.
    pub labels: Vec<String>,
    /// Pairwise cosine similarity matrix over the labeled vectors.
    pub matrix: Vec<Vec<f32>>,
    /// Similarity of each vector to a reference vector, when one was given.
    pub to_reference: Option<Vec<f32>>,
}

impl SimilarityReport {
    /// Build a report from labeled vectors and an optional reference.
    pub fn new(
        labels: Vec<String>,
        vectors: &[Vec<f32>],
        reference: Option<&[f32]>,
    ) -> Result<Self> {
        let matrix = pairwise_similarities(vectors)?;
        let to_reference = match reference {
            Some(r) => Some(similarities_to_reference(r, vectors)?),
            None => None,
        };
        Ok(Self {
            labels,
            matrix,
            to_reference,
        })
    }
}
