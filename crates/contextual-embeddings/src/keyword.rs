//! Locating a keyword in encoded batches and pulling its vectors out.

use crate::error::{Error, Result};
use candle_core::{IndexOp, Tensor};

/// Find the target id in each row of an encoded batch.
///
/// Policy: first occurrence per row, deterministically. A row that does not
/// contain the target fails with [`Error::KeywordNotFound`] naming the row,
/// rather than letting a flattened whole-batch search line up by coincidence.
pub fn locate_keyword(rows: &[Vec<u32>], target: u32) -> Result<Vec<usize>> {
    rows.iter()
        .enumerate()
        .map(|(row, ids)| {
            ids.iter()
                .position(|&id| id == target)
                .ok_or(Error::KeywordNotFound { row, id: target })
        })
        .collect()
}

/// Gather one vector per sequence from a (B, L, D) embedding tensor.
///
/// Row i of the output equals `embeddings[i, positions[i], :]`. Pure,
/// side-effect-free, O(B * D).
pub fn extract_at(embeddings: &Tensor, positions: &[usize]) -> Result<Vec<Vec<f32>>> {
    let (batch, seq_len, _hidden) = embeddings.dims3()?;
    if positions.len() != batch {
        return Err(Error::RowCountMismatch {
            rows: batch,
            positions: positions.len(),
        });
    }

    positions
        .iter()
        .enumerate()
        .map(|(row, &position)| {
            if position >= seq_len {
                return Err(Error::PositionOutOfRange {
                    row,
                    position,
                    len: seq_len,
                });
            }
            Ok(embeddings.i((row, position, ..))?.to_vec1::<f32>()?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn locator_returns_first_occurrence_per_row() {
        let rows = vec![vec![2, 9, 5, 3], vec![2, 5, 9, 9, 3]];
        assert_eq!(locate_keyword(&rows, 9).unwrap(), vec![1, 2]);
    }

    #[test]
    fn locator_fails_naming_the_row_without_the_keyword() {
        let rows = vec![vec![2, 9, 3], vec![0, 0, 0]];
        let err = locate_keyword(&rows, 9).unwrap_err();
        assert!(matches!(err, Error::KeywordNotFound { row: 1, id: 9 }));
    }

    #[test]
    fn extractor_picks_the_marked_positions() {
        // (2, 3, 2) tensor with a distinct marker at every (row, pos).
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let embeddings = Tensor::from_vec(data, (2, 3, 2), &Device::Cpu).unwrap();

        let vectors = extract_at(&embeddings, &[2, 0]).unwrap();
        assert_eq!(vectors[0], vec![4.0, 5.0]); // [0, 2, :]
        assert_eq!(vectors[1], vec![6.0, 7.0]); // [1, 0, :]
    }

    #[test]
    fn extractor_rejects_position_past_sequence_end() {
        let data: Vec<f32> = vec![0.0; 12];
        let embeddings = Tensor::from_vec(data, (2, 3, 2), &Device::Cpu).unwrap();
        let err = extract_at(&embeddings, &[0, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::PositionOutOfRange { row: 1, position: 3, len: 3 }
        ));
    }

    #[test]
    fn extractor_rejects_mismatched_position_count() {
        let data: Vec<f32> = vec![0.0; 12];
        let embeddings = Tensor::from_vec(data, (2, 3, 2), &Device::Cpu).unwrap();
        let err = extract_at(&embeddings, &[0]).unwrap_err();
        assert!(matches!(err, Error::RowCountMismatch { rows: 2, positions: 1 }));
    }
}
