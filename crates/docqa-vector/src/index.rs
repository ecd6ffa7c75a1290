//! Exact nearest-neighbour index over squared L2 distance.
//!
//! Vectors are stored row-major in one flat buffer; row `i` is the vector of
//! chunk `i`. The first non-empty `add` fixes the dimension.

use bincode::{Decode, Encode};

use crate::error::IndexError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position, equal to the chunk's position in the chunk list.
    pub position: usize,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
pub struct FlatL2Index {
    dim: Option<usize>,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn len(&self) -> usize {
        match self.dim {
            Some(d) if d > 0 => self.data.len() / d,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors in order. Either all are appended or none.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        let Some(first) = vectors.first() else { return Ok(()) };
        let dim = match self.dim {
            Some(d) => d,
            None if first.is_empty() => return Err(IndexError::EmptyVector),
            None => first.len(),
        };
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(IndexError::DimensionMismatch { expected: dim, found: bad.len() });
        }
        self.dim = Some(dim);
        self.data.reserve(vectors.len() * dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// The `k` nearest rows, closest first; equal distances keep insertion
    /// order. Returns every row when `k` exceeds the row count, and nothing
    /// for an empty index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        let Some(dim) = self.dim else { return Ok(Vec::new()) };
        if self.data.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != dim {
            return Err(IndexError::DimensionMismatch { expected: dim, found: query.len() });
        }
        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(dim)
            .enumerate()
            .map(|(position, row)| Neighbor { position, distance: squared_l2(row, query) })
            .collect();
        // stable sort: ties stay in insertion order
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }

    pub(crate) fn raw_parts(&self) -> (Option<usize>, &[f32]) {
        (self.dim, &self.data)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_returns_nothing() {
        let idx = FlatL2Index::new();
        assert!(idx.search(&[1.0, 2.0], 3).unwrap().is_empty());
        assert_eq!(idx.len(), 0);
    }

    #[test]
    fn search_orders_by_distance_then_position() {
        let mut idx = FlatL2Index::new();
        idx.add(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![5.0, 5.0]]).unwrap();
        let hits = idx.search(&[1.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 2, 1]);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[2].distance, 2.0);
    }

    #[test]
    fn k_larger_than_len_returns_all() {
        let mut idx = FlatL2Index::new();
        idx.add(&[vec![0.0], vec![2.0]]).unwrap();
        assert_eq!(idx.search(&[1.5], 10).unwrap().len(), 2);
    }

    #[test]
    fn dimension_is_fixed_by_first_add() {
        let mut idx = FlatL2Index::new();
        idx.add(&[vec![0.0, 0.0, 0.0]]).unwrap();
        let err = idx.add(&[vec![1.0, 1.0, 1.0], vec![1.0]]).unwrap_err();
        assert_eq!(err, IndexError::DimensionMismatch { expected: 3, found: 1 });
        assert_eq!(idx.len(), 1, "failed add appends nothing");
        assert!(matches!(idx.search(&[0.0], 1), Err(IndexError::DimensionMismatch { .. })));
    }
}
