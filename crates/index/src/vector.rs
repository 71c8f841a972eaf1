//! Exact nearest-neighbor search behind a narrow capability trait.

use crate::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// One search hit: distance to the query and ordinal position in the index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
  pub distance: f32,
  pub position: usize,
}

/// Minimal surface the retrieval pipeline needs from a vector index.
///
/// Positions are insertion order: the vector added at position `i` is
/// reported back as `position == i`.
pub trait VectorIndex: Send + Sync {
  fn dimension(&self) -> usize;
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Append vectors, all of which must have the index dimension
  fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()>;

  /// Up to `k` nearest vectors, ascending by distance
  fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Brute-force index over squared Euclidean distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
  dimension: usize,
  /// Row-major, `len * dimension` floats
  data: Vec<f32>,
}

impl FlatL2Index {
  pub fn new(dimension: usize) -> Self {
    Self {
      dimension,
      data: Vec::new(),
    }
  }

  /// Vector stored at `position`
  pub fn vector(&self, position: usize) -> Option<&[f32]> {
    let start = position.checked_mul(self.dimension)?;
    self.data.get(start..start + self.dimension)
  }

  /// Check the invariants of a deserialized index
  pub fn validate(&self) -> Result<()> {
    if self.dimension == 0 {
      return Err(IndexError::Corrupt("index dimension is zero".to_string()));
    }
    if self.data.len() % self.dimension != 0 {
      return Err(IndexError::Corrupt(format!(
        "{} floats do not divide into vectors of dimension {}",
        self.data.len(),
        self.dimension
      )));
    }
    Ok(())
  }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatL2Index {
  fn dimension(&self) -> usize {
    self.dimension
  }

  fn len(&self) -> usize {
    if self.dimension == 0 {
      0
    } else {
      self.data.len() / self.dimension
    }
  }

  fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
    let base = self.len();
    if let Some((offset, bad)) = vectors.iter().enumerate().find(|(_, v)| v.len() != self.dimension) {
      return Err(IndexError::DimensionMismatch {
        expected: self.dimension,
        found: bad.len(),
        position: base + offset,
      });
    }

    self.data.reserve(vectors.len() * self.dimension);
    for vector in vectors {
      self.data.extend(vector);
    }
    Ok(())
  }

  fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
    if query.len() != self.dimension {
      return Err(IndexError::DimensionMismatch {
        expected: self.dimension,
        found: query.len(),
        position: 0,
      });
    }
    if k == 0 || self.is_empty() {
      return Ok(Vec::new());
    }

    let mut neighbors: Vec<Neighbor> = self
      .data
      .chunks_exact(self.dimension)
      .enumerate()
      .map(|(position, vector)| Neighbor {
        distance: squared_l2(query, vector),
        position,
      })
      .collect();

    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
    neighbors.truncate(k);
    Ok(neighbors)
  }
}
