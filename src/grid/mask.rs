use std::sync::Arc;

use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::grid::uniform::UniformGrid;

/// Per-cell validity flags over a grid (`true` = valid).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    shape: [usize; 2],
    valid: Vec<bool>,
}

impl Mask {
    /// A mask with every cell valid.
    pub fn all_valid(shape: [usize; 2]) -> Self {
        Self {
            shape,
            valid: vec![true; shape[0] * shape[1]],
        }
    }

    /// A mask from flat cells, flat index `i * shape[1] + j`.
    pub fn from_cells(shape: [usize; 2], valid: Vec<bool>) -> PlanevizResult<Self> {
        if valid.len() != shape[0] * shape[1] {
            return Err(PlanevizError::shape_mismatch(format!(
                "mask of shape {shape:?} needs {} cells, got {}",
                shape[0] * shape[1],
                valid.len()
            )));
        }
        Ok(Self { shape, valid })
    }

    /// Array shape.
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    /// Flat cells.
    pub fn cells(&self) -> &[bool] {
        &self.valid
    }

    /// Validity of cell `(i, j)`.
    pub fn is_valid(&self, i: usize, j: usize) -> bool {
        self.valid[i * self.shape[1] + j]
    }

    /// Number of valid cells.
    pub fn count_valid(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    /// Cells as rows, `rows[i][j]`.
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.valid
            .chunks(self.shape[1].max(1))
            .map(<[bool]>::to_vec)
            .collect()
    }

    /// Cellwise AND of two masks of equal shape.
    pub fn intersect(&self, other: &Mask) -> PlanevizResult<Mask> {
        if self.shape != other.shape {
            return Err(PlanevizError::shape_mismatch(format!(
                "cannot intersect masks of shape {:?} and {:?}",
                self.shape, other.shape
            )));
        }
        Ok(Mask {
            shape: self.shape,
            valid: self
                .valid
                .iter()
                .zip(&other.valid)
                .map(|(a, b)| *a && *b)
                .collect(),
        })
    }
}

/// Mask marking a cell valid iff its value is `>= threshold`.
///
/// The bound is inclusive; NaN values are never valid. A mask already attached to `grid` is not
/// consulted.
pub fn derive_mask(grid: &UniformGrid, threshold: f64) -> Mask {
    Mask {
        shape: grid.shape(),
        valid: grid.values().iter().map(|v| *v >= threshold).collect(),
    }
}

/// A copy of `grid` with the cells where `mask` is false flagged invalid.
///
/// Values are left unchanged; an existing mask on `grid` is intersected with `mask`. The input
/// grid is not modified. Fails with [`PlanevizError::ShapeMismatch`] when shapes differ.
pub fn apply_mask(grid: &UniformGrid, mask: &Arc<Mask>) -> PlanevizResult<UniformGrid> {
    grid.clone().masked(mask)
}

#[cfg(test)]
#[path = "../../tests/unit/grid/mask.rs"]
mod tests;
