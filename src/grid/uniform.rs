use std::sync::Arc;

use crate::foundation::core::{BoundingBox, Resolution};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::foundation::math::{linspace, linspace_at};
use crate::grid::mask::Mask;

/// Samples of one field over an axis-aligned box at a fixed resolution.
///
/// Sample `(i, j)` sits at `linspace(origin, extent, n)` along each axis, `i` running along the
/// first in-plane axis. Values are stored with flat index `i * resolution[1] + j`.
///
/// The optional mask is shared behind an [`Arc`] so one mask derived from the scalar field can be
/// attached to every correlated grid of a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformGrid {
    bbox: BoundingBox,
    resolution: Resolution,
    values: Vec<f64>,
    mask: Option<Arc<Mask>>,
}

/// The per-axis sample coordinates of a [`UniformGrid`].
#[derive(Clone, Debug, PartialEq)]
pub struct GridCoordinates {
    /// Sample positions along the first in-plane axis.
    pub x: Vec<f64>,
    /// Sample positions along the second in-plane axis.
    pub y: Vec<f64>,
}

impl GridCoordinates {
    /// Coordinates of `resolution` samples spread over `bbox`, corners inclusive.
    pub fn new(bbox: &BoundingBox, resolution: Resolution) -> Self {
        Self {
            x: linspace(bbox.origin[0], bbox.extent[0], resolution.0[0]),
            y: linspace(bbox.origin[1], bbox.extent[1], resolution.0[1]),
        }
    }

    /// Dense 2D coordinate arrays `(X, Y)` indexed `[i][j]` like the grid values.
    pub fn meshgrid(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let xs = self
            .x
            .iter()
            .map(|&x| vec![x; self.y.len()])
            .collect::<Vec<_>>();
        let ys = self.x.iter().map(|_| self.y.clone()).collect::<Vec<_>>();
        (xs, ys)
    }
}

impl UniformGrid {
    /// Create a grid from row-major values (`resolution[0] * resolution[1]` of them).
    pub fn new(bbox: BoundingBox, resolution: Resolution, values: Vec<f64>) -> PlanevizResult<Self> {
        bbox.validate()?;
        resolution.validate()?;
        if values.len() != resolution.cells() {
            return Err(PlanevizError::shape_mismatch(format!(
                "grid of resolution {:?} needs {} values, got {}",
                resolution.0,
                resolution.cells(),
                values.len()
            )));
        }
        Ok(Self {
            bbox,
            resolution,
            values,
            mask: None,
        })
    }

    /// Create a grid by evaluating `f(i, j, [x, y])` at each sample.
    pub fn from_fn(
        bbox: BoundingBox,
        resolution: Resolution,
        mut f: impl FnMut(usize, usize, [f64; 2]) -> f64,
    ) -> PlanevizResult<Self> {
        resolution.validate()?;
        let [nx, ny] = resolution.0;
        let mut values = Vec::with_capacity(resolution.cells());
        for i in 0..nx {
            let x = linspace_at(bbox.origin[0], bbox.extent[0], nx, i);
            for j in 0..ny {
                let y = linspace_at(bbox.origin[1], bbox.extent[1], ny, j);
                values.push(f(i, j, [x, y]));
            }
        }
        Self::new(bbox, resolution, values)
    }

    /// Create a grid from rows, `rows[i][j]` being sample `(i, j)`.
    pub fn from_rows(bbox: BoundingBox, rows: &[Vec<f64>]) -> PlanevizResult<Self> {
        let nx = rows.len();
        let ny = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != ny) {
            return Err(PlanevizError::shape_mismatch("grid rows must have equal length"));
        }
        let resolution = Resolution::new(nx, ny)?;
        Self::new(bbox, resolution, rows.concat())
    }

    /// Lower-left corner.
    pub fn origin(&self) -> [f64; 2] {
        self.bbox.origin
    }

    /// Upper-right corner.
    pub fn extent(&self) -> [f64; 2] {
        self.bbox.extent
    }

    /// Covered box.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Samples per axis.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Value array shape (`resolution` as a plain array).
    pub fn shape(&self) -> [usize; 2] {
        self.resolution.0
    }

    /// Distance between neighbouring samples along each axis (`0` for a single sample).
    pub fn spacing(&self) -> [f64; 2] {
        let size = self.bbox.size();
        let step = |n: usize, len: f64| if n > 1 { len / ((n - 1) as f64) } else { 0.0 };
        [
            step(self.resolution.0[0], size[0]),
            step(self.resolution.0[1], size[1]),
        ]
    }

    /// All values, flat index `i * resolution[1] + j`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Flat index of sample `(i, j)`.
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.resolution.0[1] + j
    }

    /// Value at sample `(i, j)`, regardless of validity.
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[self.index(i, j)]
    }

    /// Position of sample `(i, j)`.
    pub fn point(&self, i: usize, j: usize) -> [f64; 2] {
        let [nx, ny] = self.resolution.0;
        [
            linspace_at(self.bbox.origin[0], self.bbox.extent[0], nx, i),
            linspace_at(self.bbox.origin[1], self.bbox.extent[1], ny, j),
        ]
    }

    /// Attached validity mask, if any.
    pub fn mask(&self) -> Option<&Arc<Mask>> {
        self.mask.as_ref()
    }

    /// `true` unless a mask flags sample `(i, j)` invalid.
    pub fn is_valid(&self, i: usize, j: usize) -> bool {
        self.mask.as_ref().is_none_or(|m| m.is_valid(i, j))
    }

    /// `true` unless a mask flags the sample at flat index `idx` invalid.
    pub fn is_valid_flat(&self, idx: usize) -> bool {
        self.mask.as_ref().is_none_or(|m| m.cells()[idx])
    }

    /// Sample coordinates, consistent with the value placement.
    pub fn coordinates(&self) -> GridCoordinates {
        GridCoordinates::new(&self.bbox, self.resolution)
    }

    /// `true` when both grids cover the same box at the same resolution.
    pub fn same_geometry(&self, other: &UniformGrid) -> bool {
        self.bbox == other.bbox && self.resolution == other.resolution
    }

    /// Attach `mask`, intersecting with any mask already present.
    ///
    /// When the result equals `mask` the shared allocation is reused, so re-applying a mask is a
    /// no-op and every grid masked from the same source ends up holding the same mask.
    pub fn masked(mut self, mask: &Arc<Mask>) -> PlanevizResult<Self> {
        if mask.shape() != self.shape() {
            return Err(PlanevizError::shape_mismatch(format!(
                "mask shape {:?} does not match grid shape {:?}",
                mask.shape(),
                self.shape()
            )));
        }
        let combined = match self.mask.take() {
            None => Arc::clone(mask),
            Some(existing) if Arc::ptr_eq(&existing, mask) || *existing == **mask => {
                Arc::clone(mask)
            }
            Some(existing) => {
                let merged = existing.intersect(mask)?;
                if merged == **mask {
                    Arc::clone(mask)
                } else {
                    Arc::new(merged)
                }
            }
        };
        self.mask = Some(combined);
        Ok(self)
    }

    /// Replace every value with `f(value, valid)`, keeping geometry and mask.
    pub fn map_values(&self, mut f: impl FnMut(f64, bool) -> f64) -> UniformGrid {
        let values = self
            .values
            .iter()
            .enumerate()
            .map(|(idx, &v)| f(v, self.is_valid_flat(idx)))
            .collect();
        UniformGrid {
            bbox: self.bbox,
            resolution: self.resolution,
            values,
            mask: self.mask.clone(),
        }
    }

    /// Like [`UniformGrid::map_values`], with a fallible per-cell function receiving `(i, j)`.
    pub fn try_map_cells(
        &self,
        mut f: impl FnMut(usize, usize, f64, bool) -> PlanevizResult<f64>,
    ) -> PlanevizResult<UniformGrid> {
        let ny = self.resolution.0[1];
        let mut values = Vec::with_capacity(self.values.len());
        for (idx, &v) in self.values.iter().enumerate() {
            values.push(f(idx / ny, idx % ny, v, self.is_valid_flat(idx))?);
        }
        Ok(UniformGrid {
            bbox: self.bbox,
            resolution: self.resolution,
            values,
            mask: self.mask.clone(),
        })
    }

    /// Values of cells not flagged invalid.
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.is_valid_flat(*idx))
            .map(|(_, &v)| v)
    }

    /// `(min, max)` over valid, finite values.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.valid_values()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Largest magnitude over valid, finite values.
    pub fn abs_max(&self) -> Option<f64> {
        self.valid_values()
            .filter(|v| v.is_finite())
            .map(f64::abs)
            .reduce(f64::max)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/uniform.rs"]
mod tests;
