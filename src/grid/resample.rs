use rayon::prelude::*;

use crate::foundation::core::{BoundingBox, Resolution};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::foundation::math::linspace;
use crate::grid::uniform::{GridCoordinates, UniformGrid};
use crate::source::snapshot::FieldSnapshot;

/// How a snapshot is evaluated between its own samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    /// Value of the closest sample of the containing patch.
    #[default]
    Nearest,
    /// Bilinear interpolation between the four surrounding samples.
    Multilinear,
}

/// Resamples snapshots onto one fixed box and resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridResampler {
    bbox: BoundingBox,
    resolution: Resolution,
    method: ResampleMethod,
}

impl GridResampler {
    /// Create a resampler for a validated box and resolution.
    pub fn new(
        bbox: BoundingBox,
        resolution: Resolution,
        method: ResampleMethod,
    ) -> PlanevizResult<Self> {
        bbox.validate()?;
        resolution.validate()?;
        Ok(Self {
            bbox,
            resolution,
            method,
        })
    }

    /// Target box.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Target resolution.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Sampling method.
    pub fn method(&self) -> ResampleMethod {
        self.method
    }

    /// Coordinates of the output samples.
    pub fn coordinates(&self) -> GridCoordinates {
        GridCoordinates::new(&self.bbox, self.resolution)
    }

    /// Evaluate `snapshot` at every output sample.
    ///
    /// Fails with [`PlanevizError::OutOfDomain`] when the box does not touch any region where
    /// the snapshot carries data. Partially covered boxes still produce a full grid; samples off the
    /// snapshot's support take its fill value and are not masked here.
    pub fn resample(&self, snapshot: &dyn FieldSnapshot) -> PlanevizResult<UniformGrid> {
        if !snapshot.overlaps(&self.bbox) {
            let covered = snapshot.covered_region();
            return Err(PlanevizError::out_of_domain(format!(
                "requested box {:?}..{:?} lies outside the data within {:?}..{:?}",
                self.bbox.origin, self.bbox.extent, covered.origin, covered.extent
            )));
        }

        let [nx, ny] = self.resolution.0;
        let xs = linspace(self.bbox.origin[0], self.bbox.extent[0], nx);
        let ys = linspace(self.bbox.origin[1], self.bbox.extent[1], ny);
        let method = self.method;

        let mut values = vec![0.0; nx * ny];
        values
            .par_chunks_mut(ny)
            .zip(xs.par_iter())
            .for_each(|(row, &x)| {
                for (v, &y) in row.iter_mut().zip(&ys) {
                    *v = snapshot.sample([x, y], method);
                }
            });

        tracing::trace!(nx, ny, ?method, "resampled snapshot");
        UniformGrid::new(self.bbox, self.resolution, values)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/resample.rs"]
mod tests;
