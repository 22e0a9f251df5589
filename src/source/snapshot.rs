use crate::foundation::core::{BoundingBox, Resolution};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::grid::resample::{GridResampler, ResampleMethod};
use crate::grid::uniform::UniformGrid;

/// One field at one iteration on one plane, in whatever representation the source stores.
///
/// Implementations must be pure: sampling the same point twice returns the same bits.
pub trait FieldSnapshot: Send + Sync {
    /// Smallest box enclosing every region where the snapshot carries data.
    fn covered_region(&self) -> BoundingBox;

    /// `true` when `bbox` touches a region that actually carries data.
    fn overlaps(&self, bbox: &BoundingBox) -> bool {
        self.covered_region().intersects(bbox)
    }

    /// Value at `point`; points outside every component return the snapshot's fill value.
    fn sample(&self, point: [f64; 2], method: ResampleMethod) -> f64;

    /// Simulation time of the snapshot.
    fn time(&self) -> f64;

    /// Resample onto a uniform grid over `bbox`.
    fn to_uniform_grid(
        &self,
        bbox: BoundingBox,
        resolution: Resolution,
        method: ResampleMethod,
    ) -> PlanevizResult<UniformGrid>
    where
        Self: Sized,
    {
        GridResampler::new(bbox, resolution, method)?.resample(self)
    }
}

/// A single rectangular block of evenly spaced samples.
///
/// Sample `(i, j)` sits at `origin + (i, j) * spacing`; values use flat index `i * shape[1] + j`.
/// A patch claims the region within half a spacing of its outermost samples.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UniformPatch {
    /// Position of sample `(0, 0)`.
    pub origin: [f64; 2],
    /// Distance between samples along each axis.
    pub spacing: [f64; 2],
    /// Samples per axis.
    pub shape: [usize; 2],
    /// Flat sample values.
    pub values: Vec<f64>,
}

impl UniformPatch {
    /// Create a validated patch.
    pub fn new(
        origin: [f64; 2],
        spacing: [f64; 2],
        shape: [usize; 2],
        values: Vec<f64>,
    ) -> PlanevizResult<Self> {
        let patch = Self {
            origin,
            spacing,
            shape,
            values,
        };
        patch.validate()?;
        Ok(patch)
    }

    /// Create a patch by evaluating `f([x, y])` at each sample.
    pub fn from_fn(
        origin: [f64; 2],
        spacing: [f64; 2],
        shape: [usize; 2],
        mut f: impl FnMut([f64; 2]) -> f64,
    ) -> PlanevizResult<Self> {
        let mut values = Vec::with_capacity(shape[0] * shape[1]);
        for i in 0..shape[0] {
            for j in 0..shape[1] {
                values.push(f([
                    origin[0] + i as f64 * spacing[0],
                    origin[1] + j as f64 * spacing[1],
                ]));
            }
        }
        Self::new(origin, spacing, shape, values)
    }

    /// Check the patch invariants.
    pub fn validate(&self) -> PlanevizResult<()> {
        if self.shape[0] == 0 || self.shape[1] == 0 {
            return Err(PlanevizError::validation(format!(
                "patch shape must be non-empty, got {:?}",
                self.shape
            )));
        }
        if self.values.len() != self.shape[0] * self.shape[1] {
            return Err(PlanevizError::shape_mismatch(format!(
                "patch of shape {:?} needs {} values, got {}",
                self.shape,
                self.shape[0] * self.shape[1],
                self.values.len()
            )));
        }
        if !self.origin.iter().all(|v| v.is_finite()) {
            return Err(PlanevizError::validation("patch origin must be finite"));
        }
        if !self.spacing.iter().all(|d| d.is_finite() && *d > 0.0) {
            return Err(PlanevizError::validation(format!(
                "patch spacing must be finite and positive, got {:?}",
                self.spacing
            )));
        }
        Ok(())
    }

    /// Value of sample `(i, j)`.
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.shape[1] + j]
    }

    /// Region claimed by the patch.
    pub fn bounds(&self) -> BoundingBox {
        let half = [0.5 * self.spacing[0], 0.5 * self.spacing[1]];
        BoundingBox {
            origin: [self.origin[0] - half[0], self.origin[1] - half[1]],
            extent: [
                self.origin[0] + (self.shape[0] - 1) as f64 * self.spacing[0] + half[0],
                self.origin[1] + (self.shape[1] - 1) as f64 * self.spacing[1] + half[1],
            ],
        }
    }

    /// `true` when `p` lies in the region claimed by the patch.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        self.bounds().contains(p)
    }

    /// Value at `p`, clamping to the outermost samples.
    pub fn evaluate(&self, p: [f64; 2], method: ResampleMethod) -> f64 {
        let fx = (p[0] - self.origin[0]) / self.spacing[0];
        let fy = (p[1] - self.origin[1]) / self.spacing[1];
        match method {
            ResampleMethod::Nearest => {
                let i = nearest_index(fx, self.shape[0]);
                let j = nearest_index(fy, self.shape[1]);
                self.value(i, j)
            }
            ResampleMethod::Multilinear => {
                let (i0, i1, tx) = bracket(fx, self.shape[0]);
                let (j0, j1, ty) = bracket(fy, self.shape[1]);
                let v00 = self.value(i0, j0);
                let v10 = self.value(i1, j0);
                let v01 = self.value(i0, j1);
                let v11 = self.value(i1, j1);
                let lower = v00 + (v10 - v00) * tx;
                let upper = v01 + (v11 - v01) * tx;
                lower + (upper - lower) * ty
            }
        }
    }
}

fn nearest_index(f: f64, n: usize) -> usize {
    let max = (n - 1) as f64;
    f.round().clamp(0.0, max) as usize
}

fn bracket(f: f64, n: usize) -> (usize, usize, f64) {
    if n == 1 {
        return (0, 0, 0.0);
    }
    let max = (n - 1) as f64;
    let f = f.clamp(0.0, max);
    let lo = (f.floor() as usize).min(n - 2);
    (lo, lo + 1, f - lo as f64)
}

/// Snapshot stored as one uniform patch.
#[derive(Clone, Debug, PartialEq)]
pub struct SingleResolutionSnapshot {
    patch: UniformPatch,
    time: f64,
    fill_value: f64,
}

impl SingleResolutionSnapshot {
    /// Wrap a patch; points outside it resample to `fill_value`.
    pub fn new(patch: UniformPatch, time: f64, fill_value: f64) -> PlanevizResult<Self> {
        patch.validate()?;
        Ok(Self {
            patch,
            time,
            fill_value,
        })
    }
}

impl FieldSnapshot for SingleResolutionSnapshot {
    fn covered_region(&self) -> BoundingBox {
        self.patch.bounds()
    }

    fn sample(&self, point: [f64; 2], method: ResampleMethod) -> f64 {
        if self.patch.contains(point) {
            self.patch.evaluate(point, method)
        } else {
            self.fill_value
        }
    }

    fn time(&self) -> f64 {
        self.time
    }
}

/// Patches sharing one refinement level.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RefinementLevel {
    /// Components of the level; earlier patches win where they overlap.
    pub patches: Vec<UniformPatch>,
}

/// Snapshot stored as nested refinement levels, coarsest first.
///
/// A point takes its value from the finest level with a patch containing it.
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchicalSnapshot {
    levels: Vec<RefinementLevel>,
    covered: BoundingBox,
    time: f64,
    fill_value: f64,
}

impl HierarchicalSnapshot {
    /// Create a snapshot from levels ordered coarse to fine.
    pub fn new(levels: Vec<RefinementLevel>, time: f64, fill_value: f64) -> PlanevizResult<Self> {
        let mut covered: Option<BoundingBox> = None;
        for patch in levels.iter().flat_map(|l| &l.patches) {
            patch.validate()?;
            let b = patch.bounds();
            covered = Some(covered.map_or(b, |c| c.union(&b)));
        }
        let covered = covered.ok_or_else(|| {
            PlanevizError::validation("hierarchical snapshot needs at least one patch")
        })?;
        Ok(Self {
            levels,
            covered,
            time,
            fill_value,
        })
    }

    /// Refinement levels, coarsest first.
    pub fn levels(&self) -> &[RefinementLevel] {
        &self.levels
    }

    /// Finest patch containing `point`, with its level number.
    pub fn finest_patch_at(&self, point: [f64; 2]) -> Option<(usize, &UniformPatch)> {
        self.levels
            .iter()
            .enumerate()
            .rev()
            .find_map(|(lvl, level)| {
                level
                    .patches
                    .iter()
                    .find(|p| p.contains(point))
                    .map(|p| (lvl, p))
            })
    }
}

impl FieldSnapshot for HierarchicalSnapshot {
    fn covered_region(&self) -> BoundingBox {
        self.covered
    }

    // Disjoint patches leave gaps inside `covered`.
    fn overlaps(&self, bbox: &BoundingBox) -> bool {
        self.covered.intersects(bbox)
            && self
                .levels
                .iter()
                .flat_map(|l| &l.patches)
                .any(|p| p.bounds().intersects(bbox))
    }

    fn sample(&self, point: [f64; 2], method: ResampleMethod) -> f64 {
        match self.finest_patch_at(point) {
            Some((_, patch)) => patch.evaluate(point, method),
            None => self.fill_value,
        }
    }

    fn time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/snapshot.rs"]
mod tests;
