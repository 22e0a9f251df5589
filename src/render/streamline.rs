use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::grid::uniform::{GridCoordinates, UniformGrid};
use crate::render::style::StreamlineOpts;

/// Occupancy cells per axis at `density == 1.0`.
const BASE_CELLS: f64 = 30.0;

/// A streamline as world-space points, ordered along the flow.
pub type Streamline = Vec<[f64; 2]>;

/// Trace evenly spaced streamlines of `(vx, vy)`.
///
/// Integration runs in sample-index space with a midpoint (RK2) step along the normalized
/// bilinear velocity. Seeds are the centers of a coarse occupancy grid, visited row by row; a line
/// grows in both directions from its seed and stops when it leaves the box, touches a masked or
/// non-finite sample, stalls, enters a cell claimed by another line, or runs out of steps.
///
/// Every returned point lies in a grid cell whose four corner samples are valid.
pub fn trace_streamlines(
    coords: &GridCoordinates,
    vx: &UniformGrid,
    vy: &UniformGrid,
    opts: &StreamlineOpts,
) -> PlanevizResult<Vec<Streamline>> {
    if !vx.same_geometry(vy) {
        return Err(PlanevizError::shape_mismatch(format!(
            "vector components differ: {:?}@{:?} vs {:?}@{:?}",
            vx.bbox(),
            vx.shape(),
            vy.bbox(),
            vy.shape()
        )));
    }
    let [nx, ny] = vx.shape();
    if coords.x.len() != nx || coords.y.len() != ny {
        return Err(PlanevizError::shape_mismatch(format!(
            "coordinates {}x{} do not match grid {nx}x{ny}",
            coords.x.len(),
            coords.y.len()
        )));
    }
    if nx < 2 || ny < 2 || opts.max_steps == 0 {
        return Ok(Vec::new());
    }

    let field = VelocityField::new(coords, vx, vy);
    let mut occupancy = Occupancy::new(opts.density, [nx, ny]);
    let n = occupancy.cells;
    let step = (0.5 * occupancy.cell_size[0].min(occupancy.cell_size[1])).min(0.5);

    let mut lines = Vec::new();
    for ci in 0..n {
        for cj in 0..n {
            if occupancy.owner(ci, cj).is_some() {
                continue;
            }
            let seed = occupancy.center(ci, cj);
            if field.direction(seed, 1.0).is_none() {
                continue;
            }
            let id = lines.len();
            let mut claimed = Vec::new();
            occupancy.claim(occupancy.cell_of(seed), id, &mut claimed);

            let mut grow = |sign: f64| {
                integrate(
                    &field,
                    &mut occupancy,
                    seed,
                    Step { h: step, sign, max: opts.max_steps },
                    id,
                    &mut claimed,
                )
            };
            let forward = grow(1.0);
            let backward = grow(-1.0);

            if forward.len() + backward.len() + 1 < 3 {
                occupancy.release(&claimed);
                continue;
            }
            let line = backward
                .into_iter()
                .rev()
                .chain(std::iter::once(seed))
                .chain(forward)
                .map(|p| field.to_world(p))
                .collect::<Vec<_>>();
            lines.push(line);
        }
    }

    tracing::trace!(
        lines = lines.len(),
        cells = n * n,
        claimed = occupancy.claimed(),
        "traced streamlines"
    );
    Ok(lines)
}

#[derive(Clone, Copy)]
struct Step {
    h: f64,
    sign: f64,
    max: usize,
}

fn integrate(
    field: &VelocityField<'_>,
    occupancy: &mut Occupancy,
    seed: [f64; 2],
    step: Step,
    id: usize,
    claimed: &mut Vec<usize>,
) -> Vec<[f64; 2]> {
    let Step { h, sign, max } = step;
    let mut out = Vec::new();
    let mut p = seed;
    for _ in 0..max {
        let Some(k1) = field.direction(p, sign) else {
            break;
        };
        let mid = [p[0] + 0.5 * h * k1[0], p[1] + 0.5 * h * k1[1]];
        let Some(k2) = field.direction(mid, sign) else {
            break;
        };
        let next = [p[0] + h * k2[0], p[1] + h * k2[1]];
        if !field.is_valid_at(next) {
            break;
        }
        let cell = occupancy.cell_of(next);
        match occupancy.cell_owner(cell) {
            Some(other) if other != id => break,
            _ => occupancy.claim(cell, id, claimed),
        }
        out.push(next);
        p = next;
    }
    out
}

/// Bilinear velocity in sample-index units.
struct VelocityField<'a> {
    vx: &'a UniformGrid,
    vy: &'a UniformGrid,
    origin: [f64; 2],
    spacing: [f64; 2],
    max: [f64; 2],
}

impl<'a> VelocityField<'a> {
    fn new(coords: &GridCoordinates, vx: &'a UniformGrid, vy: &'a UniformGrid) -> Self {
        let [nx, ny] = vx.shape();
        Self {
            vx,
            vy,
            origin: [coords.x[0], coords.y[0]],
            spacing: vx.spacing(),
            max: [(nx - 1) as f64, (ny - 1) as f64],
        }
    }

    fn to_world(&self, p: [f64; 2]) -> [f64; 2] {
        [
            self.origin[0] + p[0] * self.spacing[0],
            self.origin[1] + p[1] * self.spacing[1],
        ]
    }

    /// Lower corner sample and fractional offsets of the cell containing `p`.
    fn cell(&self, p: [f64; 2]) -> Option<([usize; 2], [f64; 2])> {
        if !(p[0] >= 0.0 && p[0] <= self.max[0] && p[1] >= 0.0 && p[1] <= self.max[1]) {
            return None;
        }
        let i = (p[0].floor() as usize).min(self.max[0] as usize - 1);
        let j = (p[1].floor() as usize).min(self.max[1] as usize - 1);
        Some(([i, j], [p[0] - i as f64, p[1] - j as f64]))
    }

    fn is_valid_at(&self, p: [f64; 2]) -> bool {
        self.sample(p).is_some()
    }

    fn sample(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let ([i, j], [tx, ty]) = self.cell(p)?;
        let corners = [(i, j), (i + 1, j), (i, j + 1), (i + 1, j + 1)];
        let mut u = [0.0; 4];
        let mut v = [0.0; 4];
        for (k, &(ci, cj)) in corners.iter().enumerate() {
            if !self.vx.is_valid(ci, cj) || !self.vy.is_valid(ci, cj) {
                return None;
            }
            u[k] = self.vx.value(ci, cj);
            v[k] = self.vy.value(ci, cj);
        }
        let bilerp = |c: [f64; 4]| {
            let lo = c[0] * (1.0 - tx) + c[1] * tx;
            let hi = c[2] * (1.0 - tx) + c[3] * tx;
            lo * (1.0 - ty) + hi * ty
        };
        let out = [
            bilerp(u) / self.spacing[0],
            bilerp(v) / self.spacing[1],
        ];
        (out[0].is_finite() && out[1].is_finite()).then_some(out)
    }

    /// Unit direction of travel at `p`, reversed when `sign < 0`.
    fn direction(&self, p: [f64; 2], sign: f64) -> Option<[f64; 2]> {
        let [u, v] = self.sample(p)?;
        let speed = u.hypot(v);
        (speed > 0.0 && speed.is_finite()).then(|| [sign * u / speed, sign * v / speed])
    }
}

/// Coarse grid of cells, each claimed by at most one streamline.
struct Occupancy {
    cells: usize,
    cell_size: [f64; 2],
    owners: Vec<Option<usize>>,
}

impl Occupancy {
    fn new(density: f64, shape: [usize; 2]) -> Self {
        let cells = (BASE_CELLS * density).round().max(1.0) as usize;
        Self {
            cells,
            cell_size: [
                (shape[0] - 1) as f64 / cells as f64,
                (shape[1] - 1) as f64 / cells as f64,
            ],
            owners: vec![None; cells * cells],
        }
    }

    fn center(&self, ci: usize, cj: usize) -> [f64; 2] {
        [
            (ci as f64 + 0.5) * self.cell_size[0],
            (cj as f64 + 0.5) * self.cell_size[1],
        ]
    }

    fn cell_of(&self, p: [f64; 2]) -> usize {
        let axis = |v: f64, size: f64| ((v / size).floor().max(0.0) as usize).min(self.cells - 1);
        axis(p[0], self.cell_size[0]) * self.cells + axis(p[1], self.cell_size[1])
    }

    fn owner(&self, ci: usize, cj: usize) -> Option<usize> {
        self.owners[ci * self.cells + cj]
    }

    fn cell_owner(&self, cell: usize) -> Option<usize> {
        self.owners[cell]
    }

    fn claim(&mut self, cell: usize, id: usize, claimed: &mut Vec<usize>) {
        if self.owners[cell].is_none() {
            self.owners[cell] = Some(id);
            claimed.push(cell);
        }
    }

    fn release(&mut self, claimed: &[usize]) {
        for &cell in claimed {
            self.owners[cell] = None;
        }
    }

    fn claimed(&self) -> usize {
        self.owners.iter().filter(|o| o.is_some()).count()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/streamline.rs"]
mod tests;
