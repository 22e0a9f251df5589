use crate::foundation::core::{Iteration, Plane};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::source::dataset::SnapshotDef;
use crate::source::snapshot::FieldSnapshot;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Read access to plane field data across iterations.
///
/// `snapshot` may cache expensive per-iteration state; `release` drops it again. Callers release
/// every iteration they fetched once the frame built from it is done, successful or not.
pub trait SimulationSource: Send + Sync {
    /// `true` when `variable` is stored on `plane`.
    fn has_variable(&self, plane: Plane, variable: &str) -> bool;

    /// Iterations available for `variable`, ascending.
    fn available_iterations(
        &self,
        plane: Plane,
        variable: &str,
    ) -> PlanevizResult<Vec<Iteration>>;

    /// The snapshot of `variable` at `iteration`.
    fn snapshot(
        &self,
        plane: Plane,
        variable: &str,
        iteration: Iteration,
    ) -> PlanevizResult<Arc<dyn FieldSnapshot>>;

    /// Simulation time of `variable` at `iteration`.
    fn time_at_iteration(
        &self,
        plane: Plane,
        variable: &str,
        iteration: Iteration,
    ) -> PlanevizResult<f64>;

    /// Drop cached state for `variable` at `iteration`.
    fn release(&self, plane: Plane, variable: &str, iteration: Iteration);
}

/// A closed polyline drawn over a frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Outline {
    /// Display label.
    pub label: String,
    /// Vertices in plane coordinates; the last connects back to the first.
    pub points: Vec<[f64; 2]>,
}

/// Geometry overlaid on frames, keyed by iteration.
pub trait OverlaySource: Send + Sync {
    /// Outlines on `plane` valid at `iteration`; empty when there are none.
    fn outlines_at(&self, plane: Plane, iteration: Iteration) -> Vec<Outline>;
}

/// A tracked surface (e.g. an apparent horizon) with its cut through each plane over time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Horizon {
    /// Display label.
    pub label: String,
    /// Plane cuts, at most one per `(iteration, plane)`.
    #[serde(default)]
    pub shapes: Vec<HorizonShape>,
}

/// Cut of a [`Horizon`] through one plane at one iteration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HorizonShape {
    /// Iteration of the cut.
    pub iteration: Iteration,
    /// Plane of the cut.
    pub plane: Plane,
    /// Outline vertices.
    pub points: Vec<[f64; 2]>,
}

type SeriesKey = (Plane, String);
type CacheKey = (Plane, String, Iteration);

/// In-memory [`SimulationSource`] and [`OverlaySource`].
///
/// Snapshot definitions are materialized on first fetch and cached until released.
#[derive(Default)]
pub struct MemorySource {
    series: BTreeMap<SeriesKey, BTreeMap<Iteration, SnapshotDef>>,
    horizons: Vec<Horizon>,
    cache: RwLock<HashMap<CacheKey, Arc<dyn FieldSnapshot>>>,
}

impl std::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("series", &self.series.keys().collect::<Vec<_>>())
            .field("horizons", &self.horizons.len())
            .field("cached_snapshots", &self.cached_snapshots())
            .finish()
    }
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` for `variable` on `plane`, replacing one at the same iteration.
    pub fn insert(&mut self, plane: Plane, variable: &str, snapshot: SnapshotDef) {
        let key = (plane, variable.to_owned());
        self.cache
            .write()
            .remove(&(plane, variable.to_owned(), snapshot.iteration));
        self.series
            .entry(key)
            .or_default()
            .insert(snapshot.iteration, snapshot);
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with_snapshot(mut self, plane: Plane, variable: &str, snapshot: SnapshotDef) -> Self {
        self.insert(plane, variable, snapshot);
        self
    }

    /// Add overlay geometry.
    pub fn add_horizon(&mut self, horizon: Horizon) {
        self.horizons.push(horizon);
    }

    /// Number of snapshots currently materialized.
    pub fn cached_snapshots(&self) -> usize {
        self.cache.read().len()
    }

    fn series_of(
        &self,
        plane: Plane,
        variable: &str,
    ) -> PlanevizResult<&BTreeMap<Iteration, SnapshotDef>> {
        self.series
            .get(&(plane, variable.to_owned()))
            .ok_or_else(|| {
                PlanevizError::missing_field(format!(
                    "no variable '{variable}' on plane {plane}"
                ))
            })
    }

    fn def(
        &self,
        plane: Plane,
        variable: &str,
        iteration: Iteration,
    ) -> PlanevizResult<&SnapshotDef> {
        self.series_of(plane, variable)?.get(&iteration).ok_or_else(|| {
            PlanevizError::missing_field(format!(
                "variable '{variable}' on plane {plane} has no snapshot at iteration {iteration}"
            ))
        })
    }
}

impl SimulationSource for MemorySource {
    fn has_variable(&self, plane: Plane, variable: &str) -> bool {
        self.series.contains_key(&(plane, variable.to_owned()))
    }

    fn available_iterations(
        &self,
        plane: Plane,
        variable: &str,
    ) -> PlanevizResult<Vec<Iteration>> {
        Ok(self.series_of(plane, variable)?.keys().copied().collect())
    }

    fn snapshot(
        &self,
        plane: Plane,
        variable: &str,
        iteration: Iteration,
    ) -> PlanevizResult<Arc<dyn FieldSnapshot>> {
        let key = (plane, variable.to_owned(), iteration);
        if let Some(hit) = self.cache.read().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let built = self.def(plane, variable, iteration)?.build()?;
        self.cache.write().insert(key, Arc::clone(&built));
        Ok(built)
    }

    fn time_at_iteration(
        &self,
        plane: Plane,
        variable: &str,
        iteration: Iteration,
    ) -> PlanevizResult<f64> {
        Ok(self.def(plane, variable, iteration)?.time)
    }

    fn release(&self, plane: Plane, variable: &str, iteration: Iteration) {
        self.cache
            .write()
            .remove(&(plane, variable.to_owned(), iteration));
    }
}

impl OverlaySource for MemorySource {
    fn outlines_at(&self, plane: Plane, iteration: Iteration) -> Vec<Outline> {
        self.horizons
            .iter()
            .flat_map(|h| {
                h.shapes
                    .iter()
                    .filter(|s| s.iteration == iteration && s.plane == plane)
                    .map(|s| Outline {
                        label: h.label.clone(),
                        points: s.points.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/memory.rs"]
mod tests;
