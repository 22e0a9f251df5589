use crate::foundation::core::{Iteration, Plane};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::source::memory::{Horizon, MemorySource};
use crate::source::snapshot::{
    FieldSnapshot, HierarchicalSnapshot, RefinementLevel, SingleResolutionSnapshot, UniformPatch,
};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// JSON interchange form of a set of plane fields and overlay geometry.
///
/// ```json
/// {
///   "fields": [
///     { "plane": "xy", "variable": "rho_b", "snapshots": [
///       { "iteration": 0, "time": 0.0,
///         "data": { "kind": "uniform",
///                   "patch": { "origin": [0, 0], "spacing": [1, 1], "shape": [2, 2],
///                              "values": [1, 2, 3, 4] } } }
///     ] }
///   ],
///   "horizons": []
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dataset {
    /// Field time series, one per `(plane, variable)`.
    #[serde(default)]
    pub fields: Vec<FieldSeriesDef>,
    /// Outlines to overlay on frames.
    #[serde(default)]
    pub horizons: Vec<Horizon>,
}

/// All snapshots of one variable on one plane.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldSeriesDef {
    /// Plane of the series.
    pub plane: Plane,
    /// Variable name, e.g. `rho_b` or `vx`.
    pub variable: String,
    /// Snapshots, one per iteration.
    pub snapshots: Vec<SnapshotDef>,
}

/// One stored snapshot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotDef {
    /// Iteration the snapshot belongs to.
    pub iteration: Iteration,
    /// Simulation time.
    pub time: f64,
    /// Value returned off the snapshot's support.
    #[serde(default)]
    pub fill_value: f64,
    /// Sample storage.
    pub data: SnapshotData,
}

/// Storage layout of a [`SnapshotDef`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotData {
    /// A single patch.
    Uniform {
        /// The patch.
        patch: UniformPatch,
    },
    /// Refinement levels, coarsest first.
    Hierarchical {
        /// The levels.
        levels: Vec<RefinementLevel>,
    },
}

impl SnapshotDef {
    /// A single-patch snapshot.
    pub fn uniform(iteration: Iteration, time: f64, patch: UniformPatch) -> Self {
        Self {
            iteration,
            time,
            fill_value: 0.0,
            data: SnapshotData::Uniform { patch },
        }
    }

    /// A hierarchical snapshot, levels ordered coarse to fine.
    pub fn hierarchical(iteration: Iteration, time: f64, levels: Vec<RefinementLevel>) -> Self {
        Self {
            iteration,
            time,
            fill_value: 0.0,
            data: SnapshotData::Hierarchical { levels },
        }
    }

    /// Override the off-support fill value.
    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    /// Build the sampling representation.
    pub fn build(&self) -> PlanevizResult<Arc<dyn FieldSnapshot>> {
        Ok(match &self.data {
            SnapshotData::Uniform { patch } => Arc::new(SingleResolutionSnapshot::new(
                patch.clone(),
                self.time,
                self.fill_value,
            )?),
            SnapshotData::Hierarchical { levels } => Arc::new(HierarchicalSnapshot::new(
                levels.clone(),
                self.time,
                self.fill_value,
            )?),
        })
    }

    fn validate(&self) -> PlanevizResult<()> {
        match &self.data {
            SnapshotData::Uniform { patch } => patch.validate(),
            SnapshotData::Hierarchical { levels } => {
                if levels.iter().all(|l| l.patches.is_empty()) {
                    return Err(PlanevizError::validation(
                        "hierarchical snapshot needs at least one patch",
                    ));
                }
                levels
                    .iter()
                    .flat_map(|l| &l.patches)
                    .try_for_each(UniformPatch::validate)
            }
        }
    }
}

impl Dataset {
    /// Parse a dataset from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PlanevizResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| PlanevizError::validation(format!("parse dataset JSON: {e}")))
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json_str(s: &str) -> PlanevizResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| PlanevizError::validation(format!("parse dataset JSON: {e}")))
    }

    /// Parse a dataset from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PlanevizResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PlanevizError::validation(format!("open dataset JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check series uniqueness and snapshot geometry.
    pub fn validate(&self) -> PlanevizResult<()> {
        let mut series = BTreeSet::new();
        for field in &self.fields {
            if field.variable.trim().is_empty() {
                return Err(PlanevizError::validation("field variable must be non-empty"));
            }
            if !series.insert((field.plane, field.variable.as_str())) {
                return Err(PlanevizError::validation(format!(
                    "duplicate field series '{}' on plane {}",
                    field.variable, field.plane
                )));
            }
            let mut seen = BTreeSet::new();
            for snap in &field.snapshots {
                if !seen.insert(snap.iteration) {
                    return Err(PlanevizError::validation(format!(
                        "field '{}' on plane {} lists iteration {} twice",
                        field.variable, field.plane, snap.iteration
                    )));
                }
                snap.validate().map_err(|e| {
                    PlanevizError::validation(format!(
                        "field '{}' iteration {}: {e}",
                        field.variable, snap.iteration
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Validate and load everything into an in-memory source.
    pub fn into_source(self) -> PlanevizResult<MemorySource> {
        self.validate()?;
        let mut source = MemorySource::new();
        for field in self.fields {
            for snap in field.snapshots {
                source.insert(field.plane, &field.variable, snap);
            }
        }
        for horizon in self.horizons {
            source.add_horizon(horizon);
        }
        Ok(source)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/dataset.rs"]
mod tests;
