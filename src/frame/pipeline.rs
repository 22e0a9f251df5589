use crate::foundation::core::{Iteration, Plane};
use crate::foundation::error::{PlanevizError, PlanevizResult, Stage};
use crate::frame::config::PipelineConfig;
use crate::frame::spec::FrameSpec;
use crate::grid::mask::{apply_mask, derive_mask};
use crate::grid::resample::GridResampler;
use crate::grid::uniform::UniformGrid;
use crate::source::memory::{OverlaySource, SimulationSource};
use crate::source::snapshot::FieldSnapshot;
use std::sync::Arc;

/// Turns a simulation source into a sequence of [`FrameSpec`]s, one per iteration.
///
/// [`FramePipeline::setup`] does the one-off work (reader resolution, iteration listing and
/// consistency checks). [`FramePipeline::frame`] is then a pure function of the iteration:
/// fetch, resample, mask, transform, assemble.
pub struct FramePipeline<'a> {
    source: &'a dyn SimulationSource,
    overlays: Option<&'a dyn OverlaySource>,
    config: PipelineConfig,
    vector_names: [String; 2],
    iterations: Vec<Iteration>,
    resampler: GridResampler,
}

impl std::fmt::Debug for FramePipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePipeline")
            .field("config", &self.config)
            .field("iterations", &self.iterations.len())
            .field("overlays", &self.overlays.is_some())
            .finish()
    }
}

impl<'a> FramePipeline<'a> {
    /// Resolve the three readers and the iteration list.
    ///
    /// Fails with [`PlanevizError::MissingField`] when a reader is absent and with
    /// [`PlanevizError::ShapeMismatch`] when a vector component lists different iterations than
    /// the scalar.
    #[tracing::instrument(skip_all, fields(plane = %config.plane, variable = %config.variable))]
    pub fn setup(source: &'a dyn SimulationSource, config: PipelineConfig) -> PlanevizResult<Self> {
        config.validate()?;
        let plane = config.plane;
        let vector_names = config.vector_component_names();

        for name in std::iter::once(&config.variable).chain(vector_names.iter()) {
            if !source.has_variable(plane, name) {
                return Err(PlanevizError::missing_field(format!(
                    "no variable '{name}' on plane {plane}"
                )));
            }
        }

        let all = source.available_iterations(plane, &config.variable)?;
        for name in &vector_names {
            let theirs = source.available_iterations(plane, name)?;
            if theirs != all {
                return Err(PlanevizError::shape_mismatch(format!(
                    "'{name}' lists {} iterations, '{}' lists {}; the sets differ",
                    theirs.len(),
                    config.variable,
                    all.len()
                )));
            }
        }

        let iterations = config.window.select(&all);
        let resampler = GridResampler::new(config.bbox, config.resolution, config.resample)?;
        tracing::info!(
            available = all.len(),
            selected = iterations.len(),
            "frame pipeline ready"
        );

        Ok(Self {
            source,
            overlays: None,
            config,
            vector_names,
            iterations,
            resampler,
        })
    }

    /// Use `overlays` for outlines when the configuration asks for them.
    pub fn with_overlays(mut self, overlays: &'a dyn OverlaySource) -> Self {
        self.overlays = Some(overlays);
        self
    }

    /// Configuration the pipeline was set up with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Iterations that produce frames, ascending. Each call starts over.
    pub fn iterations(&self) -> impl Iterator<Item = Iteration> + '_ {
        self.iterations.iter().copied()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    /// `true` when there are no frames.
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    /// Lazily produce every frame in order. Dropping the iterator stops production.
    pub fn frames(&self) -> impl Iterator<Item = PlanevizResult<FrameSpec>> + '_ {
        self.iterations().map(move |it| self.frame(it))
    }

    /// Build the frame for `iteration`.
    ///
    /// Errors carry the iteration and failing [`Stage`]. Per-iteration source caches are released
    /// before returning, whether the frame succeeded or not.
    #[tracing::instrument(skip_all, fields(iteration = iteration.0))]
    pub fn frame(&self, iteration: Iteration) -> PlanevizResult<FrameSpec> {
        if !self.iterations.contains(&iteration) {
            return Err(PlanevizError::missing_field(format!(
                "iteration {iteration} is not part of this pipeline"
            ))
            .at(iteration, Stage::Fetch));
        }

        let plane = self.config.plane;
        let variable = self.config.variable.as_str();
        let [name_x, name_y] = &self.vector_names;
        let _lease = SnapshotLease {
            source: self.source,
            plane,
            variables: [variable, name_x.as_str(), name_y.as_str()],
            iteration,
        };

        let fetch = |name: &str| {
            self.source
                .snapshot(plane, name, iteration)
                .map_err(|e| e.at(iteration, Stage::Fetch))
        };
        let snap = fetch(variable)?;
        let snap_x = fetch(name_x.as_str())?;
        let snap_y = fetch(name_y.as_str())?;
        let time = self
            .source
            .time_at_iteration(plane, variable, iteration)
            .map_err(|e| e.at(iteration, Stage::Fetch))?;
        tracing::debug!(time, "fetched snapshots");

        let resample = |s: &Arc<dyn FieldSnapshot>| {
            self.resampler
                .resample(s.as_ref())
                .map_err(|e| e.at(iteration, Stage::Resample))
        };
        let raw = resample(&snap)?;
        let raw_x = resample(&snap_x)?;
        let raw_y = resample(&snap_y)?;

        let (scalar, vx, vy) = self
            .mask(raw, raw_x, raw_y)
            .map_err(|e| e.at(iteration, Stage::Mask))?;

        let scalar = self
            .config
            .transform
            .apply(&scalar)
            .map_err(|e| e.at(iteration, Stage::Transform))?;

        let label = self.config.transform.label(variable);
        let outlines = match self.overlays {
            Some(o) if self.config.overlays => o.outlines_at(plane, iteration),
            _ => Vec::new(),
        };
        let spec = FrameSpec::new(iteration, time, plane, label, scalar, vx, vy)
            .map_err(|e| e.at(iteration, Stage::Assemble))?
            .with_outlines(outlines)
            .with_annotation(format!("t = {time:.3}"));
        tracing::debug!(outlines = spec.outlines().len(), "frame assembled");
        Ok(spec)
    }

    fn mask(
        &self,
        scalar: UniformGrid,
        vx: UniformGrid,
        vy: UniformGrid,
    ) -> PlanevizResult<(UniformGrid, UniformGrid, UniformGrid)> {
        let Some(threshold) = self.config.mask_threshold else {
            return Ok((scalar, vx, vy));
        };
        let mask = Arc::new(derive_mask(&scalar, threshold));
        tracing::debug!(
            threshold,
            valid = mask.count_valid(),
            cells = scalar.values().len(),
            "derived mask"
        );
        Ok((
            apply_mask(&scalar, &mask)?,
            apply_mask(&vx, &mask)?,
            apply_mask(&vy, &mask)?,
        ))
    }
}

/// Releases the per-iteration snapshot caches of one frame when dropped.
struct SnapshotLease<'s> {
    source: &'s dyn SimulationSource,
    plane: Plane,
    variables: [&'s str; 3],
    iteration: Iteration,
}

impl Drop for SnapshotLease<'_> {
    fn drop(&mut self) {
        for variable in self.variables {
            self.source.release(self.plane, variable, self.iteration);
        }
        tracing::trace!(iteration = self.iteration.0, "released snapshot caches");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/pipeline.rs"]
mod tests;
