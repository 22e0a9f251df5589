use crate::foundation::core::{BoundingBox, Fps, Iteration, Plane, Resolution};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::grid::resample::ResampleMethod;
use crate::grid::transform::FieldTransform;
use crate::render::style::RenderStyle;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Everything [`crate::FramePipeline::setup`] needs to know.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    /// Plane to read.
    pub plane: Plane,
    /// Scalar variable drawn as the color map.
    pub variable: String,
    /// Vector variable prefix; components are `<prefix><axis>` for both plane axes.
    pub vector_variable: String,
    /// Region to resample.
    pub bbox: BoundingBox,
    /// Samples per axis.
    pub resolution: Resolution,
    /// Cells of the raw scalar below this value are masked on all three grids.
    #[serde(default)]
    pub mask_threshold: Option<f64>,
    /// Scalar display transform, applied after masking.
    #[serde(default)]
    pub transform: FieldTransform,
    /// Snapshot sampling method.
    #[serde(default)]
    pub resample: ResampleMethod,
    /// Subset of iterations to produce.
    #[serde(default)]
    pub window: IterationWindow,
    /// Attach overlay outlines when an overlay source is available.
    #[serde(default)]
    pub overlays: bool,
}

impl PipelineConfig {
    /// A configuration with every optional step disabled.
    pub fn new(
        plane: Plane,
        variable: impl Into<String>,
        vector_variable: impl Into<String>,
        bbox: BoundingBox,
        resolution: Resolution,
    ) -> Self {
        Self {
            plane,
            variable: variable.into(),
            vector_variable: vector_variable.into(),
            bbox,
            resolution,
            mask_threshold: None,
            transform: FieldTransform::default(),
            resample: ResampleMethod::default(),
            window: IterationWindow::default(),
            overlays: false,
        }
    }

    /// Names of the two vector component variables, in plane-axis order.
    pub fn vector_component_names(&self) -> [String; 2] {
        self.plane
            .axes()
            .map(|axis| format!("{}{axis}", self.vector_variable))
    }

    /// Check names, geometry and window.
    pub fn validate(&self) -> PlanevizResult<()> {
        if self.variable.trim().is_empty() {
            return Err(PlanevizError::validation("variable must be non-empty"));
        }
        if self.vector_variable.trim().is_empty() {
            return Err(PlanevizError::validation("vector_variable must be non-empty"));
        }
        self.bbox.validate()?;
        self.resolution.validate()?;
        if let Some(t) = self.mask_threshold
            && t.is_nan()
        {
            return Err(PlanevizError::validation("mask_threshold must not be NaN"));
        }
        self.window.validate()
    }
}

/// Iteration subset: an inclusive `[min, max]` range thinned to every `every`-th entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IterationWindow {
    /// Smallest iteration kept.
    pub min: Option<Iteration>,
    /// Largest iteration kept.
    pub max: Option<Iteration>,
    /// Keep one iteration out of this many, starting with the first in range.
    pub every: usize,
}

impl Default for IterationWindow {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            every: 1,
        }
    }
}

impl IterationWindow {
    /// Check `every >= 1` and `min <= max`.
    pub fn validate(&self) -> PlanevizResult<()> {
        if self.every == 0 {
            return Err(PlanevizError::validation("window.every must be >= 1"));
        }
        if let (Some(lo), Some(hi)) = (self.min, self.max)
            && lo > hi
        {
            return Err(PlanevizError::validation(format!(
                "window.min ({lo}) must be <= window.max ({hi})"
            )));
        }
        Ok(())
    }

    /// The kept subset of `iterations`, order preserved.
    pub fn select(&self, iterations: &[Iteration]) -> Vec<Iteration> {
        iterations
            .iter()
            .copied()
            .filter(|it| self.min.is_none_or(|lo| *it >= lo))
            .filter(|it| self.max.is_none_or(|hi| *it <= hi))
            .step_by(self.every.max(1))
            .collect()
    }
}

/// A complete run description: what to extract, how to draw it, how fast to play it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunConfig {
    /// Data preparation.
    pub pipeline: PipelineConfig,
    /// Drawing.
    #[serde(default)]
    pub style: RenderStyle,
    /// Movie frame rate.
    #[serde(default)]
    pub fps: Fps,
}

impl RunConfig {
    /// Parse a run configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PlanevizResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| PlanevizError::validation(format!("parse run config JSON: {e}")))
    }

    /// Parse a run configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PlanevizResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PlanevizError::validation(format!("open run config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate every section.
    pub fn validate(&self) -> PlanevizResult<()> {
        self.pipeline.validate()?;
        self.style.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/config.rs"]
mod tests;
