use crate::foundation::core::{Iteration, Plane};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::grid::uniform::{GridCoordinates, UniformGrid};
use crate::source::memory::Outline;

/// Everything needed to draw one frame.
///
/// The scalar and both vector grids always share box, resolution and mask.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSpec {
    iteration: Iteration,
    time: f64,
    plane: Plane,
    label: String,
    scalar: UniformGrid,
    vector_x: UniformGrid,
    vector_y: UniformGrid,
    outlines: Vec<Outline>,
    annotation: Option<String>,
}

impl FrameSpec {
    /// Assemble a frame; fails with [`PlanevizError::ShapeMismatch`] when the grids disagree.
    pub fn new(
        iteration: Iteration,
        time: f64,
        plane: Plane,
        label: impl Into<String>,
        scalar: UniformGrid,
        vector_x: UniformGrid,
        vector_y: UniformGrid,
    ) -> PlanevizResult<Self> {
        for (name, g) in [("x", &vector_x), ("y", &vector_y)] {
            if !g.same_geometry(&scalar) {
                return Err(PlanevizError::shape_mismatch(format!(
                    "vector {name} grid {:?}@{:?} differs from scalar grid {:?}@{:?}",
                    g.bbox(),
                    g.shape(),
                    scalar.bbox(),
                    scalar.shape()
                )));
            }
            if g.mask() != scalar.mask() {
                return Err(PlanevizError::shape_mismatch(format!(
                    "vector {name} grid mask differs from scalar mask"
                )));
            }
        }
        Ok(Self {
            iteration,
            time,
            plane,
            label: label.into(),
            scalar,
            vector_x,
            vector_y,
            outlines: Vec::new(),
            annotation: None,
        })
    }

    /// Attach overlay outlines.
    pub fn with_outlines(mut self, outlines: Vec<Outline>) -> Self {
        self.outlines = outlines;
        self
    }

    /// Attach corner annotation text.
    pub fn with_annotation(mut self, text: impl Into<String>) -> Self {
        self.annotation = Some(text.into());
        self
    }

    /// Iteration.
    pub fn iteration(&self) -> Iteration {
        self.iteration
    }

    /// Simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Plane.
    pub fn plane(&self) -> Plane {
        self.plane
    }

    /// Horizontal and vertical axis labels.
    pub fn axis_labels(&self) -> [&'static str; 2] {
        self.plane.axes()
    }

    /// Display label of the scalar field.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Transformed, masked scalar grid.
    pub fn scalar(&self) -> &UniformGrid {
        &self.scalar
    }

    /// First vector component grid.
    pub fn vector_x(&self) -> &UniformGrid {
        &self.vector_x
    }

    /// Second vector component grid.
    pub fn vector_y(&self) -> &UniformGrid {
        &self.vector_y
    }

    /// Overlay outlines.
    pub fn outlines(&self) -> &[Outline] {
        &self.outlines
    }

    /// Corner annotation, if any.
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Sample coordinates shared by all three grids.
    pub fn coordinates(&self) -> GridCoordinates {
        self.scalar.coordinates()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/spec.rs"]
mod tests;
