use std::fmt;

use crate::foundation::core::Iteration;

/// Convenience result type used across planeviz.
pub type PlanevizResult<T> = Result<T, PlanevizError>;

/// Per-frame processing stage, reported when a frame fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading a snapshot or its time from the simulation source.
    Fetch,
    /// Resampling a snapshot onto the uniform grid.
    Resample,
    /// Deriving or applying the validity mask.
    Mask,
    /// Applying the scalar display transform.
    Transform,
    /// Assembling the frame description.
    Assemble,
    /// Drawing the frame.
    Render,
    /// Handing the frame to an output sink.
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Resample => "resample",
            Self::Mask => "mask",
            Self::Transform => "transform",
            Self::Assemble => "assemble",
            Self::Render => "render",
            Self::Encode => "encode",
        })
    }
}

/// Top-level error taxonomy used by library APIs.
#[derive(thiserror::Error, Debug)]
pub enum PlanevizError {
    /// The requested bounding box does not overlap a snapshot's covered region.
    #[error("out of domain: {0}")]
    OutOfDomain(String),

    /// Mask/grid shapes differ, or reader iteration sets disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A required field reader could not be resolved.
    #[error("missing field: {0}")]
    MissingField(String),

    /// A transform hit its undefined domain under a strict policy.
    #[error("undefined transform: {0}")]
    UndefinedTransform(String),

    /// Invalid user-provided configuration or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors raised while drawing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors raised by output sinks.
    #[error("encode error: {0}")]
    Encode(String),

    /// A failure while producing one frame, tagged with where it happened.
    #[error("iteration {iteration}: {stage} failed: {source}")]
    Frame {
        /// Iteration whose frame failed.
        iteration: Iteration,
        /// Stage that failed.
        stage: Stage,
        /// Underlying error.
        source: Box<PlanevizError>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlanevizError {
    /// Build a [`PlanevizError::OutOfDomain`] value.
    pub fn out_of_domain(msg: impl Into<String>) -> Self {
        Self::OutOfDomain(msg.into())
    }

    /// Build a [`PlanevizError::ShapeMismatch`] value.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Build a [`PlanevizError::MissingField`] value.
    pub fn missing_field(msg: impl Into<String>) -> Self {
        Self::MissingField(msg.into())
    }

    /// Build a [`PlanevizError::UndefinedTransform`] value.
    pub fn undefined_transform(msg: impl Into<String>) -> Self {
        Self::UndefinedTransform(msg.into())
    }

    /// Build a [`PlanevizError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PlanevizError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PlanevizError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Tag this error with the iteration and stage that produced it.
    ///
    /// Errors that already carry a frame tag are returned unchanged so the innermost stage wins.
    pub fn at(self, iteration: Iteration, stage: Stage) -> Self {
        match self {
            Self::Frame { .. } => self,
            other => Self::Frame {
                iteration,
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any frame tag stripped.
    pub fn root(&self) -> &PlanevizError {
        match self {
            Self::Frame { source, .. } => source.root(),
            other => other,
        }
    }

    /// Iteration and stage, when this error was raised while producing a frame.
    pub fn frame_context(&self) -> Option<(Iteration, Stage)> {
        match self {
            Self::Frame {
                iteration, stage, ..
            } => Some((*iteration, *stage)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
