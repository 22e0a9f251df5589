//! Planeviz renders 2D slices of 3D simulation snapshots into images and movies.
//!
//! Each frame resamples a scalar field (and optionally a vector field) from possibly
//! mesh-refined snapshot data onto a uniform grid over a region of a coordinate plane, masks
//! and transforms the values, then draws a color map with streamlines, overlay outlines and a
//! time annotation. The public API is session-oriented:
//!
//! - Describe a run with a [`PipelineConfig`] (or load a [`RunConfig`] from JSON)
//! - Produce [`FrameSpec`]s per iteration from a [`FramePipeline`]
//! - Draw them with a [`FrameRenderer`] such as [`CpuRenderer`]
//! - Stream a whole window into a [`FrameSink`] through a [`MovieSession`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod grid;
pub(crate) mod source;

/// Encoding sinks.
pub mod encode;
/// Frame production: configuration, specs and the per-iteration pipeline.
pub mod frame;
/// Rendering backend(s).
pub mod render;
/// Session-oriented movie API.
pub mod session;

pub use crate::foundation::core::{
    BoundingBox, Canvas, Fps, Iteration, Plane, Point, Rect, Resolution,
};
pub use crate::foundation::error::{PlanevizError, PlanevizResult, Stage};
pub use crate::foundation::math::linspace;

pub use crate::grid::mask::{Mask, apply_mask, derive_mask};
pub use crate::grid::resample::{GridResampler, ResampleMethod};
pub use crate::grid::transform::{FieldTransform, LogDomainPolicy, absolute_value, logarithm};
pub use crate::grid::uniform::{GridCoordinates, UniformGrid};

pub use crate::source::dataset::{Dataset, FieldSeriesDef, SnapshotData, SnapshotDef};
pub use crate::source::memory::{
    Horizon, HorizonShape, MemorySource, Outline, OverlaySource, SimulationSource,
};
pub use crate::source::snapshot::{
    FieldSnapshot, HierarchicalSnapshot, RefinementLevel, SingleResolutionSnapshot, UniformPatch,
};

pub use crate::frame::config::{IterationWindow, PipelineConfig, RunConfig};
pub use crate::frame::pipeline::FramePipeline;
pub use crate::frame::spec::FrameSpec;

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::png::PngSequenceSink;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::render::backend::{FrameGeometry, FrameRGBA, FrameRenderer, save_png};
pub use crate::render::colormap::{Colormap, ColormapName, Normalize, colorize};
pub use crate::render::cpu::{CpuRenderer, PlotLayout};
pub use crate::render::streamline::{Streamline, trace_streamlines};
pub use crate::render::style::{
    ColorMapOpts, Corner, OutlineStyle, RenderStyle, StreamlineOpts,
};
pub use crate::session::movie::{MovieSession, MovieStats, render_frame_spec};
