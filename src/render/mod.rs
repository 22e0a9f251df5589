//! Frame drawing.

/// Renderer trait, frame buffer and PNG output.
pub mod backend;
/// Color lookup tables and value normalization.
pub mod colormap;
/// `vello_cpu` renderer.
pub mod cpu;
/// Evenly spaced streamline tracing.
pub mod streamline;
/// Layer options.
pub mod style;
pub(crate) mod text;
