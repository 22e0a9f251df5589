//! Output sinks.
//!
//! Sinks consume rendered frames in iteration order and are driven by
//! [`MovieSession::render_range`](crate::MovieSession::render_range).

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Numbered PNG files.
pub mod png;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;
