//! Frame rendering and movie driving.
//!
//! A [`MovieSession`](crate::MovieSession) pulls frames from a
//! [`FramePipeline`](crate::FramePipeline), draws them with a
//! [`FrameRenderer`](crate::FrameRenderer) and streams them into a [`FrameSink`](crate::FrameSink).

/// Sequential pipeline -> renderer -> sink driver.
pub mod movie;
