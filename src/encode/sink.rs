use crate::foundation::core::{Fps, Iteration};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] at the start of a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing [`Iteration`] order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> PlanevizResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, iteration: Iteration, frame: &FrameRGBA) -> PlanevizResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> PlanevizResult<()>;
}

/// Rejects a frame whose iteration does not follow `last`.
pub(crate) fn check_order(last: Option<Iteration>, next: Iteration) -> PlanevizResult<()> {
    match last {
        Some(last) if next <= last => Err(PlanevizError::encode(format!(
            "out-of-order frame: iteration {next} after {last}"
        ))),
        _ => Ok(()),
    }
}

/// Rejects a frame whose size differs from the configured one.
pub(crate) fn check_size(cfg: &SinkConfig, frame: &FrameRGBA) -> PlanevizResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(PlanevizError::encode(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != cfg.width as usize * cfg.height as usize * 4 {
        return Err(PlanevizError::encode(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    ended: bool,
    frames: Vec<(Iteration, FrameRGBA)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(Iteration, FrameRGBA)] {
        &self.frames
    }

    /// `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PlanevizResult<()> {
        self.cfg = Some(cfg);
        self.ended = false;
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, iteration: Iteration, frame: &FrameRGBA) -> PlanevizResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PlanevizError::encode("in-memory sink not started"))?;
        check_size(cfg, frame)?;
        check_order(self.frames.last().map(|(it, _)| *it), iteration)?;
        self.frames.push((iteration, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> PlanevizResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
