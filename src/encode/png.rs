use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::{FrameSink, SinkConfig, check_order, check_size};
use crate::foundation::core::Iteration;
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::render::backend::{FrameRGBA, save_png};
use std::path::{Path, PathBuf};

/// Writes every frame to `<dir>/<prefix>_<n>.png`, `n` counting frames from zero (five digits).
///
/// Sequential numbering keeps the files consumable by `ffmpeg -i <prefix>_%05d.png`.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    cfg: Option<SinkConfig>,
    last: Option<Iteration>,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    /// Write frames into `dir` named `frame_00000.png`, `frame_00001.png`, ...
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "frame".to_owned(),
            cfg: None,
            last: None,
            written: Vec::new(),
        }
    }

    /// Use `prefix` instead of `frame` for file names.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}_{n:05}.png", self.prefix))
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> PlanevizResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(PlanevizError::validation(
                "png sink width/height must be non-zero",
            ));
        }
        if self.prefix.is_empty() || self.prefix.contains(['/', '\\']) {
            return Err(PlanevizError::validation(format!(
                "invalid png file prefix '{}'",
                self.prefix
            )));
        }
        ensure_parent_dir(&self.path_for(0))?;
        self.cfg = Some(cfg);
        self.last = None;
        self.written.clear();
        Ok(())
    }

    fn push_frame(&mut self, iteration: Iteration, frame: &FrameRGBA) -> PlanevizResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PlanevizError::encode("png sink not started"))?;
        check_size(cfg, frame)?;
        check_order(self.last, iteration)?;
        self.last = Some(iteration);

        let path = self.path_for(self.written.len());
        save_png(frame, &path)?;
        tracing::debug!(%iteration, path = %path.display(), "wrote png frame");
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> PlanevizResult<()> {
        if self.cfg.take().is_none() {
            return Err(PlanevizError::encode("png sink not started"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
