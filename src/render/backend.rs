use crate::foundation::core::BoundingBox;
use crate::foundation::error::PlanevizResult;
use crate::foundation::math::unpremul_rgba8_in_place;
use crate::grid::uniform::{GridCoordinates, UniformGrid};
use crate::render::style::{ColorMapOpts, Corner, OutlineStyle, StreamlineOpts};
use crate::source::memory::Outline;
use anyhow::Context as _;
use std::path::Path;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** by default; the `premultiplied` flag makes this explicit at
/// API boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, top row first.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA8 of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremul_rgba8_in_place(&mut out);
        }
        out
    }
}

/// World-space extent and axis labels of the plot drawn in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameGeometry {
    /// Region of the simulation plane shown.
    pub bbox: BoundingBox,
    /// Horizontal and vertical axis labels.
    pub axis_labels: [String; 2],
    /// Display label of the scalar field, used as the default colorbar title.
    pub label: String,
}

/// Draws frame layers in order: `begin`, any number of layer calls, then `finish`.
///
/// Later layers are painted over earlier ones.
pub trait FrameRenderer {
    /// Start a new frame showing `geometry`.
    fn begin(&mut self, geometry: &FrameGeometry) -> PlanevizResult<()>;

    /// Paint `grid` through a color map; invalid or non-finite cells use the bad color.
    fn color_map(&mut self, grid: &UniformGrid, opts: &ColorMapOpts) -> PlanevizResult<()>;

    /// Trace and draw streamlines of the vector field `(vx, vy)` sampled at `coords`.
    fn streamlines(
        &mut self,
        coords: &GridCoordinates,
        vx: &UniformGrid,
        vy: &UniformGrid,
        opts: &StreamlineOpts,
    ) -> PlanevizResult<()>;

    /// Draw a closed outline.
    fn outline(&mut self, outline: &Outline, style: &OutlineStyle) -> PlanevizResult<()>;

    /// Draw `text` in a corner of the plot.
    fn text(&mut self, text: &str, corner: Corner) -> PlanevizResult<()>;

    /// Rasterize everything drawn since `begin`.
    fn finish(&mut self) -> PlanevizResult<FrameRGBA>;
}

/// Write `frame` as a straight-alpha PNG, creating parent directories as needed.
pub fn save_png(frame: &FrameRGBA, path: impl AsRef<Path>) -> PlanevizResult<()> {
    let path = path.as_ref();
    crate::encode::ffmpeg::ensure_parent_dir(path)?;
    let data = frame.to_straight_rgba8();
    image::save_buffer_with_format(
        path,
        &data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
