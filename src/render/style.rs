use crate::foundation::core::Canvas;
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::render::colormap::ColormapName;

/// Corner of the plot area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    /// Upper left.
    TopLeft,
    /// Upper right.
    TopRight,
    /// Lower left.
    BottomLeft,
    /// Lower right.
    #[default]
    BottomRight,
}

/// Color map layer options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorMapOpts {
    /// Lookup table.
    pub colormap: ColormapName,
    /// Value mapped to the low end; data minimum when unset.
    pub vmin: Option<f64>,
    /// Value mapped to the high end; data maximum when unset.
    pub vmax: Option<f64>,
    /// Color of masked and non-finite cells (straight RGBA8).
    pub bad_color: [u8; 4],
    /// Values are already logarithms; only affects the colorbar label.
    pub log_scale: bool,
    /// Draw a colorbar next to the plot.
    pub colorbar: bool,
    /// Colorbar label; the frame label when unset.
    pub label: Option<String>,
}

impl Default for ColorMapOpts {
    fn default() -> Self {
        Self {
            colormap: ColormapName::default(),
            vmin: None,
            vmax: None,
            bad_color: [0, 0, 0, 255],
            log_scale: false,
            colorbar: false,
            label: None,
        }
    }
}

impl ColorMapOpts {
    /// Colorbar title for data labelled `label`.
    pub fn colorbar_label(&self, label: &str) -> String {
        let label = self.label.as_deref().unwrap_or(label);
        if self.log_scale && !label.starts_with("log10(") {
            format!("log10({label})")
        } else {
            label.to_owned()
        }
    }
}

/// Streamline layer options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StreamlineOpts {
    /// Draw streamlines at all.
    pub enabled: bool,
    /// Line color (straight RGBA8).
    pub color: [u8; 4],
    /// Line width in pixels.
    pub width: f64,
    /// Spacing control; `1.0` allows about 30 lines across each axis.
    pub density: f64,
    /// Maximum integration steps in each direction from a seed.
    pub max_steps: usize,
    /// Draw a direction arrow halfway along each line.
    pub arrows: bool,
}

impl Default for StreamlineOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            color: [255, 255, 255, 255],
            width: 1.0,
            density: 1.0,
            max_steps: 2000,
            arrows: true,
        }
    }
}

/// Outline layer options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutlineStyle {
    /// Fill color (straight RGBA8).
    pub fill: [u8; 4],
    /// Edge color (straight RGBA8).
    pub edge: [u8; 4],
    /// Opacity applied to fill and edge.
    pub alpha: f32,
    /// Edge width in pixels.
    pub width: f64,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            fill: [0, 0, 0, 255],
            edge: [255, 255, 255, 255],
            alpha: 1.0,
            width: 1.5,
        }
    }
}

/// How frames look.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Output size.
    pub canvas: Canvas,
    /// Page color behind the plot (straight RGBA8).
    pub background: [u8; 4],
    /// Axis, tick and annotation text color (straight RGBA8).
    pub foreground: [u8; 4],
    /// Text size in pixels.
    pub font_size: f64,
    /// Scalar layer.
    pub color_map: ColorMapOpts,
    /// Vector layer.
    pub streamlines: StreamlineOpts,
    /// Overlay outlines.
    pub outlines: OutlineStyle,
    /// Draw the frame annotation (simulation time).
    pub annotation: bool,
    /// Where the annotation goes.
    pub annotation_corner: Corner,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            background: [255, 255, 255, 255],
            foreground: [0, 0, 0, 255],
            font_size: 16.0,
            color_map: ColorMapOpts::default(),
            streamlines: StreamlineOpts::default(),
            outlines: OutlineStyle::default(),
            annotation: true,
            annotation_corner: Corner::default(),
        }
    }
}

impl RenderStyle {
    /// Check sizes and ranges.
    pub fn validate(&self) -> PlanevizResult<()> {
        let Canvas { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(PlanevizError::validation("canvas width/height must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(PlanevizError::validation(format!(
                "canvas {width}x{height} exceeds {0}x{0}",
                u16::MAX
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(PlanevizError::validation("font_size must be finite and > 0"));
        }
        if let (Some(lo), Some(hi)) = (self.color_map.vmin, self.color_map.vmax)
            && (lo.is_nan() || hi.is_nan() || lo >= hi)
        {
            return Err(PlanevizError::validation(format!(
                "vmin ({lo}) must be < vmax ({hi})"
            )));
        }
        let s = &self.streamlines;
        if !s.width.is_finite() || s.width <= 0.0 {
            return Err(PlanevizError::validation("streamline width must be finite and > 0"));
        }
        if !s.density.is_finite() || s.density <= 0.0 {
            return Err(PlanevizError::validation(
                "streamline density must be finite and > 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.outlines.alpha) {
            return Err(PlanevizError::validation("outline alpha must be in [0, 1]"));
        }
        if !self.outlines.width.is_finite() || self.outlines.width < 0.0 {
            return Err(PlanevizError::validation("outline width must be finite and >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/style.rs"]
mod tests;
