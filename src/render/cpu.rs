use crate::foundation::core::{BoundingBox, Canvas};
use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::grid::uniform::{GridCoordinates, UniformGrid};
use crate::render::backend::{FrameGeometry, FrameRGBA, FrameRenderer};
use crate::render::colormap::{Colormap, ColormapName, Normalize, colorize};
use crate::render::streamline::trace_streamlines;
use crate::render::style::{ColorMapOpts, Corner, OutlineStyle, RenderStyle, StreamlineOpts};
use crate::render::text::{TextRaster, TextRasterizer};
use crate::source::memory::Outline;
use std::collections::HashMap;
use vello_cpu::kurbo::{Affine, BezPath, Point, Rect};

/// Where the plot and its colorbar sit on the canvas, and how world coordinates map onto them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotLayout {
    /// Region of the simulation plane shown.
    pub bbox: BoundingBox,
    /// Pixel rectangle of the plot area, aspect-correct.
    pub plot: Rect,
    /// Pixel rectangle of the colorbar strip, when reserved.
    pub colorbar: Option<Rect>,
}

impl PlotLayout {
    /// Fit `bbox` into `canvas` with room for ticks and labels at `font_size`.
    pub fn compute(canvas: Canvas, bbox: BoundingBox, font_size: f64, colorbar: bool) -> Self {
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        let (left, right, top, bottom) = (4.5 * font_size, font_size, font_size, 3.0 * font_size);
        let reserve = if colorbar { 8.0 * font_size } else { 0.0 };
        let avail_w = (w - left - right - reserve).max(1.0);
        let avail_h = (h - top - bottom).max(1.0);

        let [sx, sy] = bbox.size();
        // A flat box fills the available area.
        let aspect = if sx > 0.0 && sy > 0.0 {
            sx / sy
        } else {
            avail_w / avail_h
        };
        let (pw, ph) = if avail_w / avail_h > aspect {
            (avail_h * aspect, avail_h)
        } else {
            (avail_w, avail_w / aspect)
        };
        let x0 = (left + (avail_w - pw) / 2.0).round();
        let y0 = (top + (avail_h - ph) / 2.0).round();
        let plot = Rect::new(x0, y0, x0 + pw.round().max(1.0), y0 + ph.round().max(1.0));

        let colorbar = colorbar.then(|| {
            let cx = (plot.x1 + 0.8 * font_size).round();
            Rect::new(cx, plot.y0, cx + font_size.round().max(1.0), plot.y1)
        });
        Self {
            bbox,
            plot,
            colorbar,
        }
    }

    /// Pixel position of world point `p` (y grows upward in the world, downward on screen).
    pub fn to_pixel(&self, p: [f64; 2]) -> Point {
        let [sx, sy] = self.bbox.size();
        let frac = |d: f64, size: f64| if size > 0.0 { d / size } else { 0.5 };
        let u = frac(p[0] - self.bbox.origin[0], sx);
        let v = frac(p[1] - self.bbox.origin[1], sy);
        Point::new(
            self.plot.x0 + u * self.plot.width(),
            self.plot.y1 - v * self.plot.height(),
        )
    }
}

/// CPU frame renderer built on `vello_cpu`.
///
/// Layers are recorded into one render context and rasterized in [`FrameRenderer::finish`].
pub struct CpuRenderer {
    canvas: Canvas,
    background: [u8; 4],
    foreground: [u8; 4],
    font_size: f64,
    reserve_colorbar: bool,
    ctx: vello_cpu::RenderContext,
    layout: Option<PlotLayout>,
    label: String,
    text: TextRasterizer,
    colormaps: HashMap<ColormapName, Colormap>,
}

impl std::fmt::Debug for CpuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRenderer")
            .field("canvas", &self.canvas)
            .field("layout", &self.layout)
            .finish()
    }
}

#[derive(Clone, Copy)]
struct Anchor {
    at: Point,
    // Fraction of the text box left of / above `at`.
    h: f64,
    v: f64,
    rotated: bool,
}

impl CpuRenderer {
    /// Create a renderer for frames drawn with `style`.
    pub fn new(style: &RenderStyle) -> PlanevizResult<Self> {
        style.validate()?;
        let Canvas { width, height } = style.canvas;
        let w: u16 = width
            .try_into()
            .map_err(|_| PlanevizError::render("canvas width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| PlanevizError::render("canvas height exceeds u16"))?;
        Ok(Self {
            canvas: style.canvas,
            background: style.background,
            foreground: style.foreground,
            font_size: style.font_size,
            reserve_colorbar: style.color_map.colorbar,
            ctx: vello_cpu::RenderContext::new(w, h),
            layout: None,
            label: String::new(),
            text: TextRasterizer::new(),
            colormaps: HashMap::new(),
        })
    }

    /// Layout of the frame in progress.
    pub fn layout(&self) -> Option<&PlotLayout> {
        self.layout.as_ref()
    }

    fn require_layout(&self) -> PlanevizResult<PlotLayout> {
        self.layout
            .ok_or_else(|| PlanevizError::render("frame not started; call begin first"))
    }

    fn reset_paint(&mut self) {
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(Affine::IDENTITY);
    }

    fn set_color(&mut self, [r, g, b, a]: [u8; 4]) {
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    }

    fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        self.set_color(color);
        self.ctx.fill_rect(&rect);
    }

    fn stroke(&mut self, path: &BezPath, width: f64, color: [u8; 4]) {
        let style = vello_cpu::kurbo::Stroke::new(width)
            .with_caps(vello_cpu::kurbo::Cap::Round)
            .with_join(vello_cpu::kurbo::Join::Round);
        let outline = vello_cpu::kurbo::stroke(
            path.iter(),
            &style,
            &vello_cpu::kurbo::StrokeOpts::default(),
            0.1,
        );
        self.set_color(color);
        self.ctx.fill_path(&outline);
    }

    fn draw_text(&mut self, text: &str, size: f64, anchor: Anchor) -> PlanevizResult<()> {
        let Some(raster) = self.text.rasterize(text, self.foreground, size)? else {
            return Ok(());
        };
        let (w, h) = (f64::from(raster.width), f64::from(raster.height));
        let offset = Affine::translate((-(w * anchor.h), -(h * anchor.v)));
        let transform = if anchor.rotated {
            Affine::translate(anchor.at.to_vec2())
                * Affine::rotate(-std::f64::consts::FRAC_PI_2)
                * offset
        } else {
            let at = Point::new(
                (anchor.at.x - w * anchor.h).round(),
                (anchor.at.y - h * anchor.v).round(),
            );
            Affine::translate(at.to_vec2())
        };

        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(text_pixmap(&raster)?)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.ctx.set_transform(transform);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&Rect::new(0.0, 0.0, w, h));
        self.ctx.set_transform(Affine::IDENTITY);
        Ok(())
    }

    fn draw_axes(&mut self, layout: &PlotLayout, labels: &[String; 2]) -> PlanevizResult<()> {
        let fs = self.font_size;
        let tick_len = (0.3 * fs).round().max(2.0);
        let plot = layout.plot;
        let bbox = layout.bbox;

        for (value, label) in nice_ticks(bbox.origin[0], bbox.extent[0], 5) {
            let x = layout.to_pixel([value, bbox.origin[1]]).x.round();
            self.fill_rect(
                Rect::new(x - 0.5, plot.y1, x + 0.5, plot.y1 + tick_len),
                self.foreground,
            );
            self.draw_text(
                &label,
                0.8 * fs,
                Anchor {
                    at: Point::new(x, plot.y1 + tick_len),
                    h: 0.5,
                    v: 0.0,
                    rotated: false,
                },
            )?;
        }
        for (value, label) in nice_ticks(bbox.origin[1], bbox.extent[1], 5) {
            let y = layout.to_pixel([bbox.origin[0], value]).y.round();
            self.fill_rect(
                Rect::new(plot.x0 - tick_len, y - 0.5, plot.x0, y + 0.5),
                self.foreground,
            );
            self.draw_text(
                &label,
                0.8 * fs,
                Anchor {
                    at: Point::new(plot.x0 - tick_len, y),
                    h: 1.0,
                    v: 0.5,
                    rotated: false,
                },
            )?;
        }

        self.draw_text(
            &labels[0],
            fs,
            Anchor {
                at: Point::new(plot.center().x, plot.y1 + 1.4 * fs),
                h: 0.5,
                v: 0.0,
                rotated: false,
            },
        )?;
        self.draw_text(
            &labels[1],
            fs,
            Anchor {
                at: Point::new(plot.x0 - 4.4 * fs, plot.center().y),
                h: 0.5,
                v: 0.0,
                rotated: true,
            },
        )
    }

    fn draw_colorbar(
        &mut self,
        bar: Rect,
        colormap: &Colormap,
        norm: Normalize,
        title: &str,
    ) -> PlanevizResult<()> {
        let fs = self.font_size;
        let rows = bar.height().round().max(1.0) as usize;
        for row in 0..rows {
            let y = bar.y0 + row as f64;
            let t = 1.0 - (row as f64 + 0.5) / rows as f64;
            let [r, g, b] = colormap.sample(t);
            self.fill_rect(Rect::new(bar.x0, y, bar.x1, y + 1.0), [r, g, b, 255]);
        }
        let mut frame = BezPath::new();
        frame.move_to((bar.x0, bar.y0));
        frame.line_to((bar.x1, bar.y0));
        frame.line_to((bar.x1, bar.y1));
        frame.line_to((bar.x0, bar.y1));
        frame.close_path();
        self.stroke(&frame, 1.0, self.foreground);

        for (value, y) in [(norm.vmax, bar.y0), (norm.vmin, bar.y1)] {
            self.draw_text(
                &format_value(value),
                0.8 * fs,
                Anchor {
                    at: Point::new(bar.x1 + 0.3 * fs, y),
                    h: 0.0,
                    v: 0.5,
                    rotated: false,
                },
            )?;
        }
        self.draw_text(
            title,
            fs,
            Anchor {
                at: Point::new(bar.x1 + 5.0 * fs, bar.center().y),
                h: 0.5,
                v: 0.0,
                rotated: true,
            },
        )
    }

    fn colormap(&mut self, name: ColormapName) -> Colormap {
        self.colormaps
            .entry(name)
            .or_insert_with(|| Colormap::new(name))
            .clone()
    }
}

impl FrameRenderer for CpuRenderer {
    fn begin(&mut self, geometry: &FrameGeometry) -> PlanevizResult<()> {
        geometry.bbox.validate()?;
        let layout = PlotLayout::compute(
            self.canvas,
            geometry.bbox,
            self.font_size,
            self.reserve_colorbar,
        );
        self.ctx.reset();
        self.reset_paint();
        self.fill_rect(
            Rect::new(
                0.0,
                0.0,
                f64::from(self.canvas.width),
                f64::from(self.canvas.height),
            ),
            self.background,
        );
        self.draw_axes(&layout, &geometry.axis_labels)?;
        self.layout = Some(layout);
        self.label = geometry.label.clone();
        tracing::trace!(plot = ?layout.plot, "frame begun");
        Ok(())
    }

    fn color_map(&mut self, grid: &UniformGrid, opts: &ColorMapOpts) -> PlanevizResult<()> {
        let layout = self.require_layout()?;
        self.reset_paint();
        let colormap = self.colormap(opts.colormap);
        let norm = Normalize::for_grid(grid, opts.vmin, opts.vmax);
        let colors = colorize(grid, &colormap, norm, opts.bad_color);

        // Each cell is centered on its sample, so the outer cells are clipped to half width.
        // Edges snap to whole pixels so neighbours never overlap.
        let [nx, ny] = grid.shape();
        let plot = layout.plot;
        let xs = cell_edges(nx)
            .map(|f| (plot.x0 + plot.width() * f).round())
            .collect::<Vec<_>>();
        let ys = cell_edges(ny)
            .map(|f| (plot.y1 - plot.height() * f).round())
            .collect::<Vec<_>>();
        for j in 0..ny {
            if ys[j] <= ys[j + 1] {
                continue;
            }
            let mut i = 0;
            while i < nx {
                let color = colors[grid.index(i, j)];
                let mut end = i + 1;
                while end < nx && colors[grid.index(end, j)] == color {
                    end += 1;
                }
                if xs[end] > xs[i] {
                    self.fill_rect(Rect::new(xs[i], ys[j + 1], xs[end], ys[j]), color);
                }
                i = end;
            }
        }

        if opts.colorbar {
            match layout.colorbar {
                Some(bar) => {
                    let title = opts.colorbar_label(&self.label);
                    self.draw_colorbar(bar, &colormap, norm, &title)?;
                }
                None => tracing::debug!("colorbar requested but no room was reserved"),
            }
        }
        Ok(())
    }

    fn streamlines(
        &mut self,
        coords: &GridCoordinates,
        vx: &UniformGrid,
        vy: &UniformGrid,
        opts: &StreamlineOpts,
    ) -> PlanevizResult<()> {
        let layout = self.require_layout()?;
        if !opts.enabled {
            return Ok(());
        }
        self.reset_paint();
        let lines = trace_streamlines(coords, vx, vy, opts)?;
        for line in &lines {
            let pts = line
                .iter()
                .map(|&p| layout.to_pixel(p))
                .collect::<Vec<_>>();
            let mut path = BezPath::new();
            path.move_to(pts[0]);
            for &p in &pts[1..] {
                path.line_to(p);
            }
            self.stroke(&path, opts.width, opts.color);
            if opts.arrows
                && let Some(head) = arrow_head(&pts, opts.width)
            {
                self.set_color(opts.color);
                self.ctx.fill_path(&head);
            }
        }
        tracing::trace!(lines = lines.len(), "drew streamlines");
        Ok(())
    }

    fn outline(&mut self, outline: &Outline, style: &OutlineStyle) -> PlanevizResult<()> {
        let layout = self.require_layout()?;
        if outline.points.len() < 2 {
            return Ok(());
        }
        self.reset_paint();
        let mut path = BezPath::new();
        path.move_to(layout.to_pixel(outline.points[0]));
        for &p in &outline.points[1..] {
            path.line_to(layout.to_pixel(p));
        }
        path.close_path();

        if style.alpha < 1.0 {
            self.ctx.push_opacity_layer(style.alpha);
        }
        self.set_color(style.fill);
        self.ctx.fill_path(&path);
        if style.width > 0.0 {
            self.stroke(&path, style.width, style.edge);
        }
        if style.alpha < 1.0 {
            self.ctx.pop_layer();
        }
        Ok(())
    }

    fn text(&mut self, text: &str, corner: Corner) -> PlanevizResult<()> {
        let layout = self.require_layout()?;
        self.reset_paint();
        let m = 0.5 * self.font_size;
        let plot = layout.plot;
        let (at, h, v) = match corner {
            Corner::TopLeft => (Point::new(plot.x0 + m, plot.y0 + m), 0.0, 0.0),
            Corner::TopRight => (Point::new(plot.x1 - m, plot.y0 + m), 1.0, 0.0),
            Corner::BottomLeft => (Point::new(plot.x0 + m, plot.y1 - m), 0.0, 1.0),
            Corner::BottomRight => (Point::new(plot.x1 - m, plot.y1 - m), 1.0, 1.0),
        };
        self.draw_text(
            text,
            self.font_size,
            Anchor {
                at,
                h,
                v,
                rotated: false,
            },
        )
    }

    fn finish(&mut self) -> PlanevizResult<FrameRGBA> {
        let layout = self.require_layout()?;
        self.reset_paint();
        let plot = layout.plot;
        let mut border = BezPath::new();
        border.move_to((plot.x0, plot.y0));
        border.line_to((plot.x1, plot.y0));
        border.line_to((plot.x1, plot.y1));
        border.line_to((plot.x0, plot.y1));
        border.close_path();
        self.stroke(&border, 1.0, self.foreground);

        let (w, h) = (self.ctx.width(), self.ctx.height());
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        self.layout = None;

        Ok(FrameRGBA {
            width: u32::from(w),
            height: u32::from(h),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn text_pixmap(raster: &TextRaster) -> PlanevizResult<vello_cpu::Pixmap> {
    let w: u16 = raster
        .width
        .try_into()
        .map_err(|_| PlanevizError::render("text width exceeds u16"))?;
    let h: u16 = raster
        .height
        .try_into()
        .map_err(|_| PlanevizError::render("text height exceeds u16"))?;
    let pixels = raster
        .data
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

/// Filled triangle halfway along `pts`, pointing along the line.
/// Plot fractions of the `n + 1` cell edges along an axis of `n` samples.
///
/// Sample `k` sits at `k / (n - 1)`; edges fall halfway between samples and are clamped to
/// the plot.
fn cell_edges(n: usize) -> impl Iterator<Item = f64> {
    (0..=n).map(move |k| {
        if n <= 1 {
            k as f64
        } else {
            ((k as f64 - 0.5) / (n - 1) as f64).clamp(0.0, 1.0)
        }
    })
}

fn arrow_head(pts: &[Point], width: f64) -> Option<BezPath> {
    if pts.len() < 3 {
        return None;
    }
    let k = pts.len() / 2;
    let d = pts[k + 1] - pts[k - 1];
    let len = d.hypot();
    if len <= f64::EPSILON {
        return None;
    }
    let d = d / len;
    let n = vello_cpu::kurbo::Vec2::new(-d.y, d.x);
    let s = 3.0 * width + 3.0;
    let c = pts[k];
    let mut head = BezPath::new();
    head.move_to(c + d * (0.6 * s));
    head.line_to(c - d * (0.4 * s) + n * (0.45 * s));
    head.line_to(c - d * (0.4 * s) - n * (0.45 * s));
    head.close_path();
    Some(head)
}

/// Round tick positions in `[lo, hi]` with about `target` steps, paired with their labels.
pub(crate) fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<(f64, String)> {
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 || target == 0 {
        return Vec::new();
    }
    let raw = span / target as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * mag)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * mag);
    let decimals = (-step.log10().floor()).max(0.0) as usize;

    let first = (lo / step).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last)
        .map(|k| {
            let v = k as f64 * step;
            let label = format!("{:.*}", decimals, v);
            // Avoid "-0".
            let label = if label.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
                label.trim_start_matches('-').to_owned()
            } else {
                label
            };
            (v, label)
        })
        .collect()
}

/// Compact label for a colorbar end value.
pub(crate) fn format_value(v: f64) -> String {
    if v == 0.0 {
        return "0".to_owned();
    }
    let a = v.abs();
    if !(1e-3..1e4).contains(&a) {
        format!("{v:.2e}")
    } else {
        let s = format!("{v:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
