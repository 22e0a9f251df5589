use crate::foundation::error::{PlanevizError, PlanevizResult};
use anyhow::Context as _;
use std::collections::HashMap;
use std::sync::Arc;

/// A line of text rasterized to premultiplied RGBA8.
///
/// The raster is one line tall; the baseline sits at [`TextRaster::baseline`] pixels from the top.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRaster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Distance from the top row to the baseline.
    pub baseline: f64,
    /// Premultiplied RGBA8, row-major.
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    color: [u8; 4],
    size_bits: u64,
}

const CACHE_LIMIT: usize = 512;

/// Renders plain text through `usvg`/`resvg` with the system fonts.
pub struct TextRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
    cache: HashMap<TextKey, Option<Arc<TextRaster>>>,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer")
            .field("faces", &self.fontdb.faces().count())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRasterizer {
    /// Load the system font database.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.faces().count(), "loaded system fonts");
        Self {
            fontdb: Arc::new(db),
            cache: HashMap::new(),
        }
    }

    /// `true` when at least one font face is available.
    pub fn has_fonts(&self) -> bool {
        self.fontdb.faces().next().is_some()
    }

    /// Rasterize `text` at `font_size` pixels in straight RGBA8 `color`.
    ///
    /// Returns `None` when nothing is visible (empty text, or no usable font).
    pub fn rasterize(
        &mut self,
        text: &str,
        color: [u8; 4],
        font_size: f64,
    ) -> PlanevizResult<Option<Arc<TextRaster>>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(PlanevizError::render(format!(
                "font size must be finite and > 0, got {font_size}"
            )));
        }

        let key = TextKey {
            text: text.to_owned(),
            color,
            size_bits: font_size.to_bits(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        if self.cache.len() >= CACHE_LIMIT {
            self.cache.clear();
        }

        let raster = self.render_uncached(text, color, font_size)?.map(Arc::new);
        self.cache.insert(key, raster.clone());
        Ok(raster)
    }

    fn render_uncached(
        &self,
        text: &str,
        color: [u8; 4],
        font_size: f64,
    ) -> PlanevizResult<Option<TextRaster>> {
        let pad = (font_size * 0.25).ceil();
        let height = (font_size * 1.4).ceil() + 2.0 * pad;
        let baseline = pad + font_size;
        // Generous guess; trimmed to the inked columns below.
        let width = (text.chars().count() as f64 * font_size * 0.75).ceil() + 2.0 * pad;

        let [r, g, b, a] = color;
        let svg = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                r#"<text x="{pad}" y="{baseline}" font-family="sans-serif" font-size="{size}" "#,
                r#"fill="rgb({r},{g},{b})" fill-opacity="{alpha}">{text}</text></svg>"#
            ),
            w = width,
            h = height,
            pad = pad,
            baseline = baseline,
            size = font_size,
            r = r,
            g = g,
            b = b,
            alpha = f64::from(a) / 255.0,
            text = escape_xml(text),
        );

        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .with_context(|| format!("parse text svg for '{text}'"))?;

        let (w, h) = (width as u32, height as u32);
        let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| PlanevizError::render("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        Ok(trim_columns(pixmap.data(), w, h, pad as u32).map(|(width, data)| TextRaster {
            width,
            height: h,
            baseline,
            data,
        }))
    }
}

/// Drop empty columns right of the last inked one, keeping `pad` columns of margin.
fn trim_columns(data: &[u8], width: u32, height: u32, pad: u32) -> Option<(u32, Vec<u8>)> {
    let stride = width as usize * 4;
    let last_inked = (0..width as usize).rev().find(|&x| {
        (0..height as usize).any(|y| data[y * stride + x * 4 + 3] != 0)
    })?;
    let new_width = (last_inked as u32 + 1 + pad).min(width);
    let row = new_width as usize * 4;
    let mut out = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        out.extend_from_slice(&data[y * stride..y * stride + row]);
    }
    Some((new_width, out))
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s.as_str()),
                })
                .collect::<Vec<_>>();
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            // Fall back to the first face.
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
