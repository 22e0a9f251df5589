use crate::foundation::error::PlanevizError;
use crate::foundation::math::lerp_u8;
use crate::grid::uniform::UniformGrid;
use std::str::FromStr;

/// Built-in color maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColormapName {
    /// Perceptually uniform black-red-yellow.
    #[default]
    Inferno,
    /// Perceptually uniform blue-green-yellow.
    Viridis,
    /// Black to white.
    Gray,
}

impl FromStr for ColormapName {
    type Err = PlanevizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inferno" => Ok(Self::Inferno),
            "viridis" => Ok(Self::Viridis),
            "gray" | "grey" => Ok(Self::Gray),
            other => Err(PlanevizError::validation(format!(
                "unknown colormap '{other}' (expected inferno, viridis or gray)"
            ))),
        }
    }
}

// Evenly spaced control points sampled from the matplotlib tables.
const INFERNO: [[u8; 3]; 10] = [
    [0x00, 0x00, 0x04],
    [0x1b, 0x0c, 0x41],
    [0x4a, 0x0c, 0x6b],
    [0x78, 0x1c, 0x6d],
    [0xa5, 0x2c, 0x60],
    [0xcf, 0x44, 0x46],
    [0xed, 0x69, 0x25],
    [0xfb, 0x9b, 0x06],
    [0xf7, 0xd1, 0x3d],
    [0xfc, 0xff, 0xa4],
];

const VIRIDIS: [[u8; 3]; 10] = [
    [0x44, 0x01, 0x54],
    [0x48, 0x28, 0x78],
    [0x3e, 0x49, 0x89],
    [0x31, 0x68, 0x8e],
    [0x26, 0x82, 0x8e],
    [0x1f, 0x9e, 0x89],
    [0x35, 0xb7, 0x79],
    [0x6e, 0xce, 0x58],
    [0xb5, 0xde, 0x2b],
    [0xfd, 0xe7, 0x25],
];

const GRAY: [[u8; 3]; 2] = [[0, 0, 0], [255, 255, 255]];

/// A 256-entry RGB lookup table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Colormap {
    lut: Box<[[u8; 3]; 256]>,
}

impl Colormap {
    /// Build the table of a built-in map.
    pub fn new(name: ColormapName) -> Self {
        Self::from_anchors(match name {
            ColormapName::Inferno => &INFERNO[..],
            ColormapName::Viridis => &VIRIDIS[..],
            ColormapName::Gray => &GRAY[..],
        })
    }

    /// Build a table by linear interpolation between evenly spaced anchors.
    ///
    /// The first and last entries equal the first and last anchors.
    pub fn from_anchors(anchors: &[[u8; 3]]) -> Self {
        let mut lut = Box::new([[0u8; 3]; 256]);
        match anchors {
            [] => {}
            [only] => lut.fill(*only),
            _ => {
                let segments = (anchors.len() - 1) as f64;
                for (i, entry) in lut.iter_mut().enumerate() {
                    let pos = (i as f64 / 255.0) * segments;
                    let k = (pos.floor() as usize).min(anchors.len() - 2);
                    let t = pos - k as f64;
                    let (a, b) = (anchors[k], anchors[k + 1]);
                    *entry = [
                        lerp_u8(a[0], b[0], t),
                        lerp_u8(a[1], b[1], t),
                        lerp_u8(a[2], b[2], t),
                    ];
                }
            }
        }
        Self { lut }
    }

    /// The table.
    pub fn lut(&self) -> &[[u8; 3]; 256] {
        &self.lut
    }

    /// Color at `t` in `[0, 1]` (clamped; NaN maps to the low end).
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        self.lut[(t * 255.0).round() as usize]
    }
}

/// Linear mapping of data values onto `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalize {
    /// Value mapped to `0`.
    pub vmin: f64,
    /// Value mapped to `1`.
    pub vmax: f64,
}

impl Normalize {
    /// Resolve the display range of `grid`: explicit bounds win, the rest come from the valid
    /// finite values. A grid without such values falls back to `[0, 1]`.
    ///
    /// A data bound never crosses an explicit one; when they would, the range collapses onto
    /// the explicit bound and [`Normalize::apply`] clamps the data to one end.
    pub fn for_grid(grid: &UniformGrid, vmin: Option<f64>, vmax: Option<f64>) -> Self {
        let (lo, hi) = grid.finite_range().unwrap_or((0.0, 1.0));
        let (vmin, vmax) = match (vmin, vmax) {
            (Some(a), Some(b)) => (a, b),
            (Some(a), None) => (a, hi.max(a)),
            (None, Some(b)) => (lo.min(b), b),
            (None, None) => (lo, hi),
        };
        Self { vmin, vmax }
    }

    /// Position of `v` in the range.
    ///
    /// A degenerate range maps values below it to `0`, above it to `1` and on it to `0.5`.
    pub fn apply(&self, v: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span > 0.0 {
            (v - self.vmin) / span
        } else if v < self.vmin {
            0.0
        } else if v > self.vmax {
            1.0
        } else {
            0.5
        }
    }
}

/// Straight RGBA8 color of every cell of `grid`, flat index order.
///
/// Masked and non-finite cells get `bad_color`.
pub fn colorize(
    grid: &UniformGrid,
    colormap: &Colormap,
    norm: Normalize,
    bad_color: [u8; 4],
) -> Vec<[u8; 4]> {
    grid
        .values()
        .iter()
        .enumerate()
        .map(|(idx, &v)| {
            if !grid.is_valid_flat(idx) || !v.is_finite() {
                bad_color
            } else {
                let [r, g, b] = colormap.sample(norm.apply(v));
                [r, g, b, 255]
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/colormap.rs"]
mod tests;
