use std::{fmt, str::FromStr};

use crate::foundation::error::{PlanevizError, PlanevizResult};

pub use kurbo::{Point, Rect};

/// Simulation iteration identifier (the frame key of a movie).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Iteration(pub u64);

impl fmt::Display for Iteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fixed 2D coordinate slice through the 3D simulation domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// The `z = 0` slice.
    Xy,
    /// The `y = 0` slice.
    Xz,
    /// The `x = 0` slice.
    Yz,
}

impl Plane {
    /// Axis labels of the two in-plane directions, in grid order.
    pub fn axes(self) -> [&'static str; 2] {
        match self {
            Self::Xy => ["x", "y"],
            Self::Xz => ["x", "z"],
            Self::Yz => ["y", "z"],
        }
    }

    /// Lowercase plane name (`"xy"`, `"xz"`, `"yz"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xy => "xy",
            Self::Xz => "xz",
            Self::Yz => "yz",
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plane {
    type Err = PlanevizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xy" => Ok(Self::Xy),
            "xz" => Ok(Self::Xz),
            "yz" => Ok(Self::Yz),
            other => Err(PlanevizError::validation(format!(
                "unknown plane '{other}' (expected xy, xz or yz)"
            ))),
        }
    }
}

/// Axis-aligned box given by its lower-left `origin` and upper-right `extent`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// Lower-left corner.
    pub origin: [f64; 2],
    /// Upper-right corner.
    pub extent: [f64; 2],
}

impl BoundingBox {
    /// Create a validated box (finite corners, `origin <= extent` componentwise).
    pub fn new(origin: [f64; 2], extent: [f64; 2]) -> PlanevizResult<Self> {
        let bbox = Self { origin, extent };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the box invariants.
    pub fn validate(&self) -> PlanevizResult<()> {
        if !self.origin.iter().chain(self.extent.iter()).all(|v| v.is_finite()) {
            return Err(PlanevizError::validation(
                "bounding box corners must be finite",
            ));
        }
        if self.origin[0] > self.extent[0] || self.origin[1] > self.extent[1] {
            return Err(PlanevizError::validation(format!(
                "bounding box origin {:?} must be <= extent {:?} componentwise",
                self.origin, self.extent
            )));
        }
        Ok(())
    }

    /// Box size along both axes.
    pub fn size(&self) -> [f64; 2] {
        [
            self.extent[0] - self.origin[0],
            self.extent[1] - self.origin[1],
        ]
    }

    /// `true` when `p` lies inside the closed box.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        (self.origin[0]..=self.extent[0]).contains(&p[0])
            && (self.origin[1]..=self.extent[1]).contains(&p[1])
    }

    /// `true` when the closed boxes share at least one point.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.origin[0] <= other.extent[0]
            && other.origin[0] <= self.extent[0]
            && self.origin[1] <= other.extent[1]
            && other.origin[1] <= self.extent[1]
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            origin: [
                self.origin[0].min(other.origin[0]),
                self.origin[1].min(other.origin[1]),
            ],
            extent: [
                self.extent[0].max(other.extent[0]),
                self.extent[1].max(other.extent[1]),
            ],
        }
    }

    /// The box as a `kurbo` rectangle in simulation coordinates.
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.origin[0], self.origin[1], self.extent[0], self.extent[1])
    }
}

/// Number of samples along each grid axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Resolution(pub [usize; 2]);

impl Resolution {
    /// Create a validated resolution (both components >= 1).
    pub fn new(nx: usize, ny: usize) -> PlanevizResult<Self> {
        let res = Self([nx, ny]);
        res.validate()?;
        Ok(res)
    }

    /// Same number of samples along both axes.
    pub fn square(n: usize) -> PlanevizResult<Self> {
        Self::new(n, n)
    }

    /// Check that both components are positive.
    pub fn validate(&self) -> PlanevizResult<()> {
        if self.0[0] == 0 || self.0[1] == 0 {
            return Err(PlanevizError::validation(format!(
                "resolution components must be >= 1, got {:?}",
                self.0
            )));
        }
        Ok(())
    }

    /// Total number of samples.
    pub fn cells(self) -> usize {
        self.0[0] * self.0[1]
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated rational FPS value.
    pub fn new(num: u32, den: u32) -> PlanevizResult<Self> {
        if den == 0 {
            return Err(PlanevizError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PlanevizError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert FPS to floating-point frames/second.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 24, den: 1 }
    }
}

/// Output image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
