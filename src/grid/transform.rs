use crate::foundation::error::{PlanevizError, PlanevizResult};
use crate::grid::uniform::UniformGrid;

/// What the logarithm produces for non-positive (or NaN) input.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDomainPolicy {
    /// Raise [`PlanevizError::UndefinedTransform`] for valid cells; invalid cells become NaN.
    Strict,
    /// Replace the result with the given value.
    Sentinel(f64),
}

impl LogDomainPolicy {
    fn sentinel(self) -> f64 {
        match self {
            Self::Strict => f64::NAN,
            Self::Sentinel(v) => v,
        }
    }
}

impl Default for LogDomainPolicy {
    fn default() -> Self {
        Self::Sentinel(f64::NEG_INFINITY)
    }
}

/// Scalar display transform: optional absolute value, then optional base-10 logarithm.
///
/// The order is fixed. Both steps keep geometry and mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FieldTransform {
    /// Take the absolute value first.
    pub absolute: bool,
    /// Take `log10` second.
    pub log10: bool,
    /// Handling of non-positive logarithm input.
    pub log_domain: LogDomainPolicy,
}

impl FieldTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// `true` when neither step is enabled.
    pub fn is_identity(&self) -> bool {
        !self.absolute && !self.log10
    }

    /// Apply the enabled steps to `grid`.
    pub fn apply(&self, grid: &UniformGrid) -> PlanevizResult<UniformGrid> {
        let abs = if self.absolute {
            absolute_value(grid)
        } else {
            grid.clone()
        };
        if self.log10 {
            logarithm(&abs, self.log_domain)
        } else {
            Ok(abs)
        }
    }

    /// Apply the enabled steps to a single value taken as valid.
    pub fn apply_value(&self, v: f64) -> PlanevizResult<f64> {
        let v = if self.absolute { v.abs() } else { v };
        if self.log10 {
            log10_cell(v, true, self.log_domain)
        } else {
            Ok(v)
        }
    }

    /// Display label of `variable` after the transform, e.g. `log10(abs(rho_b))`.
    pub fn label(&self, variable: &str) -> String {
        let mut label = variable.to_owned();
        if self.absolute {
            label = format!("abs({label})");
        }
        if self.log10 {
            label = format!("log10({label})");
        }
        label
    }
}

/// `|v|` for every cell, keeping geometry and mask.
pub fn absolute_value(grid: &UniformGrid) -> UniformGrid {
    grid.map_values(|v, _| v.abs())
}

/// `log10(v)` for every cell, keeping geometry and mask.
///
/// Non-positive input follows `policy`. A cell flagged invalid never raises.
pub fn logarithm(grid: &UniformGrid, policy: LogDomainPolicy) -> PlanevizResult<UniformGrid> {
    grid.try_map_cells(|i, j, v, valid| {
        log10_cell(v, valid, policy).map_err(|_| {
            PlanevizError::undefined_transform(format!(
                "log10 of non-positive or NaN value {v} at cell ({i}, {j})"
            ))
        })
    })
}

// NaN fails `v > 0.0` and follows the policy like a non-positive value.
fn log10_cell(v: f64, valid: bool, policy: LogDomainPolicy) -> PlanevizResult<f64> {
    if v > 0.0 {
        return Ok(v.log10());
    }
    match policy {
        LogDomainPolicy::Strict if valid => Err(PlanevizError::undefined_transform(format!(
            "log10 of non-positive or NaN value {v}"
        ))),
        _ => Ok(policy.sentinel()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/transform.rs"]
mod tests;
