/// Evenly spaced samples over `[start, end]`, both ends inclusive.
///
/// A single sample sits at `start`. The last sample is exactly `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    (0..n).map(|k| linspace_at(start, end, n, k)).collect()
}

pub(crate) fn linspace_at(start: f64, end: f64, n: usize, k: usize) -> f64 {
    if n <= 1 {
        return start;
    }
    if k + 1 == n {
        return end;
    }
    start + (end - start) * (k as f64) / ((n - 1) as f64)
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
    v.round().clamp(0.0, 255.0) as u8
}

pub(crate) fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let a = u16::from(rgba[3]);
    [
        mul_div255_u16(u16::from(rgba[0]), a) as u8,
        mul_div255_u16(u16::from(rgba[1]), a) as u8,
        mul_div255_u16(u16::from(rgba[2]), a) as u8,
        rgba[3],
    ]
}

pub(crate) fn unpremul_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
