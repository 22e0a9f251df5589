use super::*;
use crate::foundation::core::BoundingBox;
use crate::grid::mask::Mask;
use std::sync::Arc;

fn grid(rows: &[Vec<f64>]) -> UniformGrid {
    let bbox = BoundingBox::new([0.0, 0.0], [1.0, 1.0]).unwrap();
    UniformGrid::from_rows(bbox, rows).unwrap()
}

#[test]
fn lut_endpoints_match_anchors() {
    let inferno = Colormap::new(ColormapName::Inferno);
    assert_eq!(inferno.lut()[0], [0x00, 0x00, 0x04]);
    assert_eq!(inferno.lut()[255], [0xfc, 0xff, 0xa4]);
    let viridis = Colormap::new(ColormapName::Viridis);
    assert_eq!(viridis.lut()[0], [0x44, 0x01, 0x54]);
    assert_eq!(viridis.lut()[255], [0xfd, 0xe7, 0x25]);
    let gray = Colormap::new(ColormapName::Gray);
    assert!(gray.lut().iter().enumerate().all(|(i, c)| *c == [i as u8; 3]));
}

#[test]
fn sample_clamps_and_handles_nan() {
    let gray = Colormap::new(ColormapName::Gray);
    assert_eq!(gray.sample(-1.0), [0, 0, 0]);
    assert_eq!(gray.sample(2.0), [255, 255, 255]);
    assert_eq!(gray.sample(f64::NAN), [0, 0, 0]);
    assert_eq!(gray.sample(0.5), [128, 128, 128]);
}

#[test]
fn names_parse_case_insensitively() {
    assert_eq!("Inferno".parse::<ColormapName>().unwrap(), ColormapName::Inferno);
    assert_eq!("grey".parse::<ColormapName>().unwrap(), ColormapName::Gray);
    assert!(matches!(
        "jet".parse::<ColormapName>(),
        Err(PlanevizError::Validation(_))
    ));
}

#[test]
fn normalize_uses_valid_finite_range() {
    let g = grid(&[vec![1.0, f64::NEG_INFINITY], vec![3.0, 100.0]]);
    let mask = Arc::new(Mask::from_cells([2, 2], vec![true, true, true, false]).unwrap());
    let g = g.masked(&mask).unwrap();
    let n = Normalize::for_grid(&g, None, None);
    assert_eq!((n.vmin, n.vmax), (1.0, 3.0));
    assert_eq!(n.apply(2.0), 0.5);

    let n = Normalize::for_grid(&g, Some(0.0), None);
    assert_eq!((n.vmin, n.vmax), (0.0, 3.0));

    let flat = Normalize { vmin: 2.0, vmax: 2.0 };
    assert_eq!(flat.apply(2.0), 0.5);
    assert_eq!(flat.apply(7.0), 1.0);
    assert_eq!(flat.apply(-1.0), 0.0);
}

#[test]
fn one_sided_bound_outside_the_data_clamps() {
    let g = grid(&[vec![1.0, 5.0], vec![2.0, 3.0]]);

    let above = Normalize::for_grid(&g, Some(10.0), None);
    assert_eq!((above.vmin, above.vmax), (10.0, 10.0));
    assert!(g.values().iter().all(|&v| above.apply(v) <= 0.0));

    let below = Normalize::for_grid(&g, None, Some(0.0));
    assert_eq!((below.vmin, below.vmax), (0.0, 0.0));
    assert!(g.values().iter().all(|&v| below.apply(v) >= 1.0));

    // A bound inside the data keeps the other end from the data.
    let inside = Normalize::for_grid(&g, None, Some(4.0));
    assert_eq!((inside.vmin, inside.vmax), (1.0, 4.0));
    assert_eq!(inside.apply(5.0), 4.0 / 3.0);

    let gray = Colormap::new(ColormapName::Gray);
    let colors = colorize(&g, &gray, above, [255, 0, 0, 255]);
    assert!(colors.iter().all(|c| *c == [0, 0, 0, 255]));
}

#[test]
fn colorize_paints_masked_and_non_finite_cells_bad() {
    let g = grid(&[vec![0.0, f64::NAN], vec![1.0, 0.5]]);
    let mask = Arc::new(Mask::from_cells([2, 2], vec![true, true, true, false]).unwrap());
    let g = g.masked(&mask).unwrap();
    let gray = Colormap::new(ColormapName::Gray);
    let bad = [255, 0, 0, 255];
    let colors = colorize(&g, &gray, Normalize { vmin: 0.0, vmax: 1.0 }, bad);
    assert_eq!(
        colors,
        vec![[0, 0, 0, 255], bad, [255, 255, 255, 255], bad]
    );
}
