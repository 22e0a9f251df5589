use super::*;
use crate::foundation::core::BoundingBox;
use crate::grid::mask::Mask;
use std::sync::Arc;

fn grid(rows: &[Vec<f64>]) -> UniformGrid {
    let bbox = BoundingBox::new([0.0, 0.0], [1.0, 1.0]).unwrap();
    UniformGrid::from_rows(bbox, rows).unwrap()
}

#[test]
fn log10_of_power_of_ten() {
    let g = grid(&[vec![100.0, 1.0], vec![0.001, 10.0]]);
    let out = logarithm(&g, LogDomainPolicy::default()).unwrap();
    let expected = [2.0, 0.0, -3.0, 1.0];
    for (got, want) in out.values().iter().zip(expected) {
        assert!((got - want).abs() < 1e-12, "{got} != {want}");
    }
}

#[test]
fn absolute_then_log_handles_negative_values() {
    let g = grid(&[vec![-100.0]]);
    let t = FieldTransform {
        absolute: true,
        log10: true,
        ..FieldTransform::default()
    };
    let out = t.apply(&g).unwrap();
    assert!((out.value(0, 0) - 2.0).abs() < 1e-12);
    assert!((t.apply_value(-100.0).unwrap() - 2.0).abs() < 1e-12);
}

#[test]
fn default_policy_maps_non_positive_to_negative_infinity() {
    let g = grid(&[vec![0.0, -5.0]]);
    let out = logarithm(&g, LogDomainPolicy::default()).unwrap();
    assert_eq!(out.values(), &[f64::NEG_INFINITY, f64::NEG_INFINITY]);

    let out = logarithm(&g, LogDomainPolicy::Sentinel(-30.0)).unwrap();
    assert_eq!(out.values(), &[-30.0, -30.0]);
}

#[test]
fn nan_input_follows_the_log_domain_policy() {
    let g = grid(&[vec![f64::NAN, 10.0]]);
    let out = logarithm(&g, LogDomainPolicy::default()).unwrap();
    assert_eq!(out.value(0, 0), f64::NEG_INFINITY);
    assert_eq!(out.value(0, 1), 1.0);

    let out = logarithm(&g, LogDomainPolicy::Sentinel(-30.0)).unwrap();
    assert_eq!(out.value(0, 0), -30.0);

    let abs_log = FieldTransform {
        absolute: true,
        log10: true,
        ..FieldTransform::default()
    };
    assert_eq!(abs_log.apply_value(f64::NAN).unwrap(), f64::NEG_INFINITY);

    let err = logarithm(&g, LogDomainPolicy::Strict).unwrap_err();
    assert!(matches!(err, PlanevizError::UndefinedTransform(_)));
    assert!(err.to_string().contains("NaN"), "{err}");
}

#[test]
fn strict_policy_raises_on_valid_cells_only() {
    let g = grid(&[vec![1.0, 0.0], vec![-2.0, 10.0]]);
    let err = logarithm(&g, LogDomainPolicy::Strict).unwrap_err();
    assert!(matches!(err, PlanevizError::UndefinedTransform(_)));

    let mask = Arc::new(Mask::from_cells([2, 2], vec![true, false, false, true]).unwrap());
    let masked = g.masked(&mask).unwrap();
    let out = logarithm(&masked, LogDomainPolicy::Strict).unwrap();
    assert_eq!(out.value(0, 0), 0.0);
    assert!(out.value(0, 1).is_nan());
    assert!(out.value(1, 0).is_nan());
    assert_eq!(out.value(1, 1), 1.0);
    assert_eq!(out.mask(), masked.mask());
}

#[test]
fn identity_transform_returns_equal_grid() {
    let g = grid(&[vec![-1.0, 2.0]]);
    let t = FieldTransform::identity();
    assert!(t.is_identity());
    assert_eq!(t.apply(&g).unwrap(), g);
}

#[test]
fn label_wraps_in_application_order() {
    let t = FieldTransform {
        absolute: true,
        log10: true,
        ..FieldTransform::default()
    };
    assert_eq!(t.label("rho_b"), "log10(abs(rho_b))");
    assert_eq!(FieldTransform::identity().label("rho_b"), "rho_b");
}

#[test]
fn transform_config_deserializes_with_defaults() {
    let t: FieldTransform = serde_json::from_str(r#"{"log10": true}"#).unwrap();
    assert!(t.log10);
    assert!(!t.absolute);
    assert_eq!(t.log_domain, LogDomainPolicy::default());

    let t: FieldTransform = serde_json::from_str(r#"{"log_domain": "strict"}"#).unwrap();
    assert_eq!(t.log_domain, LogDomainPolicy::Strict);

    let t: FieldTransform = serde_json::from_str(r#"{"log_domain": {"sentinel": -12.5}}"#).unwrap();
    assert_eq!(t.log_domain, LogDomainPolicy::Sentinel(-12.5));
}
