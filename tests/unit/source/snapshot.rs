use super::*;

#[test]
fn patch_bounds_extend_half_a_spacing() {
    let p = UniformPatch::new([0.0, 10.0], [1.0, 2.0], [3, 2], vec![0.0; 6]).unwrap();
    let b = p.bounds();
    assert_eq!(b.origin, [-0.5, 9.0]);
    assert_eq!(b.extent, [2.5, 13.0]);
    assert!(p.contains([2.5, 13.0]));
    assert!(!p.contains([2.6, 12.0]));
}

#[test]
fn patch_validation() {
    assert!(matches!(
        UniformPatch::new([0.0, 0.0], [1.0, 1.0], [2, 2], vec![0.0; 3]).unwrap_err(),
        PlanevizError::ShapeMismatch(_)
    ));
    assert!(matches!(
        UniformPatch::new([0.0, 0.0], [0.0, 1.0], [2, 2], vec![0.0; 4]).unwrap_err(),
        PlanevizError::Validation(_)
    ));
    assert!(matches!(
        UniformPatch::new([0.0, 0.0], [1.0, 1.0], [0, 2], vec![]).unwrap_err(),
        PlanevizError::Validation(_)
    ));
}

#[test]
fn nearest_evaluation_clamps_to_edge_samples() {
    let p = UniformPatch::from_fn([0.0, 0.0], [1.0, 1.0], [3, 3], |[x, y]| x + 10.0 * y).unwrap();
    assert_eq!(p.evaluate([0.4, 0.6], ResampleMethod::Nearest), 10.0);
    assert_eq!(p.evaluate([-0.4, 2.4], ResampleMethod::Nearest), 20.0);
    assert_eq!(p.evaluate([2.5, 2.5], ResampleMethod::Multilinear), 22.0);
}

#[test]
fn single_sample_patch_is_constant() {
    let p = UniformPatch::new([1.0, 1.0], [0.5, 0.5], [1, 1], vec![3.0]).unwrap();
    assert_eq!(p.evaluate([1.2, 0.8], ResampleMethod::Multilinear), 3.0);
    assert_eq!(p.evaluate([1.2, 0.8], ResampleMethod::Nearest), 3.0);
}

#[test]
fn hierarchical_covered_region_is_union_of_patches() {
    let a = UniformPatch::new([0.0, 0.0], [1.0, 1.0], [2, 2], vec![1.0; 4]).unwrap();
    let b = UniformPatch::new([5.0, -3.0], [1.0, 1.0], [2, 2], vec![2.0; 4]).unwrap();
    let snap = HierarchicalSnapshot::new(
        vec![RefinementLevel {
            patches: vec![a, b],
        }],
        4.0,
        -9.0,
    )
    .unwrap();
    let c = snap.covered_region();
    assert_eq!(c.origin, [-0.5, -3.5]);
    assert_eq!(c.extent, [6.5, 1.5]);
    assert_eq!(snap.time(), 4.0);
    // Inside the union box but on no patch.
    assert_eq!(snap.sample([3.0, 0.0], ResampleMethod::Nearest), -9.0);
    assert_eq!(snap.sample([5.0, -3.0], ResampleMethod::Nearest), 2.0);
}

#[test]
fn finest_patch_lookup_reports_level() {
    let coarse = UniformPatch::new([0.0, 0.0], [1.0, 1.0], [4, 4], vec![1.0; 16]).unwrap();
    let fine = UniformPatch::new([1.0, 1.0], [0.25, 0.25], [3, 3], vec![2.0; 9]).unwrap();
    let snap = HierarchicalSnapshot::new(
        vec![
            RefinementLevel {
                patches: vec![coarse],
            },
            RefinementLevel {
                patches: vec![fine],
            },
        ],
        0.0,
        0.0,
    )
    .unwrap();
    assert_eq!(snap.finest_patch_at([1.25, 1.25]).map(|(l, _)| l), Some(1));
    assert_eq!(snap.finest_patch_at([3.0, 0.0]).map(|(l, _)| l), Some(0));
    assert!(snap.finest_patch_at([9.0, 9.0]).is_none());
}

#[test]
fn empty_hierarchy_is_rejected() {
    assert!(matches!(
        HierarchicalSnapshot::new(vec![RefinementLevel::default()], 0.0, 0.0).unwrap_err(),
        PlanevizError::Validation(_)
    ));
}
