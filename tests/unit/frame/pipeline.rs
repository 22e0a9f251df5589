use super::*;
use crate::foundation::core::{BoundingBox, Resolution};
use crate::grid::transform::{FieldTransform, LogDomainPolicy};
use crate::source::dataset::SnapshotDef;
use crate::source::memory::{Horizon, HorizonShape, MemorySource};
use crate::source::snapshot::UniformPatch;

fn patch(f: impl FnMut([f64; 2]) -> f64) -> UniformPatch {
    UniformPatch::from_fn([-2.0, -2.0], [0.5, 0.5], [9, 9], f).unwrap()
}

fn source(iterations: &[u64]) -> MemorySource {
    let mut src = MemorySource::new();
    for &it in iterations {
        let t = it as f64 * 0.1;
        src.insert(
            Plane::Xy,
            "rho",
            SnapshotDef::uniform(Iteration(it), t, patch(|[x, y]| x * x + y * y - 1.0)),
        );
        src.insert(
            Plane::Xy,
            "vx",
            SnapshotDef::uniform(Iteration(it), t, patch(|[_, y]| -y)),
        );
        src.insert(
            Plane::Xy,
            "vy",
            SnapshotDef::uniform(Iteration(it), t, patch(|[x, _]| x)),
        );
    }
    src
}

fn config() -> PipelineConfig {
    PipelineConfig::new(
        Plane::Xy,
        "rho",
        "v",
        BoundingBox::new([-1.0, -1.0], [1.0, 1.0]).unwrap(),
        Resolution::square(5).unwrap(),
    )
}

#[test]
fn frame_releases_caches_on_success() {
    let src = source(&[0, 1]);
    let pipeline = FramePipeline::setup(&src, config()).unwrap();
    let spec = pipeline.frame(Iteration(1)).unwrap();
    assert_eq!(spec.iteration(), Iteration(1));
    assert_eq!(src.cached_snapshots(), 0);
}

#[test]
fn frame_releases_caches_on_failure() {
    let src = source(&[0]);
    let mut cfg = config();
    cfg.transform = FieldTransform {
        absolute: false,
        log10: true,
        log_domain: LogDomainPolicy::Strict,
    };
    let pipeline = FramePipeline::setup(&src, cfg).unwrap();
    let err = pipeline.frame(Iteration(0)).unwrap_err();
    assert_eq!(err.frame_context(), Some((Iteration(0), Stage::Transform)));
    assert!(matches!(err.root(), PlanevizError::UndefinedTransform(_)));
    assert_eq!(src.cached_snapshots(), 0);
}

#[test]
fn unknown_iteration_is_a_fetch_error() {
    let src = source(&[0]);
    let pipeline = FramePipeline::setup(&src, config()).unwrap();
    let err = pipeline.frame(Iteration(3)).unwrap_err();
    assert_eq!(err.frame_context(), Some((Iteration(3), Stage::Fetch)));
}

#[test]
fn out_of_domain_is_tagged_with_resample_stage() {
    let src = source(&[0]);
    let mut cfg = config();
    cfg.bbox = BoundingBox::new([50.0, 50.0], [60.0, 60.0]).unwrap();
    let pipeline = FramePipeline::setup(&src, cfg).unwrap();
    let err = pipeline.frame(Iteration(0)).unwrap_err();
    assert_eq!(err.frame_context(), Some((Iteration(0), Stage::Resample)));
    assert!(matches!(err.root(), PlanevizError::OutOfDomain(_)));
    assert!(err.to_string().starts_with("iteration 0: resample failed"));
    assert_eq!(src.cached_snapshots(), 0);
}

#[test]
fn mask_is_shared_by_all_three_grids() {
    let src = source(&[0]);
    let mut cfg = config();
    cfg.mask_threshold = Some(0.0);
    let spec = FramePipeline::setup(&src, cfg)
        .unwrap()
        .frame(Iteration(0))
        .unwrap();
    let mask = spec.scalar().mask().unwrap();
    assert!(Arc::ptr_eq(mask, spec.vector_x().mask().unwrap()));
    assert!(Arc::ptr_eq(mask, spec.vector_y().mask().unwrap()));
    // rho = r^2 - 1: the centre is below the threshold, the corners are not.
    assert!(!mask.is_valid(2, 2));
    assert!(mask.is_valid(0, 0));
    assert!(mask.is_valid(2, 0));
}

#[test]
fn overlays_need_both_source_and_flag() {
    let mut src = source(&[0]);
    src.add_horizon(Horizon {
        label: "AH".to_owned(),
        shapes: vec![HorizonShape {
            iteration: Iteration(0),
            plane: Plane::Xy,
            points: vec![[0.0, 0.5], [0.5, 0.0], [0.0, -0.5]],
        }],
    });

    let without_flag = FramePipeline::setup(&src, config())
        .unwrap()
        .with_overlays(&src);
    assert!(without_flag.frame(Iteration(0)).unwrap().outlines().is_empty());

    let mut cfg = config();
    cfg.overlays = true;
    let with_flag = FramePipeline::setup(&src, cfg).unwrap().with_overlays(&src);
    assert_eq!(with_flag.frame(Iteration(0)).unwrap().outlines().len(), 1);
}

#[test]
fn annotation_and_label_follow_time_and_transform() {
    let src = source(&[12]);
    let mut cfg = config();
    cfg.transform.absolute = true;
    let spec = FramePipeline::setup(&src, cfg)
        .unwrap()
        .frame(Iteration(12))
        .unwrap();
    assert_eq!(spec.annotation(), Some("t = 1.200"));
    assert_eq!(spec.label(), "abs(rho)");
}

#[test]
fn window_limits_frames() {
    let src = source(&[0, 10, 20, 30, 40]);
    let mut cfg = config();
    cfg.window.min = Some(Iteration(10));
    cfg.window.every = 2;
    let pipeline = FramePipeline::setup(&src, cfg).unwrap();
    assert_eq!(
        pipeline.iterations().collect::<Vec<_>>(),
        vec![Iteration(10), Iteration(30)]
    );
    assert_eq!(pipeline.len(), 2);
    assert!(pipeline.frame(Iteration(20)).is_err());
}
