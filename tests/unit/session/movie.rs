use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::{BoundingBox, Canvas, Plane, Resolution};
use crate::frame::config::PipelineConfig;
use crate::grid::uniform::{GridCoordinates, UniformGrid};
use crate::render::style::{ColorMapOpts, Corner, OutlineStyle, StreamlineOpts};
use crate::source::dataset::SnapshotDef;
use crate::source::memory::{MemorySource, Outline};
use crate::source::snapshot::UniformPatch;

/// Records layer calls and returns a frame filled with the iteration-dependent mean value.
#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
    fail_on_color_map: bool,
    mean: f64,
}

impl FrameRenderer for Recorder {
    fn begin(&mut self, geometry: &FrameGeometry) -> PlanevizResult<()> {
        self.calls.push(format!("begin {}", geometry.label));
        Ok(())
    }

    fn color_map(&mut self, grid: &UniformGrid, _opts: &ColorMapOpts) -> PlanevizResult<()> {
        if self.fail_on_color_map {
            return Err(PlanevizError::render("boom"));
        }
        self.mean = grid.values().iter().sum::<f64>() / grid.values().len() as f64;
        self.calls.push("color_map".to_owned());
        Ok(())
    }

    fn streamlines(
        &mut self,
        _coords: &GridCoordinates,
        _vx: &UniformGrid,
        _vy: &UniformGrid,
        _opts: &StreamlineOpts,
    ) -> PlanevizResult<()> {
        self.calls.push("streamlines".to_owned());
        Ok(())
    }

    fn outline(&mut self, outline: &Outline, _style: &OutlineStyle) -> PlanevizResult<()> {
        self.calls.push(format!("outline {}", outline.label));
        Ok(())
    }

    fn text(&mut self, text: &str, _corner: Corner) -> PlanevizResult<()> {
        self.calls.push(format!("text {text}"));
        Ok(())
    }

    fn finish(&mut self) -> PlanevizResult<FrameRGBA> {
        self.calls.push("finish".to_owned());
        let v = self.mean.round().clamp(0.0, 255.0) as u8;
        Ok(FrameRGBA {
            width: 4,
            height: 2,
            data: vec![v; 32],
            premultiplied: true,
        })
    }
}

fn source(iterations: &[u64]) -> MemorySource {
    let mut src = MemorySource::new();
    for &it in iterations {
        let patch = |v: f64| UniformPatch::from_fn([0.0, 0.0], [1.0, 1.0], [3, 3], move |_| v).unwrap();
        let t = it as f64;
        src.insert(Plane::Xy, "rho", SnapshotDef::uniform(Iteration(it), t, patch(it as f64)));
        src.insert(Plane::Xy, "vx", SnapshotDef::uniform(Iteration(it), t, patch(1.0)));
        src.insert(Plane::Xy, "vy", SnapshotDef::uniform(Iteration(it), t, patch(0.0)));
    }
    src
}

fn style() -> RenderStyle {
    RenderStyle {
        canvas: Canvas {
            width: 4,
            height: 2,
        },
        ..RenderStyle::default()
    }
}

fn config() -> PipelineConfig {
    PipelineConfig::new(
        Plane::Xy,
        "rho",
        "v",
        BoundingBox::new([0.0, 0.0], [2.0, 2.0]).unwrap(),
        Resolution::square(3).unwrap(),
    )
}

#[test]
fn render_frame_spec_draws_layers_in_order() {
    let src = source(&[2]);
    let pipeline = FramePipeline::setup(&src, config()).unwrap();
    let spec = pipeline.frame(Iteration(2)).unwrap();
    let mut r = Recorder::default();
    let frame = render_frame_spec(&mut r, &spec, &style()).unwrap();
    assert_eq!(frame.data[0], 2);
    assert_eq!(
        r.calls,
        ["begin rho", "color_map", "streamlines", "text t = 2.000", "finish"]
    );

    let mut quiet = style();
    quiet.streamlines.enabled = false;
    quiet.annotation = false;
    let mut r = Recorder::default();
    render_frame_spec(&mut r, &spec, &quiet).unwrap();
    assert_eq!(r.calls, ["begin rho", "color_map", "finish"]);
}

#[test]
fn render_range_streams_every_iteration_in_order() {
    let src = source(&[0, 10, 20]);
    let pipeline = FramePipeline::setup(&src, config()).unwrap();
    let session = MovieSession::new(pipeline, style()).unwrap();
    let mut sink = InMemorySink::new();
    let stats = session
        .render_range(&mut Recorder::default(), &mut sink, Fps::new(30, 1).unwrap())
        .unwrap();

    assert_eq!(
        stats,
        MovieStats {
            frames_total: 3,
            frames_rendered: 3,
            first: Some(Iteration(0)),
            last: Some(Iteration(20)),
        }
    );
    assert!(sink.is_ended());
    assert_eq!(sink.config().unwrap().fps, Fps::new(30, 1).unwrap());
    let values = sink
        .frames()
        .iter()
        .map(|(it, f)| (it.0, f.data[0]))
        .collect::<Vec<_>>();
    assert_eq!(values, [(0, 0), (10, 10), (20, 20)]);
    assert_eq!(src.cached_snapshots(), 0);
}

#[test]
fn render_errors_carry_iteration_and_stage() {
    let src = source(&[0, 1]);
    let pipeline = FramePipeline::setup(&src, config()).unwrap();
    let session = MovieSession::new(pipeline, style()).unwrap();
    let mut sink = InMemorySink::new();
    let mut r = Recorder {
        fail_on_color_map: true,
        ..Recorder::default()
    };
    let err = session
        .render_range(&mut r, &mut sink, Fps::default())
        .unwrap_err();
    assert_eq!(err.frame_context(), Some((Iteration(0), Stage::Render)));
    assert!(sink.frames().is_empty());
    assert!(sink.is_ended());
    assert_eq!(src.cached_snapshots(), 0);
}

#[test]
fn sink_errors_are_tagged_as_encode() {
    let src = source(&[0]);
    let pipeline = FramePipeline::setup(&src, config()).unwrap();
    // The recorder always returns 4x2 frames; a different canvas makes the sink reject them.
    let mut big = style();
    big.canvas = Canvas {
        width: 8,
        height: 8,
    };
    let session = MovieSession::new(pipeline, big).unwrap();
    let err = session
        .render_range(&mut Recorder::default(), &mut InMemorySink::new(), Fps::default())
        .unwrap_err();
    assert_eq!(err.frame_context(), Some((Iteration(0), Stage::Encode)));
    assert!(err.to_string().starts_with("iteration 0: encode failed"));
}

#[test]
fn empty_window_is_rejected() {
    let src = source(&[0, 1]);
    let mut cfg = config();
    cfg.window.min = Some(Iteration(5));
    let pipeline = FramePipeline::setup(&src, cfg).unwrap();
    let session = MovieSession::new(pipeline, style()).unwrap();
    let err = session
        .render_range(&mut Recorder::default(), &mut InMemorySink::new(), Fps::default())
        .unwrap_err();
    assert!(matches!(err, PlanevizError::Validation(_)));
}
