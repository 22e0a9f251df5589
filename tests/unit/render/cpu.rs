use super::*;
use crate::foundation::core::Resolution;
use crate::grid::mask::Mask;
use crate::render::colormap::ColormapName;
use std::sync::Arc;

fn style() -> RenderStyle {
    RenderStyle {
        canvas: Canvas {
            width: 200,
            height: 200,
        },
        font_size: 10.0,
        ..RenderStyle::default()
    }
}

fn unit_box() -> BoundingBox {
    BoundingBox::new([0.0, 0.0], [1.0, 1.0]).unwrap()
}

fn geometry(bbox: BoundingBox) -> FrameGeometry {
    FrameGeometry {
        bbox,
        axis_labels: ["x".to_owned(), "y".to_owned()],
        label: "rho".to_owned(),
    }
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(b).all(|(&x, y)| x.abs_diff(y) <= tol)
}

fn quadrant_centers(plot: Rect) -> [[u32; 2]; 4] {
    let (qx0, qx1) = (plot.x0 + plot.width() * 0.25, plot.x0 + plot.width() * 0.75);
    let (qy0, qy1) = (plot.y0 + plot.height() * 0.25, plot.y0 + plot.height() * 0.75);
    // bottom-left, top-left, bottom-right, top-right
    [
        [qx0 as u32, qy1 as u32],
        [qx0 as u32, qy0 as u32],
        [qx1 as u32, qy1 as u32],
        [qx1 as u32, qy0 as u32],
    ]
}

#[test]
fn layout_keeps_world_aspect() {
    let bbox = BoundingBox::new([0.0, 0.0], [2.0, 1.0]).unwrap();
    let layout = PlotLayout::compute(Canvas::default(), bbox, 16.0, false);
    let ratio = layout.plot.width() / layout.plot.height();
    assert!((ratio - 2.0).abs() < 0.01, "ratio {ratio}");
    assert!(layout.colorbar.is_none());

    let p = layout.to_pixel([0.0, 0.0]);
    assert_eq!((p.x, p.y), (layout.plot.x0, layout.plot.y1));
    let p = layout.to_pixel([2.0, 1.0]);
    assert_eq!((p.x, p.y), (layout.plot.x1, layout.plot.y0));

    let with_bar = PlotLayout::compute(Canvas::default(), bbox, 16.0, true);
    let bar = with_bar.colorbar.unwrap();
    assert!(bar.x0 > with_bar.plot.x1);
    assert!(bar.x1 <= 800.0);
}

#[test]
fn layers_require_begin() {
    let mut r = CpuRenderer::new(&style()).unwrap();
    let g = UniformGrid::new(unit_box(), Resolution::square(2).unwrap(), vec![0.0; 4]).unwrap();
    assert!(matches!(
        r.color_map(&g, &ColorMapOpts::default()),
        Err(PlanevizError::Render(_))
    ));
    assert!(matches!(r.finish(), Err(PlanevizError::Render(_))));
}

#[test]
fn background_fills_the_margins() {
    let mut r = CpuRenderer::new(&style()).unwrap();
    r.begin(&geometry(unit_box())).unwrap();
    let frame = r.finish().unwrap();
    assert_eq!((frame.width, frame.height), (200, 200));
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), 200 * 200 * 4);
    assert_eq!(frame.pixel(0, 0), [255, 255, 255, 255]);
    assert_eq!(frame.pixel(199, 0), [255, 255, 255, 255]);
}

#[test]
fn color_map_places_cells_and_bad_color() {
    let mut r = CpuRenderer::new(&style()).unwrap();
    r.begin(&geometry(unit_box())).unwrap();
    let plot = r.layout().unwrap().plot;

    let g = UniformGrid::from_rows(unit_box(), &[vec![0.0, 1.0], vec![0.5, 1.0]]).unwrap();
    let mask = Arc::new(Mask::from_cells([2, 2], vec![true, true, true, false]).unwrap());
    let g = g.masked(&mask).unwrap();
    let opts = ColorMapOpts {
        colormap: ColormapName::Gray,
        bad_color: [255, 0, 0, 255],
        ..ColorMapOpts::default()
    };
    r.color_map(&g, &opts).unwrap();
    let frame = r.finish().unwrap();

    let [bl, tl, br, tr] = quadrant_centers(plot);
    assert!(close(frame.pixel(bl[0], bl[1]), [0, 0, 0, 255], 1));
    assert!(close(frame.pixel(tl[0], tl[1]), [255, 255, 255, 255], 1));
    assert!(close(frame.pixel(br[0], br[1]), [128, 128, 128, 255], 1));
    assert!(close(frame.pixel(tr[0], tr[1]), [255, 0, 0, 255], 1));
}

#[test]
fn cells_are_centered_on_their_samples() {
    assert_eq!(cell_edges(1).collect::<Vec<_>>(), [0.0, 1.0]);
    assert_eq!(cell_edges(2).collect::<Vec<_>>(), [0.0, 0.5, 1.0]);
    assert_eq!(cell_edges(3).collect::<Vec<_>>(), [0.0, 0.25, 0.75, 1.0]);

    let mut r = CpuRenderer::new(&style()).unwrap();
    r.begin(&geometry(unit_box())).unwrap();
    let layout = *r.layout().unwrap();
    let plot = layout.plot;

    // Only the middle sample is bright; its cell spans [0.25, 0.75] of the plot.
    let g = UniformGrid::from_rows(
        unit_box(),
        &[
            vec![0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ],
    )
    .unwrap();
    let opts = ColorMapOpts {
        colormap: ColormapName::Gray,
        ..ColorMapOpts::default()
    };
    r.color_map(&g, &opts).unwrap();
    let frame = r.finish().unwrap();

    let center = layout.to_pixel([0.5, 0.5]);
    let cy = center.y as u32;
    let at = |f: f64| frame.pixel((plot.x0 + plot.width() * f) as u32, cy);
    assert!(close(frame.pixel(center.x as u32, cy), [255, 255, 255, 255], 1));
    assert!(close(at(0.3), [255, 255, 255, 255], 1));
    assert!(close(at(0.7), [255, 255, 255, 255], 1));
    assert!(close(at(0.2), [0, 0, 0, 255], 1));
    assert!(close(at(0.8), [0, 0, 0, 255], 1));
}

#[test]
fn outline_fill_respects_alpha() {
    let square = Outline {
        label: "bh".to_owned(),
        points: vec![[0.25, 0.25], [0.75, 0.25], [0.75, 0.75], [0.25, 0.75]],
    };
    let center = |r: &CpuRenderer| {
        let p = r.layout().unwrap().plot.center();
        (p.x as u32, p.y as u32)
    };

    let mut r = CpuRenderer::new(&style()).unwrap();
    r.begin(&geometry(unit_box())).unwrap();
    let (cx, cy) = center(&r);
    let opaque = OutlineStyle {
        fill: [0, 0, 255, 255],
        ..OutlineStyle::default()
    };
    r.outline(&square, &opaque).unwrap();
    let frame = r.finish().unwrap();
    assert!(close(frame.pixel(cx, cy), [0, 0, 255, 255], 1));

    r.begin(&geometry(unit_box())).unwrap();
    let half = OutlineStyle {
        alpha: 0.5,
        ..opaque
    };
    r.outline(&square, &half).unwrap();
    let frame = r.finish().unwrap();
    assert!(close(frame.pixel(cx, cy), [128, 128, 255, 255], 3));
}

#[test]
fn streamlines_draw_over_the_color_map() {
    let bright_in_plot = |enabled: bool| {
        let mut r = CpuRenderer::new(&style()).unwrap();
        r.begin(&geometry(unit_box())).unwrap();
        let plot = r.layout().unwrap().plot;
        let res = Resolution::square(16).unwrap();
        let zero = UniformGrid::from_fn(unit_box(), res, |_, _, _| 0.0).unwrap();
        let vx = UniformGrid::from_fn(unit_box(), res, |_, _, [_, y]| 1.0 + y).unwrap();
        let vy = UniformGrid::from_fn(unit_box(), res, |_, _, [x, _]| 0.5 - x).unwrap();
        let opts = ColorMapOpts {
            colormap: ColormapName::Gray,
            vmin: Some(0.0),
            vmax: Some(1.0),
            ..ColorMapOpts::default()
        };
        r.color_map(&zero, &opts).unwrap();
        let lines = StreamlineOpts {
            enabled,
            ..StreamlineOpts::default()
        };
        r.streamlines(&zero.coordinates(), &vx, &vy, &lines).unwrap();
        let frame = r.finish().unwrap();

        let mut count = 0;
        for y in (plot.y0 as u32 + 2)..(plot.y1 as u32 - 2) {
            for x in (plot.x0 as u32 + 2)..(plot.x1 as u32 - 2) {
                if frame.pixel(x, y)[0] > 128 {
                    count += 1;
                }
            }
        }
        count
    };
    assert_eq!(bright_in_plot(false), 0);
    assert!(bright_in_plot(true) > 50);
}

#[test]
fn nice_ticks_pick_round_steps() {
    let labels = |lo, hi| {
        nice_ticks(lo, hi, 5)
            .into_iter()
            .map(|(_, l)| l)
            .collect::<Vec<_>>()
    };
    assert_eq!(labels(0.0, 1.0), ["0.0", "0.2", "0.4", "0.6", "0.8", "1.0"]);
    assert_eq!(labels(-10.0, 10.0), ["-10", "-5", "0", "5", "10"]);
    assert!(nice_ticks(1.0, 1.0, 5).is_empty());
}

#[test]
fn colorbar_values_are_compact() {
    assert_eq!(format_value(0.0), "0");
    assert_eq!(format_value(1.5), "1.5");
    assert_eq!(format_value(-2.0), "-2");
    assert_eq!(format_value(12345.0), "1.23e4");
    assert_eq!(format_value(1e-5), "1.00e-5");
}
