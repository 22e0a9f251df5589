use super::*;
use crate::foundation::core::Fps;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("planeviz_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn frame(rgba: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: 3,
        height: 2,
        data: rgba.repeat(6),
        premultiplied: true,
    }
}

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 3,
        height: 2,
        fps: Fps::default(),
    }
}

#[test]
fn writes_sequentially_numbered_pngs() {
    let dir = scratch_dir("png_seq");
    let mut sink = PngSequenceSink::new(&dir).with_prefix("rho");
    sink.begin(cfg()).unwrap();
    sink.push_frame(Iteration(0), &frame([255, 0, 0, 255])).unwrap();
    sink.push_frame(Iteration(64), &frame([0, 0, 255, 255])).unwrap();
    sink.end().unwrap();

    assert_eq!(
        sink.written(),
        &[dir.join("rho_00000.png"), dir.join("rho_00001.png")]
    );
    let img = image::open(dir.join("rho_00001.png")).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.get_pixel(2, 1).0, [0, 0, 255, 255]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn premultiplied_frames_are_saved_straight() {
    let dir = scratch_dir("png_straight");
    let mut sink = PngSequenceSink::new(&dir);
    sink.begin(cfg()).unwrap();
    sink.push_frame(Iteration(3), &frame([100, 0, 0, 128])).unwrap();
    sink.end().unwrap();

    let img = image::open(dir.join("frame_00000.png")).unwrap().to_rgba8();
    let [r, g, b, a] = img.get_pixel(0, 0).0;
    assert_eq!((g, b, a), (0, 0, 128));
    assert!(r.abs_diff(199) <= 1, "r = {r}");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn rejects_out_of_order_frames_and_bad_prefix() {
    let dir = scratch_dir("png_order");
    let mut sink = PngSequenceSink::new(&dir);
    sink.begin(cfg()).unwrap();
    sink.push_frame(Iteration(10), &frame([0, 0, 0, 255])).unwrap();
    assert!(sink.push_frame(Iteration(9), &frame([0, 0, 0, 255])).is_err());
    assert_eq!(sink.written().len(), 1);
    let _ = std::fs::remove_dir_all(&dir);

    let mut bad = PngSequenceSink::new(&dir).with_prefix("a/b");
    assert!(matches!(bad.begin(cfg()), Err(PlanevizError::Validation(_))));
}
