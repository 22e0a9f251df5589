use super::*;

#[test]
fn escape_xml_replaces_markup_characters() {
    assert_eq!(escape_xml("a < b & c > \"d\" 'e'"), "a &lt; b &amp; c &gt; &quot;d&quot; &apos;e&apos;");
    assert_eq!(escape_xml("t = 1.000"), "t = 1.000");
}

#[test]
fn blank_text_has_no_raster() {
    let mut r = TextRasterizer::new();
    assert!(r.rasterize("", [0, 0, 0, 255], 16.0).unwrap().is_none());
    assert!(r.rasterize("   ", [0, 0, 0, 255], 16.0).unwrap().is_none());
}

#[test]
fn invalid_font_size_is_rejected() {
    let mut r = TextRasterizer::new();
    let err = r.rasterize("x", [0, 0, 0, 255], 0.0).unwrap_err();
    assert!(matches!(err, PlanevizError::Render(_)));
}

#[test]
fn trim_keeps_inked_columns_and_padding() {
    // 4x1 image inked at column 1 only.
    let mut data = vec![0u8; 16];
    data[4..8].copy_from_slice(&[9, 9, 9, 255]);
    let (w, out) = trim_columns(&data, 4, 1, 1).unwrap();
    assert_eq!(w, 3);
    assert_eq!(out.len(), 12);
    assert_eq!(&out[4..8], &[9, 9, 9, 255]);
    assert!(trim_columns(&[0u8; 16], 4, 1, 1).is_none());
}

#[test]
fn rasterized_text_is_premultiplied_and_cached() {
    let mut r = TextRasterizer::new();
    if !r.has_fonts() {
        return;
    }
    let a = r
        .rasterize("t = 0.500 <&>", [255, 0, 0, 255], 20.0)
        .unwrap()
        .expect("visible text");
    assert!(a.width > 0);
    assert_eq!(a.data.len(), (a.width * a.height * 4) as usize);
    assert!(a.baseline > 0.0 && a.baseline < f64::from(a.height));
    assert!(a.data.chunks_exact(4).all(|px| px[0] <= px[3] && px[1] == 0 && px[2] == 0));
    assert!(a.data.chunks_exact(4).any(|px| px[3] > 0));

    let b = r
        .rasterize("t = 0.500 <&>", [255, 0, 0, 255], 20.0)
        .unwrap()
        .expect("visible text");
    assert!(Arc::ptr_eq(&a, &b));
}
