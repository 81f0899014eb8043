use super::*;

#[test]
fn memory_source_yields_frames_in_order_then_ends() {
    let frames: Vec<Frame> = (0..3u8)
        .map(|i| Frame::new(4, 2, PixelLayout::Gray8, vec![i; 8]).unwrap())
        .collect();
    let mut src = MemoryFrameSource::new(frames, 30.0).unwrap();
    let info = src.info();
    assert_eq!((info.width, info.height, info.total_frames), (4, 2, 3));
    assert_eq!(info.fps, 30.0);

    for i in 0..3u8 {
        assert_eq!(src.next_frame().unwrap().unwrap().data[0], i);
    }
    assert!(src.next_frame().unwrap().is_none());
    assert!(src.next_frame().unwrap().is_none());
    assert_eq!(src.remaining(), 0);
}

#[test]
fn empty_memory_source_is_rejected() {
    assert!(matches!(
        MemoryFrameSource::new(Vec::new(), 30.0).unwrap_err(),
        PanoError::Source(_)
    ));
}

#[test]
fn still_image_keeps_layout() {
    let rgb = image::RgbImage::from_pixel(8, 4, image::Rgb([1, 2, 3]));
    let mut src = StillImageSource::from_image(image::DynamicImage::ImageRgb8(rgb)).unwrap();
    assert_eq!(src.info().total_frames, 1);
    let frame = src.next_frame().unwrap().unwrap();
    assert_eq!(frame.layout, PixelLayout::Rgb8);
    assert_eq!(frame.pixel(7, 3), &[1, 2, 3]);
    assert!(src.next_frame().unwrap().is_none());

    let rgba = image::RgbaImage::from_pixel(2, 1, image::Rgba([9, 8, 7, 6]));
    let mut src = StillImageSource::from_image(image::DynamicImage::ImageRgba8(rgba)).unwrap();
    assert_eq!(src.next_frame().unwrap().unwrap().layout, PixelLayout::Rgba8);

    let gray = image::GrayImage::from_pixel(2, 2, image::Luma([5]));
    let mut src = StillImageSource::from_image(image::DynamicImage::ImageLuma8(gray)).unwrap();
    assert_eq!(src.next_frame().unwrap().unwrap().layout, PixelLayout::Gray8);
}

#[test]
fn unreadable_still_is_a_source_error() {
    let err = StillImageSource::open(Path::new("target/missing-panorama.png")).unwrap_err();
    match err {
        PanoError::Source(msg) => assert!(msg.contains("missing-panorama.png"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}
