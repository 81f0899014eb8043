use super::*;

#[test]
fn frame_new_checks_buffer_length() {
    assert!(Frame::new(2, 2, PixelLayout::Rgb8, vec![0u8; 12]).is_ok());
    let err = Frame::new(2, 2, PixelLayout::Rgb8, vec![0u8; 11]).unwrap_err();
    assert!(matches!(err, PanoError::FrameProcessing(_)));
}

#[test]
fn pixel_addresses_row_major_interleaved() {
    let data: Vec<u8> = (0u8..24).collect();
    let f = Frame::new(3, 2, PixelLayout::Rgba8, data).unwrap();
    assert_eq!(f.stride(), 12);
    assert_eq!(f.pixel(0, 0), &[0, 1, 2, 3]);
    assert_eq!(f.pixel(2, 1), &[20, 21, 22, 23]);
}

#[test]
fn layout_channel_counts() {
    assert_eq!(PixelLayout::Gray8.channels(), 1);
    assert_eq!(PixelLayout::Rgb8.channels(), 3);
    assert_eq!(PixelLayout::Rgba8.channels(), 4);
    let blank = Frame::blank(4, 3, PixelLayout::Gray8).unwrap();
    assert_eq!(blank.data.len(), 12);
}
