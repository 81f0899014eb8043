use super::*;
use crate::foundation::core::PixelLayout;
use crate::projection::{mapping::build_mapping, view::ViewConfig};

const KERNELS: [Interpolation; 3] = [
    Interpolation::Nearest,
    Interpolation::Bilinear,
    Interpolation::Bicubic,
];

fn table(pw: u32, ph: u32, w: u32, h: u32, yaw: f64, pitch: f64) -> MappingTable {
    let view = ViewConfig::from_degrees(w, h, 90.0, yaw, pitch).unwrap();
    build_mapping(pw, ph, &view).unwrap()
}

fn column_gradient(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height) as usize);
    for _ in 0..height {
        for x in 0..width {
            data.push(x as u8);
        }
    }
    Frame::new(width, height, PixelLayout::Gray8, data).unwrap()
}

#[test]
fn output_has_view_dimensions_and_input_layout() {
    let t = table(120, 60, 17, 9, 30.0, 80.0);
    for layout in [PixelLayout::Gray8, PixelLayout::Rgb8, PixelLayout::Rgba8] {
        let frame = Frame::blank(120, 60, layout).unwrap();
        for kernel in KERNELS {
            let out = apply(&frame, &t, kernel).unwrap();
            assert_eq!((out.width, out.height), (17, 9));
            assert_eq!(out.layout, layout);
            assert_eq!(out.data.len(), 17 * 9 * layout.channels());
        }
    }
}

#[test]
fn uniform_panorama_projects_to_uniform_view() {
    let t = table(90, 45, 20, 20, 200.0, 40.0);
    let frame = Frame::new(90, 45, PixelLayout::Rgb8, [10u8, 200, 77].repeat(90 * 45)).unwrap();
    for kernel in KERNELS {
        let out = apply(&frame, &t, kernel).unwrap();
        assert!(
            out.data.chunks_exact(3).all(|px| px == [10, 200, 77]),
            "{kernel:?}"
        );
    }
}

#[test]
fn nearest_reads_the_rounded_source_pixel() {
    let (pw, ph) = (200u32, 100u32);
    let t = table(pw, ph, 24, 16, 75.0, 100.0);
    let mut data = Vec::with_capacity((pw * ph * 3) as usize);
    for y in 0..ph {
        for x in 0..pw {
            data.extend_from_slice(&[x as u8, y as u8, ((x + y) % 256) as u8]);
        }
    }
    let frame = Frame::new(pw, ph, PixelLayout::Rgb8, data).unwrap();

    let out = apply(&frame, &t, Interpolation::Nearest).unwrap();
    for y in 0..t.height() {
        for x in 0..t.width() {
            let (u, v) = t.at(x, y);
            let expected = frame.pixel(u.round() as u32, v.round() as u32);
            assert_eq!(out.pixel(x, y), expected);
        }
    }
}

#[test]
fn bilinear_tracks_a_linear_ramp() {
    let t = table(240, 120, 32, 32, 10.0, 90.0);
    let frame = column_gradient(240, 120);
    let out = apply(&frame, &t, Interpolation::Bilinear).unwrap();
    for y in 0..t.height() {
        for x in 0..t.width() {
            let (u, _) = t.at(x, y);
            let got = f32::from(out.pixel(x, y)[0]);
            assert!((got - u).abs() <= 1.0, "u={u} got={got}");
        }
    }
}

#[test]
fn bicubic_is_exact_on_integer_taps_and_stays_in_range() {
    let t = table(64, 32, 40, 40, 0.0, 5.0);
    let frame = column_gradient(64, 32);
    let out = apply(&frame, &t, Interpolation::Bicubic).unwrap();
    for y in 0..t.height() {
        for x in 0..t.width() {
            let (u, v) = t.at(x, y);
            if u.fract() == 0.0 && v.fract() == 0.0 {
                assert_eq!(f32::from(out.pixel(x, y)[0]), u);
            }
        }
    }
    assert_eq!(cubic_weights(0.0), [0.0, 1.0, 0.0, 0.0]);
    let w = cubic_weights(0.37);
    assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-6);
}

#[test]
fn mismatched_frame_is_a_processing_error() {
    let t = table(100, 50, 8, 8, 0.0, 90.0);
    let frame = Frame::blank(99, 50, PixelLayout::Rgb8).unwrap();
    let err = apply(&frame, &t, Interpolation::Bilinear).unwrap_err();
    assert!(matches!(err, PanoError::FrameProcessing(_)));
}

#[test]
fn mirror_repeats_the_edge_pixel() {
    assert_eq!(mirror(0, 5), 0);
    assert_eq!(mirror(4, 5), 4);
    assert_eq!(mirror(-1, 5), 0);
    assert_eq!(mirror(-2, 5), 1);
    assert_eq!(mirror(5, 5), 4);
    assert_eq!(mirror(6, 5), 3);
    assert_eq!(mirror(-3, 1), 0);
    assert_eq!(mirror(7, 1), 0);
}

#[test]
fn interpolation_parses_from_cli_names() {
    assert_eq!("nearest".parse::<Interpolation>(), Ok(Interpolation::Nearest));
    assert_eq!("Bilinear".parse::<Interpolation>(), Ok(Interpolation::Bilinear));
    assert_eq!("cubic".parse::<Interpolation>(), Ok(Interpolation::Bicubic));
    assert!("lanczos".parse::<Interpolation>().is_err());
    assert_eq!(Interpolation::default(), Interpolation::Bilinear);
}
