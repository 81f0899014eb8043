use super::*;

#[test]
fn flat_names_carry_index_and_yaw() {
    let layout = OutputLayout::new("out", false, OutputFormat::Jpg);
    assert_eq!(
        layout.path_for(0, 90.0),
        PathBuf::from("out/frame_00000_yaw_90.jpg")
    );
    assert_eq!(
        layout.path_for(123, 22.5),
        PathBuf::from("out/frame_00123_yaw_22.5.jpg")
    );
    assert_eq!(layout.yaw_dir(180.0), PathBuf::from("out"));
}

#[test]
fn by_yaw_names_use_subdirectories() {
    let layout = OutputLayout::new("out", true, OutputFormat::Png);
    assert_eq!(layout.yaw_dir(0.0), PathBuf::from("out/yaw_0"));
    assert_eq!(
        layout.path_for(7, 270.0),
        PathBuf::from("out/yaw_270/frame_00007.png")
    );
}

#[test]
fn wide_indices_are_not_truncated() {
    let layout = OutputLayout::new("o", false, OutputFormat::Png);
    assert_eq!(
        layout.path_for(123_456, 0.0),
        PathBuf::from("o/frame_123456_yaw_0.png")
    );
}

#[test]
fn angles_format_without_trailing_zero() {
    assert_eq!(format_angle(0.0), "0");
    assert_eq!(format_angle(360.0), "360");
    assert_eq!(format_angle(45.25), "45.25");
}

#[test]
fn layout_follows_job_config() {
    let cfg = JobConfig {
        output_dir: PathBuf::from("frames"),
        organize_by_yaw: true,
        output_format: OutputFormat::Png,
        ..JobConfig::default()
    };
    let layout = OutputLayout::from_config(&cfg);
    assert_eq!(layout.root(), Path::new("frames"));
    assert!(layout.organize_by_yaw());
    assert_eq!(
        layout.path_for(1, 90.0),
        PathBuf::from("frames/yaw_90/frame_00001.png")
    );
}
