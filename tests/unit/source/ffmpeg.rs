use super::*;

#[test]
fn probe_json_prefers_container_frame_count() {
    let json = br#"{
        "streams": [
            {"codec_type": "audio"},
            {"codec_type": "video", "width": 3840, "height": 1920,
             "r_frame_rate": "30/1", "avg_frame_rate": "30000/1001",
             "nb_frames": "900", "duration": "30.03"}
        ],
        "format": {"duration": "30.1"}
    }"#;
    let info = parse_probe(json).unwrap();
    assert_eq!((info.width, info.height), (3840, 1920));
    assert_eq!(info.total_frames, 900);
    assert!((info.fps - 29.97).abs() < 0.01);
}

#[test]
fn probe_json_estimates_frames_from_duration() {
    let json = br#"{
        "streams": [{"codec_type": "video", "width": 200, "height": 100, "r_frame_rate": "25/1"}],
        "format": {"duration": "4.0"}
    }"#;
    let info = parse_probe(json).unwrap();
    assert_eq!(info.total_frames, 100);
    assert_eq!(info.fps, 25.0);
}

#[test]
fn probe_json_without_video_is_a_source_error() {
    let err = parse_probe(br#"{"streams": [{"codec_type": "audio"}]}"#).unwrap_err();
    assert!(matches!(err, PanoError::Source(_)));
    assert!(matches!(parse_probe(b"not json").unwrap_err(), PanoError::Source(_)));
}

#[test]
fn frame_count_fallbacks() {
    assert_eq!(frame_count(Some("45"), Some(10.0), 30.0), 45);
    assert_eq!(frame_count(Some("0"), Some(1.5), 30.0), 45);
    assert_eq!(frame_count(Some("N/A"), None, 30.0), 0);
    assert_eq!(frame_count(None, Some(2.0), 0.0), 0);
}

#[test]
fn ratios_parse_and_reject_zero_denominators() {
    assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
    assert_eq!(parse_ff_ratio("0/0"), None);
    assert_eq!(parse_ff_ratio("30"), None);
}

#[test]
fn missing_video_fails_before_spawning_ffmpeg() {
    let err = FfmpegFrameSource::open(Path::new("target/does-not-exist/pano.mp4")).unwrap_err();
    match err {
        PanoError::Source(msg) => assert!(msg.contains("does not exist"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn read_full_reports_short_reads() {
    let mut src: &[u8] = &[1, 2, 3];
    let mut buf = [0u8; 5];
    assert_eq!(read_full(&mut src, &mut buf).unwrap(), 3);
    assert_eq!(&buf[..3], &[1, 2, 3]);
}

#[test]
fn decode_args_keep_stored_orientation_and_every_frame() {
    let args: Vec<String> = decode_args(Path::new("clips/walk.mp4"))
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();

    assert!(pos("-noautorotate") < pos("-i"));
    assert_eq!(args[pos("-i") + 1], "clips/walk.mp4");
    assert_eq!(args[pos("-fps_mode") + 1], "passthrough");
    assert!(pos("-fps_mode") > pos("-i"));
    assert_eq!(args[pos("-pix_fmt") + 1], "rgb24");
    assert_eq!(args[pos("-f") + 1], "rawvideo");
    assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
}
