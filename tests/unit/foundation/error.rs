use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PanoError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(PanoError::frame_source("x").to_string().contains("source error:"));
    assert!(
        PanoError::frame_processing("x")
            .to_string()
            .contains("frame processing error:")
    );
    assert!(PanoError::export("x").to_string().contains("export error:"));
    assert!(
        PanoError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn only_per_frame_errors_are_recoverable() {
    assert!(PanoError::configuration("fov").is_fatal());
    assert!(PanoError::frame_source("open").is_fatal());
    assert!(!PanoError::frame_processing("boom").is_fatal());
    assert!(!PanoError::export("disk full").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PanoError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
