//! Frame sources: where decoded panoramas come from.

use crate::foundation::{core::Frame, error::PanoResult};

pub(crate) mod ffmpeg;
pub(crate) mod memory;

/// Stream properties known before the first frame is decoded.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    /// Frame count reported by the container; 0 when unknown. Only used for progress.
    pub total_frames: u64,
    /// Nominal frame rate; 0 when unknown.
    pub fps: f64,
}

/// Sequential supplier of equirectangular frames.
///
/// Frames are yielded in decode order. Every frame must have the dimensions given by [`info`].
///
/// [`info`]: FrameSource::info
pub trait FrameSource {
    fn info(&self) -> SourceInfo;

    /// Decode the next frame; `Ok(None)` marks the end of the stream.
    ///
    /// Errors are fatal for the job reading this source.
    fn next_frame(&mut self) -> PanoResult<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn info(&self) -> SourceInfo {
        (**self).info()
    }

    fn next_frame(&mut self) -> PanoResult<Option<Frame>> {
        (**self).next_frame()
    }
}
