//! pano-plane reprojects 360° equirectangular video into ordinary rectilinear "plane" views.
//!
//! A job samples every n-th frame of a source, projects it into one view per requested yaw
//! (shared pitch, field of view and resolution) and writes the views as JPEG or PNG files:
//!
//! - Describe the job with a [`JobConfig`] (JSON via [`JobConfig::from_path`] or built in code)
//! - Create a [`JobRunner`], which validates the configuration up front
//! - Run it over any [`FrameSource`] into any [`ImageSink`], observing a [`ProgressSink`]
//!
//! [`run`] wires the usual pieces together: an `ffmpeg` decoder and files on disk.
#![forbid(unsafe_code)]

mod export;
mod foundation;
mod job;
mod projection;
mod source;

pub use crate::foundation::core::{Frame, PixelLayout};
pub use crate::foundation::error::{PanoError, PanoResult};
pub use crate::foundation::math::{Mat3, Vec3};

pub use crate::export::layout::{OutputLayout, format_angle};
pub use crate::export::sink::{
    FsImageSink, ImageSink, InMemoryImageSink, ProjectedFrame, encode_image,
};
pub use crate::job::config::{JobConfig, OutputFormat, parse_yaw_list};
pub use crate::job::processor::{FrameProcessor, PreparedView, ProjectedView};
pub use crate::job::progress::{
    CancelToken, ChannelProgressSink, JobState, NoProgress, ProgressSink, ProgressUpdate,
};
pub use crate::job::runner::{JobResult, JobRunner};
pub use crate::projection::cache::{CacheStats, MappingCache};
pub use crate::projection::mapping::{MappingTable, build_mapping};
pub use crate::projection::projector::{Interpolation, apply};
pub use crate::projection::rotation::rotation_matrix;
pub use crate::projection::view::{MappingKey, ViewConfig};
pub use crate::source::ffmpeg::FfmpegFrameSource;
pub use crate::source::memory::{MemoryFrameSource, StillImageSource};
pub use crate::source::{FrameSource, SourceInfo};

/// Project a video file as described by `config` into files under `config.output_dir`.
///
/// Configuration errors are returned before the video is opened.
pub fn run(config: &JobConfig, progress: &mut dyn ProgressSink) -> PanoResult<JobResult> {
    let runner = JobRunner::new(config.clone())?;
    let mut source = FfmpegFrameSource::open(&runner.config().source_path)
        .map_err(|e| runner.abort(progress, e))?;
    let mut sink = FsImageSink::from_config(runner.config());
    runner.run(&mut source, &mut sink, progress)
}

/// Like [`run`], but `config.source_path` names a single equirectangular image.
pub fn run_still(config: &JobConfig, progress: &mut dyn ProgressSink) -> PanoResult<JobResult> {
    let runner = JobRunner::new(config.clone())?;
    let mut source = StillImageSource::open(&runner.config().source_path)
        .map_err(|e| runner.abort(progress, e))?;
    let mut sink = FsImageSink::from_config(runner.config());
    runner.run(&mut source, &mut sink, progress)
}
