use std::{collections::VecDeque, path::Path};

use anyhow::Context;

use crate::{
    foundation::{
        core::{Frame, PixelLayout},
        error::{PanoError, PanoResult},
    },
    source::{FrameSource, SourceInfo},
};

/// Serves frames that are already in memory, in insertion order.
#[derive(Clone, Debug)]
pub struct MemoryFrameSource {
    info: SourceInfo,
    frames: VecDeque<Frame>,
}

impl MemoryFrameSource {
    /// Source over `frames`; dimensions come from the first frame.
    pub fn new(frames: Vec<Frame>, fps: f64) -> PanoResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| PanoError::frame_source("in-memory source needs at least one frame"))?;
        let info = SourceInfo {
            width: first.width,
            height: first.height,
            total_frames: frames.len() as u64,
            fps,
        };
        Ok(Self::with_info(info, frames))
    }

    /// Source with explicit stream properties. Frames are not checked against `info`.
    pub fn with_info(info: SourceInfo, frames: Vec<Frame>) -> Self {
        Self {
            info,
            frames: frames.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemoryFrameSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn next_frame(&mut self) -> PanoResult<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

/// A single equirectangular still image, decoded with the `image` crate.
#[derive(Clone, Debug)]
pub struct StillImageSource {
    inner: MemoryFrameSource,
}

impl StillImageSource {
    pub fn open(path: &Path) -> PanoResult<Self> {
        let img = image::open(path)
            .with_context(|| format!("decode panorama '{}'", path.display()))
            .map_err(|e| PanoError::frame_source(format!("{e:#}")))?;
        Self::from_image(img)
    }

    /// Keeps alpha when the image has it; everything else becomes RGB.
    pub fn from_image(img: image::DynamicImage) -> PanoResult<Self> {
        let frame = match img {
            image::DynamicImage::ImageLuma8(buf) => {
                Frame::new(buf.width(), buf.height(), PixelLayout::Gray8, buf.into_raw())?
            }
            img if img.color().has_alpha() => {
                let buf = img.into_rgba8();
                Frame::new(buf.width(), buf.height(), PixelLayout::Rgba8, buf.into_raw())?
            }
            img => {
                let buf = img.into_rgb8();
                Frame::new(buf.width(), buf.height(), PixelLayout::Rgb8, buf.into_raw())?
            }
        };
        Ok(Self {
            inner: MemoryFrameSource::new(vec![frame], 0.0)?,
        })
    }
}

impl FrameSource for StillImageSource {
    fn info(&self) -> SourceInfo {
        self.inner.info()
    }

    fn next_frame(&mut self) -> PanoResult<Option<Frame>> {
        self.inner.next_frame()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/memory.rs"]
mod tests;
