use std::{
    fs::File,
    io::{BufWriter, Write},
};

use anyhow::Context as _;
use image::ImageEncoder as _;

use crate::{
    export::layout::OutputLayout,
    foundation::{
        core::{Frame, PixelLayout},
        error::{PanoError, PanoResult},
    },
    job::config::{JobConfig, OutputFormat},
    projection::view::ViewConfig,
};

/// One projected view of one sampled frame, ready for export.
#[derive(Clone, Debug)]
pub struct ProjectedFrame {
    /// Zero-based position among sampled frames; shared by every yaw of that frame.
    pub sampled_index: u64,
    /// Zero-based decode index in the source.
    pub source_index: u64,
    pub yaw_degrees: f64,
    pub view: ViewConfig,
    pub image: Frame,
}

/// Destination for projected views.
///
/// `write` is called in ascending `sampled_index` order, yaws ascending within a frame.
pub trait ImageSink {
    /// Called once with every requested yaw before any frame is written.
    fn begin(&mut self, yaws: &[f64]) -> PanoResult<()>;
    fn write(&mut self, frame: &ProjectedFrame) -> PanoResult<()>;
    /// Called once after the last write, also after cancellation.
    fn end(&mut self) -> PanoResult<()>;
}

/// Writes JPEG or PNG files under an [`OutputLayout`].
#[derive(Clone, Debug)]
pub struct FsImageSink {
    layout: OutputLayout,
    format: OutputFormat,
    jpeg_quality: u8,
    written: u64,
}

impl FsImageSink {
    pub fn new(layout: OutputLayout, format: OutputFormat, jpeg_quality: u8) -> Self {
        Self {
            layout,
            format,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            written: 0,
        }
    }

    pub fn from_config(config: &JobConfig) -> Self {
        Self::new(
            OutputLayout::from_config(config),
            config.output_format,
            config.jpeg_quality,
        )
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Images written since `begin`.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl ImageSink for FsImageSink {
    fn begin(&mut self, yaws: &[f64]) -> PanoResult<()> {
        self.written = 0;
        let mut dirs = vec![self.layout.root().to_path_buf()];
        dirs.extend(yaws.iter().map(|&yaw| self.layout.yaw_dir(yaw)));
        for dir in dirs {
            std::fs::create_dir_all(&dir).map_err(|e| {
                PanoError::export(format!(
                    "failed to create output directory '{}': {e}",
                    dir.display()
                ))
            })?;
        }
        Ok(())
    }

    fn write(&mut self, frame: &ProjectedFrame) -> PanoResult<()> {
        let path = self.layout.path_for(frame.sampled_index, frame.yaw_degrees);
        let res = File::create(&path)
            .with_context(|| format!("create '{}'", path.display()))
            .and_then(|f| {
                let mut w = BufWriter::new(f);
                encode_image(&frame.image, self.format, self.jpeg_quality, &mut w)?;
                w.flush()
                    .with_context(|| format!("flush '{}'", path.display()))
            });
        res.map_err(|e| PanoError::export(format!("{e:#}")))?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> PanoResult<()> {
        tracing::debug!(written = self.written, root = %self.layout.root().display(), "export finished");
        Ok(())
    }
}

/// Keeps every written view in memory; for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryImageSink {
    yaws: Vec<f64>,
    frames: Vec<ProjectedFrame>,
    ended: bool,
}

impl InMemoryImageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yaws announced in `begin`.
    pub fn yaws(&self) -> &[f64] {
        &self.yaws
    }

    pub fn frames(&self) -> &[ProjectedFrame] {
        &self.frames
    }

    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl ImageSink for InMemoryImageSink {
    fn begin(&mut self, yaws: &[f64]) -> PanoResult<()> {
        self.yaws = yaws.to_vec();
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn write(&mut self, frame: &ProjectedFrame) -> PanoResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> PanoResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Encode `frame` as `format`. JPEG has no alpha channel, so RGBA input is flattened to RGB.
pub fn encode_image(
    frame: &Frame,
    format: OutputFormat,
    jpeg_quality: u8,
    w: &mut impl Write,
) -> anyhow::Result<()> {
    let (w_px, h_px) = (frame.width, frame.height);
    match format {
        OutputFormat::Png => {
            image::codecs::png::PngEncoder::new(w)
                .write_image(&frame.data, w_px, h_px, color_type(frame.layout))
                .context("encode png")?;
        }
        OutputFormat::Jpg => {
            let enc = image::codecs::jpeg::JpegEncoder::new_with_quality(w, jpeg_quality);
            if frame.layout == PixelLayout::Rgba8 {
                let rgb: Vec<u8> = frame
                    .data
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                enc.write_image(&rgb, w_px, h_px, image::ExtendedColorType::Rgb8)
            } else {
                enc.write_image(&frame.data, w_px, h_px, color_type(frame.layout))
            }
            .context("encode jpeg")?;
        }
    }
    Ok(())
}

fn color_type(layout: PixelLayout) -> image::ExtendedColorType {
    match layout {
        PixelLayout::Gray8 => image::ExtendedColorType::L8,
        PixelLayout::Rgb8 => image::ExtendedColorType::Rgb8,
        PixelLayout::Rgba8 => image::ExtendedColorType::Rgba8,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;
