use crate::foundation::error::{PanoError, PanoResult};

/// Interleaved 8-bit channel layout of a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// One luma channel.
    Gray8,
    /// Red, green, blue.
    Rgb8,
    /// Red, green, blue, straight alpha.
    Rgba8,
}

impl PixelLayout {
    /// Number of interleaved channels per pixel.
    pub fn channels(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Row-major, tightly packed 8-bit image.
///
/// Decoded panoramas and projected views share this type; a projected view always has the
/// layout of the panorama it was sampled from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap an existing buffer, checking that its length matches `width * height * channels`.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> PanoResult<Self> {
        let expected = expected_len(width, height, layout)?;
        if data.len() != expected {
            return Err(PanoError::frame_processing(format!(
                "frame buffer has {} bytes, expected {expected} for {width}x{height} {layout:?}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// A zero-filled frame.
    pub fn blank(width: u32, height: u32, layout: PixelLayout) -> PanoResult<Self> {
        let len = expected_len(width, height, layout)?;
        Ok(Self {
            width,
            height,
            layout,
            data: vec![0u8; len],
        })
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Byte length of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Channel values of the pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels();
        let off = y as usize * self.stride() + x as usize * c;
        &self.data[off..off + c]
    }
}

fn expected_len(width: u32, height: u32, layout: PixelLayout) -> PanoResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(layout.channels()))
        .ok_or_else(|| PanoError::frame_processing("frame buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
