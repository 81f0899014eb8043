use rayon::prelude::*;

use crate::{
    foundation::core::Frame,
    foundation::error::{PanoError, PanoResult},
    projection::mapping::MappingTable,
};

/// Resampling kernel used when reading the panorama at fractional coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

impl std::str::FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" | "linear" => Ok(Self::Bilinear),
            "bicubic" | "cubic" => Ok(Self::Bicubic),
            other => Err(format!(
                "unknown interpolation '{other}' (expected nearest, bilinear or bicubic)"
            )),
        }
    }
}

/// Keys cubic convolution parameter (the common `-0.75` variant).
const CUBIC_A: f32 = -0.75;

/// Resample `frame` through `table`.
///
/// The output has the table's dimensions and the frame's pixel layout. Taps that fall outside the
/// panorama are mirrored back inside (edge pixel repeated), so reads never leave the buffer. The
/// azimuth seam is not wrapped: columns near `U = 0` and `U = width - 1` do not blend across it.
pub fn apply(frame: &Frame, table: &MappingTable, kernel: Interpolation) -> PanoResult<Frame> {
    if frame.width != table.pano_width() || frame.height != table.pano_height() {
        return Err(PanoError::frame_processing(format!(
            "frame is {}x{} but the mapping table was built for a {}x{} panorama",
            frame.width,
            frame.height,
            table.pano_width(),
            table.pano_height()
        )));
    }
    let channels = frame.channels();
    if frame.data.len() != frame.stride() * frame.height as usize {
        return Err(PanoError::frame_processing(
            "frame buffer length does not match its dimensions",
        ));
    }

    let mut out = Frame::blank(table.width(), table.height(), frame.layout)?;
    let out_w = table.width() as usize;
    let src = SourceView {
        data: &frame.data,
        width: frame.width as usize,
        height: frame.height as usize,
        channels,
    };

    out.data
        .par_chunks_mut(out_w * channels)
        .zip(table.u().par_chunks(out_w))
        .zip(table.v().par_chunks(out_w))
        .for_each(|((row, us), vs)| {
            for (x, (&u, &v)) in us.iter().zip(vs).enumerate() {
                let px = &mut row[x * channels..(x + 1) * channels];
                match kernel {
                    Interpolation::Nearest => src.nearest(u, v, px),
                    Interpolation::Bilinear => src.bilinear(u, v, px),
                    Interpolation::Bicubic => src.bicubic(u, v, px),
                }
            }
        });

    Ok(out)
}

struct SourceView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
}

impl SourceView<'_> {
    #[inline]
    fn texel(&self, x: isize, y: isize, c: usize) -> f32 {
        let x = mirror(x, self.width);
        let y = mirror(y, self.height);
        f32::from(self.data[(y * self.width + x) * self.channels + c])
    }

    fn nearest(&self, u: f32, v: f32, out: &mut [u8]) {
        let x = u.round() as isize;
        let y = v.round() as isize;
        for (c, o) in out.iter_mut().enumerate() {
            *o = self.texel(x, y, c) as u8;
        }
    }

    fn bilinear(&self, u: f32, v: f32, out: &mut [u8]) {
        let x0 = u.floor();
        let y0 = v.floor();
        let fx = u - x0;
        let fy = v - y0;
        let (x0, y0) = (x0 as isize, y0 as isize);

        for (c, o) in out.iter_mut().enumerate() {
            let p00 = self.texel(x0, y0, c);
            let p10 = self.texel(x0 + 1, y0, c);
            let p01 = self.texel(x0, y0 + 1, c);
            let p11 = self.texel(x0 + 1, y0 + 1, c);
            let top = p00 + (p10 - p00) * fx;
            let bottom = p01 + (p11 - p01) * fx;
            *o = to_u8(top + (bottom - top) * fy);
        }
    }

    fn bicubic(&self, u: f32, v: f32, out: &mut [u8]) {
        let x0 = u.floor();
        let y0 = v.floor();
        let wx = cubic_weights(u - x0);
        let wy = cubic_weights(v - y0);
        let (x0, y0) = (x0 as isize, y0 as isize);

        for (c, o) in out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (j, wyj) in wy.iter().enumerate() {
                let y = y0 - 1 + j as isize;
                let mut row = 0.0f32;
                for (i, wxi) in wx.iter().enumerate() {
                    row += wxi * self.texel(x0 - 1 + i as isize, y, c);
                }
                acc += wyj * row;
            }
            *o = to_u8(acc);
        }
    }
}

/// Mirror an index into `[0, n)` with the edge pixel repeated: `-1 -> 0`, `n -> n - 1`.
#[inline]
fn mirror(i: isize, n: usize) -> usize {
    let n = n as isize;
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

fn cubic_weights(t: f32) -> [f32; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let w2 = ((a + 2.0) * (1.0 - t) - (a + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    let w3 = 1.0 - w0 - w1 - w2;
    [w0, w1, w2, w3]
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/projection/projector.rs"]
mod tests;
