use std::f64::consts::{PI, TAU};

use rayon::prelude::*;

use crate::{
    foundation::error::{PanoError, PanoResult},
    foundation::math::{Vec3, wrap_tau},
    projection::{rotation::rotation_matrix, view::ViewConfig},
};

/// Per-output-pixel source coordinates for one view over one panorama size.
///
/// `u[y * width + x]` is the (fractional) panorama column and `v[...]` the panorama row sampled
/// for output pixel `(x, y)`. Coordinates are already clipped to the panorama bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct MappingTable {
    width: u32,
    height: u32,
    pano_width: u32,
    pano_height: u32,
    u: Vec<f32>,
    v: Vec<f32>,
}

impl MappingTable {
    /// Output width (table columns).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height (table rows).
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pano_width(&self) -> u32 {
        self.pano_width
    }

    pub fn pano_height(&self) -> u32 {
        self.pano_height
    }

    /// Row-major source columns.
    pub fn u(&self) -> &[f32] {
        &self.u
    }

    /// Row-major source rows.
    pub fn v(&self) -> &[f32] {
        &self.v
    }

    /// Source coordinate `(U, V)` for output pixel `(x, y)`.
    pub fn at(&self, x: u32, y: u32) -> (f32, f32) {
        let i = y as usize * self.width as usize + x as usize;
        (self.u[i], self.v[i])
    }

    /// Approximate heap footprint in bytes.
    pub fn byte_size(&self) -> usize {
        (self.u.len() + self.v.len()) * std::mem::size_of::<f32>()
    }
}

/// Build the equirectangular lookup table for `view` over a `pano_width x pano_height` panorama.
///
/// Fails with a configuration error when the view violates its preconditions (see
/// [`ViewConfig::validate`]) or the panorama is empty.
pub fn build_mapping(
    pano_width: u32,
    pano_height: u32,
    view: &ViewConfig,
) -> PanoResult<MappingTable> {
    validate_mapping_inputs(pano_width, pano_height, view)?;
    Ok(compute_mapping(pano_width, pano_height, view))
}

pub(crate) fn validate_mapping_inputs(
    pano_width: u32,
    pano_height: u32,
    view: &ViewConfig,
) -> PanoResult<()> {
    if pano_width == 0 || pano_height == 0 {
        return Err(PanoError::configuration(format!(
            "panorama dimensions must be positive, got {pano_width}x{pano_height}"
        )));
    }
    view.validate()
}

/// Unchecked table construction; callers validate first.
///
/// Rows are filled in parallel. Every pixel is an independent pure computation, so the result
/// does not depend on how rows are scheduled.
pub(crate) fn compute_mapping(pano_width: u32, pano_height: u32, view: &ViewConfig) -> MappingTable {
    let w = view.output_width as usize;
    let h = view.output_height as usize;
    let half_w = 0.5 * view.output_width as f64;
    let half_h = 0.5 * view.output_height as f64;
    let f = view.focal_length_px();
    let r = rotation_matrix(view.yaw_rad, view.pitch_rad);

    let pw = f64::from(pano_width);
    let ph = f64::from(pano_height);
    let u_max = pw - 1.0;
    let v_max = ph - 1.0;

    let mut u = vec![0f32; w * h];
    let mut v = vec![0f32; w * h];

    u.par_chunks_mut(w)
        .zip(v.par_chunks_mut(w))
        .enumerate()
        .for_each(|(row, (u_row, v_row))| {
            let y = half_h - row as f64;
            for (col, (u_out, v_out)) in u_row.iter_mut().zip(v_row.iter_mut()).enumerate() {
                let x = col as f64 - half_w;
                let ray = r.mul_vec(Vec3::new(x, y, f).normalized());

                let theta = ray.z.clamp(-1.0, 1.0).acos();
                let phi = wrap_tau(ray.y.atan2(ray.x));

                let su = (phi * pw / TAU).clamp(0.0, u_max);
                let sv = (theta * ph / PI).clamp(0.0, v_max);
                *u_out = su as f32;
                *v_out = sv as f32;
            }
        });

    MappingTable {
        width: view.output_width,
        height: view.output_height,
        pano_width,
        pano_height,
        u,
        v,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/mapping.rs"]
mod tests;
