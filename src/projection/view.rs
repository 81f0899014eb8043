use std::f64::consts::PI;

use crate::foundation::error::{PanoError, PanoResult};

/// One requested rectilinear view: output resolution, horizontal field of view and direction.
///
/// Angles are radians. Use [`ViewConfig::from_degrees`] for validated construction.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewConfig {
    pub output_width: u32,
    pub output_height: u32,
    pub fov_rad: f64,
    pub yaw_rad: f64,
    pub pitch_rad: f64,
}

impl ViewConfig {
    /// Build a view from degrees and validate it.
    pub fn from_degrees(
        output_width: u32,
        output_height: u32,
        fov_deg: f64,
        yaw_deg: f64,
        pitch_deg: f64,
    ) -> PanoResult<Self> {
        let view = Self {
            output_width,
            output_height,
            fov_rad: fov_deg.to_radians(),
            yaw_rad: yaw_deg.to_radians(),
            pitch_rad: pitch_deg.to_radians(),
        };
        view.validate()?;
        Ok(view)
    }

    /// Check the mapping preconditions: non-empty output and `0 < fov < π`.
    pub fn validate(&self) -> PanoResult<()> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(PanoError::configuration(format!(
                "output dimensions must be positive, got {}x{}",
                self.output_width, self.output_height
            )));
        }
        if !self.fov_rad.is_finite() || self.fov_rad <= 0.0 || self.fov_rad >= PI {
            return Err(PanoError::configuration(format!(
                "field of view must lie strictly between 0 and 180 degrees, got {}",
                self.fov_rad.to_degrees()
            )));
        }
        if !self.yaw_rad.is_finite() || !self.pitch_rad.is_finite() {
            return Err(PanoError::configuration("view angles must be finite"));
        }
        Ok(())
    }

    /// Pinhole focal length in output pixels.
    pub fn focal_length_px(&self) -> f64 {
        (0.5 * f64::from(self.output_width)) / (0.5 * self.fov_rad).tan()
    }
}

/// Exact cache key of a mapping table.
///
/// Floating point parameters are keyed by their bit patterns: two keys are equal only when
/// every parameter is bit-identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MappingKey {
    pub pano_width: u32,
    pub pano_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    fov_bits: u64,
    yaw_bits: u64,
    pitch_bits: u64,
}

impl MappingKey {
    pub fn new(pano_width: u32, pano_height: u32, view: &ViewConfig) -> Self {
        Self {
            pano_width,
            pano_height,
            output_width: view.output_width,
            output_height: view.output_height,
            fov_bits: view.fov_rad.to_bits(),
            yaw_bits: view.yaw_rad.to_bits(),
            pitch_bits: view.pitch_rad.to_bits(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/view.rs"]
mod tests;
