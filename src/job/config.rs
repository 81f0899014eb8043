use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use crate::{
    foundation::error::{PanoError, PanoResult},
    projection::{projector::Interpolation, view::ViewConfig},
};

/// Encoded image format of exported views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "jpeg")]
    Jpg,
    Png,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            other => Err(format!("unknown output format '{other}' (expected jpg or png)")),
        }
    }
}

/// Everything a projection job needs.
///
/// Missing JSON fields take the defaults below: every 15th frame, four horizon views at 0, 90,
/// 180 and 270 degrees yaw, 90 degree FOV, 1500x1500 JPEG output, one worker per core.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    /// Requested view directions; each in `[0, 360]`. Duplicates are dropped on validation.
    pub yaw_angles_degrees: Vec<f64>,
    /// Vertical view direction in `[1, 179]`; 90 looks at the horizon.
    pub pitch_degrees: f64,
    /// Field of view in the open interval `(0, 180)`.
    pub fov_degrees: f64,
    pub output_width: u32,
    pub output_height: u32,
    /// Project every n-th decoded frame (n >= 1), starting with frame 0.
    pub frame_interval: u64,
    pub output_format: OutputFormat,
    pub num_workers: usize,
    /// Write into one `yaw_{yaw}` directory per view instead of a flat directory.
    pub organize_by_yaw: bool,
    pub interpolation: Interpolation,
    /// JPEG quality 1..=100; ignored for PNG.
    pub jpeg_quality: u8,
    /// Sampled frames allowed in flight at once. 1 resolves each frame before decoding the next.
    pub pipeline_depth: usize,
    /// Upper bound on cached mapping tables; `None` keeps every table.
    pub cache_capacity: Option<usize>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::new(),
            output_dir: PathBuf::new(),
            yaw_angles_degrees: vec![0.0, 90.0, 180.0, 270.0],
            pitch_degrees: 90.0,
            fov_degrees: 90.0,
            output_width: 1500,
            output_height: 1500,
            frame_interval: 15,
            output_format: OutputFormat::Jpg,
            num_workers: default_workers(),
            organize_by_yaw: false,
            interpolation: Interpolation::Bilinear,
            jpeg_quality: 95,
            pipeline_depth: 1,
            cache_capacity: None,
        }
    }
}

impl JobConfig {
    /// Read a job from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> PanoResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PanoError::configuration(format!("open job file '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_reader(r: impl Read) -> PanoResult<Self> {
        serde_json::from_reader(r).map_err(|e| PanoError::serde(format!("job JSON: {e}")))
    }

    pub fn from_json_str(s: &str) -> PanoResult<Self> {
        serde_json::from_str(s).map_err(|e| PanoError::serde(format!("job JSON: {e}")))
    }

    pub fn to_json_pretty(&self) -> PanoResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PanoError::serde(e.to_string()))
    }

    /// Check every parameter and return a copy with yaw angles sorted and de-duplicated.
    ///
    /// Runs before any source is opened, so a bad FOV never costs a decode.
    pub fn validated(&self) -> PanoResult<Self> {
        if self.source_path.as_os_str().is_empty() {
            return Err(PanoError::configuration("source path must be set"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(PanoError::configuration("output directory must be set"));
        }
        if self.yaw_angles_degrees.is_empty() {
            return Err(PanoError::configuration(
                "at least one yaw angle must be given",
            ));
        }
        for &yaw in &self.yaw_angles_degrees {
            if !yaw.is_finite() || !(0.0..=360.0).contains(&yaw) {
                return Err(PanoError::configuration(format!(
                    "yaw angle {yaw} is outside the valid range (0-360 degrees)"
                )));
            }
        }
        if !self.pitch_degrees.is_finite() || !(1.0..=179.0).contains(&self.pitch_degrees) {
            return Err(PanoError::configuration(format!(
                "pitch {} must be between 1 and 179 degrees",
                self.pitch_degrees
            )));
        }
        if !self.fov_degrees.is_finite() || self.fov_degrees <= 0.0 || self.fov_degrees >= 180.0 {
            return Err(PanoError::configuration(format!(
                "field of view {} must lie strictly between 0 and 180 degrees",
                self.fov_degrees
            )));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(PanoError::configuration(format!(
                "output dimensions must be positive, got {}x{}",
                self.output_width, self.output_height
            )));
        }
        if self.frame_interval < 1 {
            return Err(PanoError::configuration("frame interval must be at least 1"));
        }
        if self.num_workers < 1 {
            return Err(PanoError::configuration("worker count must be at least 1"));
        }
        if self.pipeline_depth < 1 {
            return Err(PanoError::configuration("pipeline depth must be at least 1"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PanoError::configuration(format!(
                "jpeg quality {} must be between 1 and 100",
                self.jpeg_quality
            )));
        }
        if self.cache_capacity == Some(0) {
            return Err(PanoError::configuration(
                "cache capacity must be at least 1 when set",
            ));
        }

        let mut yaws = self.yaw_angles_degrees.clone();
        yaws.sort_by(f64::total_cmp);
        yaws.dedup();

        Ok(Self {
            yaw_angles_degrees: yaws,
            ..self.clone()
        })
    }

    /// One view per yaw, sharing pitch, FOV and resolution.
    pub fn view_configs(&self) -> PanoResult<Vec<(f64, ViewConfig)>> {
        self.yaw_angles_degrees
            .iter()
            .map(|&yaw| {
                let view = ViewConfig::from_degrees(
                    self.output_width,
                    self.output_height,
                    self.fov_degrees,
                    yaw,
                    self.pitch_degrees,
                )?;
                Ok((yaw, view))
            })
            .collect()
    }
}

/// Parse a comma separated list of yaw angles such as `"0,90,180,270"`.
pub fn parse_yaw_list(s: &str) -> PanoResult<Vec<f64>> {
    let mut out = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let yaw = part.parse::<f64>().map_err(|_| {
            PanoError::configuration(format!("invalid yaw angle '{part}' in '{s}'"))
        })?;
        out.push(yaw);
    }
    Ok(out)
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "../../tests/unit/job/config.rs"]
mod tests;
