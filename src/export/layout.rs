use std::path::{Path, PathBuf};

use crate::job::config::{JobConfig, OutputFormat};

/// Deterministic output paths for projected views.
///
/// Flat: `root/frame_{sampled:05}_yaw_{yaw}.{ext}`.
/// By yaw: `root/yaw_{yaw}/frame_{sampled:05}.{ext}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    organize_by_yaw: bool,
    extension: &'static str,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, organize_by_yaw: bool, format: OutputFormat) -> Self {
        Self {
            root: root.into(),
            organize_by_yaw,
            extension: format.extension(),
        }
    }

    pub fn from_config(config: &JobConfig) -> Self {
        Self::new(
            config.output_dir.clone(),
            config.organize_by_yaw,
            config.output_format,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn organize_by_yaw(&self) -> bool {
        self.organize_by_yaw
    }

    /// Directory holding the images of `yaw`.
    pub fn yaw_dir(&self, yaw: f64) -> PathBuf {
        if self.organize_by_yaw {
            self.root.join(format!("yaw_{}", format_angle(yaw)))
        } else {
            self.root.clone()
        }
    }

    pub fn path_for(&self, sampled_index: u64, yaw: f64) -> PathBuf {
        let name = if self.organize_by_yaw {
            format!("frame_{sampled_index:05}.{}", self.extension)
        } else {
            format!(
                "frame_{sampled_index:05}_yaw_{}.{}",
                format_angle(yaw),
                self.extension
            )
        };
        self.yaw_dir(yaw).join(name)
    }
}

/// `90.0` renders as `90`, `22.5` as `22.5`.
pub fn format_angle(deg: f64) -> String {
    format!("{deg}")
}

#[cfg(test)]
#[path = "../../tests/unit/export/layout.rs"]
mod tests;
