use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    foundation::core::Frame,
    foundation::error::{PanoError, PanoResult},
    projection::{
        cache::MappingCache,
        mapping::MappingTable,
        projector::{Interpolation, apply},
        view::ViewConfig,
    },
};

/// A requested view with its mapping table resolved.
#[derive(Clone, Debug)]
pub struct PreparedView {
    /// Yaw as requested by the user, used for output naming.
    pub yaw_degrees: f64,
    pub view: ViewConfig,
    pub table: Arc<MappingTable>,
}

/// One projected view of one source frame.
#[derive(Clone, Debug)]
pub struct ProjectedView {
    pub yaw_degrees: f64,
    pub view: ViewConfig,
    pub image: Frame,
}

/// Projects a decoded panorama into every configured view.
///
/// Stateless between frames: the same processor is shared by all frame tasks of a job.
#[derive(Clone, Debug)]
pub struct FrameProcessor {
    views: Vec<PreparedView>,
    kernel: Interpolation,
}

impl FrameProcessor {
    pub fn new(views: Vec<PreparedView>, kernel: Interpolation) -> Self {
        Self { views, kernel }
    }

    /// Resolve the tables for `views` over a `pano_width x pano_height` panorama through `cache`.
    ///
    /// Tables for distinct views are built in parallel on the current rayon pool.
    pub fn prepare(
        cache: &MappingCache,
        pano_width: u32,
        pano_height: u32,
        views: &[(f64, ViewConfig)],
        kernel: Interpolation,
    ) -> PanoResult<Self> {
        let prepared = views
            .par_iter()
            .map(|(yaw_degrees, view)| {
                Ok(PreparedView {
                    yaw_degrees: *yaw_degrees,
                    view: *view,
                    table: cache.get_or_build(pano_width, pano_height, view)?,
                })
            })
            .collect::<PanoResult<Vec<_>>>()?;
        Ok(Self::new(prepared, kernel))
    }

    pub fn views(&self) -> &[PreparedView] {
        &self.views
    }

    pub fn kernel(&self) -> Interpolation {
        self.kernel
    }

    /// Combined heap footprint of the resolved mapping tables.
    pub fn table_bytes(&self) -> usize {
        self.views.iter().map(|p| p.table.byte_size()).sum()
    }

    /// Project `frame` into every view, in configured order.
    pub fn process(&self, frame: &Frame) -> PanoResult<Vec<ProjectedView>> {
        self.views
            .par_iter()
            .map(|prepared| {
                let image = apply(frame, &prepared.table, self.kernel).map_err(|e| match e {
                    PanoError::FrameProcessing(msg) => PanoError::frame_processing(format!(
                        "yaw {}: {msg}",
                        prepared.yaw_degrees
                    )),
                    other => other,
                })?;
                Ok(ProjectedView {
                    yaw_degrees: prepared.yaw_degrees,
                    view: prepared.view,
                    image,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/processor.rs"]
mod tests;
