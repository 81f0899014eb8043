//! Equirectangular-to-rectilinear reprojection: orientation, lookup tables and resampling.

pub(crate) mod cache;
pub(crate) mod mapping;
pub(crate) mod projector;
pub(crate) mod rotation;
pub(crate) mod view;
