//! Writing projected views to disk (or anywhere else an [`sink::ImageSink`] points).

pub(crate) mod layout;
pub(crate) mod sink;
