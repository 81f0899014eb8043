//! Job orchestration: configuration, per-frame processing, scheduling and progress.

pub(crate) mod config;
pub(crate) mod processor;
pub(crate) mod progress;
pub(crate) mod runner;
