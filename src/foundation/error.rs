/// Convenience result type used across pano-plane.
pub type PanoResult<T> = Result<T, PanoError>;

/// Top-level error taxonomy used by projection and job APIs.
///
/// `Configuration` and `Source` are fatal for a job. `FrameProcessing` and `Export` are recorded
/// per frame/image by the job runner and only surface as `Err` from lower-level calls.
#[derive(thiserror::Error, Debug)]
pub enum PanoError {
    /// Invalid job or view parameters, detected before any decoding starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The frame source could not be opened, probed or decoded.
    #[error("source error: {0}")]
    Source(String),

    /// Projecting one sampled frame failed.
    #[error("frame processing error: {0}")]
    FrameProcessing(String),

    /// Writing an output image (or preparing its directory) failed.
    #[error("export error: {0}")]
    Export(String),

    /// Errors when serializing or deserializing job files.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PanoError {
    /// Build a [`PanoError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`PanoError::Source`] value.
    pub fn frame_source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`PanoError::FrameProcessing`] value.
    pub fn frame_processing(msg: impl Into<String>) -> Self {
        Self::FrameProcessing(msg.into())
    }

    /// Build a [`PanoError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`PanoError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error aborts a running job.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::FrameProcessing(_) | Self::Export(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
