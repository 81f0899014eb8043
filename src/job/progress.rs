use std::sync::{
    Arc, mpsc,
    atomic::{AtomicBool, Ordering},
};

/// Lifecycle of one job run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Snapshot handed to progress observers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProgressUpdate {
    pub state: JobState,
    /// Sampled frames dispatched so far.
    pub sampled_count: u64,
    /// Zero-based decode index of the frame this update refers to.
    pub source_index: u64,
    /// Source frame count as reported by the source; 0 when unknown.
    pub total_frames: u64,
    /// `source_index / total_frames`, clamped to `[0, 100]`.
    pub percent: f64,
    pub processed_count: u64,
    pub error_count: u64,
}

/// Running counters owned by the orchestrating thread.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProgressState {
    pub(crate) state: JobState,
    pub(crate) sampled_count: u64,
    pub(crate) total_frames: u64,
    pub(crate) processed_count: u64,
    pub(crate) error_count: u64,
    pub(crate) cancelled: bool,
    last_source_index: u64,
}

impl ProgressState {
    pub(crate) fn new(total_frames: u64) -> Self {
        Self {
            total_frames,
            ..Self::default()
        }
    }

    /// Snapshot at `source_index`, remembered as the position terminal snapshots report.
    pub(crate) fn snapshot(&mut self, source_index: u64) -> ProgressUpdate {
        self.last_source_index = source_index;
        ProgressUpdate {
            state: self.state,
            sampled_count: self.sampled_count,
            source_index,
            total_frames: self.total_frames,
            percent: percent_of(source_index, self.total_frames),
            processed_count: self.processed_count,
            error_count: self.error_count,
        }
    }

    /// Snapshot for a terminal state at the last reported position; a completed run reads 100%.
    pub(crate) fn final_snapshot(&self) -> ProgressUpdate {
        let source_index = self.last_source_index;
        ProgressUpdate {
            state: self.state,
            sampled_count: self.sampled_count,
            source_index,
            total_frames: self.total_frames,
            percent: if self.state == JobState::Completed {
                100.0
            } else {
                percent_of(source_index, self.total_frames)
            },
            processed_count: self.processed_count,
            error_count: self.error_count,
        }
    }
}

fn percent_of(index: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (index as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Receives progress while a job runs. Called from the orchestrating thread only.
pub trait ProgressSink {
    fn report(&mut self, update: &ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressUpdate),
{
    fn report(&mut self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _update: &ProgressUpdate) {}
}

/// Forwards updates to another thread. A dropped receiver silently stops delivery.
#[derive(Clone, Debug)]
pub struct ChannelProgressSink {
    tx: mpsc::Sender<ProgressUpdate>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressUpdate>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::Receiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&mut self, update: &ProgressUpdate) {
        let _ = self.tx.send(update.clone());
    }
}

/// Cooperative cancellation flag shared between a job and its controller.
///
/// Checked once per sampled frame before it is dispatched.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/progress.rs"]
mod tests;
