use std::{
    any::Any,
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::{Arc, mpsc},
    time::Instant,
};

use crate::{
    export::sink::{ImageSink, ProjectedFrame},
    foundation::error::{PanoError, PanoResult},
    job::{
        config::JobConfig,
        processor::{FrameProcessor, ProjectedView},
        progress::{CancelToken, JobState, ProgressSink, ProgressState},
    },
    projection::{cache::MappingCache, view::ViewConfig},
    source::FrameSource,
};

/// Processed frames between two throughput log lines.
const THROUGHPUT_LOG_EVERY: u64 = 10;

/// Outcome of a job that was not aborted by a fatal error.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct JobResult {
    /// `Completed`, or `Cancelled` when the cancel token stopped dispatch early.
    pub state: JobState,
    /// Sampled frames projected successfully.
    pub processed_count: u64,
    /// `frame_errors + export_errors`.
    pub error_count: u64,
    pub elapsed_seconds: f64,
    /// Frames read from the source, sampled or not.
    pub frames_decoded: u64,
    pub outputs_written: u64,
    pub frame_errors: u64,
    pub export_errors: u64,
}

/// Runs one projection job: decode, sample, project every yaw, export in order.
///
/// Decoding, dispatch and export all happen on the calling thread; projection runs on a
/// dedicated rayon pool of `num_workers` threads. Up to `pipeline_depth` sampled frames are in
/// flight at once and their results are reordered so exports always follow decode order.
#[derive(Debug)]
pub struct JobRunner {
    config: JobConfig,
    views: Vec<(f64, ViewConfig)>,
    cache: Arc<MappingCache>,
    cancel: CancelToken,
}

impl JobRunner {
    /// Validate `config`. No source is touched and no directory is created here.
    pub fn new(config: JobConfig) -> PanoResult<Self> {
        let config = config.validated()?;
        let views = config.view_configs()?;
        let cache = match config.cache_capacity {
            Some(n) => MappingCache::with_capacity(n),
            None => MappingCache::new(),
        };
        Ok(Self {
            config,
            views,
            cache: Arc::new(cache),
            cancel: CancelToken::new(),
        })
    }

    /// Share mapping tables with other jobs.
    pub fn with_cache(mut self, cache: Arc<MappingCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// The validated configuration (yaws sorted and de-duplicated).
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<MappingCache> {
        &self.cache
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn yaws(&self) -> Vec<f64> {
        self.views.iter().map(|(yaw, _)| *yaw).collect()
    }

    /// Run the job to completion, cancellation or the first fatal error.
    ///
    /// Fatal errors (source, thread pool, output directories) are reported to `progress` as
    /// [`JobState::Failed`] and returned. Per-frame projection and per-image export failures
    /// are logged, counted in the result and skipped.
    #[tracing::instrument(skip_all, fields(source = %self.config.source_path.display()))]
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn ImageSink,
        progress: &mut dyn ProgressSink,
    ) -> PanoResult<JobResult> {
        let started = Instant::now();
        let info = source.info();
        let mut st = ProgressState::new(info.total_frames);
        st.state = JobState::Running;

        tracing::info!(
            width = info.width,
            height = info.height,
            fps = info.fps,
            total_frames = info.total_frames,
            yaws = ?self.yaws(),
            interval = self.config.frame_interval,
            workers = self.config.num_workers,
            "starting projection job"
        );

        let pool = match build_thread_pool(self.config.num_workers) {
            Ok(pool) => pool,
            Err(e) => return Err(fail(&mut st, progress, e)),
        };

        let t_map = Instant::now();
        let processor = match pool.install(|| {
            FrameProcessor::prepare(
                &self.cache,
                info.width,
                info.height,
                &self.views,
                self.config.interpolation,
            )
        }) {
            Ok(p) => p,
            Err(e) => {
                return Err(fail(
                    &mut st,
                    progress,
                    PanoError::frame_source(format!(
                        "cannot project a {}x{} source: {e}",
                        info.width, info.height
                    )),
                ));
            }
        };
        tracing::info!(
            views = processor.views().len(),
            kernel = ?processor.kernel(),
            table_bytes = processor.table_bytes(),
            elapsed_ms = t_map.elapsed().as_millis() as u64,
            cache = ?self.cache.stats(),
            "mapping tables ready"
        );

        if let Err(e) = sink.begin(&self.yaws()) {
            return Err(fail(&mut st, progress, e));
        }

        let mut tally = Tally::default();
        let depth = self.config.pipeline_depth;
        let interval = self.config.frame_interval;

        let decode_res = pool.in_place_scope(|scope| -> PanoResult<()> {
            let (tx, rx) = mpsc::channel::<FrameDone>();
            let mut reorder = Reorder::default();
            let mut in_flight = 0usize;
            let mut source_index = 0u64;

            let mut decode_res = Ok(());
            loop {
                while in_flight >= depth {
                    reorder.insert(recv_done(&rx)?);
                    in_flight -= 1;
                    reorder.drain(|done| {
                        self.export(done, sink, progress, &mut st, &mut tally, started)
                    });
                }

                let frame = match source.next_frame() {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break,
                    Err(e) => {
                        decode_res = Err(e);
                        break;
                    }
                };
                let idx = source_index;
                source_index += 1;
                tally.frames_decoded += 1;
                if idx % interval != 0 {
                    continue;
                }
                if self.cancel.is_cancelled() {
                    tracing::info!(source_index = idx, "cancellation requested, stopping dispatch");
                    st.cancelled = true;
                    break;
                }

                let sampled = st.sampled_count;
                st.sampled_count += 1;
                let tx = tx.clone();
                let processor = &processor;
                scope.spawn(move |_| {
                    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        processor.process(&frame)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(PanoError::frame_processing(format!(
                            "frame task panicked: {}",
                            panic_message(payload.as_ref())
                        )))
                    });
                    let _ = tx.send(FrameDone {
                        sampled,
                        source_index: idx,
                        result,
                    });
                });
                in_flight += 1;
            }

            while in_flight > 0 {
                reorder.insert(recv_done(&rx)?);
                in_flight -= 1;
                reorder.drain(|done| {
                    self.export(done, sink, progress, &mut st, &mut tally, started)
                });
            }
            decode_res
        });

        if let Err(e) = sink.end() {
            tally.export_errors += 1;
            tracing::warn!(error = %e, "finalizing output failed");
        }

        if let Err(e) = decode_res {
            return Err(fail(&mut st, progress, e));
        }

        st.state = if st.cancelled {
            JobState::Cancelled
        } else {
            JobState::Completed
        };
        st.error_count = tally.frame_errors + tally.export_errors;
        progress.report(&st.final_snapshot());

        let result = JobResult {
            state: st.state,
            processed_count: st.processed_count,
            error_count: st.error_count,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            frames_decoded: tally.frames_decoded,
            outputs_written: tally.outputs_written,
            frame_errors: tally.frame_errors,
            export_errors: tally.export_errors,
        };
        tracing::info!(
            state = ?result.state,
            processed = result.processed_count,
            errors = result.error_count,
            written = result.outputs_written,
            elapsed_s = result.elapsed_seconds,
            "projection job finished"
        );
        Ok(result)
    }

    /// Report a fatal error raised before [`run`](Self::run) could start, e.g. while opening
    /// the source, and hand it back.
    pub fn abort(&self, progress: &mut dyn ProgressSink, err: PanoError) -> PanoError {
        fail(&mut ProgressState::default(), progress, err)
    }

    fn export(
        &self,
        done: FrameDone,
        sink: &mut dyn ImageSink,
        progress: &mut dyn ProgressSink,
        st: &mut ProgressState,
        tally: &mut Tally,
        started: Instant,
    ) {
        match done.result {
            Ok(views) => {
                for ProjectedView {
                    yaw_degrees,
                    view,
                    image,
                } in views
                {
                    let out = ProjectedFrame {
                        sampled_index: done.sampled,
                        source_index: done.source_index,
                        yaw_degrees,
                        view,
                        image,
                    };
                    match sink.write(&out) {
                        Ok(()) => tally.outputs_written += 1,
                        Err(e) => {
                            tally.export_errors += 1;
                            tracing::warn!(
                                sampled = done.sampled,
                                yaw = yaw_degrees,
                                error = %e,
                                "failed to export view"
                            );
                        }
                    }
                }
                st.processed_count += 1;
                if st.processed_count % THROUGHPUT_LOG_EVERY == 0 {
                    let secs = started.elapsed().as_secs_f64();
                    let fps = if secs > 0.0 {
                        st.processed_count as f64 / secs
                    } else {
                        0.0
                    };
                    tracing::info!(
                        processed = st.processed_count,
                        frames_per_sec = fps,
                        "throughput"
                    );
                }
            }
            Err(e) => {
                tally.frame_errors += 1;
                tracing::error!(
                    sampled = done.sampled,
                    source_index = done.source_index,
                    error = %e,
                    "frame failed, skipping its outputs"
                );
            }
        }
        st.error_count = tally.frame_errors + tally.export_errors;
        progress.report(&st.snapshot(done.source_index));
    }
}

#[derive(Debug, Default)]
struct Tally {
    frames_decoded: u64,
    outputs_written: u64,
    frame_errors: u64,
    export_errors: u64,
}

#[derive(Debug)]
struct FrameDone {
    sampled: u64,
    source_index: u64,
    result: PanoResult<Vec<ProjectedView>>,
}

/// Holds completions until every earlier sampled frame has been handed on.
#[derive(Debug, Default)]
struct Reorder {
    next: u64,
    pending: HashMap<u64, FrameDone>,
}

impl Reorder {
    fn insert(&mut self, done: FrameDone) {
        self.pending.insert(done.sampled, done);
    }

    fn drain(&mut self, mut f: impl FnMut(FrameDone)) {
        while let Some(done) = self.pending.remove(&self.next) {
            f(done);
            self.next += 1;
        }
    }
}

fn recv_done(rx: &mpsc::Receiver<FrameDone>) -> PanoResult<FrameDone> {
    rx.recv().map_err(|_| {
        PanoError::frame_processing("frame result channel disconnected unexpectedly")
    })
}

fn fail(st: &mut ProgressState, progress: &mut dyn ProgressSink, err: PanoError) -> PanoError {
    st.state = JobState::Failed;
    tracing::error!(error = %err, "projection job failed");
    progress.report(&st.final_snapshot());
    err
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub(crate) fn build_thread_pool(threads: usize) -> PanoResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(PanoError::configuration("worker count must be at least 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("pano-worker-{i}"))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build rayon thread pool: {e}").into())
}

#[cfg(test)]
#[path = "../../tests/unit/job/runner.rs"]
mod tests;
