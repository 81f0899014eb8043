use super::*;

#[test]
fn percent_is_clamped_and_zero_for_unknown_totals() {
    assert_eq!(percent_of(15, 60), 25.0);
    assert_eq!(percent_of(90, 60), 100.0);
    assert_eq!(percent_of(3, 0), 0.0);
}

#[test]
fn snapshots_copy_the_counters() {
    let mut st = ProgressState::new(45);
    st.state = JobState::Running;
    st.sampled_count = 2;
    st.processed_count = 1;
    st.error_count = 1;
    let u = st.snapshot(15);
    assert_eq!(u.state, JobState::Running);
    assert_eq!((u.sampled_count, u.processed_count, u.error_count), (2, 1, 1));
    assert_eq!(u.total_frames, 45);
    assert!((u.percent - 100.0 / 3.0).abs() < 1e-9);

    st.state = JobState::Completed;
    assert_eq!(st.final_snapshot().percent, 100.0);
}

#[test]
fn interrupted_runs_end_at_the_last_reported_position() {
    let mut st = ProgressState::new(50);
    st.state = JobState::Failed;
    assert_eq!(st.final_snapshot().percent, 0.0);

    st.state = JobState::Running;
    st.snapshot(5);
    st.snapshot(20);
    for state in [JobState::Cancelled, JobState::Failed] {
        st.state = state;
        let u = st.final_snapshot();
        assert_eq!(u.state, state);
        assert_eq!(u.source_index, 20);
        assert_eq!(u.percent, 40.0);
    }
}

#[test]
fn closures_are_progress_sinks() {
    let mut seen = Vec::new();
    {
        let mut sink = |u: &ProgressUpdate| seen.push(u.sampled_count);
        let mut st = ProgressState::new(10);
        sink.report(&st.snapshot(0));
        sink.report(&st.snapshot(5));
    }
    assert_eq!(seen, vec![0, 0]);
}

#[test]
fn channel_sink_forwards_and_tolerates_a_dropped_receiver() {
    let (mut sink, rx) = ChannelProgressSink::channel();
    let mut st = ProgressState::new(4);
    sink.report(&st.snapshot(2));
    assert_eq!(rx.recv().unwrap().percent, 50.0);
    drop(rx);
    sink.report(&st.snapshot(3));
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(!other.is_cancelled());
    token.cancel();
    assert!(other.is_cancelled());
}

#[test]
fn terminal_states() {
    assert!(!JobState::Idle.is_terminal());
    assert!(!JobState::Running.is_terminal());
    assert!(JobState::Completed.is_terminal());
    assert!(JobState::Cancelled.is_terminal());
    assert!(JobState::Failed.is_terminal());
}
