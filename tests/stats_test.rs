use beach_scene::stats::{FpsHistory, FrameStats};
use instant::Duration;

#[test]
fn should_report_nothing_before_the_first_frame() {
    let mut stats = FrameStats::default();
    assert_eq!(stats.take(), None);
}

#[test]
fn should_summarise_and_reset() {
    let mut stats = FrameStats::default();
    for ms in [10, 10, 10, 40] {
        stats.record(Duration::from_millis(ms));
    }
    let report = stats.take().expect("four frames were recorded");
    assert_eq!(report.frames, 4);
    assert!((report.mean_frame_ms - 17.5).abs() < 1e-3);
    assert!((report.slowest_frame_ms - 40.0).abs() < 1e-3);
    assert!((report.fps - 4.0 / 0.07).abs() < 1e-2);

    assert_eq!(stats.take(), None);
}

#[test]
fn should_not_divide_by_zero_for_instant_frames() {
    let mut stats = FrameStats::default();
    stats.record(Duration::from_millis(0));
    let report = stats.take().expect("one frame was recorded");
    assert_eq!(report.fps, 0.0);
    assert_eq!(report.mean_frame_ms, 0.0);
}

#[test]
fn should_keep_only_the_latest_rates() {
    let mut history = FpsHistory::new(3);
    assert!(history.is_empty());
    for fps in [30.0, 60.0, 45.0, 15.0] {
        history.push(fps);
    }
    assert_eq!(history.len(), 3);
    // 30 scrolled out, the peak stays
    assert_eq!(history.peak(), 60.0);
    let heights: Vec<f32> = history.heights().collect();
    assert_eq!(heights, vec![1.0, 0.75, 0.25]);
}

#[test]
fn should_ignore_rates_that_cannot_be_drawn() {
    let mut history = FpsHistory::new(4);
    history.push(f32::NAN);
    history.push(f32::INFINITY);
    assert!(history.is_empty());

    history.push(0.0);
    assert_eq!(history.heights().collect::<Vec<_>>(), vec![0.0]);
}
