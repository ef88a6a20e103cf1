use linefield::game::lines::recording::RecordingBackend;
use linefield::game::lines::{LineLayout, LineSettings, TimingLineManager};
use linefield::game::scroll::ScrollDirection;
use linefield::game::timing::{ScrollVelocity, ScrollVelocityMap, TimingPoint, TrackPositionSource};
use std::hint::black_box;
use std::time::Instant;

const LENGTH_MS: f32 = 600_000.0;
const FRAMES: usize = 200_000;

fn main() {
    let points: Vec<TimingPoint> = (0..40)
        .map(|i| TimingPoint::new(i as f32 * 15_000.0, 120.0 + (i % 7) as f32 * 40.0, 4))
        .collect();
    let svs: Vec<ScrollVelocity> = (0..400)
        .map(|i| ScrollVelocity { start_time: i as f32 * 1_500.0, multiplier: if i % 2 == 0 { 0.6 } else { 1.4 } })
        .collect();
    let map = ScrollVelocityMap::new(1.0, &svs);
    let settings = LineSettings { lines_per_measure: 16, ..LineSettings::default() };
    let layout = LineLayout {
        direction: ScrollDirection::Down,
        base_position: 385.0,
        scroll_speed: 1.0,
        render_threshold: 72_000,
    };

    let started = Instant::now();
    let mut manager = TimingLineManager::new(RecordingBackend::default(), layout);
    manager.load(&points, LENGTH_MS, &settings, &map);
    let load_elapsed = started.elapsed();

    let step = LENGTH_MS / FRAMES as f32;
    let started = Instant::now();
    let mut active = 0usize;
    for frame in 0..FRAMES {
        let offset = map.position_at_time(frame as f32 * step);
        active += black_box(manager.refresh(offset)).active;
    }
    let refresh_elapsed = started.elapsed();

    println!(
        "load: {} lines in {:?}, pool {}",
        manager.lines().len(),
        load_elapsed,
        manager.max_visible()
    );
    println!(
        "refresh: {FRAMES} frames in {:?} ({:.0} ns/frame, avg {:.1} active, {} overflow)",
        refresh_elapsed,
        refresh_elapsed.as_nanos() as f64 / FRAMES as f64,
        active as f64 / FRAMES as f64,
        manager.pool().overflow_created()
    );
}
