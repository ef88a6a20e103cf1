use crate::config::Config;
use crate::game::keyframes::KeyframeCursor;
use crate::game::lines::generation::LineSettings;
use crate::game::lines::manager::{LineLayout, RefreshStats, TimingLineManager};
use crate::game::lines::pool::VisualBackend;
use crate::game::map::MapTiming;
use crate::game::scroll::ScrollDirection;
use crate::game::timing::{ScrollVelocityMap, TrackPositionSource};
use log::info;
use smallvec::SmallVec;

// Keeps the speed curve from stopping or flipping the playfield.
pub const MIN_SPEED_FACTOR: f32 = 0.05;

/// All timing line managers of one gameplay screen, one per scroll direction.
///
/// Owned by the screen for the lifetime of a loaded chart; split scroll gets two
/// fully independent instances.
pub struct TimingLineField<B: VisualBackend> {
    managers: SmallVec<[TimingLineManager<B>; 2]>,
    settings: LineSettings,
    scroll_speed: f32,
    speed_curve: Option<KeyframeCursor>,
    position: ScrollVelocityMap,
    map: MapTiming,
}

impl<B: VisualBackend> TimingLineField<B> {
    /// Builds and loads one manager per direction implied by the configured
    /// scroll option. `make_backend` is called once per direction.
    pub fn load<F>(config: &Config, map: MapTiming, mut make_backend: F) -> Self
    where
        F: FnMut(ScrollDirection) -> B,
    {
        let settings = config.line_settings();
        let position = map.position_map();
        let render_threshold = config.render_threshold();
        let speed_curve = (!map.speed_keyframes.is_empty()).then(|| KeyframeCursor::new(&map.speed_keyframes));

        let mut managers = SmallVec::new();
        for direction in config.scroll_option.directions() {
            let layout = LineLayout {
                direction,
                base_position: config.receptor_position(direction),
                scroll_speed: config.scroll_speed,
                render_threshold,
            };
            let mut manager = TimingLineManager::new(make_backend(direction), layout);
            manager.load(&map.timing_points, map.length_ms, &settings, &position);
            managers.push(manager);
        }
        info!(
            "Timing line field loaded: {} scroll direction(s), render threshold {}.",
            managers.len(),
            render_threshold
        );

        Self { managers, settings, scroll_speed: config.scroll_speed, speed_curve, position, map }
    }

    /// Track offset for a song time under the current scroll velocities.
    #[inline(always)]
    pub fn track_offset_at(&self, time_ms: f32) -> i64 {
        self.position.position_at_time(time_ms)
    }

    /// Per-frame entry point. Returns the combined refresh counters.
    pub fn update(&mut self, time_ms: f32) -> RefreshStats {
        let offset = self.position.position_at_time(time_ms);
        let speed = match self.speed_curve.as_mut() {
            Some(curve) => self.scroll_speed * (1.0 + curve.value_at(time_ms)).max(MIN_SPEED_FACTOR),
            None => self.scroll_speed,
        };

        let mut total = RefreshStats::default();
        for manager in &mut self.managers {
            manager.set_scroll_speed(speed);
            let stats = manager.refresh(offset);
            total.evicted += stats.evicted;
            total.admitted += stats.admitted;
            total.overflowed += stats.overflowed;
            total.active += stats.active;
        }
        total
    }

    /// Regenerates every instance against new scroll velocities.
    pub fn rebuild(&mut self, position: ScrollVelocityMap) {
        self.position = position;
        for manager in &mut self.managers {
            manager.load(&self.map.timing_points, self.map.length_ms, &self.settings, &self.position);
        }
        info!("Timing line field rebuilt for {} scroll direction(s).", self.managers.len());
    }

    pub fn dispose(&mut self) {
        for manager in &mut self.managers {
            manager.dispose();
        }
    }

    #[inline(always)]
    pub fn managers(&self) -> &[TimingLineManager<B>] {
        &self.managers
    }
}

#[cfg(test)]
mod tests {
    use super::{MIN_SPEED_FACTOR, TimingLineField};
    use crate::config::Config;
    use crate::game::keyframes::Keyframe;
    use crate::game::lines::manager::ManagerState;
    use crate::game::lines::recording::RecordingBackend;
    use crate::game::map::MapTiming;
    use crate::game::scroll::{ScrollDirection, ScrollOption};
    use crate::game::timing::{ScrollVelocityMap, TimingPoint};

    fn demo_map() -> MapTiming {
        MapTiming {
            length_ms: 30_000.0,
            timing_points: vec![TimingPoint::new(0.0, 120.0, 4), TimingPoint::new(16_000.0, 180.0, 4)],
            ..MapTiming::default()
        }
    }

    #[test]
    fn split_scroll_gets_independent_halves() {
        let config = Config { scroll_option: ScrollOption::Split, ..Config::default() };
        let mut field = TimingLineField::load(&config, demo_map(), |_| RecordingBackend::default());
        let dirs: Vec<ScrollDirection> = field.managers().iter().map(|m| m.layout().direction).collect();
        assert_eq!(dirs, vec![ScrollDirection::Down, ScrollDirection::Up]);

        let stats = field.update(4_000.0);
        assert!(stats.active > 0);
        let down = &field.managers()[0];
        let up = &field.managers()[1];
        assert_eq!(down.active_lines(), up.active_lines(), "both halves see the same lines");
        assert_eq!(stats.active, down.active_lines().len() * 2);
        assert_ne!(down.layout().base_position, up.layout().base_position);
    }

    #[test]
    fn speed_curve_scales_scroll_speed() {
        let config = Config::default();
        let map = MapTiming {
            speed_keyframes: vec![Keyframe::new(10_000.0, 1.0)],
            ..demo_map()
        };
        let mut field = TimingLineField::load(&config, map, |_| RecordingBackend::default());
        field.update(5_000.0);
        let speed = field.managers()[0].layout().scroll_speed;
        assert!((speed - config.scroll_speed * 1.5).abs() < 1e-4, "speed {speed}");
    }

    #[test]
    fn speed_curve_never_stops_or_flips_lines() {
        let config = Config::default();
        let map = MapTiming {
            speed_keyframes: vec![Keyframe::new(1_000.0, -3.0)],
            ..demo_map()
        };
        let mut field = TimingLineField::load(&config, map, |_| RecordingBackend::default());
        field.update(2_000.0);
        let speed = field.managers()[0].layout().scroll_speed;
        assert!((speed - config.scroll_speed * MIN_SPEED_FACTOR).abs() < 1e-6, "speed {speed}");
    }

    #[test]
    fn rebuild_moves_lines_to_new_offsets() {
        let config = Config::default();
        let mut field = TimingLineField::load(&config, demo_map(), |_| RecordingBackend::default());
        field.update(2_000.0);
        let before = field.managers()[0].lines()[1].track_offset;
        field.rebuild(ScrollVelocityMap::new(0.5, &[]));
        let after = field.managers()[0].lines()[1].track_offset;
        assert_eq!(after * 2, before);
        assert_eq!(field.managers()[0].state(), ManagerState::Ready);
        assert_eq!(field.track_offset_at(2_000.0), 100_000);
    }

    #[test]
    fn dispose_tears_down_every_half() {
        let config = Config { scroll_option: ScrollOption::Split, ..Config::default() };
        let mut field = TimingLineField::load(&config, demo_map(), |_| RecordingBackend::default());
        field.update(1_000.0);
        field.dispose();
        for m in field.managers() {
            assert_eq!(m.state(), ManagerState::Disposed);
            assert_eq!(m.backend().live(), 0);
        }
        assert_eq!(field.update(1_000.0).active, 0);
    }
}
