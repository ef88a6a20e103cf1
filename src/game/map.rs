use crate::game::keyframes::Keyframe;
use crate::game::timing::{ScrollVelocity, ScrollVelocityMap, TimingPoint};
use log::info;
use serde::Deserialize;
use std::path::Path;

fn default_initial_scroll_velocity() -> f32 {
    1.0
}

/// Timing data of one chart, as far as the playfield needs it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapTiming {
    pub length_ms: f32,
    pub timing_points: Vec<TimingPoint>,
    #[serde(default)]
    pub scroll_velocities: Vec<ScrollVelocity>,
    #[serde(default = "default_initial_scroll_velocity")]
    pub initial_scroll_velocity: f32,
    /// Additive scroll speed modifier over time; 0.5 draws at 1.5x speed.
    /// Values should stay above -1; the factor is clamped to a small positive
    /// minimum and the visibility window is not rescaled.
    #[serde(default)]
    pub speed_keyframes: Vec<Keyframe>,
}

impl Default for MapTiming {
    fn default() -> Self {
        Self {
            length_ms: 0.0,
            timing_points: Vec::new(),
            scroll_velocities: Vec::new(),
            initial_scroll_velocity: default_initial_scroll_velocity(),
            speed_keyframes: Vec::new(),
        }
    }
}

impl MapTiming {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let map: Self = serde_json::from_str(&content)?;
        info!(
            "Loaded '{}': {:.0}ms, {} timing point(s), {} scroll velocity change(s).",
            path.display(),
            map.length_ms,
            map.timing_points.len(),
            map.scroll_velocities.len()
        );
        Ok(map)
    }

    #[inline(always)]
    pub fn position_map(&self) -> ScrollVelocityMap {
        ScrollVelocityMap::new(self.initial_scroll_velocity, &self.scroll_velocities)
    }

    /// A three-minute chart with a tempo change, a slowdown and a speed swell.
    pub fn demo() -> Self {
        Self {
            length_ms: 180_000.0,
            timing_points: vec![
                TimingPoint::new(0.0, 140.0, 4),
                TimingPoint::new(60_000.0, 175.0, 4),
                TimingPoint::new(120_000.0, 87.5, 3),
            ],
            scroll_velocities: vec![
                ScrollVelocity { start_time: 45_000.0, multiplier: 0.5 },
                ScrollVelocity { start_time: 50_000.0, multiplier: 1.0 },
                ScrollVelocity { start_time: 150_000.0, multiplier: 2.0 },
            ],
            initial_scroll_velocity: 1.0,
            speed_keyframes: vec![
                Keyframe::new(90_000.0, 0.0),
                Keyframe::new(100_000.0, 0.5),
                Keyframe::new(110_000.0, 0.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MapTiming;
    use crate::game::timing::TrackPositionSource;

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "length_ms": 4000.0,
            "timing_points": [{ "start_time": 0.0, "bpm": 120.0 }]
        }"#;
        let map: MapTiming = serde_json::from_str(json).expect("valid map json");
        assert_eq!(map.timing_points.len(), 1);
        assert_eq!(map.timing_points[0].signature, 4);
        assert!(!map.timing_points[0].hidden);
        assert_eq!(map.initial_scroll_velocity, 1.0);
        assert!(map.scroll_velocities.is_empty());
        assert!(map.speed_keyframes.is_empty());
    }

    #[test]
    fn full_document_round_trips_through_position_map() {
        let json = r#"{
            "length_ms": 10000.0,
            "timing_points": [{ "start_time": 0.0, "bpm": 200.0, "signature": 3, "hidden": true }],
            "scroll_velocities": [{ "start_time": 1000.0, "multiplier": 2.0 }],
            "initial_scroll_velocity": 0.5,
            "speed_keyframes": [{ "time": 500.0, "value": 1.0 }]
        }"#;
        let map: MapTiming = serde_json::from_str(json).expect("valid map json");
        assert!(map.timing_points[0].hidden);
        let pos = map.position_map();
        assert_eq!(pos.position_at_time(1000.0), 50_000);
        assert_eq!(pos.position_at_time(2000.0), 250_000);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(MapTiming::load("definitely/not/here.json").is_err());
    }
}
