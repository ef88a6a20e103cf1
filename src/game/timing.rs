use serde::Deserialize;
use std::cmp::Ordering;

/// Track offsets are stored as `i64` with this many units per millisecond at 1.0x velocity.
pub const TRACK_ROUNDING: f32 = 100.0;

// Guards against malformed charts producing near-infinite line counts.
pub const MAX_BPM: f32 = 9999.0;

fn default_signature() -> u32 {
    4
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimingPoint {
    pub start_time: f32,
    pub bpm: f32,
    #[serde(default = "default_signature")]
    pub signature: u32,
    #[serde(default)]
    pub hidden: bool,
}

impl TimingPoint {
    #[inline(always)]
    pub fn new(start_time: f32, bpm: f32, signature: u32) -> Self {
        Self { start_time, bpm, signature, hidden: false }
    }

    /// Milliseconds per beat after clamping to `MAX_BPM`. Non-positive BPMs
    /// yield a non-positive or non-finite value which callers must skip.
    #[inline(always)]
    pub fn ms_per_beat(&self) -> f32 {
        // f32::min would turn a NaN BPM into MAX_BPM.
        let bpm = if self.bpm.is_nan() { 0.0 } else { self.bpm.min(MAX_BPM) };
        60_000.0 / bpm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScrollVelocity {
    pub start_time: f32,
    pub multiplier: f32,
}

/// Source of the scroll-axis coordinate for a point in song time.
///
/// Must be deterministic for the duration of one generation pass; a changed
/// mapping (scroll speed settings, new velocities) requires a rebuild.
pub trait TrackPositionSource {
    fn position_at_time(&self, time_ms: f32) -> i64;
}

impl<F> TrackPositionSource for F
where
    F: Fn(f32) -> i64,
{
    #[inline(always)]
    fn position_at_time(&self, time_ms: f32) -> i64 {
        self(time_ms)
    }
}

#[derive(Debug, Clone, Copy)]
struct VelocityPrefix {
    start_time: f32,
    position: f64,
    multiplier: f32,
}

/// Piecewise-linear time → track offset mapping built from scroll velocity changes.
#[derive(Debug, Clone)]
pub struct ScrollVelocityMap {
    initial_multiplier: f32,
    prefix: Vec<VelocityPrefix>,
}

impl Default for ScrollVelocityMap {
    fn default() -> Self {
        Self::new(1.0, &[])
    }
}

impl ScrollVelocityMap {
    pub fn new(initial_multiplier: f32, velocities: &[ScrollVelocity]) -> Self {
        let initial_multiplier = if initial_multiplier.is_finite() { initial_multiplier } else { 1.0 };
        let mut sorted: Vec<ScrollVelocity> = velocities
            .iter()
            .copied()
            .filter(|sv| sv.start_time.is_finite() && sv.multiplier.is_finite())
            .collect();
        sorted.sort_by(|a, b| a.start_time.partial_cmp(&b.start_time).unwrap_or(Ordering::Less));

        let mut prefix = Vec::with_capacity(sorted.len());
        let mut last_time = 0.0_f32;
        let mut last_multiplier = initial_multiplier;
        // Accumulated in f64; f32 loses whole track units past a few minutes.
        let mut position = 0.0_f64;
        for (i, sv) in sorted.iter().enumerate() {
            position = if i == 0 {
                f64::from(sv.start_time) * f64::from(initial_multiplier) * f64::from(TRACK_ROUNDING)
            } else {
                let elapsed = f64::from(sv.start_time) - f64::from(last_time);
                elapsed.mul_add(f64::from(last_multiplier) * f64::from(TRACK_ROUNDING), position)
            };
            prefix.push(VelocityPrefix { start_time: sv.start_time, position, multiplier: sv.multiplier });
            last_time = sv.start_time;
            last_multiplier = sv.multiplier;
        }

        Self { initial_multiplier, prefix }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }
}

impl TrackPositionSource for ScrollVelocityMap {
    fn position_at_time(&self, time_ms: f32) -> i64 {
        let idx = self.prefix.partition_point(|p| p.start_time <= time_ms);
        let time = f64::from(time_ms);
        let pos = if idx == 0 {
            time * f64::from(self.initial_multiplier) * f64::from(TRACK_ROUNDING)
        } else {
            let p = self.prefix[idx - 1];
            (time - f64::from(p.start_time)).mul_add(f64::from(p.multiplier) * f64::from(TRACK_ROUNDING), p.position)
        };
        pos as i64
    }
}
