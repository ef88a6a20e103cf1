use serde::Deserialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    #[inline(always)]
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Piecewise-linear scalar over time, resolved with a cursor that remembers the
/// last bracketing keyframe. Forward playback is O(1) amortized; a seek costs
/// the number of keyframes crossed.
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    keys: Vec<Keyframe>,
    cursor: usize,
}

impl KeyframeCursor {
    pub fn new(keyframes: &[Keyframe]) -> Self {
        let mut keys: Vec<Keyframe> = keyframes
            .iter()
            .copied()
            .filter(|k| k.time.is_finite() && k.value.is_finite())
            .collect();
        // Stable sort keeps authored order for keyframes sharing a time.
        keys.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));

        let has_anchor = keys.iter().any(|k| k.time == 0.0 && k.value == 0.0);
        if !has_anchor {
            let at = keys.partition_point(|k| k.time < 0.0);
            keys.insert(at, Keyframe::new(0.0, 0.0));
        }

        Self { keys, cursor: 0 }
    }

    #[inline(always)]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keys
    }

    #[inline(always)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves an out-of-range cursor back to the first keyframe. Returns whether
    /// it had to.
    fn reset_invalid_cursor(&mut self) -> bool {
        if self.cursor < self.keys.len() {
            return false;
        }
        self.cursor = 0;
        true
    }

    pub fn value_at(&mut self, time: f32) -> f32 {
        if self.keys.is_empty() {
            return 0.0;
        }
        if self.reset_invalid_cursor() {
            debug_assert!(false, "keyframe cursor out of bounds ({} keyframes)", self.keys.len());
            return 0.0;
        }
        let keys = &self.keys;
        let Some(last) = keys.last() else {
            return 0.0;
        };
        if time >= last.time {
            self.cursor = keys.len() - 1;
            return last.value;
        }
        if time < keys[0].time {
            self.cursor = 0;
            return keys[0].value;
        }

        // keys[0].time <= time < last.time, so both walks stay in bounds.
        let mut i = self.cursor;
        while keys[i].time > time {
            i -= 1;
        }
        while keys[i + 1].time <= time {
            i += 1;
        }
        self.cursor = i;

        let k0 = keys[i];
        let k1 = keys[i + 1];
        let progress = (time - k0.time) / (k1.time - k0.time);
        (k1.value - k0.value).mul_add(progress, k0.value)
    }
}
