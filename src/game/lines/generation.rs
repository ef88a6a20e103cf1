use crate::game::lines::pool::PoolIndex;
use crate::game::lines::spatial_hash::{LineId, PositionIndex};
use crate::game::timing::{TimingPoint, TrackPositionSource};
use log::{debug, info, warn};
use std::cmp::Ordering;

pub const DEFAULT_LINES_PER_MEASURE: u32 = 1;
pub const DEFAULT_MAX_TIMING_LINES: usize = 100_000;

/// A measure (or sub-measure) line on the scroll axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingLine {
    pub time: f32,
    pub track_offset: i64,
    /// Visual currently drawing this line; `None` while off-screen.
    pub linked: Option<PoolIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSettings {
    /// Evenly spaced lines per measure; 1 draws measure lines only.
    pub lines_per_measure: u32,
    pub max_lines: usize,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self { lines_per_measure: DEFAULT_LINES_PER_MEASURE, max_lines: DEFAULT_MAX_TIMING_LINES }
    }
}

/// Generated lines plus the index over them and the derived pool size.
#[derive(Debug, Clone)]
pub struct TimingLineSet {
    pub lines: Vec<TimingLine>,
    pub index: PositionIndex,
    pub max_visible: usize,
}

impl TimingLineSet {
    pub fn empty(cell_size: i64) -> Self {
        Self { lines: Vec::new(), index: PositionIndex::new(cell_size), max_visible: 0 }
    }
}

#[inline(always)]
fn line_interval_ms(tp: &TimingPoint, lines_per_measure: u32) -> f32 {
    tp.signature as f32 * tp.ms_per_beat() / lines_per_measure.max(1) as f32
}

/// Lays out timing lines for every visible timing point and indexes them by
/// track offset. Malformed points are skipped, never reported as errors.
pub fn generate_timing_lines<P>(
    timing_points: &[TimingPoint],
    length_ms: f32,
    settings: &LineSettings,
    position: &P,
    cell_size: i64,
) -> TimingLineSet
where
    P: TrackPositionSource + ?Sized,
{
    let mut set = TimingLineSet::empty(cell_size);

    let mut points: Vec<TimingPoint> = timing_points
        .iter()
        .copied()
        .filter(|tp| tp.start_time.is_finite())
        .collect();
    points.sort_by(|a, b| a.start_time.partial_cmp(&b.start_time).unwrap_or(Ordering::Less));

    let mut skipped = 0usize;
    'points: for (i, tp) in points.iter().enumerate() {
        if tp.hidden {
            continue;
        }
        let interval = line_interval_ms(tp, settings.lines_per_measure);
        if !interval.is_finite() || interval <= 0.0 {
            skipped += 1;
            continue;
        }

        let next_start = points.get(i + 1).map(|next| next.start_time);
        let mut k = 0u32;
        loop {
            let time = (k as f32).mul_add(interval, tp.start_time);
            let in_range = match next_start {
                Some(end) => time < end,
                None => time <= length_ms,
            };
            if !in_range {
                break;
            }
            if set.lines.len() >= settings.max_lines {
                warn!(
                    "Timing line ceiling of {} reached at {:.1}ms; remaining lines dropped.",
                    settings.max_lines, time
                );
                break 'points;
            }
            let track_offset = position.position_at_time(time);
            let id = set.lines.len() as LineId;
            set.lines.push(TimingLine { time, track_offset, linked: None });
            set.index.insert(track_offset, id);
            k += 1;
        }
    }

    set.max_visible = set.index.max_bucket_len() * 2;
    if skipped > 0 {
        debug!("Skipped {skipped} timing point(s) with a non-positive line interval.");
    }
    info!(
        "Generated {} timing lines across {} cells (cell size {}, pool size {}).",
        set.lines.len(),
        set.index.bucket_count(),
        set.index.cell_size(),
        set.max_visible
    );
    set
}
