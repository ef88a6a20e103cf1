use crate::game::lines::generation::{LineSettings, TimingLine, TimingLineSet, generate_timing_lines};
use crate::game::lines::pool::{VisualBackend, VisualPool};
use crate::game::lines::spatial_hash::LineId;
use crate::game::scroll::ScrollDirection;
use crate::game::timing::{TimingPoint, TrackPositionSource};
use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Ready,
    Updating,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLayout {
    pub direction: ScrollDirection,
    /// Receptor position lines converge on.
    pub base_position: f32,
    /// Pixels per millisecond at 1.0x scroll velocity.
    pub scroll_speed: f32,
    /// Track distance from the current offset within which a line is drawn.
    pub render_threshold: i64,
}

impl LineLayout {
    #[inline(always)]
    pub fn cell_size(&self) -> i64 {
        self.render_threshold.max(1).saturating_mul(2)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub evicted: usize,
    pub admitted: usize,
    /// Visuals constructed because the pool ran dry.
    pub overflowed: usize,
    pub active: usize,
}

/// Keeps the visuals of one scroll direction bound to exactly the timing lines
/// within `render_threshold` of the current track offset.
pub struct TimingLineManager<B: VisualBackend> {
    backend: B,
    layout: LineLayout,
    state: ManagerState,
    set: TimingLineSet,
    pool: VisualPool<B::Handle>,
    active: Vec<LineId>,
    scratch: Vec<LineId>,
}

impl<B: VisualBackend> TimingLineManager<B> {
    pub fn new(backend: B, layout: LineLayout) -> Self {
        Self {
            backend,
            layout,
            state: ManagerState::Uninitialized,
            set: TimingLineSet::empty(layout.cell_size()),
            pool: VisualPool::default(),
            active: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Generates lines for a chart and pre-fills the pool. Calling this again
    /// tears down the previous generation first.
    pub fn load<P>(
        &mut self,
        timing_points: &[TimingPoint],
        length_ms: f32,
        settings: &LineSettings,
        position: &P,
    ) where
        P: TrackPositionSource + ?Sized,
    {
        if matches!(self.state, ManagerState::Ready | ManagerState::Updating) {
            self.teardown();
        }
        let set = generate_timing_lines(timing_points, length_ms, settings, position, self.layout.cell_size());
        let capacity = set.max_visible;
        self.pool = VisualPool::with_capacity(capacity, &mut self.backend);
        self.active = Vec::with_capacity(capacity);
        self.scratch = Vec::with_capacity(capacity);
        self.set = set;
        self.state = ManagerState::Ready;
        debug!(
            "{} timing line manager ready: {} lines, {} pooled visuals.",
            self.layout.direction,
            self.set.lines.len(),
            capacity
        );
    }

    pub fn refresh(&mut self, current_offset: i64) -> RefreshStats {
        match self.state {
            ManagerState::Uninitialized | ManagerState::Disposed => {
                trace!("Ignoring refresh on {:?} timing line manager.", self.state);
                return RefreshStats::default();
            }
            ManagerState::Ready | ManagerState::Updating => self.state = ManagerState::Updating,
        }

        let threshold = self.layout.render_threshold.max(0);
        let reach = threshold as u64;
        let mut stats = RefreshStats::default();

        // Evict lines that scrolled out of range.
        let mut i = 0;
        while i < self.active.len() {
            let line = &mut self.set.lines[self.active[i] as usize];
            if line.track_offset.abs_diff(current_offset) > reach {
                match line.linked.take() {
                    Some(idx) => self.pool.release(idx),
                    None => debug_assert!(false, "active line {} had no visual", self.active[i]),
                }
                self.active.swap_remove(i);
                stats.evicted += 1;
            } else {
                i += 1;
            }
        }

        // Probe the (at most two) cells the window touches.
        let low = current_offset.saturating_sub(threshold);
        let high = current_offset.saturating_add(threshold);
        let index = &self.set.index;
        self.scratch.clear();
        self.scratch.extend_from_slice(index.query(low));
        if index.cell_of(high) != index.cell_of(low) {
            self.scratch.extend_from_slice(index.query(high));
        }

        for &id in &self.scratch {
            let line = &mut self.set.lines[id as usize];
            if line.linked.is_some() || line.track_offset.abs_diff(current_offset) > reach {
                continue;
            }
            let before = self.pool.overflow_created();
            let idx = self.pool.acquire(&mut self.backend);
            stats.overflowed += self.pool.overflow_created() - before;
            line.linked = Some(idx);
            self.active.push(id);
            stats.admitted += 1;
        }

        let layout = self.layout;
        for &id in &self.active {
            let line = &self.set.lines[id as usize];
            let Some(idx) = line.linked else {
                debug_assert!(false, "active line {id} had no visual");
                continue;
            };
            let y = layout
                .direction
                .line_position(layout.base_position, current_offset, line.track_offset, layout.scroll_speed);
            if let Some(handle) = self.pool.get_mut(idx) {
                self.backend.set_position(handle, y);
            }
        }

        stats.active = self.active.len();
        if stats.admitted > 0 || stats.evicted > 0 {
            trace!(
                "{} lines @ {current_offset}: +{} -{} ({} active, {} pooled).",
                layout.direction,
                stats.admitted,
                stats.evicted,
                stats.active,
                self.pool.available()
            );
        }
        stats
    }

    /// Unlinks every line and destroys every visual. Further refreshes are ignored.
    pub fn dispose(&mut self) {
        if self.state == ManagerState::Disposed {
            return;
        }
        self.teardown();
        self.state = ManagerState::Disposed;
        debug!("{} timing line manager disposed.", self.layout.direction);
    }

    fn teardown(&mut self) {
        for id in self.active.drain(..) {
            if let Some(idx) = self.set.lines[id as usize].linked.take() {
                self.pool.release(idx);
            }
        }
        self.pool.destroy_all(&mut self.backend);
    }

    #[inline(always)]
    pub fn state(&self) -> ManagerState {
        self.state
    }

    #[inline(always)]
    pub fn layout(&self) -> &LineLayout {
        &self.layout
    }

    /// Changes on-screen spacing only; the visibility window stays as generated.
    #[inline(always)]
    pub fn set_scroll_speed(&mut self, scroll_speed: f32) {
        self.layout.scroll_speed = scroll_speed;
    }

    #[inline(always)]
    pub fn lines(&self) -> &[TimingLine] {
        &self.set.lines
    }

    #[inline(always)]
    pub fn active_lines(&self) -> &[LineId] {
        &self.active
    }

    #[inline(always)]
    pub fn max_visible(&self) -> usize {
        self.set.max_visible
    }

    #[inline(always)]
    pub fn pool(&self) -> &VisualPool<B::Handle> {
        &self.pool
    }

    #[inline(always)]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: VisualBackend> Drop for TimingLineManager<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
