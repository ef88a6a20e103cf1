use crate::game::lines::pool::VisualBackend;
use rustc_hash::FxHashMap;

/// Visual stand-in that only remembers where it was last placed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVisual {
    pub id: u32,
    pub y: f32,
}

/// Headless backend: counts constructions and keeps the last position of every
/// live visual. Used by the demo driver, the benchmark and tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    created: usize,
    destroyed: usize,
    moves: u64,
    positions: FxHashMap<u32, f32>,
}

impl RecordingBackend {
    #[inline(always)]
    pub fn created(&self) -> usize {
        self.created
    }

    #[inline(always)]
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    #[inline(always)]
    pub fn live(&self) -> usize {
        self.created - self.destroyed
    }

    #[inline(always)]
    pub fn moves(&self) -> u64 {
        self.moves
    }

    #[inline(always)]
    pub fn position_of(&self, id: u32) -> Option<f32> {
        self.positions.get(&id).copied()
    }
}

impl VisualBackend for RecordingBackend {
    type Handle = RecordedVisual;

    fn create(&mut self) -> RecordedVisual {
        let id = self.next_id;
        self.next_id += 1;
        self.created += 1;
        RecordedVisual { id, y: 0.0 }
    }

    fn destroy(&mut self, handle: RecordedVisual) {
        self.destroyed += 1;
        self.positions.remove(&handle.id);
    }

    fn set_position(&mut self, handle: &mut RecordedVisual, y: f32) {
        handle.y = y;
        self.moves += 1;
        self.positions.insert(handle.id, y);
    }
}
