use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub type LineId = u32;

type Bucket = SmallVec<[LineId; 8]>;

/// One-dimensional spatial hash over track offsets.
///
/// With `cell_size = 2 * render_threshold` any visible window
/// `[pos - threshold, pos + threshold]` touches at most two cells, so a frame
/// needs two bucket probes regardless of chart length. Buckets are not
/// distance-filtered; callers check the exact threshold themselves.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    cell_size: i64,
    buckets: FxHashMap<i64, Bucket>,
    len: usize,
}

impl PositionIndex {
    pub fn new(cell_size: i64) -> Self {
        debug_assert!(cell_size > 0, "cell size must be positive, got {cell_size}");
        Self { cell_size: cell_size.max(1), buckets: FxHashMap::default(), len: 0 }
    }

    #[inline(always)]
    pub fn cell_size(&self) -> i64 {
        self.cell_size
    }

    #[inline(always)]
    pub fn cell_of(&self, offset: i64) -> i64 {
        offset.div_euclid(self.cell_size)
    }

    #[inline(always)]
    pub fn insert(&mut self, offset: i64, id: LineId) {
        let cell = self.cell_of(offset);
        self.buckets.entry(cell).or_default().push(id);
        self.len += 1;
    }

    #[inline(always)]
    pub fn query(&self, offset: i64) -> &[LineId] {
        match self.buckets.get(&self.cell_of(offset)) {
            Some(bucket) => bucket.as_slice(),
            None => &[],
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_bucket_len(&self) -> usize {
        self.buckets.values().map(|b| b.len()).max().unwrap_or(0)
    }
}
