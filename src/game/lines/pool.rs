use log::warn;

/// Rendering-layer capability used to materialize timing lines. The pool never
/// inspects handle contents.
pub trait VisualBackend {
    type Handle;

    fn create(&mut self) -> Self::Handle;
    fn destroy(&mut self, handle: Self::Handle);
    fn set_position(&mut self, handle: &mut Self::Handle, y: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolIndex(u32);

impl PoolIndex {
    #[inline(always)]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

/// Owns every visual. Available slots sit on the free list; the rest are
/// linked to exactly one line.
#[derive(Debug)]
pub struct VisualPool<H> {
    slots: Vec<H>,
    in_use: Vec<bool>,
    free: Vec<PoolIndex>,
    prefilled: usize,
    overflow_created: usize,
}

impl<H> Default for VisualPool<H> {
    fn default() -> Self {
        Self { slots: Vec::new(), in_use: Vec::new(), free: Vec::new(), prefilled: 0, overflow_created: 0 }
    }
}

impl<H> VisualPool<H> {
    pub fn with_capacity<B>(capacity: usize, backend: &mut B) -> Self
    where
        B: VisualBackend<Handle = H>,
    {
        let mut slots = Vec::with_capacity(capacity);
        let mut free = Vec::with_capacity(capacity);
        for i in 0..capacity {
            slots.push(backend.create());
            // Reverse order so acquisition hands out low indices first.
            free.push(PoolIndex((capacity - 1 - i) as u32));
        }
        Self { slots, in_use: vec![false; capacity], free, prefilled: capacity, overflow_created: 0 }
    }

    /// Takes an available visual, constructing one when the pool is exhausted.
    pub fn acquire<B>(&mut self, backend: &mut B) -> PoolIndex
    where
        B: VisualBackend<Handle = H>,
    {
        if let Some(idx) = self.free.pop() {
            debug_assert!(!self.in_use[idx.get()], "free list handed out linked visual {}", idx.get());
            self.in_use[idx.get()] = true;
            return idx;
        }
        let idx = PoolIndex(self.slots.len() as u32);
        self.slots.push(backend.create());
        self.in_use.push(true);
        self.overflow_created += 1;
        warn!(
            "Timing line pool exhausted at {} visuals (prefilled {}); constructed one on demand.",
            self.slots.len(),
            self.prefilled
        );
        idx
    }

    /// Returns a linked visual to the free list. Releasing an unknown or
    /// already free index is a caller bug.
    pub fn release(&mut self, idx: PoolIndex) {
        let released = self.unlink(idx);
        debug_assert!(released, "visual {} released while not linked", idx.get());
    }

    /// Frees `idx` if it is currently linked. Anything else leaves the free
    /// list untouched, so a slot can never be handed out twice.
    fn unlink(&mut self, idx: PoolIndex) -> bool {
        match self.in_use.get_mut(idx.get()) {
            Some(used) if *used => {
                *used = false;
                self.free.push(idx);
                true
            }
            _ => false,
        }
    }

    #[inline(always)]
    pub fn get(&self, idx: PoolIndex) -> Option<&H> {
        self.slots.get(idx.get())
    }

    #[inline(always)]
    pub fn get_mut(&mut self, idx: PoolIndex) -> Option<&mut H> {
        self.slots.get_mut(idx.get())
    }

    #[inline(always)]
    pub fn is_linked(&self, idx: PoolIndex) -> bool {
        self.in_use.get(idx.get()).copied().unwrap_or(false)
    }

    #[inline(always)]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    #[inline(always)]
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[inline(always)]
    pub fn total_created(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub fn prefilled(&self) -> usize {
        self.prefilled
    }

    #[inline(always)]
    pub fn overflow_created(&self) -> usize {
        self.overflow_created
    }

    /// Destroys every visual, linked or not. Callers unlink lines first.
    pub fn destroy_all<B>(&mut self, backend: &mut B)
    where
        B: VisualBackend<Handle = H>,
    {
        self.free.clear();
        self.in_use.clear();
        for handle in self.slots.drain(..) {
            backend.destroy(handle);
        }
    }
}
