pub mod field;
pub mod generation;
pub mod manager;
pub mod pool;
pub mod recording;
pub mod spatial_hash;

pub use field::TimingLineField;
pub use generation::{LineSettings, TimingLine, TimingLineSet, generate_timing_lines};
pub use manager::{LineLayout, ManagerState, RefreshStats, TimingLineManager};
pub use pool::{PoolIndex, VisualBackend, VisualPool};
pub use spatial_hash::{LineId, PositionIndex};
