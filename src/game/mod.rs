pub mod keyframes;
pub mod lines;
pub mod map;
pub mod scroll;
pub mod timing;
