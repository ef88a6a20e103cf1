//! Timing line visibility for a vertically scrolling rhythm-game playfield.
//!
//! Lines are generated once per chart, indexed by track offset in a
//! one-dimensional spatial hash, and bound every frame to a fixed pool of
//! visuals supplied by the renderer. [`game::keyframes::KeyframeCursor`] is the
//! companion scalar-over-time lookup used for animated modifiers.

pub mod config;
pub mod game;
