#![forbid(unsafe_code)]

//! Frame-driven animation primitives.
//!
//! Animations here never read a clock. The host's frame loop measures the
//! time between frames and passes it to [`Animation::tick`], which keeps
//! every animation deterministic under test.

pub mod spring;

use std::time::Duration;

pub use spring::Spring;

/// A value that evolves over time when ticked.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its resting state.
    fn is_complete(&self) -> bool;
}
