#![forbid(unsafe_code)]

//! Canonical pointer event types.
//!
//! Mouse, touch and pen input all collapse into [`PointerEvent`]. A drawer
//! only moves vertically, so an event carries the y coordinate (in px,
//! measured from the top of the drawer's container) plus the timestamp the
//! host observed it at.
//!
//! # Design Notes
//!
//! - Timestamps come from the host, never from a clock read inside the
//!   crate, so replays and tests are deterministic.
//! - `pointer_id` distinguishes fingers; a drag session belongs to the
//!   pointer that started it.

use web_time::Instant;

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Pointer pressed / finger touched down.
    Down,
    /// Pointer moved while pressed.
    Move,
    /// Pointer released.
    Up,
    /// The platform took the gesture away (touchcancel, lost capture).
    Cancel,
}

/// A single pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pointer_id: u32,
    /// Vertical position in container coordinates (px).
    pub y: f64,
    pub time: Instant,
}

impl PointerEvent {
    /// Create an event for the primary pointer.
    #[must_use]
    pub const fn new(kind: PointerKind, y: f64, time: Instant) -> Self {
        Self {
            kind,
            pointer_id: 0,
            y,
            time,
        }
    }

    #[must_use]
    pub const fn down(y: f64, time: Instant) -> Self {
        Self::new(PointerKind::Down, y, time)
    }

    #[must_use]
    pub const fn moved(y: f64, time: Instant) -> Self {
        Self::new(PointerKind::Move, y, time)
    }

    #[must_use]
    pub const fn up(y: f64, time: Instant) -> Self {
        Self::new(PointerKind::Up, y, time)
    }

    #[must_use]
    pub const fn cancel(y: f64, time: Instant) -> Self {
        Self::new(PointerKind::Cancel, y, time)
    }

    /// Attach a pointer id (builder pattern).
    #[must_use]
    pub const fn with_pointer(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}
