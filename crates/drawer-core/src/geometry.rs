#![forbid(unsafe_code)]

//! Vertical geometry for drawers.
//!
//! A drawer only moves along the y axis, so geometry here is one-dimensional:
//! offsets are pixels measured from the top of the container (0 = fully
//! expanded, `container_height` = fully hidden) and [`Span`] describes a
//! vertical band used for hit testing.

use serde::{Deserialize, Serialize};

/// A vertical band `[top, top + height)` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Top edge (inclusive).
    pub top: f64,
    /// Height in px.
    pub height: f64,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Check if the span has no height.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height.is_nan() || self.height <= 0.0
    }

    /// Check if `y` falls inside the span.
    #[inline]
    pub fn contains(&self, y: f64) -> bool {
        !self.is_empty() && y >= self.top && y < self.bottom()
    }
}

/// Clamp an offset into `[0, container_height]`.
///
/// Non-finite heights collapse to zero. A NaN offset maps to the hidden
/// position (`container_height`) so a corrupted value can never leave the
/// panel half-open.
#[inline]
pub fn clamp_offset(offset: f64, container_height: f64) -> f64 {
    let max = sanitize_height(container_height);
    if offset.is_nan() {
        return max;
    }
    offset.clamp(0.0, max)
}

/// Whether `offset` lies outside `[0, container_height]`.
#[inline]
pub fn is_out_of_bounds(offset: f64, container_height: f64) -> bool {
    let max = sanitize_height(container_height);
    offset.is_nan() || offset < 0.0 || offset > max
}

/// Normalize a host-measured container height.
#[inline]
pub fn sanitize_height(container_height: f64) -> f64 {
    if container_height.is_finite() {
        container_height.max(0.0)
    } else {
        0.0
    }
}
