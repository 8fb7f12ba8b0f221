#![forbid(unsafe_code)]

//! Snap points and the release-time snap decision.
//!
//! A drawer rests only at named snap points. [`SnapLayout`] resolves a
//! drawer's configured [`SnapPoint`]s against the current container height,
//! and [`resolve`] decides, when a drag is released, which snap the panel
//! settles at.
//!
//! # Decision rules
//!
//! Given the snap the drag started from (`origin`), the signed offset delta
//! (positive = downward), the signed release velocity and the active level's
//! allowed snaps:
//!
//! 1. `|velocity| >= fast_velocity_px_s` → move one allowed snap in the
//!    direction of the velocity.
//! 2. else `|delta| >= distance_px` → move one allowed snap in the direction
//!    of the offset.
//! 3. else → revert to `origin`.
//!
//! Equality at either threshold counts as met. Moving down from the lowest
//! allowed snap yields [`Resolution::Dismiss`] when the level is dismissible;
//! moving past either end otherwise stays at `origin`.
//!
//! # Failure Modes
//!
//! - Empty allowed set, or a target outside it: the caller's fallback snap is
//!   returned with [`Rule::Unresolved`].
//! - Non-finite delta or velocity: treated as zero (the drag reverts).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp_offset, sanitize_height};

// ---------------------------------------------------------------------------
// Identifiers and positions
// ---------------------------------------------------------------------------

/// Named resting position of a drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapId {
    /// Off-screen. Offset is always the container height.
    Hidden,
    /// A sliver of the panel is visible.
    Peek,
    /// The half-height resting position.
    Initial,
    /// Fully expanded (offset 0 unless configured otherwise).
    Full,
}

impl SnapId {
    /// All snaps a visible panel can rest at.
    pub const VISIBLE: [SnapId; 3] = [SnapId::Peek, SnapId::Initial, SnapId::Full];

    #[inline]
    #[must_use]
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Peek => "peek",
            Self::Initial => "initial",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for SnapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a snap point sits, resolved against the container height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapPosition {
    /// Absolute offset from the container top, in px.
    Offset(f64),
    /// Fraction of the container height (`0.55` = panel top at 55%).
    Fraction(f64),
    /// Exposed panel height in px (offset = container height - px).
    Visible(f64),
}

impl SnapPosition {
    /// Offset in px for a container of `container_height`, clamped.
    #[must_use]
    pub fn resolve(self, container_height: f64) -> f64 {
        let h = sanitize_height(container_height);
        let raw = match self {
            Self::Offset(px) => px,
            Self::Fraction(f) => f * h,
            Self::Visible(px) => h - px,
        };
        clamp_offset(raw, h)
    }
}

/// A configured snap point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    pub id: SnapId,
    pub position: SnapPosition,
}

impl SnapPoint {
    #[must_use]
    pub const fn new(id: SnapId, position: SnapPosition) -> Self {
        Self { id, position }
    }

    #[must_use]
    pub const fn offset(id: SnapId, px: f64) -> Self {
        Self::new(id, SnapPosition::Offset(px))
    }

    #[must_use]
    pub const fn fraction(id: SnapId, fraction: f64) -> Self {
        Self::new(id, SnapPosition::Fraction(fraction))
    }

    #[must_use]
    pub const fn visible(id: SnapId, px: f64) -> Self {
        Self::new(id, SnapPosition::Visible(px))
    }
}

// ---------------------------------------------------------------------------
// SnapLayout
// ---------------------------------------------------------------------------

/// Snap points resolved to pixel offsets for one container height.
///
/// Entries are ordered by offset, top-most first. `Hidden` is always
/// present at `container_height`; explicit `Hidden` entries and duplicate ids
/// are dropped (first wins).
#[derive(Debug, Clone, PartialEq)]
pub struct SnapLayout {
    container_height: f64,
    entries: Vec<(SnapId, f64)>,
}

impl SnapLayout {
    #[must_use]
    pub fn new(points: &[SnapPoint], container_height: f64) -> Self {
        let h = sanitize_height(container_height);
        let mut entries: Vec<(SnapId, f64)> = Vec::with_capacity(points.len() + 1);
        for point in points {
            if point.id.is_hidden() || entries.iter().any(|(id, _)| *id == point.id) {
                continue;
            }
            entries.push((point.id, point.position.resolve(h)));
        }
        entries.push((SnapId::Hidden, h));
        entries.sort_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));
        Self {
            container_height: h,
            entries,
        }
    }

    #[inline]
    #[must_use]
    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    /// Offset of `id`, if the layout has it.
    #[must_use]
    pub fn offset_of(&self, id: SnapId) -> Option<f64> {
        self.entries
            .iter()
            .find_map(|(sid, offset)| (*sid == id).then_some(*offset))
    }

    #[must_use]
    pub fn contains(&self, id: SnapId) -> bool {
        self.entries.iter().any(|(sid, _)| *sid == id)
    }

    /// Snap ids ordered top-most first (`Hidden` last).
    pub fn ids(&self) -> impl Iterator<Item = SnapId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Visible snap ids, top-most first.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<SnapId> {
        self.ids().filter(|id| !id.is_hidden()).collect()
    }

    /// Allowed snaps that exist in this layout, ordered top-most first.
    fn ordered_allowed(&self, allowed: &[SnapId]) -> Vec<(SnapId, f64)> {
        self.entries
            .iter()
            .filter(|(id, _)| !id.is_hidden() && allowed.contains(id))
            .copied()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Thresholds and release input
// ---------------------------------------------------------------------------

/// Release thresholds. Both are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapThresholds {
    /// Minimum |velocity| (px/s) for a flick (default: 500).
    pub fast_velocity_px_s: f64,
    /// Minimum |offset delta| (px) for a deliberate drag (default: 50).
    pub distance_px: f64,
}

impl Default for SnapThresholds {
    fn default() -> Self {
        Self {
            fast_velocity_px_s: 500.0,
            distance_px: 50.0,
        }
    }
}

/// Everything the resolver needs about a released drag.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseInput<'a> {
    /// Snap active when the drag began.
    pub origin: SnapId,
    /// Signed displacement, positive = downward.
    pub offset_delta_px: f64,
    /// Signed release velocity, positive = downward.
    pub velocity_px_s: f64,
    /// The active level's allowed snaps.
    pub allowed: &'a [SnapId],
    /// The active level's default snap, used when nothing else resolves.
    pub fallback: SnapId,
    /// Whether dragging down past the lowest allowed snap closes the panel.
    pub dismissible: bool,
}

/// Where a released panel goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Settle at this snap.
    Snap(SnapId),
    /// Close the panel.
    Dismiss,
}

/// Which rule produced a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Release velocity met the fast threshold.
    Fast,
    /// Displacement met the distance threshold.
    Distance,
    /// Sub-threshold release; back to the origin snap.
    Revert,
    /// No allowed target; the fallback snap was used.
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub resolution: Resolution,
    pub rule: Rule,
}

impl Decision {
    const fn new(resolution: Resolution, rule: Rule) -> Self {
        Self { resolution, rule }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn of(signed: f64) -> Self {
        if signed > 0.0 { Self::Down } else { Self::Up }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Decide where a released drag settles.
#[must_use]
pub fn resolve(input: &ReleaseInput<'_>, layout: &SnapLayout, thresholds: &SnapThresholds) -> Decision {
    let allowed = layout.ordered_allowed(input.allowed);
    if allowed.is_empty() {
        return Decision::new(Resolution::Snap(input.fallback), Rule::Unresolved);
    }

    let velocity = finite_or_zero(input.velocity_px_s);
    let delta = finite_or_zero(input.offset_delta_px);

    let motion = if velocity.abs() >= thresholds.fast_velocity_px_s {
        Some((Direction::of(velocity), Rule::Fast))
    } else if delta.abs() >= thresholds.distance_px {
        Some((Direction::of(delta), Rule::Distance))
    } else {
        None
    };

    let origin_allowed = allowed.iter().any(|(id, _)| *id == input.origin);
    let stay = |rule: Rule| {
        if origin_allowed {
            Decision::new(Resolution::Snap(input.origin), rule)
        } else {
            Decision::new(Resolution::Snap(fallback_in(&allowed, input.fallback)), Rule::Unresolved)
        }
    };

    let Some((direction, rule)) = motion else {
        return stay(Rule::Revert);
    };

    let Some(origin_offset) = layout.offset_of(input.origin) else {
        return Decision::new(Resolution::Snap(fallback_in(&allowed, input.fallback)), Rule::Unresolved);
    };

    match direction {
        Direction::Down => {
            let next = allowed
                .iter()
                .find(|(id, offset)| *offset > origin_offset && *id != input.origin);
            match next {
                Some((id, _)) => Decision::new(Resolution::Snap(*id), rule),
                None if input.dismissible && origin_allowed => {
                    Decision::new(Resolution::Dismiss, rule)
                }
                None => stay(rule),
            }
        }
        Direction::Up => {
            let next = allowed
                .iter()
                .rev()
                .find(|(id, offset)| *offset < origin_offset && *id != input.origin);
            match next {
                Some((id, _)) => Decision::new(Resolution::Snap(*id), rule),
                None => stay(rule),
            }
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// The fallback if allowed, otherwise the lowest allowed snap.
fn fallback_in(allowed: &[(SnapId, f64)], fallback: SnapId) -> SnapId {
    if allowed.iter().any(|(id, _)| *id == fallback) {
        fallback
    } else {
        allowed.last().map_or(fallback, |(id, _)| *id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
