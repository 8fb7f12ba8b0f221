#![forbid(unsafe_code)]

//! Panel error taxonomy.
//!
//! Every panel error is recoverable. `InvalidTransition` is returned to the
//! caller as a refused no-op; the others are absorbed by the controller
//! (clamped, cancelled or replaced by a fallback), logged, and counted in
//! [`PanelStats`](crate::PanelStats).

use std::fmt;

use drawer_core::snap::SnapId;

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRefusal {
    /// The panel is hidden; only `open` is meaningful.
    PanelHidden,
    /// `back()` with only the root frame on the stack.
    AtRoot,
    /// The current level does not allow this snap.
    SnapNotAllowed(SnapId),
}

impl fmt::Display for TransitionRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PanelHidden => f.write_str("panel is hidden"),
            Self::AtRoot => f.write_str("only the root level remains"),
            Self::SnapNotAllowed(snap) => write!(f, "snap `{snap}` is not allowed at this level"),
        }
    }
}

/// Errors raised by panel mechanics.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelError {
    /// An operation that does not apply in the current state.
    InvalidTransition {
        op: &'static str,
        reason: TransitionRefusal,
    },
    /// A drag began while a settle animation was in flight.
    DragConflict { interrupted_at_px: f64 },
    /// A computed offset fell outside `[0, container_height]`.
    OutOfBoundsOffset { requested_px: f64, clamped_px: f64 },
    /// A level's allowed snaps could not produce a target.
    UnresolvedSnap {
        level: String,
        requested: SnapId,
        fallback: SnapId,
    },
}

impl PanelError {
    /// Short machine-friendly name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::DragConflict { .. } => "drag_conflict",
            Self::OutOfBoundsOffset { .. } => "out_of_bounds_offset",
            Self::UnresolvedSnap { .. } => "unresolved_snap",
        }
    }
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { op, reason } => {
                write!(f, "invalid transition `{op}`: {reason}")
            }
            Self::DragConflict { interrupted_at_px } => {
                write!(
                    f,
                    "drag started during settle; animation interrupted at {interrupted_at_px:.1}px"
                )
            }
            Self::OutOfBoundsOffset {
                requested_px,
                clamped_px,
            } => write!(
                f,
                "offset {requested_px:.1}px out of bounds, clamped to {clamped_px:.1}px"
            ),
            Self::UnresolvedSnap {
                level,
                requested,
                fallback,
            } => write!(
                f,
                "level `{level}` cannot rest at `{requested}`, falling back to `{fallback}`"
            ),
        }
    }
}

impl std::error::Error for PanelError {}
