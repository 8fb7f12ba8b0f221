#![forbid(unsafe_code)]

//! Core: pointer input, snap geometry, drag arbitration and spring motion.
//!
//! # Role in the drawer stack
//! `drawer-core` is the input layer of a gesture-driven bottom drawer. It
//! turns raw pointer samples into drag sessions, decides where a released
//! drag settles, and provides the spring that carries the panel there. It
//! holds no callbacks and reads no clocks; `drawer-panel` owns the state
//! machine that wires these pieces together.
//!
//! # Primary responsibilities
//! - **PointerEvent**: canonical pointer samples (down, move, up, cancel).
//! - **DragArbiter**: panel drag vs. content scroll, clamped offsets and
//!   smoothed velocity.
//! - **Snap resolution**: snap layouts and the release decision.
//! - **Spring**: damped settle motion whose duration scales with distance.

pub mod animation;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod snap;

pub use event::{PointerEvent, PointerKind};
pub use geometry::Span;
pub use gesture::{ArbiterConfig, ArbiterOutput, DragArbiter, PanelContext, TouchAction};
pub use snap::{Resolution, SnapId, SnapLayout, SnapPoint, SnapPosition, SnapThresholds};
