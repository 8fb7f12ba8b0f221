#![forbid(unsafe_code)]

//! Drag arbitration: decides whether pointer input drives the panel.
//!
//! [`DragArbiter`] is a stateful processor fed raw [`PointerEvent`]s. On
//! pointer-down it decides between starting a **panel drag** and letting the
//! gesture **pass through** to the content underneath (so lists can scroll
//! natively). While a drag session is active it turns moves into clamped
//! panel offsets and a smoothed velocity, and on release it reports the
//! displacement and velocity the snap resolver needs.
//!
//! # Arbitration rule
//!
//! - Down on a handle region → always drag.
//! - Down on content → drag only while the panel rests at a compact snap
//!   (peek/initial by default), where the content is not meant to scroll yet.
//! - Down above the panel, or while the panel is hidden → pass through.
//!
//! # Invariants
//!
//! 1. At most one session exists; it belongs to the pointer that opened it.
//!    Input from other pointers during a session is ignored.
//! 2. Every reported offset lies in `[0, container_height]`.
//! 3. Events are processed strictly in arrival order; nothing is batched
//!    beyond the velocity window.
//! 4. Every session ends in exactly one `DragEnd` or `DragCancel`.
//! 5. While a session is active [`DragArbiter::touch_action`] is
//!    [`TouchAction::None`].
//!
//! # Failure Modes
//!
//! - Timestamps that go backwards contribute a zero interval; the previous
//!   velocity is kept rather than dividing by zero.
//! - A move or up without a session is a content gesture: `PassThrough`.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::event::{PointerEvent, PointerKind};
use crate::geometry::{Span, clamp_offset};
use crate::snap::SnapId;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Arbitration and velocity-smoothing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Number of trailing samples used for velocity (default: 2).
    pub velocity_window: usize,
    /// Snaps at which a drag may start on the content region
    /// (default: peek, initial).
    pub compact_snaps: Vec<SnapId>,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            velocity_window: 2,
            compact_snaps: vec![SnapId::Peek, SnapId::Initial],
        }
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What part of the panel a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    /// Above the panel top or below the container.
    Outside,
    /// A grab handle (always drags).
    Handle,
    /// Panel content (drags only at compact snaps).
    Content,
}

/// Native scrolling hint for the host (`touch-action` equivalent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchAction {
    /// Let the platform scroll content.
    #[default]
    Auto,
    /// Suppress native scrolling; the panel owns the gesture.
    None,
}

/// Panel state the arbiter needs for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelContext {
    /// Current panel top, in container px.
    pub offset_px: f64,
    pub container_height: f64,
    /// Snap the panel currently rests at (or settles toward).
    pub snap: SnapId,
}

/// Result of feeding one event to the arbiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArbiterOutput {
    /// Not a panel gesture; the host should deliver it to content.
    PassThrough,
    /// Event belongs to another pointer while a session is active.
    Ignored,
    /// A session began at `offset_px`.
    DragStart { offset_px: f64 },
    /// The panel follows the pointer.
    DragMove {
        offset_px: f64,
        delta_px: f64,
        velocity_px_s: f64,
    },
    /// The pointer was released.
    DragEnd {
        offset_px: f64,
        offset_delta_px: f64,
        velocity_px_s: f64,
        origin: SnapId,
    },
    /// The platform cancelled the gesture.
    DragCancel { origin: SnapId },
}

// ---------------------------------------------------------------------------
// Velocity tracking
// ---------------------------------------------------------------------------

/// Velocity over a short trailing window of offset samples.
///
/// With the default window of 2 the velocity is the slope between the last
/// two samples, which smooths out a single noisy event without lagging.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    samples: VecDeque<(Instant, f64)>,
    window: usize,
    velocity: f64,
}

impl VelocityTracker {
    /// Create a tracker keeping `window` samples (minimum 2).
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
            velocity: 0.0,
        }
    }

    /// Record a sample and recompute the velocity.
    pub fn push(&mut self, time: Instant, offset_px: f64) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back((time, offset_px));

        let (Some(&(t0, o0)), Some(&(t1, o1))) = (self.samples.front(), self.samples.back()) else {
            return;
        };
        let dt = t1.saturating_duration_since(t0);
        if dt > Duration::ZERO {
            self.velocity = (o1 - o0) / dt.as_secs_f64();
        }
    }

    /// Latest velocity in px/s (positive = downward).
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.velocity = 0.0;
    }
}

// ---------------------------------------------------------------------------
// DragSession
// ---------------------------------------------------------------------------

/// An active drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub start_offset_px: f64,
    pub start_time: Instant,
    pub last_offset_px: f64,
    pub last_time: Instant,
    /// Snap active when the drag began; the revert target.
    pub origin: SnapId,
    pointer_id: u32,
    start_pointer_y: f64,
    tracker: VelocityTracker,
}

impl DragSession {
    fn begin(ctx: &PanelContext, event: &PointerEvent, window: usize) -> Self {
        let start = clamp_offset(ctx.offset_px, ctx.container_height);
        let mut tracker = VelocityTracker::new(window);
        tracker.push(event.time, start);
        Self {
            start_offset_px: start,
            start_time: event.time,
            last_offset_px: start,
            last_time: event.time,
            origin: ctx.snap,
            pointer_id: event.pointer_id,
            start_pointer_y: event.y,
            tracker,
        }
    }

    /// Follow the pointer to `y`; returns the new clamped offset.
    fn follow(&mut self, y: f64, time: Instant, container_height: f64) -> f64 {
        let delta = if y.is_finite() { y - self.start_pointer_y } else { 0.0 };
        let offset = clamp_offset(self.start_offset_px + delta, container_height);
        self.last_offset_px = offset;
        self.last_time = time;
        self.tracker.push(time, offset);
        offset
    }

    /// Displacement since the session began (positive = downward).
    #[inline]
    #[must_use]
    pub fn offset_delta_px(&self) -> f64 {
        self.last_offset_px - self.start_offset_px
    }

    #[inline]
    #[must_use]
    pub fn velocity_px_s(&self) -> f64 {
        self.tracker.velocity()
    }

    #[inline]
    #[must_use]
    pub fn pointer_id(&self) -> u32 {
        self.pointer_id
    }
}

// ---------------------------------------------------------------------------
// DragArbiter
// ---------------------------------------------------------------------------

/// Classifies pointer input into panel drags or content pass-through.
pub struct DragArbiter {
    config: ArbiterConfig,
    /// Handle bands, relative to the panel top.
    handles: Vec<Span>,
    session: Option<DragSession>,
}

impl std::fmt::Debug for DragArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragArbiter")
            .field("dragging", &self.is_dragging())
            .field("handles", &self.handles.len())
            .finish()
    }
}

impl DragArbiter {
    /// Create an arbiter with the given configuration and handle regions.
    #[must_use]
    pub fn new(config: ArbiterConfig, handles: Vec<Span>) -> Self {
        Self {
            config,
            handles,
            session: None,
        }
    }

    /// Which region `y` (container px) falls in for a panel at `ctx`.
    #[must_use]
    pub fn hit_test(&self, y: f64, ctx: &PanelContext) -> HitRegion {
        if ctx.snap.is_hidden() || !y.is_finite() || y < ctx.offset_px || y > ctx.container_height
        {
            return HitRegion::Outside;
        }
        let rel = y - ctx.offset_px;
        if self.handles.iter().any(|span| span.contains(rel)) {
            HitRegion::Handle
        } else {
            HitRegion::Content
        }
    }

    /// Process one pointer event.
    pub fn process(&mut self, event: &PointerEvent, ctx: &PanelContext) -> ArbiterOutput {
        match event.kind {
            PointerKind::Down => self.on_down(event, ctx),
            PointerKind::Move => self.on_move(event, ctx),
            PointerKind::Up => self.on_up(event, ctx),
            PointerKind::Cancel => self.on_cancel(event),
        }
    }

    /// End the active session without a release (focus loss, host override).
    pub fn cancel(&mut self) -> Option<DragSession> {
        let session = self.session.take();
        #[cfg(feature = "tracing")]
        if let Some(ref s) = session {
            tracing::debug!(target: "drawer.gesture", origin = ?s.origin, "drag cancelled");
        }
        session
    }

    /// Whether a drag session is active.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The active session, if any.
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Native scroll hint for the host.
    #[inline]
    #[must_use]
    pub fn touch_action(&self) -> TouchAction {
        if self.is_dragging() {
            TouchAction::None
        } else {
            TouchAction::Auto
        }
    }

    /// Drop any session without reporting it.
    pub fn reset(&mut self) {
        self.session = None;
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ArbiterConfig) {
        self.config = config;
    }

    /// Replace the handle regions (relative to the panel top).
    pub fn set_handles(&mut self, handles: Vec<Span>) {
        self.handles = handles;
    }

    #[must_use]
    pub fn handles(&self) -> &[Span] {
        &self.handles
    }
}

// ---------------------------------------------------------------------------
// Internal event handlers
// ---------------------------------------------------------------------------

impl DragArbiter {
    fn on_down(&mut self, event: &PointerEvent, ctx: &PanelContext) -> ArbiterOutput {
        if self.session.is_some() {
            return ArbiterOutput::Ignored;
        }

        let starts_drag = match self.hit_test(event.y, ctx) {
            HitRegion::Outside => false,
            HitRegion::Handle => true,
            HitRegion::Content => self.config.compact_snaps.contains(&ctx.snap),
        };
        if !starts_drag {
            return ArbiterOutput::PassThrough;
        }

        let session = DragSession::begin(ctx, event, self.config.velocity_window);
        let offset_px = session.start_offset_px;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "drawer.gesture",
            offset_px,
            origin = ?session.origin,
            pointer = session.pointer_id,
            "drag started"
        );
        self.session = Some(session);
        ArbiterOutput::DragStart { offset_px }
    }

    fn on_move(&mut self, event: &PointerEvent, ctx: &PanelContext) -> ArbiterOutput {
        let Some(ref mut session) = self.session else {
            return ArbiterOutput::PassThrough;
        };
        if session.pointer_id != event.pointer_id {
            return ArbiterOutput::Ignored;
        }

        let offset_px = session.follow(event.y, event.time, ctx.container_height);
        ArbiterOutput::DragMove {
            offset_px,
            delta_px: session.offset_delta_px(),
            velocity_px_s: session.velocity_px_s(),
        }
    }

    fn on_up(&mut self, event: &PointerEvent, ctx: &PanelContext) -> ArbiterOutput {
        match self.session {
            None => return ArbiterOutput::PassThrough,
            Some(ref s) if s.pointer_id != event.pointer_id => return ArbiterOutput::Ignored,
            Some(_) => {}
        }
        let Some(mut session) = self.session.take() else {
            return ArbiterOutput::PassThrough;
        };

        let offset_px = session.follow(event.y, event.time, ctx.container_height);
        let out = ArbiterOutput::DragEnd {
            offset_px,
            offset_delta_px: session.offset_delta_px(),
            velocity_px_s: session.velocity_px_s(),
            origin: session.origin,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "drawer.gesture",
            offset_px,
            delta_px = session.offset_delta_px(),
            velocity_px_s = session.velocity_px_s(),
            "drag released"
        );
        out
    }

    fn on_cancel(&mut self, event: &PointerEvent) -> ArbiterOutput {
        match self.session {
            None => ArbiterOutput::PassThrough,
            Some(ref s) if s.pointer_id != event.pointer_id => ArbiterOutput::Ignored,
            Some(_) => match self.cancel() {
                Some(session) => ArbiterOutput::DragCancel {
                    origin: session.origin,
                },
                None => ArbiterOutput::PassThrough,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
