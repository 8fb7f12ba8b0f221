#![forbid(unsafe_code)]

//! The panel state machine.
//!
//! [`PanelController`] owns one drawer: its visibility, current snap, level
//! stack and working offset. It is driven by two kinds of input:
//!
//! - host calls: [`open`](PanelController::open),
//!   [`close`](PanelController::close),
//!   [`push_level`](PanelController::push_level),
//!   [`back`](PanelController::back);
//! - pointer events, routed through the [`DragArbiter`] and, on release,
//!   the snap resolver.
//!
//! Animation frames arrive through [`tick`](PanelController::tick) and only
//! touch the [`RenderAdapter`].
//!
//! # Invariants
//!
//! 1. `working_offset_px` is always within `[0, container_height]`.
//! 2. `visible == false` ⟺ `snap == Hidden` ⟺
//!    `working_offset_px == container_height`.
//! 3. The level stack is never empty while visible.
//! 4. While visible, `snap` is allowed by the top level.
//!
//! The working offset is the drag position during a drag and the target
//! snap's offset otherwise. The rendered offset (see
//! [`frame`](PanelController::frame)) trails it while a settle runs.
//!
//! # Failure Modes
//!
//! Nothing here panics or propagates internal errors. `push_level` and
//! `back` return [`PanelError::InvalidTransition`] when refused; every other
//! [`PanelError`] is recovered in place, logged, and counted in
//! [`PanelStats`].

use std::fmt;
use std::time::Duration;

use drawer_core::event::PointerEvent;
use drawer_core::geometry::{clamp_offset, is_out_of_bounds, sanitize_height};
use drawer_core::gesture::{ArbiterOutput, DragArbiter, PanelContext, TouchAction};
use drawer_core::snap::{ReleaseInput, Resolution, Rule, SnapId, SnapLayout, resolve};

use crate::config::DrawerConfig;
use crate::error::{PanelError, TransitionRefusal};
use crate::render::{Frame, RenderAdapter};
use crate::view_stack::{ViewFrame, ViewStack};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What caused a snap change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapCause {
    Open,
    Close,
    /// A level was pushed or popped.
    Navigation,
    /// A drag was released.
    Release,
    /// A drag was released past the lowest snap.
    Dismiss,
    /// A drag was cancelled.
    Cancel,
    /// The host asked for a snap with `snap_to`.
    Request,
}

/// Emitted whenever the panel's snap changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapChange {
    pub from: SnapId,
    pub to: SnapId,
    /// Offset of `to` in the current container.
    pub offset_px: f64,
    pub cause: SnapCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChangeKind {
    /// `open()` installed a new root.
    Open,
    Push,
    Pop,
    /// The stack was reset to its root after the panel finished closing.
    Reset,
}

/// Emitted whenever the level stack changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub kind: LevelChangeKind,
    /// Stack depth after the change (root only = 1).
    pub depth: usize,
    /// Id of the top level after the change.
    pub level: String,
    /// Resolved title of the top level.
    pub title: String,
}

/// Live drag feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragProgress {
    pub offset_px: f64,
    pub delta_px: f64,
    pub velocity_px_s: f64,
    /// `1.0` fully expanded, `0.0` hidden.
    pub open_fraction: f64,
}

/// Result of [`PanelController::back_or_close`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackOutcome {
    Popped(ViewFrame),
    Closed,
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type SnapListener = Box<dyn FnMut(&SnapChange)>;
type LevelListener = Box<dyn FnMut(&LevelChange)>;
type DragListener = Box<dyn FnMut(&DragProgress)>;

struct ListenerEntry<T> {
    id: ListenerId,
    callback: T,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    snap: Vec<ListenerEntry<SnapListener>>,
    level: Vec<ListenerEntry<LevelListener>>,
    drag: Vec<ListenerEntry<DragListener>>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.snap.len() + self.level.len() + self.drag.len();
        self.snap.retain(|e| e.id != id);
        self.level.retain(|e| e.id != id);
        self.drag.retain(|e| e.id != id);
        before != self.snap.len() + self.level.len() + self.drag.len()
    }

    fn len(&self) -> usize {
        self.snap.len() + self.level.len() + self.drag.len()
    }
}

// ---------------------------------------------------------------------------
// State and stats
// ---------------------------------------------------------------------------

/// Snapshot of the panel's logical state.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    visible: bool,
    snap: SnapId,
    levels: ViewStack,
    working_offset_px: f64,
    container_height: f64,
}

impl PanelState {
    fn hidden(container_height: f64) -> Self {
        Self {
            visible: false,
            snap: SnapId::Hidden,
            levels: ViewStack::new(),
            working_offset_px: container_height,
            container_height,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    #[must_use]
    pub fn snap(&self) -> SnapId {
        self.snap
    }

    #[must_use]
    pub fn levels(&self) -> &ViewStack {
        &self.levels
    }

    #[must_use]
    pub fn current_level(&self) -> Option<&ViewFrame> {
        self.levels.top()
    }

    /// Resolved title of the current level.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.levels.current_title()
    }

    #[inline]
    #[must_use]
    pub fn working_offset_px(&self) -> f64 {
        self.working_offset_px
    }

    #[inline]
    #[must_use]
    pub fn container_height(&self) -> f64 {
        self.container_height
    }
}

/// Counters of recovered and refused operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelStats {
    pub invalid_transitions: u64,
    pub drag_conflicts: u64,
    pub out_of_bounds_offsets: u64,
    pub unresolved_snaps: u64,
}

impl PanelStats {
    fn record(&mut self, err: &PanelError) {
        let counter = match err {
            PanelError::InvalidTransition { .. } => &mut self.invalid_transitions,
            PanelError::DragConflict { .. } => &mut self.drag_conflicts,
            PanelError::OutOfBoundsOffset { .. } => &mut self.out_of_bounds_offsets,
            PanelError::UnresolvedSnap { .. } => &mut self.unresolved_snaps,
        };
        *counter = counter.saturating_add(1);
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.invalid_transitions
            + self.drag_conflicts
            + self.out_of_bounds_offsets
            + self.unresolved_snaps
    }
}

// ---------------------------------------------------------------------------
// PanelController
// ---------------------------------------------------------------------------

/// Gesture-driven multi-level drawer.
pub struct PanelController {
    config: DrawerConfig,
    layout: SnapLayout,
    state: PanelState,
    arbiter: DragArbiter,
    adapter: RenderAdapter,
    /// Stack reset owed once the close animation lands.
    pending_reset: bool,
    listeners: Listeners,
    stats: PanelStats,
}

impl fmt::Debug for PanelController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelController")
            .field("state", &self.state)
            .field("dragging", &self.arbiter.is_dragging())
            .field("settling", &self.adapter.is_settling())
            .field("pending_reset", &self.pending_reset)
            .field("listeners", &self.listeners.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl PanelController {
    /// Create a hidden panel in a container of `container_height` px.
    #[must_use]
    pub fn new(config: DrawerConfig, container_height: f64) -> Self {
        let problems = config.validate();
        if !problems.is_empty() {
            tracing::warn!(
                target: "drawer.config",
                problems = ?problems,
                "panel created with an invalid config"
            );
        }
        let h = sanitize_height(container_height);
        let layout = SnapLayout::new(&config.snaps, h);
        let arbiter = DragArbiter::new(config.gesture.clone(), config.handles.clone());
        let adapter = RenderAdapter::new(h, config.spring, config.reduced_motion);
        Self {
            config,
            layout,
            state: PanelState::hidden(h),
            arbiter,
            adapter,
            pending_reset: false,
            listeners: Listeners::default(),
            stats: PanelStats::default(),
        }
    }

    // -- accessors ----------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    #[must_use]
    pub fn stats(&self) -> PanelStats {
        self.stats
    }

    /// The transform for the current animation frame.
    #[must_use]
    pub fn frame(&self) -> Frame {
        self.adapter.frame()
    }

    #[must_use]
    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> &SnapLayout {
        &self.layout
    }

    #[must_use]
    pub fn adapter(&self) -> &RenderAdapter {
        &self.adapter
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.arbiter.is_dragging()
    }

    /// Native scroll hint for the content area.
    #[inline]
    #[must_use]
    pub fn touch_action(&self) -> TouchAction {
        self.arbiter.touch_action()
    }

    // -- listeners ----------------------------------------------------------

    pub fn on_snap_change<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&SnapChange) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.snap.push(ListenerEntry {
            id,
            callback: Box::new(callback),
        });
        id
    }

    pub fn on_level_change<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&LevelChange) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.level.push(ListenerEntry {
            id,
            callback: Box::new(callback),
        });
        id
    }

    pub fn on_drag_progress<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&DragProgress) + 'static,
    {
        let id = self.listeners.next_id();
        self.listeners.drag.push(ListenerEntry {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Unregister a listener. Returns `false` if `id` was unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // -- lifecycle ----------------------------------------------------------

    /// Show the panel with `root` as its only level, at the root's default
    /// snap. No-op while visible.
    pub fn open(&mut self, root: ViewFrame) {
        if self.state.visible {
            tracing::trace!(target: "drawer.panel", level = %root.id, "open ignored; already visible");
            return;
        }
        let _span = tracing::debug_span!("panel.transition", op = "open", level = %root.id).entered();

        self.pending_reset = false;
        self.arbiter.reset();
        let (snap, unresolved) = entry_snap(&self.layout, &root, SnapId::Hidden);
        if let Some(err) = unresolved {
            self.recover(err);
        }
        self.state.levels.reset_to(root);
        self.state.visible = true;
        self.emit_level(LevelChangeKind::Open);
        self.settle_at(snap, SnapCause::Open, 0.0);
    }

    /// Hide the panel. The level stack is reset to its root once the exit
    /// animation finishes. No-op while hidden.
    pub fn close(&mut self) {
        self.close_with(SnapCause::Close, 0.0);
    }

    /// Append a level. The snap is kept if the level allows it, otherwise
    /// the level's default snap is entered.
    pub fn push_level(&mut self, frame: ViewFrame) -> Result<(), PanelError> {
        if !self.state.visible {
            return Err(self.refuse("push_level", TransitionRefusal::PanelHidden));
        }
        let _span =
            tracing::debug_span!("panel.transition", op = "push_level", level = %frame.id).entered();

        self.interrupt_drag();
        let covered = self.state.snap;
        let (snap, unresolved) = entry_snap(&self.layout, &frame, covered);
        if let Some(err) = unresolved {
            self.recover(err);
        }
        self.state.levels.push(frame, covered);
        self.emit_level(LevelChangeKind::Push);
        self.settle_at(snap, SnapCause::Navigation, 0.0);
        Ok(())
    }

    /// Pop the top level and return to the snap the revealed level was
    /// resting at. Refused at the root; the caller decides whether to close.
    pub fn back(&mut self) -> Result<ViewFrame, PanelError> {
        if !self.state.visible {
            return Err(self.refuse("back", TransitionRefusal::PanelHidden));
        }
        if self.state.levels.is_at_root() {
            return Err(self.refuse("back", TransitionRefusal::AtRoot));
        }
        let _span = tracing::debug_span!("panel.transition", op = "back").entered();

        self.interrupt_drag();
        let Some(popped) = self.state.levels.pop() else {
            return Err(self.refuse("back", TransitionRefusal::AtRoot));
        };
        let resume = self.state.levels.take_resume_snap();
        let (snap, unresolved) = match self.state.levels.top() {
            Some(top) => entry_snap(&self.layout, top, resume.unwrap_or(top.default_snap)),
            None => (self.state.snap, None),
        };
        if let Some(err) = unresolved {
            self.recover(err);
        }
        self.emit_level(LevelChangeKind::Pop);
        self.settle_at(snap, SnapCause::Navigation, 0.0);
        Ok(popped)
    }

    /// Move to `snap`, e.g. expanding when a list level fills up. Refused
    /// while hidden or when the current level does not allow `snap`.
    pub fn snap_to(&mut self, snap: SnapId) -> Result<(), PanelError> {
        if !self.state.visible {
            return Err(self.refuse("snap_to", TransitionRefusal::PanelHidden));
        }
        let allowed = !snap.is_hidden()
            && self.layout.contains(snap)
            && self.state.levels.top().is_some_and(|f| f.allows(snap));
        if !allowed {
            return Err(self.refuse("snap_to", TransitionRefusal::SnapNotAllowed(snap)));
        }
        let _span = tracing::debug_span!("panel.transition", op = "snap_to", snap = ?snap).entered();

        self.interrupt_drag();
        self.settle_at(snap, SnapCause::Request, 0.0);
        Ok(())
    }

    /// `back()`, or `close()` when only the root remains.
    pub fn back_or_close(&mut self) -> Result<BackOutcome, PanelError> {
        if self.state.visible && self.state.levels.is_at_root() {
            self.close();
            return Ok(BackOutcome::Closed);
        }
        self.back().map(BackOutcome::Popped)
    }

    /// Record the current level's sub-selection (e.g. the chosen city).
    ///
    /// Levels titled from their parent pick it up when pushed on top.
    pub fn set_selection(&mut self, selection: Option<String>) {
        self.state.levels.select(selection);
    }

    // -- input --------------------------------------------------------------

    /// Feed one pointer event. The returned output tells the host whether
    /// the panel consumed it ([`ArbiterOutput::PassThrough`] means deliver
    /// it to content).
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> ArbiterOutput {
        let offset_px = if self.adapter.is_settling() && !self.arbiter.is_dragging() {
            self.adapter.rendered_offset()
        } else {
            self.state.working_offset_px
        };
        let ctx = PanelContext {
            offset_px,
            container_height: self.state.container_height,
            snap: self.state.snap,
        };

        let output = self.arbiter.process(event, &ctx);
        match output {
            ArbiterOutput::DragStart { offset_px } => self.begin_drag(offset_px),
            ArbiterOutput::DragMove {
                offset_px,
                delta_px,
                velocity_px_s,
            } => self.drag_to(offset_px, delta_px, velocity_px_s),
            ArbiterOutput::DragEnd {
                offset_px,
                offset_delta_px,
                velocity_px_s,
                origin,
            } => self.release(offset_px, offset_delta_px, velocity_px_s, origin),
            ArbiterOutput::DragCancel { origin } => self.settle_after_cancel(origin),
            ArbiterOutput::PassThrough | ArbiterOutput::Ignored => {}
        }
        output
    }

    /// End an active drag (focus loss, host override) and settle back to the
    /// snap it started from. Returns `false` if no drag was active.
    pub fn cancel_drag(&mut self) -> bool {
        match self.arbiter.cancel() {
            Some(session) => {
                self.settle_after_cancel(session.origin);
                true
            }
            None => false,
        }
    }

    /// Advance animations by `dt` and return the frame to render.
    pub fn tick(&mut self, dt: Duration) -> Frame {
        if let Some(done) = self.adapter.tick(dt)
            && done.is_hidden()
        {
            self.finish_close();
        }
        self.adapter.frame()
    }

    /// Apply a new container height. Snap offsets are re-resolved; a resting
    /// panel jumps to its snap's new offset without animating.
    pub fn set_container_height(&mut self, container_height: f64) {
        let h = sanitize_height(container_height);
        if h == self.state.container_height {
            return;
        }
        tracing::debug!(
            target: "drawer.panel",
            from_px = self.state.container_height,
            to_px = h,
            "container resized"
        );
        self.layout = SnapLayout::new(&self.config.snaps, h);
        self.state.container_height = h;

        let target_px = if self.arbiter.is_dragging() {
            let current = self.state.working_offset_px;
            self.set_working_offset(current);
            self.state.working_offset_px
        } else {
            let px = self.offset_of(self.state.snap);
            self.state.working_offset_px = px;
            px
        };
        self.adapter.set_container_height(h, target_px);
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.config.reduced_motion = reduced_motion;
        self.adapter.set_reduced_motion(reduced_motion);
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

impl PanelController {
    fn close_with(&mut self, cause: SnapCause, velocity_px_s: f64) {
        if !self.state.visible {
            return;
        }
        let _span = tracing::debug_span!("panel.transition", op = "close", cause = ?cause).entered();

        self.arbiter.reset();
        self.state.visible = false;
        self.pending_reset = true;
        self.settle_at(SnapId::Hidden, cause, velocity_px_s);
        if !self.adapter.is_settling() {
            self.finish_close();
        }
    }

    /// Perform the deferred stack reset.
    fn finish_close(&mut self) {
        if !self.pending_reset || self.state.visible {
            return;
        }
        self.pending_reset = false;
        if self.state.levels.truncate_to_root() {
            self.emit_level(LevelChangeKind::Reset);
        }
    }

    fn begin_drag(&mut self, offset_px: f64) {
        if let Some(interrupted_at_px) = self.adapter.interrupt() {
            self.recover(PanelError::DragConflict { interrupted_at_px });
        }
        self.set_working_offset(offset_px);
        self.adapter.follow(self.state.working_offset_px);
    }

    fn drag_to(&mut self, offset_px: f64, delta_px: f64, velocity_px_s: f64) {
        self.set_working_offset(offset_px);
        self.adapter.follow(self.state.working_offset_px);
        let progress = DragProgress {
            offset_px: self.state.working_offset_px,
            delta_px,
            velocity_px_s,
            open_fraction: self.adapter.frame().open_fraction,
        };
        for entry in &mut self.listeners.drag {
            (entry.callback)(&progress);
        }
    }

    fn release(&mut self, offset_px: f64, delta_px: f64, velocity_px_s: f64, origin: SnapId) {
        let _span = tracing::debug_span!("panel.transition", op = "release").entered();
        self.set_working_offset(offset_px);
        self.adapter.follow(self.state.working_offset_px);

        let Some(level) = self.state.levels.top() else {
            self.settle_at(origin, SnapCause::Release, velocity_px_s);
            return;
        };
        let input = ReleaseInput {
            origin,
            offset_delta_px: delta_px,
            velocity_px_s,
            allowed: &level.allowed_snaps,
            fallback: level.default_snap,
            dismissible: level.dismissible.unwrap_or(self.config.dismissible),
        };
        let decision = resolve(&input, &self.layout, &self.config.thresholds);
        tracing::debug!(
            target: "drawer.panel",
            level = %level.id,
            delta_px,
            velocity_px_s,
            rule = ?decision.rule,
            resolution = ?decision.resolution,
            "drag resolved"
        );

        match decision.resolution {
            Resolution::Dismiss => self.close_with(SnapCause::Dismiss, velocity_px_s),
            Resolution::Snap(suggested) if decision.rule == Rule::Unresolved => {
                let (snap, err) = entry_snap(&self.layout, level, suggested);
                let err = err.unwrap_or_else(|| PanelError::UnresolvedSnap {
                    level: level.id.clone(),
                    requested: origin,
                    fallback: snap,
                });
                self.recover(err);
                self.settle_at(snap, SnapCause::Release, velocity_px_s);
            }
            Resolution::Snap(snap) => self.settle_at(snap, SnapCause::Release, velocity_px_s),
        }
    }

    fn settle_after_cancel(&mut self, origin: SnapId) {
        let (snap, unresolved) = match self.state.levels.top() {
            Some(level) if self.state.visible => entry_snap(&self.layout, level, origin),
            _ => (self.state.snap, None),
        };
        if let Some(err) = unresolved {
            self.recover(err);
        }
        self.settle_at(snap, SnapCause::Cancel, 0.0);
    }

    /// Cancel a drag made stale by navigation. The caller settles.
    fn interrupt_drag(&mut self) {
        if self.arbiter.cancel().is_some() {
            tracing::debug!(target: "drawer.panel", "drag ended by navigation");
        }
    }

    /// Make `snap` current and animate toward it.
    fn settle_at(&mut self, snap: SnapId, cause: SnapCause, velocity_px_s: f64) {
        let from = self.state.snap;
        let target_px = self.offset_of(snap);
        self.state.snap = snap;
        self.state.working_offset_px = target_px;

        let already_heading = self
            .adapter
            .task()
            .is_some_and(|t| t.target() == snap && t.target_px() == target_px);
        if !already_heading {
            self.adapter.settle_to(snap, target_px, velocity_px_s);
        }

        if from != snap {
            let change = SnapChange {
                from,
                to: snap,
                offset_px: target_px,
                cause,
            };
            tracing::debug!(
                target: "drawer.panel",
                from = ?from,
                snap = ?snap,
                offset_px = target_px,
                cause = ?cause,
                "snap changed"
            );
            for entry in &mut self.listeners.snap {
                (entry.callback)(&change);
            }
        }
    }

    fn emit_level(&mut self, kind: LevelChangeKind) {
        let change = LevelChange {
            kind,
            depth: self.state.levels.len(),
            level: self
                .state
                .levels
                .top()
                .map(|f| f.id.clone())
                .unwrap_or_default(),
            title: self.state.levels.current_title().unwrap_or_default(),
        };
        tracing::debug!(
            target: "drawer.panel",
            kind = ?kind,
            level = %change.level,
            depth = change.depth,
            "level changed"
        );
        for entry in &mut self.listeners.level {
            (entry.callback)(&change);
        }
    }

    /// Clamp and store a working offset, recording out-of-range input.
    fn set_working_offset(&mut self, offset_px: f64) {
        let h = self.state.container_height;
        let clamped = clamp_offset(offset_px, h);
        if is_out_of_bounds(offset_px, h) {
            self.recover(PanelError::OutOfBoundsOffset {
                requested_px: offset_px,
                clamped_px: clamped,
            });
        }
        self.state.working_offset_px = clamped;
    }

    /// Offset of `snap`. Snaps missing from the layout render fully expanded.
    fn offset_of(&self, snap: SnapId) -> f64 {
        self.layout.offset_of(snap).unwrap_or(0.0)
    }

    fn refuse(&mut self, op: &'static str, reason: TransitionRefusal) -> PanelError {
        let err = PanelError::InvalidTransition { op, reason };
        self.recover(err.clone());
        err
    }

    fn recover(&mut self, err: PanelError) {
        self.stats.record(&err);
        match err {
            PanelError::UnresolvedSnap { .. } => {
                tracing::warn!(target: "drawer.panel", kind = err.kind(), "{err}");
            }
            _ => tracing::debug!(target: "drawer.panel", kind = err.kind(), "{err}"),
        }
    }
}

/// The snap to rest at when `frame` becomes the top level while `current`
/// is active: `current` if allowed, else the default. A default the frame
/// does not allow is still used if the layout has it; otherwise the lowest
/// allowed (or any visible) snap. Both fallbacks are reported as unresolved.
fn entry_snap(
    layout: &SnapLayout,
    frame: &ViewFrame,
    current: SnapId,
) -> (SnapId, Option<PanelError>) {
    let placeable = |snap: SnapId| !snap.is_hidden() && layout.contains(snap);
    let usable = |snap: SnapId| placeable(snap) && frame.allows(snap);
    if usable(current) {
        return (current, None);
    }
    if usable(frame.default_snap) {
        return (frame.default_snap, None);
    }
    let fallback = if placeable(frame.default_snap) {
        frame.default_snap
    } else {
        layout
            .ids()
            .filter(|snap| usable(*snap))
            .last()
            .or_else(|| layout.visible_ids().last().copied())
            .unwrap_or(frame.default_snap)
    };
    let err = PanelError::UnresolvedSnap {
        level: frame.id.clone(),
        requested: frame.default_snap,
        fallback,
    };
    (fallback, Some(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use drawer_core::geometry::Span;
    use drawer_core::snap::SnapPoint;
    use web_time::Instant;

    const H: f64 = 800.0;
    const FRAME: Duration = Duration::from_millis(16);
    /// Sample spacing that is exact in binary floating point.
    const STEP: Duration = Duration::from_micros(15_625);

    fn config() -> DrawerConfig {
        DrawerConfig {
            snaps: vec![
                SnapPoint::offset(SnapId::Full, 0.0),
                SnapPoint::fraction(SnapId::Initial, 0.5),
                SnapPoint::visible(SnapId::Peek, 130.0),
            ],
            handles: vec![Span::new(0.0, 48.0)],
            ..DrawerConfig::default()
        }
    }

    fn panel() -> PanelController {
        PanelController::new(config(), H)
    }

    fn root() -> ViewFrame {
        ViewFrame::new("cities", [SnapId::Initial, SnapId::Full], SnapId::Initial)
    }

    fn settle(panel: &mut PanelController) {
        for _ in 0..600 {
            if panel.tick(FRAME).settled {
                return;
            }
        }
        panic!("panel never settled");
    }

    /// Drag from the handle by `dy`, releasing at `velocity` px/s.
    fn drag(panel: &mut PanelController, dy: f64, velocity: f64) {
        let top = panel.frame().offset_px;
        let y0 = top + 10.0;
        let t0 = Instant::now();
        panel.handle_pointer(&PointerEvent::down(y0, t0));
        panel.handle_pointer(&PointerEvent::moved(y0 + dy / 2.0, t0 + STEP));
        panel.handle_pointer(&PointerEvent::moved(
            y0 + dy - velocity * STEP.as_secs_f64(),
            t0 + STEP * 2,
        ));
        panel.handle_pointer(&PointerEvent::up(y0 + dy, t0 + STEP * 3));
    }

    fn record_snaps(panel: &mut PanelController) -> Rc<RefCell<Vec<SnapChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        panel.on_snap_change(move |c| sink.borrow_mut().push(*c));
        log
    }

    fn record_levels(panel: &mut PanelController) -> Rc<RefCell<Vec<LevelChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        panel.on_level_change(move |c| sink.borrow_mut().push(c.clone()));
        log
    }

    #[test]
    fn starts_hidden() {
        let panel = panel();
        let state = panel.state();
        assert!(!state.is_visible());
        assert_eq!(state.snap(), SnapId::Hidden);
        assert_eq!(state.working_offset_px(), H);
        assert!(state.levels().is_empty());
    }

    #[test]
    fn open_enters_root_default_and_emits() {
        let mut panel = panel();
        let snaps = record_snaps(&mut panel);
        let levels = record_levels(&mut panel);

        panel.open(root());
        assert!(panel.state().is_visible());
        assert_eq!(panel.state().snap(), SnapId::Initial);
        assert_eq!(panel.state().working_offset_px(), 400.0);
        assert_eq!(levels.borrow()[0].kind, LevelChangeKind::Open);
        assert_eq!(levels.borrow()[0].depth, 1);
        assert_eq!(
            snaps.borrow()[0],
            SnapChange {
                from: SnapId::Hidden,
                to: SnapId::Initial,
                offset_px: 400.0,
                cause: SnapCause::Open,
            }
        );

        settle(&mut panel);
        assert_eq!(panel.frame().offset_px, 400.0);
    }

    #[test]
    fn open_while_visible_is_noop() {
        let mut panel = panel();
        panel.open(root());
        let snaps = record_snaps(&mut panel);
        panel.open(ViewFrame::new("other", [SnapId::Full], SnapId::Full));
        assert!(snaps.borrow().is_empty());
        assert_eq!(panel.state().current_level().map(|f| f.id.as_str()), Some("cities"));
    }

    #[test]
    fn close_defers_stack_reset_until_hidden() {
        let mut panel = panel();
        panel.open(root());
        panel.set_selection(Some("Lisbon".into()));
        panel
            .push_level(ViewFrame::new("categories", [SnapId::Full], SnapId::Full))
            .unwrap();
        settle(&mut panel);
        let levels = record_levels(&mut panel);

        panel.close();
        assert!(!panel.state().is_visible());
        assert_eq!(panel.state().snap(), SnapId::Hidden);
        assert_eq!(panel.state().working_offset_px(), H);
        assert_eq!(panel.state().levels().len(), 2, "reset happens after the exit animation");
        assert!(levels.borrow().is_empty());

        settle(&mut panel);
        assert_eq!(panel.state().levels().len(), 1);
        assert_eq!(levels.borrow().last().map(|c| c.kind), Some(LevelChangeKind::Reset));
        assert_eq!(panel.state().levels().root().and_then(ViewFrame::selection), None);
    }

    #[test]
    fn reduced_motion_resets_immediately() {
        let mut panel = PanelController::new(
            DrawerConfig {
                reduced_motion: true,
                ..config()
            },
            H,
        );
        panel.open(root());
        assert!(panel.frame().settled);
        panel
            .push_level(ViewFrame::new("list", [SnapId::Full], SnapId::Full))
            .unwrap();
        panel.close();
        assert_eq!(panel.state().levels().len(), 1);
        assert_eq!(panel.frame().offset_px, H);
    }

    #[test]
    fn reopening_mid_close_cancels_reset() {
        let mut panel = panel();
        panel.open(root());
        panel
            .push_level(ViewFrame::new("list", [SnapId::Full], SnapId::Full))
            .unwrap();
        settle(&mut panel);
        panel.close();
        panel.tick(FRAME);

        let levels = record_levels(&mut panel);
        panel.open(root());
        settle(&mut panel);
        assert_eq!(panel.state().levels().len(), 1);
        let kinds: Vec<_> = levels.borrow().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![LevelChangeKind::Open]);
    }

    #[test]
    fn close_when_hidden_emits_nothing() {
        let mut panel = panel();
        let snaps = record_snaps(&mut panel);
        let before = panel.state().clone();
        panel.close();
        assert!(snaps.borrow().is_empty());
        assert_eq!(panel.state(), &before);
        assert_eq!(panel.stats(), PanelStats::default());
    }

    #[test]
    fn push_while_hidden_is_refused() {
        let mut panel = panel();
        let err = panel.push_level(root()).unwrap_err();
        assert_eq!(
            err,
            PanelError::InvalidTransition {
                op: "push_level",
                reason: TransitionRefusal::PanelHidden,
            }
        );
        assert_eq!(panel.stats().invalid_transitions, 1);
    }

    #[test]
    fn back_at_root_is_refused_without_state_change() {
        let mut panel = panel();
        panel.open(root());
        let before = panel.state().clone();
        let err = panel.back().unwrap_err();
        assert!(matches!(
            err,
            PanelError::InvalidTransition {
                reason: TransitionRefusal::AtRoot,
                ..
            }
        ));
        assert_eq!(panel.state(), &before);
    }

    #[test]
    fn push_keeps_allowed_snap() {
        let mut panel = panel();
        panel.open(root());
        panel
            .push_level(ViewFrame::new(
                "list",
                [SnapId::Initial, SnapId::Full],
                SnapId::Full,
            ))
            .unwrap();
        assert_eq!(panel.state().snap(), SnapId::Initial);
    }

    #[test]
    fn back_restores_covered_snap() {
        let mut panel = panel();
        panel.open(root());
        panel
            .push_level(ViewFrame::new("detail", [SnapId::Full], SnapId::Full))
            .unwrap();
        assert_eq!(panel.state().snap(), SnapId::Full);

        let popped = panel.back().unwrap();
        assert_eq!(popped.id, "detail");
        assert_eq!(panel.state().snap(), SnapId::Initial);
    }

    #[test]
    fn snap_to_respects_allowed_snaps() {
        let mut panel = panel();
        assert!(panel.snap_to(SnapId::Full).is_err());
        panel.open(root());
        panel.snap_to(SnapId::Full).unwrap();
        assert_eq!(panel.state().snap(), SnapId::Full);
        assert_eq!(panel.state().working_offset_px(), 0.0);

        let err = panel.snap_to(SnapId::Peek).unwrap_err();
        assert_eq!(
            err,
            PanelError::InvalidTransition {
                op: "snap_to",
                reason: TransitionRefusal::SnapNotAllowed(SnapId::Peek),
            }
        );
        assert!(panel.snap_to(SnapId::Hidden).is_err());
        assert_eq!(panel.state().snap(), SnapId::Full);
        assert_eq!(panel.stats().invalid_transitions, 3);
    }

    #[test]
    fn back_or_close_closes_at_root() {
        let mut panel = panel();
        panel.open(root());
        panel
            .push_level(ViewFrame::new("detail", [SnapId::Full], SnapId::Full))
            .unwrap();
        assert!(matches!(panel.back_or_close(), Ok(BackOutcome::Popped(_))));
        assert_eq!(panel.back_or_close(), Ok(BackOutcome::Closed));
        assert!(!panel.state().is_visible());
        assert_eq!(panel.stats().invalid_transitions, 0);
    }

    #[test]
    fn derived_title_reaches_level_change() {
        let mut panel = panel();
        panel.open(root());
        panel.set_selection(Some("Porto".into()));
        let levels = record_levels(&mut panel);
        panel
            .push_level(
                ViewFrame::new("categories", [SnapId::Full], SnapId::Full)
                    .with_title_from_parent("Categories"),
            )
            .unwrap();
        assert_eq!(levels.borrow()[0].title, "Porto");
        assert_eq!(panel.state().title().as_deref(), Some("Porto"));
    }

    #[test]
    fn drag_emits_progress_and_follows_pointer() {
        let mut panel = panel();
        panel.open(root());
        settle(&mut panel);

        let progress = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&progress);
        panel.on_drag_progress(move |p| sink.borrow_mut().push(*p));

        let t0 = Instant::now();
        panel.handle_pointer(&PointerEvent::down(410.0, t0));
        assert_eq!(panel.touch_action(), TouchAction::None);
        panel.handle_pointer(&PointerEvent::moved(380.0, t0 + STEP));
        assert_eq!(panel.state().working_offset_px(), 370.0);
        assert_eq!(panel.frame().offset_px, 370.0);

        let last = progress.borrow().last().copied().unwrap();
        assert_eq!(last.offset_px, 370.0);
        assert_eq!(last.delta_px, -30.0);
        assert!((last.open_fraction - (1.0 - 370.0 / H)).abs() < 1e-9);
    }

    #[test]
    fn fast_flick_down_from_lowest_dismisses() {
        let mut panel = panel();
        panel.open(root());
        settle(&mut panel);
        let snaps = record_snaps(&mut panel);

        drag(&mut panel, 30.0, 900.0);
        assert!(!panel.state().is_visible());
        assert_eq!(snaps.borrow()[0].cause, SnapCause::Dismiss);
        assert_eq!(snaps.borrow()[0].to, SnapId::Hidden);
    }

    #[test]
    fn level_override_blocks_dismiss() {
        let mut panel = panel();
        panel.open(root().with_dismissible(false));
        settle(&mut panel);

        drag(&mut panel, 120.0, 900.0);
        assert!(panel.state().is_visible());
        assert_eq!(panel.state().snap(), SnapId::Initial);
    }

    #[test]
    fn release_velocity_seeds_settle() {
        let mut panel = panel();
        panel.open(root());
        settle(&mut panel);

        drag(&mut panel, -60.0, -800.0);
        assert_eq!(panel.state().snap(), SnapId::Full);
        let released_at = panel.frame().offset_px;
        assert_eq!(released_at, 340.0);

        let mut at_rest_start = crate::config::SpringConfig::default().spring(released_at, 0.0, 0.0);
        at_rest_start.advance(FRAME);
        panel.tick(FRAME);
        assert!(panel.frame().offset_px < at_rest_start.position());
    }

    #[test]
    fn pointer_cancel_settles_back_to_origin() {
        let mut panel = panel();
        panel.open(root());
        settle(&mut panel);
        let snaps = record_snaps(&mut panel);

        let t0 = Instant::now();
        panel.handle_pointer(&PointerEvent::down(410.0, t0));
        panel.handle_pointer(&PointerEvent::moved(260.0, t0 + STEP));
        let out = panel.handle_pointer(&PointerEvent::cancel(300.0, t0 + STEP * 2));
        assert_eq!(out, ArbiterOutput::DragCancel { origin: SnapId::Initial });
        assert_eq!(panel.state().snap(), SnapId::Initial);
        assert_eq!(panel.state().working_offset_px(), 400.0);
        assert!(snaps.borrow().is_empty());

        settle(&mut panel);
        assert_eq!(panel.frame().offset_px, 400.0);
    }

    #[test]
    fn cancel_drag_without_session_is_false() {
        let mut panel = panel();
        assert!(!panel.cancel_drag());
        panel.open(root());
        settle(&mut panel);
        panel.handle_pointer(&PointerEvent::down(410.0, Instant::now()));
        assert!(panel.cancel_drag());
        assert!(!panel.is_dragging());
    }

    #[test]
    fn drag_during_settle_counts_conflict() {
        let mut panel = panel();
        panel.open(root());
        for _ in 0..3 {
            panel.tick(FRAME);
        }
        let drawn = panel.frame().offset_px;
        panel.handle_pointer(&PointerEvent::down(drawn + 5.0, Instant::now()));
        assert!(panel.is_dragging());
        assert_eq!(panel.stats().drag_conflicts, 1);
        assert_eq!(panel.state().working_offset_px(), drawn);
    }

    #[test]
    fn empty_allowed_snaps_fall_back() {
        let mut panel = panel();
        panel.open(ViewFrame::new("broken", Vec::<SnapId>::new(), SnapId::Initial));
        assert!(panel.state().is_visible());
        assert_eq!(panel.state().snap(), SnapId::Initial);
        assert_eq!(panel.stats().unresolved_snaps, 1);
    }

    #[test]
    fn release_on_level_without_allowed_snaps_falls_back_to_default() {
        let mut panel = panel();
        panel.open(ViewFrame::new("broken", Vec::<SnapId>::new(), SnapId::Initial));
        settle(&mut panel);
        assert_eq!(panel.stats().unresolved_snaps, 1);
        let snaps = record_snaps(&mut panel);

        drag(&mut panel, -120.0, -900.0);
        assert!(!panel.is_dragging());
        assert_eq!(panel.stats().unresolved_snaps, 2);
        assert!(panel.state().is_visible());
        assert_eq!(panel.state().snap(), SnapId::Initial);
        assert_eq!(panel.state().working_offset_px(), 400.0);
        assert!(snaps.borrow().is_empty());

        settle(&mut panel);
        assert_eq!(panel.frame().offset_px, 400.0);
    }

    #[test]
    fn default_outside_layout_falls_back_to_lowest_allowed() {
        let mut panel = PanelController::new(
            DrawerConfig {
                snaps: vec![
                    SnapPoint::offset(SnapId::Full, 0.0),
                    SnapPoint::visible(SnapId::Peek, 130.0),
                ],
                ..config()
            },
            H,
        );
        panel.open(ViewFrame::new("list", [SnapId::Full, SnapId::Peek], SnapId::Initial));
        assert_eq!(panel.state().snap(), SnapId::Peek);
        assert_eq!(panel.stats().unresolved_snaps, 1);
    }

    #[test]
    fn resize_rescales_resting_panel() {
        let mut panel = panel();
        panel.open(root());
        settle(&mut panel);
        panel.set_container_height(600.0);
        assert_eq!(panel.state().working_offset_px(), 300.0);
        assert_eq!(panel.frame().offset_px, 300.0);
        assert!(panel.frame().settled);
    }

    #[test]
    fn resize_during_drag_clamps_and_counts() {
        let mut panel = panel();
        panel.open(root());
        settle(&mut panel);
        let t0 = Instant::now();
        panel.handle_pointer(&PointerEvent::down(410.0, t0));
        panel.handle_pointer(&PointerEvent::moved(720.0, t0 + STEP));
        assert_eq!(panel.state().working_offset_px(), 710.0);

        panel.set_container_height(500.0);
        assert_eq!(panel.state().working_offset_px(), 500.0);
        assert_eq!(panel.stats().out_of_bounds_offsets, 1);
    }

    #[test]
    fn removed_listener_stops_receiving() {
        let mut panel = panel();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = panel.on_snap_change(move |_| *sink.borrow_mut() += 1);
        panel.open(root());
        assert!(panel.remove_listener(id));
        assert!(!panel.remove_listener(id));
        panel.close();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn content_pass_through_at_full() {
        let mut panel = panel();
        panel.open(ViewFrame::new("list", [SnapId::Initial, SnapId::Full], SnapId::Full));
        settle(&mut panel);
        let out = panel.handle_pointer(&PointerEvent::down(300.0, Instant::now()));
        assert_eq!(out, ArbiterOutput::PassThrough);
        assert_eq!(panel.touch_action(), TouchAction::Auto);
    }
}
