#![forbid(unsafe_code)]

//! Rendering adapter: panel offset to on-screen transform.
//!
//! The adapter owns the only notion of frame timing in the drawer. During a
//! drag it follows the working offset exactly; after a release (or any other
//! transition) it runs a [`SettleTask`] that springs the rendered offset to
//! the target snap, one step per [`RenderAdapter::tick`].
//!
//! A settle task is cancellable at any frame. [`RenderAdapter::interrupt`]
//! stops it and hands back the last rendered offset so a new drag can start
//! exactly where the panel is drawn.

use std::time::Duration;

use drawer_core::animation::{Animation, Spring};
use drawer_core::geometry::{clamp_offset, sanitize_height};
use drawer_core::snap::SnapId;

use crate::config::SpringConfig;

/// The transform a host applies for one animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Panel top, in container px.
    pub offset_px: f64,
    /// Vertical translation to apply (`translateY`).
    pub translate_y: f64,
    /// `1.0` fully expanded, `0.0` hidden.
    pub open_fraction: f64,
    /// No settle animation is running.
    pub settled: bool,
}

/// A running settle animation toward one snap.
#[derive(Debug, Clone)]
pub struct SettleTask {
    id: u64,
    target: SnapId,
    spring: Spring,
}

impl SettleTask {
    /// Monotonic id; a restarted settle gets a new one.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> SnapId {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn target_px(&self) -> f64 {
        self.spring.target()
    }
}

/// Maps panel offsets to frames, animating settles with a spring.
#[derive(Debug, Clone)]
pub struct RenderAdapter {
    rendered_px: f64,
    container_height: f64,
    spring: SpringConfig,
    reduced_motion: bool,
    task: Option<SettleTask>,
    next_task_id: u64,
}

impl RenderAdapter {
    /// Create an adapter rendering a hidden panel.
    #[must_use]
    pub fn new(container_height: f64, spring: SpringConfig, reduced_motion: bool) -> Self {
        let h = sanitize_height(container_height);
        Self {
            rendered_px: h,
            container_height: h,
            spring,
            reduced_motion,
            task: None,
            next_task_id: 0,
        }
    }

    /// Last rendered offset.
    #[inline]
    #[must_use]
    pub fn rendered_offset(&self) -> f64 {
        self.rendered_px
    }

    #[inline]
    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.task.is_some()
    }

    #[must_use]
    pub fn task(&self) -> Option<&SettleTask> {
        self.task.as_ref()
    }

    /// Track a dragged offset directly, cancelling any settle.
    pub fn follow(&mut self, offset_px: f64) {
        self.task = None;
        self.rendered_px = clamp_offset(offset_px, self.container_height);
    }

    /// Start settling at `target` (resolved to `target_px`), seeded with
    /// `velocity_px_s`. Replaces any running task.
    ///
    /// Returns the id of the new task, or `None` when the settle completed
    /// immediately (reduced motion, or already resting at the target).
    pub fn settle_to(&mut self, target: SnapId, target_px: f64, velocity_px_s: f64) -> Option<u64> {
        let target_px = clamp_offset(target_px, self.container_height);
        self.task = None;

        if self.reduced_motion || (self.rendered_px - target_px).abs() < self.spring.rest_threshold_px
        {
            self.rendered_px = target_px;
            tracing::trace!(target: "drawer.render", snap = ?target, offset_px = target_px, "settled instantly");
            return None;
        }

        let id = self.next_task_id;
        self.next_task_id += 1;
        tracing::debug!(
            target: "drawer.render",
            task = id,
            snap = ?target,
            from_px = self.rendered_px,
            to_px = target_px,
            velocity_px_s,
            "settle started"
        );
        self.task = Some(SettleTask {
            id,
            target,
            spring: self.spring.spring(self.rendered_px, target_px, velocity_px_s),
        });
        Some(id)
    }

    /// Cancel the running settle, keeping the last rendered offset.
    ///
    /// Returns that offset if a task was cancelled.
    pub fn interrupt(&mut self) -> Option<f64> {
        let task = self.task.take()?;
        tracing::debug!(
            target: "drawer.render",
            task = task.id,
            offset_px = self.rendered_px,
            "settle interrupted"
        );
        Some(self.rendered_px)
    }

    /// Render without animation at `offset_px`, cancelling any settle.
    pub fn jump_to(&mut self, offset_px: f64) {
        self.follow(offset_px);
    }

    /// Advance the running settle by `dt`.
    ///
    /// Returns the target snap if the settle finished during this frame.
    pub fn tick(&mut self, dt: Duration) -> Option<SnapId> {
        let task = self.task.as_mut()?;
        task.spring.tick(dt);
        self.rendered_px = clamp_offset(task.spring.position(), self.container_height);

        if task.spring.is_complete() {
            let target = task.target;
            self.rendered_px = clamp_offset(task.spring.target(), self.container_height);
            tracing::debug!(target: "drawer.render", task = task.id, snap = ?target, "settle finished");
            self.task = None;
            return Some(target);
        }
        None
    }

    /// Apply a new container height. A running settle is retargeted to
    /// `target_px` without losing its velocity.
    pub fn set_container_height(&mut self, container_height: f64, target_px: f64) {
        self.container_height = sanitize_height(container_height);
        self.rendered_px = clamp_offset(self.rendered_px, self.container_height);
        let target_px = clamp_offset(target_px, self.container_height);
        match self.task.as_mut() {
            Some(task) => task.spring.set_target(target_px),
            None => self.rendered_px = target_px,
        }
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.reduced_motion = reduced_motion;
    }

    /// The transform for the current rendered offset.
    #[must_use]
    pub fn frame(&self) -> Frame {
        let open_fraction = if self.container_height > 0.0 {
            (1.0 - self.rendered_px / self.container_height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Frame {
            offset_px: self.rendered_px,
            translate_y: self.rendered_px,
            open_fraction,
            settled: self.task.is_none(),
        }
    }
}
