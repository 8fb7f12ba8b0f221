#![forbid(unsafe_code)]

//! Damped harmonic oscillator (spring) for panel offsets.
//!
//! The spring moves a pixel offset toward a target following
//!
//!   F = -stiffness × (position - target) - damping × velocity
//!
//! # Parameters
//!
//! - **stiffness** (k): restoring force. Typical drawer range: 150–400.
//! - **damping** (c): velocity drag.
//!   - Underdamped (c < 2√k): overshoots before settling
//!   - Critically damped (c ≈ 2√k): fastest convergence without overshoot
//!   - Overdamped (c > 2√k): slow convergence, no overshoot
//! - **rest_threshold**: distance in px below which the spring may rest.
//! - **velocity_threshold**: speed in px/s below which the spring may rest.
//!
//! Because the spring integrates physics instead of following a fixed
//! duration, settle time grows with the distance travelled.
//!
//! # Invariants
//!
//! 1. `position()` is raw and unclamped; callers clamp to their own bounds.
//! 2. A spring at rest stays put until `set_target()` wakes it.
//! 3. On coming to rest the position snaps exactly onto the target and the
//!    velocity is zeroed.
//! 4. Stiffness is clamped to a positive minimum, damping to `>= 0`.
//!
//! # Failure Modes
//!
//! - Large `dt` (a dropped frame, a backgrounded tab): integration is
//!   subdivided into 4ms steps so the spring cannot explode.
//! - Non-finite inputs: `set_target` and `with_velocity` ignore NaN and
//!   infinities.

use std::time::Duration;

use super::Animation;

/// Maximum dt per integration step (4ms).
const MAX_STEP_SECS: f64 = 0.004;

/// Default rest threshold in px.
const DEFAULT_REST_THRESHOLD: f64 = 0.5;

/// Default velocity threshold in px/s.
const DEFAULT_VELOCITY_THRESHOLD: f64 = 5.0;

/// Minimum stiffness to prevent degenerate springs.
const MIN_STIFFNESS: f64 = 0.1;

/// A damped spring driving a single offset toward a target.
///
/// ```
/// use std::time::Duration;
/// use drawer_core::animation::{Animation, Spring};
///
/// let mut spring = Spring::new(600.0, 0.0)
///     .with_stiffness(200.0)
///     .with_damping(25.0);
///
/// for _ in 0..240 {
///     spring.tick(Duration::from_millis(16));
/// }
///
/// assert!(spring.is_complete());
/// assert_eq!(spring.position(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    damping: f64,
    rest_threshold: f64,
    velocity_threshold: f64,
    at_rest: bool,
}

impl Spring {
    /// Create a spring starting at `initial` and targeting `target`.
    ///
    /// Default parameters are the drawer feel: stiffness 200, damping 25.
    #[must_use]
    pub fn new(initial: f64, target: f64) -> Self {
        Self {
            position: initial,
            velocity: 0.0,
            target,
            stiffness: 200.0,
            damping: 25.0,
            rest_threshold: DEFAULT_REST_THRESHOLD,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            at_rest: false,
        }
    }

    /// Set stiffness (builder pattern). Clamped to minimum 0.1.
    #[must_use]
    pub fn with_stiffness(mut self, k: f64) -> Self {
        self.stiffness = if k.is_finite() { k.max(MIN_STIFFNESS) } else { MIN_STIFFNESS };
        self
    }

    /// Set damping (builder pattern). Clamped to minimum 0.0.
    #[must_use]
    pub fn with_damping(mut self, c: f64) -> Self {
        self.damping = if c.is_finite() { c.max(0.0) } else { 0.0 };
        self
    }

    /// Set the initial velocity in px/s (builder pattern).
    ///
    /// Used to hand a release velocity over to the settle motion.
    #[must_use]
    pub fn with_velocity(mut self, v: f64) -> Self {
        if v.is_finite() {
            self.velocity = v;
        }
        self
    }

    /// Set rest threshold in px (builder pattern).
    #[must_use]
    pub fn with_rest_threshold(mut self, threshold: f64) -> Self {
        self.rest_threshold = threshold.abs();
        self
    }

    /// Set velocity threshold in px/s (builder pattern).
    #[must_use]
    pub fn with_velocity_threshold(mut self, threshold: f64) -> Self {
        self.velocity_threshold = threshold.abs();
        self
    }

    /// Current position (unclamped).
    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity in px/s.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    #[inline]
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Change the target. Wakes the spring if it was at rest.
    pub fn set_target(&mut self, target: f64) {
        if !target.is_finite() {
            return;
        }
        if (self.target - target).abs() > self.rest_threshold {
            self.target = target;
            self.at_rest = false;
        }
    }

    /// Semi-implicit Euler step of `dt` seconds.
    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let acceleration = -self.stiffness * displacement - self.damping * self.velocity;

        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Advance the spring by `dt`, subdividing for stability.
    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }

        let total_secs = dt.as_secs_f64();
        if total_secs <= 0.0 {
            // A zero-length frame can still land an already-settled spring.
            self.settle_if_resting();
            return;
        }

        let mut remaining = total_secs;
        while remaining > 0.0 {
            let step_dt = remaining.min(MAX_STEP_SECS);
            self.step(step_dt);
            remaining -= step_dt;
        }

        self.settle_if_resting();
    }

    fn settle_if_resting(&mut self) {
        let pos_delta = (self.position - self.target).abs();
        if pos_delta < self.rest_threshold && self.velocity.abs() < self.velocity_threshold {
            self.position = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
        }
    }
}

impl Animation for Spring {
    fn tick(&mut self, dt: Duration) {
        self.advance(dt);
    }

    fn is_complete(&self) -> bool {
        self.at_rest
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
