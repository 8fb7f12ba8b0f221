#![forbid(unsafe_code)]

//! Drawer configuration.
//!
//! A [`DrawerConfig`] carries everything one drawer instance needs beyond
//! its level frames: the snap set, release thresholds, arbitration and
//! spring settings. Configs deserialize from TOML or JSON with every field
//! optional (`#[serde(default)]`), and every loader runs
//! [`DrawerConfig::validate`] before handing the value out.
//!
//! ```toml
//! dismissible = true
//!
//! [[snaps]]
//! id = "full"
//! position = { offset = 0.0 }
//!
//! [[snaps]]
//! id = "initial"
//! position = { fraction = 0.55 }
//!
//! [thresholds]
//! distance_px = 100.0
//! ```

use std::fmt;
use std::path::Path;

use drawer_core::animation::Spring;
use drawer_core::geometry::Span;
use drawer_core::gesture::ArbiterConfig;
use drawer_core::snap::{SnapId, SnapPoint, SnapPosition, SnapThresholds};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SpringConfig
// ---------------------------------------------------------------------------

/// Settle spring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    /// Distance from target (px) below which the spring may rest.
    pub rest_threshold_px: f64,
    /// Speed (px/s) below which the spring may rest.
    pub velocity_threshold_px_s: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 200.0,
            damping: 25.0,
            rest_threshold_px: 0.5,
            velocity_threshold_px_s: 5.0,
        }
    }
}

impl SpringConfig {
    /// Build a spring from `from` to `to`, seeded with `velocity_px_s`.
    #[must_use]
    pub fn spring(&self, from: f64, to: f64, velocity_px_s: f64) -> Spring {
        Spring::new(from, to)
            .with_stiffness(self.stiffness)
            .with_damping(self.damping)
            .with_rest_threshold(self.rest_threshold_px)
            .with_velocity_threshold(self.velocity_threshold_px_s)
            .with_velocity(velocity_px_s)
    }
}

// ---------------------------------------------------------------------------
// DrawerConfig
// ---------------------------------------------------------------------------

/// Per-drawer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerConfig {
    /// Global snap set. `hidden` is implicit and must not be listed.
    pub snaps: Vec<SnapPoint>,
    pub thresholds: SnapThresholds,
    pub gesture: ArbiterConfig,
    /// Handle bands relative to the panel top.
    pub handles: Vec<Span>,
    pub spring: SpringConfig,
    /// Whether dragging down past the lowest snap closes the drawer.
    /// Individual levels may override this.
    pub dismissible: bool,
    /// Settle instantly instead of springing.
    pub reduced_motion: bool,
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            snaps: vec![
                SnapPoint::offset(SnapId::Full, 0.0),
                SnapPoint::fraction(SnapId::Initial, 0.55),
                SnapPoint::visible(SnapId::Peek, 130.0),
            ],
            thresholds: SnapThresholds::default(),
            gesture: ArbiterConfig::default(),
            handles: vec![Span::new(0.0, 48.0)],
            spring: SpringConfig::default(),
            dismissible: true,
            reduced_motion: false,
        }
    }
}

impl DrawerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src).map_err(ConfigError::Toml)?;
        config.checked()
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&src)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(src).map_err(ConfigError::Json)?;
        config.checked()
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&src)
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSer)
    }

    fn checked(self) -> Result<Self, ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(self)
        } else {
            tracing::warn!(
                target: "drawer.config",
                count = problems.len(),
                "rejected drawer config"
            );
            Err(ConfigError::Validation(problems))
        }
    }

    /// List every problem with this config. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !(self.thresholds.fast_velocity_px_s.is_finite()
            && self.thresholds.fast_velocity_px_s > 0.0)
        {
            problems.push(format!(
                "thresholds.fast_velocity_px_s must be > 0 (got {})",
                self.thresholds.fast_velocity_px_s
            ));
        }
        if !(self.thresholds.distance_px.is_finite() && self.thresholds.distance_px > 0.0) {
            problems.push(format!(
                "thresholds.distance_px must be > 0 (got {})",
                self.thresholds.distance_px
            ));
        }
        if self.gesture.velocity_window < 2 {
            problems.push(format!(
                "gesture.velocity_window must be >= 2 (got {})",
                self.gesture.velocity_window
            ));
        }
        if !(self.spring.stiffness.is_finite() && self.spring.stiffness > 0.0) {
            problems.push(format!(
                "spring.stiffness must be > 0 (got {})",
                self.spring.stiffness
            ));
        }
        if !(self.spring.damping.is_finite() && self.spring.damping >= 0.0) {
            problems.push(format!(
                "spring.damping must be >= 0 (got {})",
                self.spring.damping
            ));
        }

        let mut seen: Vec<SnapId> = Vec::with_capacity(self.snaps.len());
        for point in &self.snaps {
            if point.id.is_hidden() {
                problems.push("snap `hidden` is implicit and must not be listed".to_string());
                continue;
            }
            if seen.contains(&point.id) {
                problems.push(format!("duplicate snap `{}`", point.id));
            }
            seen.push(point.id);

            match point.position {
                SnapPosition::Fraction(f) if !(0.0..=1.0).contains(&f) => problems.push(format!(
                    "snap `{}` fraction must be within [0, 1] (got {f})",
                    point.id
                )),
                SnapPosition::Offset(px) | SnapPosition::Visible(px)
                    if !(px.is_finite() && px >= 0.0) =>
                {
                    problems.push(format!(
                        "snap `{}` pixel position must be >= 0 (got {px})",
                        point.id
                    ));
                }
                _ => {}
            }
        }
        if seen.is_empty() {
            problems.push("at least one visible snap is required".to_string());
        }

        for (i, span) in self.handles.iter().enumerate() {
            if span.is_empty() || !span.top.is_finite() {
                problems.push(format!("handles[{i}] must have a finite top and positive height"));
            }
        }

        problems
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors from loading a [`DrawerConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    TomlSer(toml::ser::Error),
    Json(serde_json::Error),
    /// The document parsed but describes an unusable drawer.
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Toml(e) => write!(f, "config TOML error: {e}"),
            Self::TomlSer(e) => write!(f, "config TOML serialization error: {e}"),
            Self::Json(e) => write!(f, "config JSON error: {e}"),
            Self::Validation(problems) => {
                write!(f, "invalid config: {}", problems.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::TomlSer(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
