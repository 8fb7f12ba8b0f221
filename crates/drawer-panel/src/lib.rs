#![forbid(unsafe_code)]

//! Panel: the multi-level bottom drawer controller.
//!
//! # Role in the drawer stack
//! `drawer-panel` wires the `drawer-core` primitives into one reusable
//! drawer. A host owns a [`PanelController`], feeds it pointer events and
//! animation frames, and reacts to its snap and level callbacks (for
//! example to recenter a map).
//!
//! # Primary responsibilities
//! - **PanelController**: open/close lifecycle, drag release, level
//!   navigation, listeners.
//! - **ViewStack**: root-first levels with per-level allowed snaps,
//!   titles and sub-selection.
//! - **RenderAdapter**: cancellable spring settle and the per-frame
//!   transform.
//! - **DrawerConfig**: snap sets, thresholds and spring tuning, loadable
//!   from TOML or JSON.
//! - **ContentRegistry / LevelContent**: level renderers and loading state,
//!   kept apart from panel mechanics.
//! - **presets**: the city, POI detail, user and search results drawers.
//!
//! # Example
//! ```
//! use drawer_panel::{PanelController, DrawerConfig, ViewFrame};
//! use drawer_core::snap::SnapId;
//! use std::time::Duration;
//!
//! let mut panel = PanelController::new(DrawerConfig::default(), 800.0);
//! panel.open(ViewFrame::new("cities", [SnapId::Initial, SnapId::Full], SnapId::Initial));
//! panel.push_level(ViewFrame::new("detail", [SnapId::Full], SnapId::Full)).unwrap();
//! assert_eq!(panel.state().snap(), SnapId::Full);
//!
//! let frame = panel.tick(Duration::from_millis(16));
//! assert!(!frame.settled);
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod panel;
pub mod presets;
pub mod render;
pub mod view_stack;

pub use config::{ConfigError, DrawerConfig, SpringConfig};
pub use content::{ContentRegistry, LevelContent};
pub use error::{PanelError, TransitionRefusal};
pub use panel::{
    BackOutcome, DragProgress, LevelChange, LevelChangeKind, ListenerId, PanelController,
    PanelState, PanelStats, SnapCause, SnapChange,
};
pub use render::{Frame, RenderAdapter, SettleTask};
pub use view_stack::{FrameTitle, ViewFrame, ViewStack};
