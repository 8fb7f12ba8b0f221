#![forbid(unsafe_code)]

//! Ready-made drawers.
//!
//! Each preset bundles a [`DrawerConfig`] with its root and child level
//! frames. Fractions are relative to the host container (the full map
//! viewport), so a drawer that is `85vh` tall and rests at 55% of its own
//! height sits at `0.15 + 0.55 * 0.85` of the container.

use drawer_core::geometry::Span;
use drawer_core::gesture::ArbiterConfig;
use drawer_core::snap::{SnapId, SnapPoint, SnapThresholds};

use crate::config::DrawerConfig;
use crate::panel::PanelController;
use crate::view_stack::ViewFrame;

/// A drawer configuration plus its level frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawerPreset {
    pub name: &'static str,
    pub config: DrawerConfig,
    pub root: ViewFrame,
    /// Frames that can be pushed on top of the root.
    pub levels: Vec<ViewFrame>,
}

impl DrawerPreset {
    /// A hidden controller for this drawer.
    #[must_use]
    pub fn controller(&self, container_height: f64) -> PanelController {
        PanelController::new(self.config.clone(), container_height)
    }

    /// A controller already opened at the root level.
    #[must_use]
    pub fn open(&self, container_height: f64) -> PanelController {
        let mut panel = self.controller(container_height);
        panel.open(self.root.clone());
        panel
    }

    /// A copy of the child frame `id`.
    #[must_use]
    pub fn level(&self, id: &str) -> Option<ViewFrame> {
        self.levels.iter().find(|f| f.id == id).cloned()
    }
}

pub mod city {
    pub const CITIES: &str = "cities";
    pub const CATEGORIES: &str = "categories";
    pub const LIST: &str = "list";
}

pub mod poi {
    pub const DETAIL: &str = "detail";
}

pub mod user {
    pub const MENU: &str = "menu";
    pub const FAVORITES: &str = "favorites";
    pub const SETTINGS: &str = "settings";
}

pub mod search {
    pub const RESULTS: &str = "results";
}

const MEDIUM_AND_FULL: [SnapId; 2] = [SnapId::Initial, SnapId::Full];

/// City picker: cities → categories → POI list.
///
/// Categories and the list are titled with the selection made one level
/// up. Hosts expand the list with `snap_to(SnapId::Full)` once it is
/// entered.
#[must_use]
pub fn city_drawer() -> DrawerPreset {
    DrawerPreset {
        name: "city",
        config: DrawerConfig {
            snaps: vec![
                SnapPoint::fraction(SnapId::Full, 0.15),
                SnapPoint::fraction(SnapId::Initial, 0.6175),
            ],
            thresholds: SnapThresholds {
                distance_px: 100.0,
                ..SnapThresholds::default()
            },
            gesture: ArbiterConfig {
                compact_snaps: vec![SnapId::Initial],
                ..ArbiterConfig::default()
            },
            handles: vec![Span::new(0.0, 56.0)],
            ..DrawerConfig::default()
        },
        root: ViewFrame::new(city::CITIES, MEDIUM_AND_FULL, SnapId::Initial).with_title("Cities"),
        levels: vec![
            ViewFrame::new(city::CATEGORIES, MEDIUM_AND_FULL, SnapId::Initial)
                .with_title_from_parent("Categories"),
            ViewFrame::new(city::LIST, MEDIUM_AND_FULL, SnapId::Full)
                .with_title_from_parent("Places"),
        ],
    }
}

/// POI detail sheet: peeks at the bottom 35%, expands to full screen.
/// Drags from the grab bar and the header.
#[must_use]
pub fn poi_detail_sheet() -> DrawerPreset {
    DrawerPreset {
        name: "poi_detail",
        config: DrawerConfig {
            snaps: vec![
                SnapPoint::offset(SnapId::Full, 0.0),
                SnapPoint::fraction(SnapId::Peek, 0.65),
            ],
            gesture: ArbiterConfig {
                compact_snaps: vec![SnapId::Peek],
                ..ArbiterConfig::default()
            },
            handles: vec![Span::new(0.0, 32.0), Span::new(32.0, 96.0)],
            ..DrawerConfig::default()
        },
        root: ViewFrame::new(poi::DETAIL, [SnapId::Peek, SnapId::Full], SnapId::Peek)
            .with_title("Details"),
        levels: Vec::new(),
    }
}

/// Account drawer: a menu with full-height favorites and settings pages.
#[must_use]
pub fn user_drawer() -> DrawerPreset {
    DrawerPreset {
        name: "user",
        config: DrawerConfig {
            snaps: vec![
                SnapPoint::fraction(SnapId::Full, 0.15),
                SnapPoint::fraction(SnapId::Initial, 0.49),
            ],
            thresholds: SnapThresholds {
                distance_px: 100.0,
                ..SnapThresholds::default()
            },
            gesture: ArbiterConfig {
                compact_snaps: vec![SnapId::Initial],
                ..ArbiterConfig::default()
            },
            ..DrawerConfig::default()
        },
        root: ViewFrame::new(user::MENU, MEDIUM_AND_FULL, SnapId::Initial).with_title("Account"),
        levels: vec![
            ViewFrame::new(user::FAVORITES, [SnapId::Full], SnapId::Full).with_title("Favorites"),
            ViewFrame::new(user::SETTINGS, [SnapId::Full], SnapId::Full).with_title("Settings"),
        ],
    }
}

/// Search results: a single full-height list that only drags from its
/// handle, so the list always scrolls natively.
#[must_use]
pub fn search_results_drawer() -> DrawerPreset {
    DrawerPreset {
        name: "search_results",
        config: DrawerConfig {
            snaps: vec![SnapPoint::fraction(SnapId::Full, 0.25)],
            thresholds: SnapThresholds {
                distance_px: 100.0,
                ..SnapThresholds::default()
            },
            gesture: ArbiterConfig {
                compact_snaps: Vec::new(),
                ..ArbiterConfig::default()
            },
            handles: vec![Span::new(0.0, 64.0)],
            ..DrawerConfig::default()
        },
        root: ViewFrame::new(search::RESULTS, [SnapId::Full], SnapId::Full).with_title("Results"),
        levels: Vec::new(),
    }
}

/// All presets.
#[must_use]
pub fn all() -> Vec<DrawerPreset> {
    vec![
        city_drawer(),
        poi_detail_sheet(),
        user_drawer(),
        search_results_drawer(),
    ]
}
