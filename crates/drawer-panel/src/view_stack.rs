#![forbid(unsafe_code)]

//! Level navigation inside one drawer.
//!
//! A [`ViewStack`] is a LIFO of [`ViewFrame`]s, root first. The root frame is
//! never popped; `pop()` at the root returns `None` and leaves closing the
//! drawer to the caller.
//!
//! # Frame-owned state
//!
//! Each frame carries two pieces of short-lived state that die with it:
//!
//! - `selection`: the item chosen inside this level (a city, a category).
//!   Child frames may derive their title from it.
//! - the snap it was resting at when a child covered it, restored when the
//!   child is popped.
//!
//! Neither is ever copied to another frame.

use drawer_core::snap::SnapId;
use serde::{Deserialize, Serialize};

/// How a frame's title is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTitle {
    /// A fixed string.
    Fixed(String),
    /// The parent frame's selection, or `fallback` when it has none.
    FromParentSelection { fallback: String },
}

/// One navigation level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewFrame {
    /// Level id; also the content-render key.
    pub id: String,
    pub title: FrameTitle,
    /// Snaps this level may rest at.
    pub allowed_snaps: Vec<SnapId>,
    /// Snap used on entry when the current one is not allowed.
    pub default_snap: SnapId,
    /// Overrides the drawer's dismiss-by-drag flag.
    #[serde(default)]
    pub dismissible: Option<bool>,
    #[serde(skip)]
    selection: Option<String>,
    #[serde(skip)]
    resume_snap: Option<SnapId>,
}

impl ViewFrame {
    /// Create a frame titled with its id.
    #[must_use]
    pub fn new(id: impl Into<String>, allowed_snaps: impl Into<Vec<SnapId>>, default_snap: SnapId) -> Self {
        let id = id.into();
        Self {
            title: FrameTitle::Fixed(id.clone()),
            id,
            allowed_snaps: allowed_snaps.into(),
            default_snap,
            dismissible: None,
            selection: None,
            resume_snap: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = FrameTitle::Fixed(title.into());
        self
    }

    /// Title this frame with the parent's selection.
    #[must_use]
    pub fn with_title_from_parent(mut self, fallback: impl Into<String>) -> Self {
        self.title = FrameTitle::FromParentSelection {
            fallback: fallback.into(),
        };
        self
    }

    #[must_use]
    pub fn with_dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = Some(dismissible);
        self
    }

    #[inline]
    #[must_use]
    pub fn allows(&self, snap: SnapId) -> bool {
        self.allowed_snaps.contains(&snap)
    }

    /// Current sub-selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Snap remembered when a child level covered this one.
    #[must_use]
    pub fn resume_snap(&self) -> Option<SnapId> {
        self.resume_snap
    }

    /// Reset the frame-owned state.
    fn clear_transient(&mut self) {
        self.selection = None;
        self.resume_snap = None;
    }
}

/// Root-first stack of navigation levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStack {
    frames: Vec<ViewFrame>,
}

impl ViewStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole stack with `root`.
    pub fn reset_to(&mut self, mut root: ViewFrame) {
        root.clear_transient();
        self.frames.clear();
        self.frames.push(root);
    }

    /// Drop everything above the root and clear the root's transient state.
    ///
    /// Returns `true` if anything changed.
    pub fn truncate_to_root(&mut self) -> bool {
        let popped = self.frames.len() > 1;
        self.frames.truncate(1);
        let root_dirty = self
            .frames
            .first()
            .is_some_and(|f| f.selection.is_some() || f.resume_snap.is_some());
        if let Some(root) = self.frames.first_mut() {
            root.clear_transient();
        }
        popped || root_dirty
    }

    /// Push `frame`, remembering `covered_snap` on the frame it covers.
    pub fn push(&mut self, mut frame: ViewFrame, covered_snap: SnapId) {
        if let Some(top) = self.frames.last_mut() {
            top.resume_snap = Some(covered_snap);
        }
        frame.clear_transient();
        self.frames.push(frame);
    }

    /// Pop the top frame. The root is never popped.
    ///
    /// The returned frame has its transient state cleared.
    pub fn pop(&mut self) -> Option<ViewFrame> {
        if self.frames.len() <= 1 {
            return None;
        }
        let mut frame = self.frames.pop()?;
        frame.clear_transient();
        Some(frame)
    }

    /// Take the snap remembered on the (new) top frame.
    pub fn take_resume_snap(&mut self) -> Option<SnapId> {
        self.frames.last_mut().and_then(|f| f.resume_snap.take())
    }

    /// Set the top frame's selection.
    pub fn select(&mut self, selection: Option<String>) {
        if let Some(top) = self.frames.last_mut() {
            top.selection = selection;
        }
    }

    #[must_use]
    pub fn top(&self) -> Option<&ViewFrame> {
        self.frames.last()
    }

    #[must_use]
    pub fn root(&self) -> Option<&ViewFrame> {
        self.frames.first()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_at_root(&self) -> bool {
        self.frames.len() <= 1
    }

    #[must_use]
    pub fn frames(&self) -> &[ViewFrame] {
        &self.frames
    }

    /// Resolved title of the frame at `index`.
    #[must_use]
    pub fn title_at(&self, index: usize) -> Option<String> {
        let frame = self.frames.get(index)?;
        let title = match &frame.title {
            FrameTitle::Fixed(title) => title.clone(),
            FrameTitle::FromParentSelection { fallback } => index
                .checked_sub(1)
                .and_then(|parent| self.frames[parent].selection.clone())
                .unwrap_or_else(|| fallback.clone()),
        };
        Some(title)
    }

    /// Resolved title of the top frame.
    #[must_use]
    pub fn current_title(&self) -> Option<String> {
        self.frames.len().checked_sub(1).and_then(|i| self.title_at(i))
    }
}
