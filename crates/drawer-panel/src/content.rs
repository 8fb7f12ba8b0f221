#![forbid(unsafe_code)]

//! Level content: renderer lookup and per-level loading state.
//!
//! Content is independent of panel mechanics. The controller never waits on
//! it, and a failed load is just another [`LevelContent`] value for the
//! level's renderer to show.

use std::fmt;

use ahash::AHashMap;

use crate::view_stack::ViewFrame;

/// Renderers keyed by frame id, with an explicit fallback.
///
/// Lookups never fail: unknown ids resolve to the fallback renderer.
pub struct ContentRegistry<R> {
    renderers: AHashMap<String, R>,
    fallback: R,
}

impl<R> fmt::Debug for ContentRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ContentRegistry").field("ids", &ids).finish()
    }
}

impl<R> ContentRegistry<R> {
    #[must_use]
    pub fn new(fallback: R) -> Self {
        Self {
            renderers: AHashMap::new(),
            fallback,
        }
    }

    /// Register `renderer` for `id`, returning any renderer it replaces.
    pub fn register(&mut self, id: impl Into<String>, renderer: R) -> Option<R> {
        self.renderers.insert(id.into(), renderer)
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, renderer: R) -> Self {
        self.register(id, renderer);
        self
    }

    pub fn unregister(&mut self, id: &str) -> Option<R> {
        self.renderers.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.renderers.contains_key(id)
    }

    /// Renderer for `id`, or the fallback.
    #[must_use]
    pub fn get(&self, id: &str) -> &R {
        match self.renderers.get(id) {
            Some(renderer) => renderer,
            None => {
                tracing::trace!(target: "drawer.panel", level = %id, "no renderer; using fallback");
                &self.fallback
            }
        }
    }

    /// Renderer for `frame`.
    #[must_use]
    pub fn resolve(&self, frame: &ViewFrame) -> &R {
        self.get(&frame.id)
    }

    #[must_use]
    pub fn fallback(&self) -> &R {
        &self.fallback
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl<O> ContentRegistry<Box<dyn Fn(&ViewFrame) -> O>> {
    /// Render `frame` with its registered renderer.
    pub fn render(&self, frame: &ViewFrame) -> O {
        (self.resolve(frame))(frame)
    }
}

/// Loading state of one level's data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LevelContent<T> {
    /// Nothing requested yet.
    #[default]
    Idle,
    Loading,
    Ready(T),
    /// The fetch failed; the message is shown inside the level.
    Failed(String),
}

impl<T> LevelContent<T> {
    /// Enter `Loading`, dropping any previous data or error.
    pub fn start_loading(&mut self) {
        *self = Self::Loading;
    }

    /// Settle a fetch result.
    pub fn finish<E: fmt::Display>(&mut self, result: Result<T, E>) {
        *self = match result {
            Ok(data) => Self::Ready(data),
            Err(e) => Self::Failed(e.to_string()),
        };
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Map the ready value, keeping the loading state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LevelContent<U> {
        match self {
            Self::Idle => LevelContent::Idle,
            Self::Loading => LevelContent::Loading,
            Self::Ready(data) => LevelContent::Ready(f(data)),
            Self::Failed(message) => LevelContent::Failed(message),
        }
    }
}
