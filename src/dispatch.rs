//! Routing of window-system events to the component that owns the window.
//!
//! Every window the pager creates or watches is registered with a
//! [`Target`]. Child windows that have no handler of their own can be linked
//! to a parent; [`Router::resolve`] follows those links, so an event on an
//! unregistered descendant still reaches its owner.

use crate::event::WindowId;
use std::collections::HashMap;

/// Owner of a registered window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Root,
    /// The pager's top-level window.
    Pager,
    /// A workspace thumbnail.
    Workspace(usize),
    /// A miniature of `client` living in workspace `workspace`.
    Proxy { workspace: usize, client: WindowId },
    /// A real top-level window tracked by the pager.
    Client,
}

/// Window handle to owner table.
#[derive(Debug, Default)]
pub struct Router {
    handlers: HashMap<WindowId, Target>,
    parents: HashMap<WindowId, WindowId>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, window: WindowId, target: Target) {
        self.handlers.insert(window, target);
    }

    /// Forget `window` and any parent link from or to it.
    pub fn unregister(&mut self, window: WindowId) {
        self.handlers.remove(&window);
        self.parents.remove(&window);
        self.parents.retain(|_, parent| *parent != window);
    }

    pub fn set_parent(&mut self, child: WindowId, parent: WindowId) {
        if child != parent {
            self.parents.insert(child, parent);
        }
    }

    /// Direct lookup, without following parent links.
    pub fn target(&self, window: WindowId) -> Option<Target> {
        self.handlers.get(&window).copied()
    }

    /// Find the owner of `window`, walking up parent links on a miss.
    ///
    /// Returns the window that matched together with its target.
    pub fn resolve(&self, window: WindowId) -> Option<(WindowId, Target)> {
        let mut current = window;
        // bounded by the number of links, so a cycle cannot spin forever
        for _ in 0..=self.parents.len() {
            if let Some(target) = self.handlers.get(&current) {
                return Some((current, *target));
            }
            current = *self.parents.get(&current)?;
        }
        None
    }
}
