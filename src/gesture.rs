//! Pointer gestures: the button queue and drag state.
//!
//! # Button queue
//!
//! Every button press appends a token to an accumulating string:
//!
//! | situation                                        | appended     |
//! |--------------------------------------------------|--------------|
//! | same button as last press, within multi-click    | `"<n>"`      |
//! | anything else                                    | `" <n>"`     |
//!
//! If more than [`QUEUE_RESET_MS`] passed since the previous press, the queue
//! is emptied before appending. Two quick right clicks followed by a left
//! click therefore yield `" 33 1"`, which matches the binding `"3 3 1"`:
//! patterns and queue are compared with all whitespace removed.
//!
//! On button release the pager matches the queue against its bindings
//! ([`ButtonConfig`]). A match clears the queue; no match keeps it so that
//! longer sequences can continue to build up.
//!
//! # Drag
//!
//! Pressing the move or drag button over a window proxy starts a [`Drag`].
//! Motion events move the proxy, the release commits the result.

use crate::event::WindowId;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Gap after which a new press starts a fresh queue.
pub const QUEUE_RESET_MS: u32 = 1000;

/// Button bindings.
///
/// Sequence bindings are button-queue patterns such as `"1"` or `"3 3 1"`.
/// `move_in_workspace` and `drag_to_workspace` are single buttons that start
/// a drag when pressed over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    /// Switch to the workspace under the pointer.  Default: `"1"`.
    pub change_workspace: String,
    /// Focus and raise the window under the pointer.  Default: `"2"`.
    pub raise_window: String,
    /// Lower the window under the pointer.  Default: `"3"`.
    pub lower_window: String,
    /// Ask the window manager to close the window.  Default: `"3 3 1"`.
    pub close_window: String,
    /// Quit the pager.  Default: `"1 3 3"`.
    pub exit: String,
    /// Default: `"4"` (wheel up).
    pub next_workspace: String,
    /// Default: `"5"` (wheel down).
    pub prev_workspace: String,
    /// Move a window within its workspace.  Default: `2`.
    pub move_in_workspace: u8,
    /// Drag a window to another workspace.  Default: `3`.
    pub drag_to_workspace: u8,
    /// Maximum gap between two presses of the same button to count as a
    /// multi-click (ms).  Default: `250`.
    pub multi_click_ms: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            change_workspace: "1".into(),
            raise_window: "2".into(),
            lower_window: "3".into(),
            close_window: "3 3 1".into(),
            exit: "1 3 3".into(),
            next_workspace: "4".into(),
            prev_workspace: "5".into(),
            move_in_workspace: 2,
            drag_to_workspace: 3,
            multi_click_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LastPress {
    button: u8,
    time: u32,
}

/// Accumulated button presses.
#[derive(Debug, Default)]
pub struct ButtonQueue {
    tokens: String,
    last: LastPress,
}

impl ButtonQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press of `button` at server time `time`.
    pub fn push(&mut self, button: u8, time: u32, multi_click_ms: u32) {
        let gap = time.wrapping_sub(self.last.time);
        if gap > QUEUE_RESET_MS {
            self.tokens.clear();
        }
        if gap < multi_click_ms && button == self.last.button {
            self.tokens.push_str(&button.to_string());
        } else {
            self.tokens.push(' ');
            self.tokens.push_str(&button.to_string());
        }
        self.last = LastPress { button, time };
    }

    /// `true` if the queue equals `pattern`, ignoring whitespace.
    pub fn matches(&self, pattern: &str) -> bool {
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        let pattern = strip(pattern);
        !pattern.is_empty() && strip(&self.tokens) == pattern
    }

    /// Empty the queue. The last press is kept for multi-click detection.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.tokens
    }
}

/// A proxy being moved with the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drag {
    /// Real window represented by the proxy.
    pub client: WindowId,
    pub proxy: WindowId,
    /// Workspace the proxy belonged to when the drag started.
    pub origin: usize,
    /// Proxy geometry at grab time, relative to the origin workspace.
    pub origin_rect: Rect,
    /// Pointer offset inside the proxy at grab time.
    pub grab: (i32, i32),
    /// Last workspace the pointer was seen over.
    pub pointer_workspace: Option<usize>,
    pub button: u8,
    pub moved: bool,
}

/// Gesture state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(Drag),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_click_collapses_into_one_token() {
        let mut q = ButtonQueue::new();
        q.push(3, 10_000, 250);
        q.push(3, 10_100, 250);
        q.push(1, 10_300, 250);
        assert_eq!(q.as_str(), " 33 1");
        assert!(q.matches("3 3 1"));
        assert!(q.matches("33 1"));
        assert!(!q.matches("3 1"));
    }

    #[test]
    fn long_gap_resets_queue() {
        let mut q = ButtonQueue::new();
        q.push(3, 10_000, 250);
        q.push(3, 10_100, 250);
        q.push(1, 11_600, 250);
        assert_eq!(q.as_str(), " 1");
        assert!(!q.matches("3 3 1"));
        assert!(q.matches("1"));
    }

    #[test]
    fn slow_repeat_is_separate_token() {
        let mut q = ButtonQueue::new();
        q.push(1, 5_000, 250);
        q.push(1, 5_400, 250);
        assert_eq!(q.as_str(), " 1 1");
    }

    #[test]
    fn clear_keeps_multi_click_tracking() {
        let mut q = ButtonQueue::new();
        q.push(2, 5_000, 250);
        q.clear();
        assert_eq!(q.as_str(), "");
        q.push(2, 5_100, 250);
        assert_eq!(q.as_str(), "2");
    }

    #[test]
    fn empty_pattern_never_matches() {
        let q = ButtonQueue::new();
        assert!(!q.matches(""));
        assert!(!q.matches("   "));
    }

    #[test]
    fn button_config_defaults() {
        let b = ButtonConfig::default();
        assert_eq!(b.close_window, "3 3 1");
        assert_eq!(b.move_in_workspace, 2);
        assert_eq!(b.drag_to_workspace, 3);
        assert_eq!(b.multi_click_ms, 250);
    }
}
