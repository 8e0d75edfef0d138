//! Events and types used throughout xpager.
//!
//! This module defines the vocabulary all components share:
//!
//! * [`Event`] is what the display backend delivers (pointer, expose,
//!   property and structure traffic), already reduced to plain data.
//! * [`PagerEvent`] is what a protocol adapter extracts from window-manager
//!   traffic, i.e. a change the pager model has to follow.
//! * [`Handled`] is an adapter's answer to "is this message yours?".

use crate::geometry::Rect;
use std::ops::BitOr;

/// An opaque X window handle.
pub type WindowId = u32;

/// An interned X atom.
pub type Atom = u32;

/// The null window / atom.
pub const NONE: u32 = 0;

/// Workspace value used by window managers to mean "not assigned yet".
///
/// Any value at or above this is treated as "look at the window's hints".
pub const UNASSIGNED_WORKSPACE: u32 = 0x7FFF_FFFF;

/// A pointer button event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Window the event was reported on.
    pub window: WindowId,
    /// Child of `window` under the pointer, [`NONE`] if there is none.
    pub subwindow: WindowId,
    pub button: u8,
    /// Position relative to `window`.
    pub x: i32,
    pub y: i32,
    /// Server time in milliseconds.
    pub time: u32,
}

/// A property on `window` changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyEvent {
    pub window: WindowId,
    pub atom: Atom,
}

/// A 32-bit format client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessageEvent {
    pub window: WindowId,
    pub message_type: Atom,
    pub data: [u32; 5],
}

/// Input delivered by the display backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    Motion {
        window: WindowId,
        x: i32,
        y: i32,
        time: u32,
    },
    Expose {
        window: WindowId,
    },
    Property(PropertyEvent),
    ClientMessage(ClientMessageEvent),
    Configure {
        window: WindowId,
        geometry: Rect,
        /// `true` for configure notifies sent by a client rather than the server.
        synthetic: bool,
    },
    Destroy {
        window: WindowId,
    },
}

/// A change in window-manager state that the pager must follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerEvent {
    WorkspaceCount(u32),
    CurrentWorkspace(u32),
    AddWindow { window: WindowId, workspace: u32 },
    MoveToWorkspace { window: WindowId, workspace: u32 },
    RemoveWindow(WindowId),
    RaiseWindow(WindowId),
    LowerWindow(WindowId),
    FocusWindow(WindowId),
    /// Full `(window, workspace)` list; windows not listed are gone.
    WindowList(Vec<(WindowId, u32)>),
}

/// Result of offering an inbound message to a protocol adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// Not this adapter's message.
    No,
    /// Recognised, but nothing for the pager to do.
    Ignored,
    Event(PagerEvent),
}

impl Handled {
    /// `true` if the adapter claimed the message.
    pub fn consumed(&self) -> bool {
        !matches!(self, Handled::No)
    }
}

/// X11 event selection mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventMask(pub u32);

impl EventMask {
    pub const BUTTON_PRESS: EventMask = EventMask(1 << 2);
    pub const BUTTON_RELEASE: EventMask = EventMask(1 << 3);
    pub const BUTTON_MOTION: EventMask = EventMask(1 << 13);
    pub const EXPOSURE: EventMask = EventMask(1 << 15);
    pub const STRUCTURE_NOTIFY: EventMask = EventMask(1 << 17);
    pub const PROPERTY_CHANGE: EventMask = EventMask(1 << 22);

    pub fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}
