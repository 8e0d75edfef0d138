//! Core traits that decouple xpager from any specific display connection or
//! window-manager protocol.
//!
//! * [`Display`] is the window-system collaborator: window creation, geometry,
//!   properties and client messages. The X11 backend lives in
//!   [`x11`](crate::x11); tests use an in-memory recorder.
//! * [`ProtocolAdapter`] speaks one window-manager protocol (EWMH, Fluxbox).
//!   The [`PagerController`](crate::pager::PagerController) fans every outgoing
//!   intent out to all adapters and offers inbound traffic to each in turn.

use crate::event::{Atom, ClientMessageEvent, EventMask, Handled, PagerEvent, PropertyEvent, WindowId};
use crate::geometry::{Rect, Size};
use crate::hints::WindowHints;
use log::debug;

/// A window property as read from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Property {
    /// Actual type atom, [`NONE`](crate::event::NONE) if the property is missing.
    pub type_: Atom,
    /// 8, 16 or 32; 0 if missing.
    pub format: u8,
    /// Values widened to 32 bits.
    pub value: Vec<u32>,
}

impl Property {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn first(&self) -> Option<u32> {
        self.value.first().copied()
    }
}

/// Standard ICCCM properties published on the pager window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WmProperties {
    pub name: String,
    /// `(instance, class)` for `WM_CLASS`.
    pub class: (String, String),
    /// Start in the withdrawn state (dock-app mode).
    pub withdrawn: bool,
    /// Extra atoms for `WM_PROTOCOLS`.
    pub protocols: Vec<Atom>,
}

/// Desktop grid published through `_NET_DESKTOP_LAYOUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopLayout {
    /// 0 = horizontal, 1 = vertical.
    pub orientation: u32,
    pub columns: u32,
    pub rows: u32,
    /// 0 = top-left.
    pub starting_corner: u32,
}

/// Abstraction over the window system.
///
/// Methods take `&self`; the X11 connection is internally synchronized and
/// test doubles record through `RefCell`s.
pub trait Display {
    /// The error type produced by this display.
    type Error: std::error::Error + Send + 'static;

    fn root(&self) -> WindowId;

    fn screen_size(&self) -> Size;

    fn intern_atom(&self, name: &str) -> Result<Atom, Self::Error>;

    /// Resolve a colour name (`"darkgreen"`, `"#202020"`) to a pixel value.
    fn alloc_color(&self, name: &str) -> Result<u32, Self::Error>;

    fn create_window(
        &self,
        parent: WindowId,
        geometry: Rect,
        events: EventMask,
    ) -> Result<WindowId, Self::Error>;

    fn destroy_window(&self, window: WindowId) -> Result<(), Self::Error>;

    fn map_window(&self, window: WindowId) -> Result<(), Self::Error>;

    fn unmap_window(&self, window: WindowId) -> Result<(), Self::Error>;

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), Self::Error>;

    fn move_resize(&self, window: WindowId, geometry: Rect) -> Result<(), Self::Error>;

    /// Reparent `window` under `parent` at `(x, y)` in parent coordinates.
    fn reparent_window(
        &self,
        window: WindowId,
        parent: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(), Self::Error>;

    fn raise_window(&self, window: WindowId) -> Result<(), Self::Error>;

    fn lower_window(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Geometry relative to the parent window.
    fn geometry(&self, window: WindowId) -> Result<Rect, Self::Error>;

    /// Translate `(x, y)` from `src` coordinates into `dst` coordinates.
    fn translate_coordinates(
        &self,
        src: WindowId,
        dst: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(i32, i32), Self::Error>;

    fn set_background(&self, window: WindowId, pixel: u32) -> Result<(), Self::Error>;

    fn set_border(&self, window: WindowId, pixel: u32, width: u32) -> Result<(), Self::Error>;

    /// Repaint the window background.
    fn clear(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Read up to `max_len` 32-bit items of a property.
    /// `type_` of [`NONE`](crate::event::NONE) accepts any type.
    fn get_property(
        &self,
        window: WindowId,
        property: Atom,
        type_: Atom,
        max_len: u32,
    ) -> Result<Property, Self::Error>;

    fn change_property32(
        &self,
        window: WindowId,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<(), Self::Error>;

    /// Send a 32-bit client message about `window` to `destination`, using
    /// the substructure redirect/notify mask.
    fn send_client_message(
        &self,
        destination: WindowId,
        window: WindowId,
        message_type: Atom,
        data: [u32; 5],
    ) -> Result<(), Self::Error>;

    fn select_input(&self, window: WindowId, events: EventMask) -> Result<(), Self::Error>;

    fn set_wm_properties(&self, window: WindowId, props: &WmProperties) -> Result<(), Self::Error>;

    /// Publish a fixed `min == max` size hint.
    fn set_fixed_size(&self, window: WindowId, size: Size) -> Result<(), Self::Error>;

    fn flush(&self) -> Result<(), Self::Error>;
}

/// One window-manager protocol.
///
/// Outgoing requests are fire-and-forget. The two classifiers return
/// [`Handled::No`] for traffic that belongs to another protocol; the first
/// adapter that consumes a message stops the search.
pub trait ProtocolAdapter {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Atoms to add to the pager's `WM_PROTOCOLS`.
    fn wm_protocols(&self) -> Vec<Atom>;

    /// Ask the window manager to focus (and activate) `window`.
    fn set_focus<D: Display>(&self, display: &D, window: WindowId) -> Result<(), D::Error>;

    /// Ask the window manager to resize `window` (the pager itself after a
    /// relayout).
    fn move_resize<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        geometry: Rect,
    ) -> Result<(), D::Error>;

    fn send_to_workspace<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        workspace: u32,
    ) -> Result<(), D::Error>;

    fn close_window<D: Display>(&self, display: &D, window: WindowId) -> Result<(), D::Error>;

    fn change_workspace<D: Display>(&self, display: &D, workspace: u32) -> Result<(), D::Error>;

    /// Publish `hints` on `window` (used for the pager's own window).
    fn set_hints<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        hints: &WindowHints,
    ) -> Result<(), D::Error>;

    /// Merge whatever this protocol knows about `window` into `hints`.
    /// Unreadable properties contribute nothing.
    fn get_hints<D: Display>(&self, display: &D, window: WindowId, hints: &mut WindowHints);

    /// Workspace count as reported by this protocol, 0 if unknown.
    fn number_of_workspaces<D: Display>(&self, display: &D) -> u32;

    fn set_desktop_layout<D: Display>(
        &self,
        display: &D,
        layout: &DesktopLayout,
    ) -> Result<(), D::Error>;

    /// Current state, applied once at startup.
    fn snapshot<D: Display>(&self, display: &D) -> Vec<PagerEvent>;

    /// Classify a property change.
    fn handle_protocol_notification<D: Display>(
        &mut self,
        display: &D,
        event: &PropertyEvent,
    ) -> Handled;

    /// Classify a client message.
    fn handle_client_request<D: Display>(
        &mut self,
        display: &D,
        event: &ClientMessageEvent,
    ) -> Handled;
}

/// Absorb recoverable display failures.
///
/// A window can vanish between an event and the request that reacts to it;
/// such failures are logged at debug level and otherwise ignored.
pub trait Tolerate<T> {
    fn tolerate(self, what: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> Tolerate<T> for Result<T, E> {
    fn tolerate(self, what: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("{} failed: {}", what, e);
                None
            }
        }
    }
}
