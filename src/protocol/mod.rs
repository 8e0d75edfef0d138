//! Window-manager protocol adapters.
//!
//! Two protocols are supported and may run side by side:
//!
//! * [`ewmh`]: the freedesktop Extended Window Manager Hints, driven by root
//!   window properties.
//! * [`fluxbox`]: the Blackbox/Fluxbox structure messages, driven by client
//!   messages the window manager sends to subscribed pagers.
//!
//! The set of adapters is fixed at startup, so [`Adapter`] is a plain enum
//! rather than a trait object.

pub mod ewmh;
pub mod fluxbox;

pub use ewmh::EwmhAdapter;
pub use fluxbox::FluxboxAdapter;

use crate::config::ProtocolConfig;
use crate::event::{Atom, ClientMessageEvent, Handled, PagerEvent, PropertyEvent, WindowId};
use crate::geometry::Rect;
use crate::hints::WindowHints;
use crate::traits::{DesktopLayout, Display, ProtocolAdapter};
use log::warn;

/// Predefined X atoms.
pub const XA_ATOM: Atom = 4;
pub const XA_CARDINAL: Atom = 6;
pub const XA_WINDOW: Atom = 33;

/// Upper bound on list-valued property reads (32-bit items).
pub(crate) const MAX_LIST_LEN: u32 = 4096;

/// One of the supported protocols.
#[derive(Debug)]
pub enum Adapter {
    Ewmh(EwmhAdapter),
    Fluxbox(FluxboxAdapter),
}

impl From<EwmhAdapter> for Adapter {
    fn from(a: EwmhAdapter) -> Self {
        Adapter::Ewmh(a)
    }
}

impl From<FluxboxAdapter> for Adapter {
    fn from(a: FluxboxAdapter) -> Self {
        Adapter::Fluxbox(a)
    }
}

/// Start the adapters enabled in `protocols`. An adapter whose atoms
/// cannot be interned is skipped.
pub fn enabled<D: Display>(display: &D, protocols: &ProtocolConfig) -> Vec<Adapter> {
    let mut adapters = Vec::new();
    if protocols.ewmh {
        match EwmhAdapter::new(display) {
            Ok(a) => adapters.push(a.into()),
            Err(e) => warn!("ewmh support disabled: {}", e),
        }
    }
    if protocols.fluxbox {
        match FluxboxAdapter::new(display) {
            Ok(a) => adapters.push(a.into()),
            Err(e) => warn!("fluxbox support disabled: {}", e),
        }
    }
    adapters
}

macro_rules! delegate {
    ($self:ident, $a:ident => $e:expr) => {
        match $self {
            Adapter::Ewmh($a) => $e,
            Adapter::Fluxbox($a) => $e,
        }
    };
}

impl ProtocolAdapter for Adapter {
    fn name(&self) -> &'static str {
        delegate!(self, a => a.name())
    }

    fn wm_protocols(&self) -> Vec<Atom> {
        delegate!(self, a => a.wm_protocols())
    }

    fn set_focus<D: Display>(&self, display: &D, window: WindowId) -> Result<(), D::Error> {
        delegate!(self, a => a.set_focus(display, window))
    }

    fn move_resize<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        geometry: Rect,
    ) -> Result<(), D::Error> {
        delegate!(self, a => a.move_resize(display, window, geometry))
    }

    fn send_to_workspace<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        workspace: u32,
    ) -> Result<(), D::Error> {
        delegate!(self, a => a.send_to_workspace(display, window, workspace))
    }

    fn close_window<D: Display>(&self, display: &D, window: WindowId) -> Result<(), D::Error> {
        delegate!(self, a => a.close_window(display, window))
    }

    fn change_workspace<D: Display>(&self, display: &D, workspace: u32) -> Result<(), D::Error> {
        delegate!(self, a => a.change_workspace(display, workspace))
    }

    fn set_hints<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        hints: &WindowHints,
    ) -> Result<(), D::Error> {
        delegate!(self, a => a.set_hints(display, window, hints))
    }

    fn get_hints<D: Display>(&self, display: &D, window: WindowId, hints: &mut WindowHints) {
        delegate!(self, a => a.get_hints(display, window, hints))
    }

    fn number_of_workspaces<D: Display>(&self, display: &D) -> u32 {
        delegate!(self, a => a.number_of_workspaces(display))
    }

    fn set_desktop_layout<D: Display>(
        &self,
        display: &D,
        layout: &DesktopLayout,
    ) -> Result<(), D::Error> {
        delegate!(self, a => a.set_desktop_layout(display, layout))
    }

    fn snapshot<D: Display>(&self, display: &D) -> Vec<PagerEvent> {
        delegate!(self, a => a.snapshot(display))
    }

    fn handle_protocol_notification<D: Display>(
        &mut self,
        display: &D,
        event: &PropertyEvent,
    ) -> Handled {
        delegate!(self, a => a.handle_protocol_notification(display, event))
    }

    fn handle_client_request<D: Display>(
        &mut self,
        display: &D,
        event: &ClientMessageEvent,
    ) -> Handled {
        delegate!(self, a => a.handle_client_request(display, event))
    }
}
