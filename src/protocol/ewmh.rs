//! [`ProtocolAdapter`] for the Extended Window Manager Hints.
//!
//! EWMH state lives in properties: the root window carries the desktop
//! count, the current desktop, the active window and the client list, and
//! each client carries its own desktop, state and type. The pager follows
//! root `PropertyNotify` events and sends requests as client messages to
//! the root window.

use super::{MAX_LIST_LEN, XA_ATOM, XA_CARDINAL, XA_WINDOW};
use crate::event::{
    Atom, ClientMessageEvent, Handled, PagerEvent, PropertyEvent, WindowId, UNASSIGNED_WORKSPACE,
};
use crate::geometry::Rect;
use crate::hints::WindowHints;
use crate::traits::{DesktopLayout, Display, ProtocolAdapter, Tolerate};
use log::{debug, warn};

/// `_NET_WM_DESKTOP` value for "all desktops".
const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// Source indication for requests coming from a pager.
const SOURCE_PAGER: u32 = 2;

/// `_NET_MOVERESIZE_WINDOW` flags: width and height present, sent by a pager.
const MOVERESIZE_SIZE_FROM_PAGER: u32 = (1 << 10) | (1 << 11) | (SOURCE_PAGER << 12);

#[derive(Debug, Clone, Copy)]
struct Atoms {
    state_skip_pager: Atom,
    state_skip_taskbar: Atom,
    state_sticky: Atom,
    state_hidden: Atom,
    state_shaded: Atom,
    state_above: Atom,
    state_below: Atom,
    wm_desktop: Atom,
    wm_state: Atom,
    wm_pid: Atom,
    wm_type: Atom,
    type_dock: Atom,
    type_normal: Atom,
    number_of_desktops: Atom,
    current_desktop: Atom,
    client_list: Atom,
    moveresize_window: Atom,
    active_window: Atom,
    close_window: Atom,
    desktop_layout: Atom,
}

impl Atoms {
    fn intern<D: Display>(display: &D) -> Result<Self, D::Error> {
        Ok(Self {
            state_skip_pager: display.intern_atom("_NET_WM_STATE_SKIP_PAGER")?,
            state_skip_taskbar: display.intern_atom("_NET_WM_STATE_SKIP_TASKBAR")?,
            state_sticky: display.intern_atom("_NET_WM_STATE_STICKY")?,
            state_hidden: display.intern_atom("_NET_WM_STATE_HIDDEN")?,
            state_shaded: display.intern_atom("_NET_WM_STATE_SHADED")?,
            state_above: display.intern_atom("_NET_WM_STATE_ABOVE")?,
            state_below: display.intern_atom("_NET_WM_STATE_BELOW")?,
            wm_desktop: display.intern_atom("_NET_WM_DESKTOP")?,
            wm_state: display.intern_atom("_NET_WM_STATE")?,
            wm_pid: display.intern_atom("_NET_WM_PID")?,
            wm_type: display.intern_atom("_NET_WM_WINDOW_TYPE")?,
            type_dock: display.intern_atom("_NET_WM_WINDOW_TYPE_DOCK")?,
            type_normal: display.intern_atom("_NET_WM_WINDOW_TYPE_NORMAL")?,
            number_of_desktops: display.intern_atom("_NET_NUMBER_OF_DESKTOPS")?,
            current_desktop: display.intern_atom("_NET_CURRENT_DESKTOP")?,
            client_list: display.intern_atom("_NET_CLIENT_LIST")?,
            moveresize_window: display.intern_atom("_NET_MOVERESIZE_WINDOW")?,
            active_window: display.intern_atom("_NET_ACTIVE_WINDOW")?,
            close_window: display.intern_atom("_NET_CLOSE_WINDOW")?,
            desktop_layout: display.intern_atom("_NET_DESKTOP_LAYOUT")?,
        })
    }
}

/// EWMH protocol adapter.
#[derive(Debug)]
pub struct EwmhAdapter {
    atoms: Atoms,
    root: WindowId,
}

impl EwmhAdapter {
    /// Intern the EWMH atoms on `display`.
    pub fn new<D: Display>(display: &D) -> Result<Self, D::Error> {
        Ok(Self {
            atoms: Atoms::intern(display)?,
            root: display.root(),
        })
    }

    fn cardinal<D: Display>(&self, display: &D, window: WindowId, atom: Atom) -> Option<u32> {
        display
            .get_property(window, atom, XA_CARDINAL, 1)
            .tolerate("read cardinal")
            .and_then(|p| p.first())
    }

    /// `(window, desktop)` for every entry of `_NET_CLIENT_LIST`.
    ///
    /// A window whose desktop cannot be read is reported as unassigned so
    /// the pager falls back to its hints.
    fn client_list<D: Display>(&self, display: &D) -> Option<Vec<(WindowId, u32)>> {
        let list = display
            .get_property(self.root, self.atoms.client_list, XA_WINDOW, MAX_LIST_LEN)
            .tolerate("read client list")?;
        Some(
            list.value
                .iter()
                .map(|&win| {
                    let desktop = self
                        .cardinal(display, win, self.atoms.wm_desktop)
                        .unwrap_or(UNASSIGNED_WORKSPACE);
                    (win, desktop)
                })
                .collect(),
        )
    }

    fn root_message<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        message_type: Atom,
        data: [u32; 5],
    ) -> Result<(), D::Error> {
        display.send_client_message(self.root, window, message_type, data)
    }
}

impl ProtocolAdapter for EwmhAdapter {
    fn name(&self) -> &'static str {
        "ewmh"
    }

    fn wm_protocols(&self) -> Vec<Atom> {
        Vec::new()
    }

    fn set_focus<D: Display>(&self, display: &D, window: WindowId) -> Result<(), D::Error> {
        self.root_message(
            display,
            window,
            self.atoms.active_window,
            [SOURCE_PAGER, 0, 0, 0, 0],
        )
    }

    fn move_resize<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        geometry: Rect,
    ) -> Result<(), D::Error> {
        self.root_message(
            display,
            window,
            self.atoms.moveresize_window,
            [
                MOVERESIZE_SIZE_FROM_PAGER,
                geometry.x as u32,
                geometry.y as u32,
                geometry.width,
                geometry.height,
            ],
        )
    }

    fn send_to_workspace<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        workspace: u32,
    ) -> Result<(), D::Error> {
        self.root_message(
            display,
            window,
            self.atoms.wm_desktop,
            [workspace, SOURCE_PAGER, 0, 0, 0],
        )
    }

    fn close_window<D: Display>(&self, display: &D, window: WindowId) -> Result<(), D::Error> {
        self.root_message(
            display,
            window,
            self.atoms.close_window,
            [0, SOURCE_PAGER, 0, 0, 0],
        )
    }

    fn change_workspace<D: Display>(&self, display: &D, workspace: u32) -> Result<(), D::Error> {
        self.root_message(
            display,
            self.root,
            self.atoms.current_desktop,
            [workspace, 0, 0, 0, 0],
        )
    }

    fn set_hints<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        hints: &WindowHints,
    ) -> Result<(), D::Error> {
        let a = &self.atoms;
        display.change_property32(window, a.wm_pid, XA_CARDINAL, &[std::process::id()])?;

        if hints.is_sticky() {
            display.change_property32(window, a.wm_desktop, XA_CARDINAL, &[ALL_DESKTOPS])?;
        } else if let Some(ws) = hints.workspace {
            display.change_property32(window, a.wm_desktop, XA_CARDINAL, &[ws])?;
        }

        let window_type = if hints.is_dock() {
            a.type_dock
        } else {
            a.type_normal
        };
        display.change_property32(window, a.wm_type, XA_ATOM, &[window_type])?;

        let states: Vec<Atom> = [
            (WindowHints::SKIP_TASKBAR, a.state_skip_taskbar),
            (WindowHints::SKIP_PAGER, a.state_skip_pager),
            (WindowHints::STICKY, a.state_sticky),
            (WindowHints::HIDDEN, a.state_hidden),
            (WindowHints::LAYER_TOP, a.state_above),
            (WindowHints::LAYER_BOTTOM, a.state_below),
        ]
        .into_iter()
        .filter(|(flag, _)| hints.has(*flag))
        .map(|(_, atom)| atom)
        .collect();
        display.change_property32(window, a.wm_state, XA_ATOM, &states)
    }

    fn get_hints<D: Display>(&self, display: &D, window: WindowId, hints: &mut WindowHints) {
        let a = &self.atoms;

        if let Some(state) = display
            .get_property(window, a.wm_state, XA_ATOM, MAX_LIST_LEN)
            .tolerate("read _NET_WM_STATE")
        {
            for atom in state.value {
                let flag = match atom {
                    x if x == a.state_skip_pager => WindowHints::SKIP_PAGER,
                    x if x == a.state_skip_taskbar => WindowHints::SKIP_TASKBAR,
                    x if x == a.state_sticky => WindowHints::STICKY,
                    x if x == a.state_shaded => WindowHints::SHADED,
                    x if x == a.state_hidden => WindowHints::HIDDEN | WindowHints::ICONIC,
                    x if x == a.state_above => WindowHints::LAYER_TOP,
                    x if x == a.state_below => WindowHints::LAYER_BOTTOM,
                    _ => 0,
                };
                hints.add(flag);
            }
        }

        // only the first (preferred) type counts
        if let Some(types) = display
            .get_property(window, a.wm_type, XA_ATOM, MAX_LIST_LEN)
            .tolerate("read _NET_WM_WINDOW_TYPE")
        {
            if types.first() == Some(a.type_dock) {
                hints.add(WindowHints::TYPE_DOCK);
            }
        }

        match self.cardinal(display, window, a.wm_desktop) {
            Some(ALL_DESKTOPS) => hints.add(WindowHints::STICKY),
            Some(ws) => hints.workspace = Some(ws),
            None => {}
        }
    }

    fn number_of_workspaces<D: Display>(&self, display: &D) -> u32 {
        self.cardinal(display, self.root, self.atoms.number_of_desktops)
            .unwrap_or(0)
    }

    fn set_desktop_layout<D: Display>(
        &self,
        display: &D,
        layout: &DesktopLayout,
    ) -> Result<(), D::Error> {
        display.change_property32(
            self.root,
            self.atoms.desktop_layout,
            XA_CARDINAL,
            &[
                layout.orientation,
                layout.columns,
                layout.rows,
                layout.starting_corner,
            ],
        )
    }

    fn snapshot<D: Display>(&self, display: &D) -> Vec<PagerEvent> {
        let mut events = Vec::new();
        if let Some(list) = self.client_list(display) {
            events.push(PagerEvent::WindowList(list));
        }
        if let Some(current) = self.cardinal(display, self.root, self.atoms.current_desktop) {
            events.push(PagerEvent::CurrentWorkspace(current));
        }
        if let Some(active) = display
            .get_property(self.root, self.atoms.active_window, XA_WINDOW, 1)
            .tolerate("read _NET_ACTIVE_WINDOW")
            .and_then(|p| p.first())
        {
            events.push(PagerEvent::FocusWindow(active));
        }
        events
    }

    fn handle_protocol_notification<D: Display>(
        &mut self,
        display: &D,
        event: &PropertyEvent,
    ) -> Handled {
        if event.window != self.root {
            return Handled::No;
        }
        let a = self.atoms;

        let result = if event.atom == a.current_desktop {
            self.cardinal(display, self.root, a.current_desktop)
                .map(PagerEvent::CurrentWorkspace)
        } else if event.atom == a.number_of_desktops {
            self.cardinal(display, self.root, a.number_of_desktops)
                .map(PagerEvent::WorkspaceCount)
        } else if event.atom == a.active_window {
            display
                .get_property(self.root, a.active_window, XA_WINDOW, 1)
                .tolerate("read _NET_ACTIVE_WINDOW")
                .and_then(|p| p.first())
                .map(PagerEvent::FocusWindow)
        } else if event.atom == a.client_list {
            self.client_list(display).map(PagerEvent::WindowList)
        } else {
            return Handled::No;
        };

        match result {
            Some(ev) => Handled::Event(ev),
            None => {
                warn!("ewmh: unreadable root property {}", event.atom);
                Handled::Ignored
            }
        }
    }

    fn handle_client_request<D: Display>(
        &mut self,
        _display: &D,
        event: &ClientMessageEvent,
    ) -> Handled {
        let a = &self.atoms;
        let t = event.message_type;
        let ev = if t == a.current_desktop {
            PagerEvent::CurrentWorkspace(event.data[0])
        } else if t == a.number_of_desktops {
            PagerEvent::WorkspaceCount(event.data[0])
        } else if t == a.wm_desktop {
            PagerEvent::MoveToWorkspace {
                window: event.window,
                workspace: event.data[0],
            }
        } else if t == a.client_list {
            return Handled::Ignored;
        } else if t == a.active_window {
            PagerEvent::FocusWindow(event.window)
        } else {
            return Handled::No;
        };
        debug!("ewmh: client request {:?}", ev);
        Handled::Event(ev)
    }
}
