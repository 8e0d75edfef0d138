//! [`ProtocolAdapter`] for the Blackbox/Fluxbox structure messages.
//!
//! A pager that lists `_BLACKBOX_STRUCTURE_MESSAGES` in its `WM_PROTOCOLS`
//! receives a client message for every structural change. The first data
//! item names the notification, the rest carry its arguments:
//!
//! | `data[0]`                              | `data[1]` | `data[2]`  |
//! |----------------------------------------|-----------|------------|
//! | `_BLACKBOX_NOTIFY_WORKSPACE_COUNT`     | count     |            |
//! | `_BLACKBOX_NOTIFY_CURRENT_WORKSPACE`   | workspace |            |
//! | `_BLACKBOX_NOTIFY_WINDOW_ADD`          | window    | workspace  |
//! | `_BLACKBOX_NOTIFY_WINDOW_DEL`          | window    |            |
//! | `_BLACKBOX_NOTIFY_WINDOW_FOCUS`        | window    |            |
//! | `_BLACKBOX_NOTIFY_WINDOW_RAISE`        | window    |            |
//! | `_BLACKBOX_NOTIFY_WINDOW_LOWER`        | window    |            |
//!
//! Per-window state comes from the five-item `_BLACKBOX_ATTRIBUTES`
//! property and ICCCM `WM_STATE`.

use crate::event::{Atom, ClientMessageEvent, Handled, PagerEvent, PropertyEvent, WindowId, NONE};
use crate::geometry::Rect;
use crate::hints::WindowHints;
use crate::traits::{DesktopLayout, Display, ProtocolAdapter, Tolerate};
use log::debug;

const ATTRIB_SHADED: u32 = 0x01;
const ATTRIB_STICK: u32 = 0x08;
const ATTRIB_WORKSPACE: u32 = 0x10;
const ATTRIB_DECOR: u32 = 0x40;

const DECOR_NONE: u32 = 0;
const DECOR_NORMAL: u32 = 1;

/// Number of items in `_BLACKBOX_HINTS` / `_BLACKBOX_ATTRIBUTES`.
const HINT_ITEMS: usize = 5;

/// ICCCM `WM_STATE` value for iconified windows.
const ICONIC_STATE: u32 = 3;

#[derive(Debug, Clone, Copy)]
struct Atoms {
    hints: Atom,
    attributes: Atom,
    change_attributes: Atom,
    structure_messages: Atom,
    notify_workspace_count: Atom,
    notify_current_workspace: Atom,
    notify_window_add: Atom,
    notify_window_del: Atom,
    notify_window_focus: Atom,
    notify_window_raise: Atom,
    notify_window_lower: Atom,
    change_workspace: Atom,
    change_window_focus: Atom,
    wm_state: Atom,
}

impl Atoms {
    fn intern<D: Display>(display: &D) -> Result<Self, D::Error> {
        Ok(Self {
            hints: display.intern_atom("_BLACKBOX_HINTS")?,
            attributes: display.intern_atom("_BLACKBOX_ATTRIBUTES")?,
            change_attributes: display.intern_atom("_BLACKBOX_CHANGE_ATTRIBUTES")?,
            structure_messages: display.intern_atom("_BLACKBOX_STRUCTURE_MESSAGES")?,
            notify_workspace_count: display.intern_atom("_BLACKBOX_NOTIFY_WORKSPACE_COUNT")?,
            notify_current_workspace: display.intern_atom("_BLACKBOX_NOTIFY_CURRENT_WORKSPACE")?,
            notify_window_add: display.intern_atom("_BLACKBOX_NOTIFY_WINDOW_ADD")?,
            notify_window_del: display.intern_atom("_BLACKBOX_NOTIFY_WINDOW_DEL")?,
            notify_window_focus: display.intern_atom("_BLACKBOX_NOTIFY_WINDOW_FOCUS")?,
            notify_window_raise: display.intern_atom("_BLACKBOX_NOTIFY_WINDOW_RAISE")?,
            notify_window_lower: display.intern_atom("_BLACKBOX_NOTIFY_WINDOW_LOWER")?,
            change_workspace: display.intern_atom("_BLACKBOX_CHANGE_WORKSPACE")?,
            change_window_focus: display.intern_atom("_BLACKBOX_CHANGE_WINDOW_FOCUS")?,
            wm_state: display.intern_atom("WM_STATE")?,
        })
    }
}

/// Fluxbox protocol adapter.
#[derive(Debug)]
pub struct FluxboxAdapter {
    atoms: Atoms,
    root: WindowId,
}

impl FluxboxAdapter {
    /// Intern the Blackbox atoms on `display`.
    pub fn new<D: Display>(display: &D) -> Result<Self, D::Error> {
        Ok(Self {
            atoms: Atoms::intern(display)?,
            root: display.root(),
        })
    }
}

impl ProtocolAdapter for FluxboxAdapter {
    fn name(&self) -> &'static str {
        "fluxbox"
    }

    fn wm_protocols(&self) -> Vec<Atom> {
        vec![self.atoms.structure_messages]
    }

    fn set_focus<D: Display>(&self, display: &D, window: WindowId) -> Result<(), D::Error> {
        display.send_client_message(self.root, window, self.atoms.change_window_focus, [0; 5])
    }

    fn move_resize<D: Display>(
        &self,
        _display: &D,
        _window: WindowId,
        _geometry: Rect,
    ) -> Result<(), D::Error> {
        Ok(())
    }

    fn send_to_workspace<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        workspace: u32,
    ) -> Result<(), D::Error> {
        display.send_client_message(
            self.root,
            window,
            self.atoms.change_attributes,
            [ATTRIB_WORKSPACE, 0, workspace, 0, 0],
        )
    }

    fn close_window<D: Display>(&self, _display: &D, _window: WindowId) -> Result<(), D::Error> {
        Ok(())
    }

    fn change_workspace<D: Display>(&self, display: &D, workspace: u32) -> Result<(), D::Error> {
        display.send_client_message(
            self.root,
            self.root,
            self.atoms.change_workspace,
            [workspace, 0, 0, 0, 0],
        )
    }

    fn set_hints<D: Display>(
        &self,
        display: &D,
        window: WindowId,
        hints: &WindowHints,
    ) -> Result<(), D::Error> {
        let attrib = if hints.is_sticky() { ATTRIB_STICK } else { 0 };
        let decoration = if hints.has(WindowHints::NO_DECOR) {
            DECOR_NONE
        } else {
            DECOR_NORMAL
        };
        let data: [u32; HINT_ITEMS] = [
            ATTRIB_DECOR | ATTRIB_STICK,
            attrib,
            hints.workspace.unwrap_or(0),
            0,
            decoration,
        ];
        display.change_property32(window, self.atoms.hints, self.atoms.hints, &data)
    }

    fn get_hints<D: Display>(&self, display: &D, window: WindowId, hints: &mut WindowHints) {
        let Some(attributes) = display
            .get_property(
                window,
                self.atoms.attributes,
                self.atoms.attributes,
                HINT_ITEMS as u32,
            )
            .tolerate("read _BLACKBOX_ATTRIBUTES")
        else {
            return;
        };
        if attributes.value.len() != HINT_ITEMS {
            return;
        }

        let attrib = attributes.value[1];
        hints.workspace = Some(attributes.value[2]);
        if attrib & ATTRIB_SHADED != 0 {
            hints.add(WindowHints::SHADED);
        }
        if attrib & ATTRIB_STICK != 0 {
            hints.add(WindowHints::STICKY);
        }

        match display
            .get_property(window, self.atoms.wm_state, self.atoms.wm_state, 1)
            .tolerate("read WM_STATE")
            .and_then(|p| p.first())
        {
            Some(ICONIC_STATE) => hints.add(WindowHints::ICONIC),
            Some(_) => {}
            None => debug!("fluxbox: no WM_STATE on {:#x}", window),
        }
    }

    fn number_of_workspaces<D: Display>(&self, display: &D) -> u32 {
        display
            .get_property(self.root, self.atoms.notify_workspace_count, NONE, 1)
            .tolerate("read workspace count")
            .and_then(|p| p.first())
            .unwrap_or(0)
    }

    fn set_desktop_layout<D: Display>(
        &self,
        _display: &D,
        _layout: &DesktopLayout,
    ) -> Result<(), D::Error> {
        Ok(())
    }

    fn snapshot<D: Display>(&self, _display: &D) -> Vec<PagerEvent> {
        // the window manager replays its state once the pager subscribes
        Vec::new()
    }

    fn handle_protocol_notification<D: Display>(
        &mut self,
        _display: &D,
        _event: &PropertyEvent,
    ) -> Handled {
        Handled::No
    }

    fn handle_client_request<D: Display>(
        &mut self,
        _display: &D,
        event: &ClientMessageEvent,
    ) -> Handled {
        let a = &self.atoms;
        let [kind, arg1, arg2, ..] = event.data;
        let ev = if kind == a.notify_workspace_count {
            PagerEvent::WorkspaceCount(arg1)
        } else if kind == a.notify_current_workspace {
            PagerEvent::CurrentWorkspace(arg1)
        } else if kind == a.notify_window_add {
            PagerEvent::AddWindow {
                window: arg1,
                workspace: arg2,
            }
        } else if kind == a.notify_window_del {
            PagerEvent::RemoveWindow(arg1)
        } else if kind == a.notify_window_raise {
            PagerEvent::RaiseWindow(arg1)
        } else if kind == a.notify_window_lower {
            PagerEvent::LowerWindow(arg1)
        } else if kind == a.notify_window_focus {
            PagerEvent::FocusWindow(arg1)
        } else {
            return Handled::No;
        };
        debug!("fluxbox: {:?}", ev);
        Handled::Event(ev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDisplay, ROOT};

    fn setup() -> (MockDisplay, FluxboxAdapter) {
        let d = MockDisplay::default();
        let a = FluxboxAdapter::new(&d).unwrap();
        (d, a)
    }

    fn notify(d: &MockDisplay, name: &str, arg1: u32, arg2: u32) -> ClientMessageEvent {
        ClientMessageEvent {
            window: 0x9000,
            message_type: d.atom("_BLACKBOX_STRUCTURE_MESSAGES"),
            data: [d.atom(name), arg1, arg2, 0, 0],
        }
    }

    #[test]
    fn notifications_are_classified() {
        let (d, mut a) = setup();
        assert_eq!(
            a.handle_client_request(&d, &notify(&d, "_BLACKBOX_NOTIFY_WINDOW_ADD", 0x500, 2)),
            Handled::Event(PagerEvent::AddWindow {
                window: 0x500,
                workspace: 2
            })
        );
        assert_eq!(
            a.handle_client_request(&d, &notify(&d, "_BLACKBOX_NOTIFY_WINDOW_DEL", 0x500, 0)),
            Handled::Event(PagerEvent::RemoveWindow(0x500))
        );
        assert_eq!(
            a.handle_client_request(&d, &notify(&d, "_BLACKBOX_NOTIFY_WORKSPACE_COUNT", 6, 0)),
            Handled::Event(PagerEvent::WorkspaceCount(6))
        );
        assert_eq!(
            a.handle_client_request(&d, &notify(&d, "_BLACKBOX_NOTIFY_WINDOW_LOWER", 0x700, 0)),
            Handled::Event(PagerEvent::LowerWindow(0x700))
        );
        assert_eq!(
            a.handle_client_request(&d, &notify(&d, "_NET_WM_DESKTOP", 0x700, 0)),
            Handled::No
        );
    }

    #[test]
    fn attributes_give_workspace_and_state() {
        let (d, a) = setup();
        d.add_client(0x500, Rect::new(0, 0, 10, 10));
        d.set_property32(
            0x500,
            "_BLACKBOX_ATTRIBUTES",
            "_BLACKBOX_ATTRIBUTES",
            &[ATTRIB_SHADED | ATTRIB_STICK, ATTRIB_SHADED | ATTRIB_STICK, 4, 0, 1],
        );
        d.set_property32(0x500, "WM_STATE", "WM_STATE", &[ICONIC_STATE, 0]);

        let mut h = WindowHints::default();
        a.get_hints(&d, 0x500, &mut h);

        assert_eq!(h.workspace, Some(4));
        assert!(h.is_shaded());
        assert!(h.is_sticky());
        assert!(h.is_iconic());
    }

    #[test]
    fn short_attributes_are_ignored() {
        let (d, a) = setup();
        d.add_client(0x500, Rect::new(0, 0, 10, 10));
        d.set_property32(
            0x500,
            "_BLACKBOX_ATTRIBUTES",
            "_BLACKBOX_ATTRIBUTES",
            &[0, ATTRIB_SHADED, 4],
        );

        let mut h = WindowHints::default();
        a.get_hints(&d, 0x500, &mut h);

        assert_eq!(h, WindowHints::default());
    }

    #[test]
    fn set_hints_encodes_five_items() {
        let (d, a) = setup();
        d.add_client(0x500, Rect::new(0, 0, 10, 10));
        let h = WindowHints::new(WindowHints::STICKY | WindowHints::NO_DECOR);

        a.set_hints(&d, 0x500, &h).unwrap();

        let p = d.property(0x500, "_BLACKBOX_HINTS").unwrap();
        assert_eq!(p.type_, d.atom("_BLACKBOX_HINTS"));
        assert_eq!(
            p.value,
            vec![ATTRIB_DECOR | ATTRIB_STICK, ATTRIB_STICK, 0, 0, DECOR_NONE]
        );
    }

    #[test]
    fn send_to_workspace_uses_change_attributes() {
        let (d, a) = setup();
        a.send_to_workspace(&d, 0x500, 3).unwrap();
        let sent = d.messages_of("_BLACKBOX_CHANGE_ATTRIBUTES");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].window, 0x500);
        assert_eq!(sent[0].destination, ROOT);
        assert_eq!(sent[0].data, [ATTRIB_WORKSPACE, 0, 3, 0, 0]);
    }

    #[test]
    fn structure_messages_protocol() {
        let (d, a) = setup();
        assert_eq!(a.wm_protocols(), vec![d.atom("_BLACKBOX_STRUCTURE_MESSAGES")]);
    }

    #[test]
    fn workspace_count_from_root() {
        let (d, a) = setup();
        assert_eq!(a.number_of_workspaces(&d), 0);
        d.set_property32(ROOT, "_BLACKBOX_NOTIFY_WORKSPACE_COUNT", "CARDINAL", &[3]);
        assert_eq!(a.number_of_workspaces(&d), 3);
    }

    #[test]
    fn close_and_move_resize_are_noops() {
        let (d, a) = setup();
        a.close_window(&d, 0x500).unwrap();
        a.move_resize(&d, 0x500, Rect::new(0, 0, 1, 1)).unwrap();
        assert!(d.messages.borrow().is_empty());
    }
}
