//! Pointer gestures over the pager window.
//!
//! | binding              | effect                                             |
//! |----------------------|----------------------------------------------------|
//! | `change_workspace`   | switch to the workspace the button was released on |
//! | `raise_window`       | focus and raise the window under the pointer        |
//! | `lower_window`       | lower the window under the pointer                  |
//! | `close_window`       | ask the window manager to close it                  |
//! | `next/prev_workspace`| cycle the current workspace                          |
//! | `exit`               | stop the event loop                                  |
//!
//! Pressing `move_in_workspace` over a proxy moves it inside its workspace;
//! `drag_to_workspace` lifts it into the pager window so it can be dropped on
//! another workspace.

use super::PagerController;
use crate::dispatch::Target;
use crate::event::{ButtonEvent, WindowId, NONE};
use crate::geometry::{constrain, Rect, Scale, Size};
use crate::gesture::{Drag, GestureState};
use crate::traits::{Display, ProtocolAdapter, Tolerate};
use crate::workspace::Workspace;
use log::{debug, info};
use std::ops::ControlFlow;

/// What a completed button sequence asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureAction {
    ChangeWorkspace(usize),
    Raise(WindowId),
    Lower(WindowId),
    Close(WindowId),
    NextWorkspace,
    PrevWorkspace,
    Exit,
}

impl<D: Display> PagerController<D> {
    /// Workspace a button event happened in.
    fn workspace_at(&self, window: WindowId) -> Option<usize> {
        match self.router.resolve(window)?.1 {
            Target::Workspace(index) | Target::Proxy { workspace: index, .. } => Some(index),
            _ => None,
        }
    }

    /// Client whose proxy is under the pointer.
    fn client_at(&self, b: &ButtonEvent) -> Option<(usize, WindowId)> {
        [b.subwindow, b.window]
            .into_iter()
            .filter(|w| *w != NONE)
            .find_map(|w| match self.router.target(w) {
                Some(Target::Proxy { workspace, client }) => Some((workspace, client)),
                _ => None,
            })
    }

    pub(super) fn button_press(&mut self, b: &ButtonEvent) {
        self.queue
            .push(b.button, b.time, self.config.buttons.multi_click_ms);
        debug!("button queue {:?}", self.queue.as_str());

        let buttons = &self.config.buttons;
        if b.button != buttons.move_in_workspace && b.button != buttons.drag_to_workspace {
            return;
        }
        if matches!(self.gesture, GestureState::Dragging(_)) {
            return;
        }
        let Some((origin, client)) = self.client_at(b) else {
            return;
        };
        let Some(ws) = self.workspaces.get(origin) else {
            return;
        };
        let Some(proxy) = ws.proxy(client).copied() else {
            return;
        };

        // pointer relative to the workspace
        let (px, py) = if b.window == proxy.window {
            (b.x + proxy.geometry.x, b.y + proxy.geometry.y)
        } else if b.window == self.window {
            (b.x - ws.geometry().x, b.y - ws.geometry().y)
        } else {
            (b.x, b.y)
        };
        let grab = (px - proxy.geometry.x, py - proxy.geometry.y);

        if b.button == buttons.drag_to_workspace && b.button != buttons.move_in_workspace {
            let area = ws.geometry();
            let lifted = Rect {
                x: proxy.geometry.x + area.x,
                y: proxy.geometry.y + area.y,
                ..proxy.geometry
            };
            if self
                .display
                .reparent_window(proxy.window, self.window, lifted.x, lifted.y)
                .tolerate("lift proxy")
                .is_none()
            {
                return;
            }
            self.display.raise_window(proxy.window).tolerate("raise proxy");
            self.workspaces[origin].set_proxy_geometry(client, lifted);
        }

        debug!("grab {:#x} in workspace {}", client, origin);
        self.gesture = GestureState::Dragging(Drag {
            client,
            proxy: proxy.window,
            origin,
            origin_rect: proxy.geometry,
            grab,
            pointer_workspace: None,
            button: b.button,
            moved: false,
        });
    }

    /// `x`, `y` are relative to the workspace the drag started in.
    pub(super) fn motion(&mut self, x: i32, y: i32) {
        let GestureState::Dragging(mut drag) = std::mem::take(&mut self.gesture) else {
            return;
        };
        let Some(area) = self.workspaces.get(drag.origin).map(Workspace::geometry) else {
            return;
        };
        let Some(current) = self.workspaces[drag.origin]
            .proxy(drag.client)
            .map(|p| p.geometry)
        else {
            return;
        };

        let (px, py) = (area.x + x, area.y + y);
        let previous = drag.pointer_workspace;
        if let Some(index) = self
            .workspaces
            .iter()
            .rposition(|ws| ws.geometry().contains(px, py))
        {
            drag.pointer_workspace = Some(index);
        }
        drag.moved = true;

        let proposed = (x - drag.grab.0, y - drag.grab.1);
        if drag.button == self.config.buttons.move_in_workspace {
            let (nx, ny) = constrain(proposed, current, area.size());
            self.move_proxy(&drag, Rect { x: nx, y: ny, ..current });
            if self.config.follow_move {
                self.move_client(drag.client, (nx, ny), area.size());
            }
        } else {
            let proposed = (proposed.0 + area.x, proposed.1 + area.y);
            let (nx, ny) = constrain(proposed, current, self.geometry.size());
            self.move_proxy(&drag, Rect { x: nx, y: ny, ..current });
            if self.config.follow_drag && drag.pointer_workspace != previous {
                if let Some(index) = drag.pointer_workspace {
                    self.send_change_to_workspace(index);
                }
            }
        }

        self.gesture = GestureState::Dragging(drag);
    }

    fn move_proxy(&mut self, drag: &Drag, rect: Rect) {
        if self
            .display
            .move_window(drag.proxy, rect.x, rect.y)
            .tolerate("move proxy")
            .is_some()
        {
            self.workspaces[drag.origin].set_proxy_geometry(drag.client, rect);
        }
    }

    /// Move the real window to where its proxy sits in a thumbnail of size
    /// `thumb`.
    fn move_client(&self, client: WindowId, (x, y): (i32, i32), thumb: Size) {
        let (sx, sy) = Scale::between(thumb, self.display.screen_size()).point(x, y);
        self.display
            .move_window(client, sx, sy)
            .tolerate("move client");
    }

    pub(super) fn button_release(&mut self, b: &ButtonEvent) -> ControlFlow<()> {
        let mut client = None;
        match std::mem::take(&mut self.gesture) {
            GestureState::Dragging(drag) if drag.button == b.button => {
                if drag.button == self.config.buttons.move_in_workspace {
                    if let Some(ws) = self.workspaces.get(drag.origin) {
                        if let Some(proxy) = ws.proxy(drag.client) {
                            let pos = (proxy.geometry.x, proxy.geometry.y);
                            self.move_client(drag.client, pos, ws.geometry().size());
                        }
                    }
                    client = Some(drag.client);
                } else {
                    self.finish_drag(&drag);
                    if drag.moved {
                        self.queue.clear();
                    }
                    return ControlFlow::Continue(());
                }
            }
            other => self.gesture = other,
        }

        let client = client.or_else(|| self.client_at(b).map(|(_, c)| c));
        let Some(action) = self.match_gesture(b, client) else {
            return ControlFlow::Continue(());
        };
        self.queue.clear();
        self.run_gesture(action)
    }

    /// Drop a proxy lifted with the drag button.
    fn finish_drag(&mut self, drag: &Drag) {
        let Some(lifted) = self
            .workspaces
            .get(drag.origin)
            .and_then(|ws| ws.proxy(drag.client))
            .map(|p| p.geometry)
        else {
            return;
        };

        match drag.pointer_workspace {
            Some(dest) if dest != drag.origin && dest < self.workspaces.len() => {
                info!(
                    "send {:#x} from workspace {} to {}",
                    drag.client, drag.origin, dest
                );
                for adapter in &self.adapters {
                    adapter
                        .send_to_workspace(&self.display, drag.client, dest as u32)
                        .tolerate("send to workspace");
                }

                let area = self.workspaces[dest].geometry();
                let (x, y) = (lifted.x - area.x, lifted.y - area.y);
                self.display
                    .reparent_window(drag.proxy, self.workspaces[dest].window(), x, y)
                    .tolerate("drop proxy");
                if let Some(mut proxy) =
                    self.workspaces[drag.origin].take_proxy(&mut self.router, drag.client)
                {
                    proxy.geometry = Rect { x, y, ..lifted };
                    self.workspaces[dest].adopt_proxy(
                        &self.display,
                        &mut self.router,
                        drag.client,
                        proxy,
                    );
                    self.workspaces[dest].update_focused_window(&self.display, self.focused);
                }
                self.move_client(drag.client, (x, y), area.size());
            }
            _ => {
                let ws = &self.workspaces[drag.origin];
                let home = drag.origin_rect;
                self.display
                    .reparent_window(drag.proxy, ws.window(), home.x, home.y)
                    .tolerate("return proxy");
                let thumb = ws.geometry().size();
                self.workspaces[drag.origin].set_proxy_geometry(drag.client, home);
                self.move_client(drag.client, (home.x, home.y), thumb);
            }
        }
    }

    fn match_gesture(&self, b: &ButtonEvent, client: Option<WindowId>) -> Option<GestureAction> {
        let buttons = &self.config.buttons;
        let q = &self.queue;
        let count = self.workspaces.len();

        if q.matches(&buttons.change_workspace) {
            if let Some(index) = self.workspace_at(b.window) {
                return Some(GestureAction::ChangeWorkspace(index));
            }
        }
        if let Some(client) = client {
            if q.matches(&buttons.raise_window) {
                return Some(GestureAction::Raise(client));
            }
            if q.matches(&buttons.lower_window) {
                return Some(GestureAction::Lower(client));
            }
            if q.matches(&buttons.close_window) {
                return Some(GestureAction::Close(client));
            }
        }
        if q.matches(&buttons.exit) {
            return Some(GestureAction::Exit);
        }
        if count > 0 && q.matches(&buttons.next_workspace) {
            return Some(GestureAction::NextWorkspace);
        }
        if count > 0 && q.matches(&buttons.prev_workspace) {
            return Some(GestureAction::PrevWorkspace);
        }
        None
    }

    fn run_gesture(&mut self, action: GestureAction) -> ControlFlow<()> {
        debug!("gesture {:?}", action);
        let count = self.workspaces.len();
        match action {
            GestureAction::ChangeWorkspace(index) => self.send_change_to_workspace(index),
            GestureAction::Raise(client) => {
                for adapter in &self.adapters {
                    adapter
                        .set_focus(&self.display, client)
                        .tolerate("focus window");
                }
                self.display.raise_window(client).tolerate("raise window");
            }
            GestureAction::Lower(client) => {
                self.display.lower_window(client).tolerate("lower window");
            }
            GestureAction::Close(client) => {
                info!("close {:#x}", client);
                for adapter in &self.adapters {
                    adapter
                        .close_window(&self.display, client)
                        .tolerate("close window");
                }
            }
            GestureAction::NextWorkspace => {
                self.send_change_to_workspace((self.current + 1) % count);
            }
            GestureAction::PrevWorkspace => {
                self.send_change_to_workspace((self.current + count - 1) % count);
            }
            GestureAction::Exit => {
                info!("exit gesture");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}
