//! The main orchestrator that ties workspaces, protocol adapters and the
//! display together.
//!
//! [`PagerController`] owns the pager window and one [`Workspace`] per
//! window-manager workspace. It reacts to two kinds of input:
//!
//! * [`PagerEvent`]s extracted by the protocol adapters from window-manager
//!   traffic (workspace count, current workspace, window membership, focus
//!   and stacking), applied through [`PagerController::apply`].
//! * Raw display [`Event`]s, routed through [`PagerController::handle_event`]
//!   which also drives the pointer gestures.
//!
//! Pointer gestures are handled in the `gestures` submodule.

use crate::config::Config;
use crate::dispatch::{Router, Target};
use crate::event::{
    Atom, ClientMessageEvent, Event, EventMask, Handled, PagerEvent, PropertyEvent, WindowId,
    NONE, UNASSIGNED_WORKSPACE,
};
use crate::geometry::{layout_thumbnails, Alignment, Rect};
use crate::gesture::{ButtonQueue, GestureState};
use crate::hints::WindowHints;
use crate::protocol::Adapter;
use crate::traits::{DesktopLayout, Display, ProtocolAdapter, Tolerate, WmProperties};
use crate::workspace::{ProxyStyle, Workspace};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::ops::ControlFlow;

mod gestures;

/// Possible errors from the pager.
#[derive(Debug, thiserror::Error)]
pub enum PagerError {
    /// The pager window could not be created.
    #[error("failed to create the pager window: {0}")]
    CreateWindow(String),
}

/// Colour names from the configuration, resolved to pixels.
#[derive(Debug, Clone, Copy)]
struct Palette {
    pager: u32,
    window: u32,
    focused: u32,
    window_border: u32,
    background: u32,
    current_background: u32,
    active_border: u32,
    inactive_border: u32,
}

impl Palette {
    fn resolve<D: Display>(display: &D, config: &Config) -> Self {
        let pixel = |name: &str| match display.alloc_color(name) {
            Ok(pixel) => pixel,
            Err(e) => {
                warn!("unknown colour {:?}, using black: {}", name, e);
                0
            }
        };
        let c = &config.colors;
        Self {
            pager: pixel(&c.pager),
            window: pixel(&c.window),
            focused: pixel(&c.focused_window),
            window_border: pixel(&c.window_border),
            background: pixel(&c.background),
            current_background: pixel(&c.current_background),
            active_border: pixel(&config.borders.active.color),
            inactive_border: pixel(&config.borders.inactive.color),
        }
    }
}

/// Mirrors window-manager workspaces and windows as thumbnails.
///
/// The controller is generic over any [`Display`], making it independent of
/// the X11 backend. Display failures are tolerated and logged; only the
/// creation of the pager window itself is fatal.
///
/// # Typical usage
///
/// ```ignore
/// let display = X11Display::connect(None)?;
/// let adapters = vec![EwmhAdapter::new(&display)?.into()];
/// let mut pager = PagerController::new(display, Config::default(), adapters, false)?;
/// pager.handle_event(event);
/// ```
pub struct PagerController<D: Display> {
    display: D,
    config: Config,
    palette: Palette,
    adapters: Vec<Adapter>,
    router: Router,
    workspaces: Vec<Workspace>,
    /// Every client the window manager told us about.
    windows: BTreeSet<WindowId>,
    current: usize,
    focused: WindowId,
    queue: ButtonQueue,
    gesture: GestureState,
    window: WindowId,
    geometry: Rect,
    wm_protocols: Atom,
    wm_delete_window: Atom,
}

impl<D: Display> PagerController<D> {
    /// Create the pager window, publish its hints and pull the initial
    /// state from the adapters.
    ///
    /// `withdrawn` starts the window in the withdrawn state so that a dock
    /// can swallow it.
    pub fn new(
        display: D,
        config: Config,
        adapters: Vec<Adapter>,
        withdrawn: bool,
    ) -> Result<Self, PagerError> {
        let root = display.root();
        let palette = Palette::resolve(&display, &config);
        let geometry = Rect::new(config.x, config.y, 1, 1);

        let window = display
            .create_window(
                root,
                geometry,
                EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::BUTTON_MOTION
                    | EventMask::EXPOSURE
                    | EventMask::STRUCTURE_NOTIFY,
            )
            .map_err(|e| PagerError::CreateWindow(e.to_string()))?;
        display
            .set_background(window, palette.pager)
            .tolerate("pager background");
        display
            .select_input(root, EventMask::PROPERTY_CHANGE)
            .tolerate("select root input");

        let mut router = Router::new();
        router.register(root, Target::Root);
        router.register(window, Target::Pager);

        let wm_protocols = display
            .intern_atom("WM_PROTOCOLS")
            .tolerate("intern WM_PROTOCOLS")
            .unwrap_or(NONE);
        let wm_delete_window = display
            .intern_atom("WM_DELETE_WINDOW")
            .tolerate("intern WM_DELETE_WINDOW")
            .unwrap_or(NONE);

        let mut protocols = vec![wm_delete_window];
        for adapter in &adapters {
            protocols.extend(adapter.wm_protocols());
        }
        display
            .set_wm_properties(
                window,
                &WmProperties {
                    name: "xpager".into(),
                    class: ("xpager".into(), "XPager".into()),
                    withdrawn,
                    protocols,
                },
            )
            .tolerate("set WM properties");

        if !withdrawn {
            let hints = WindowHints::new(
                WindowHints::NO_DECOR
                    | WindowHints::SKIP_TASKBAR
                    | WindowHints::SKIP_PAGER
                    | WindowHints::STICKY
                    | config.layer.hint_flags(),
            );
            for adapter in &adapters {
                adapter
                    .set_hints(&display, window, &hints)
                    .tolerate("publish pager hints");
            }
        }

        let count = adapters
            .iter()
            .map(|a| a.number_of_workspaces(&display))
            .max()
            .unwrap_or(0);
        let initial: Vec<PagerEvent> = adapters
            .iter()
            .flat_map(|a| a.snapshot(&display))
            .collect();

        let mut pager = Self {
            display,
            config,
            palette,
            adapters,
            router,
            workspaces: Vec::new(),
            windows: BTreeSet::new(),
            current: 0,
            focused: NONE,
            queue: ButtonQueue::new(),
            gesture: GestureState::Idle,
            window,
            geometry,
            wm_protocols,
            wm_delete_window,
        };

        pager.update_workspace_count(count as usize);
        for event in initial {
            pager.apply(event);
        }

        pager.display.map_window(window).tolerate("map pager");
        pager
            .display
            .move_window(window, pager.geometry.x, pager.geometry.y)
            .tolerate("position pager");
        pager.display.flush().tolerate("flush");

        info!(
            "pager started with {} workspace(s) via {}",
            pager.workspaces.len(),
            pager
                .adapters
                .iter()
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(pager)
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The pager's own top-level window.
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Position and size of the pager window.
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn current_workspace(&self) -> usize {
        self.current
    }

    pub fn focused_window(&self) -> WindowId {
        self.focused
    }

    pub fn has_window(&self, window: WindowId) -> bool {
        self.windows.contains(&window)
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// Apply one change reported by a protocol adapter.
    pub fn apply(&mut self, event: PagerEvent) {
        debug!("apply {:?}", event);
        match event {
            PagerEvent::WorkspaceCount(n) => self.update_workspace_count(n as usize),
            PagerEvent::CurrentWorkspace(n) => self.set_current_workspace(n as usize),
            PagerEvent::AddWindow { window, workspace } => self.add_window(window, workspace),
            PagerEvent::MoveToWorkspace { window, workspace } => {
                self.move_to_workspace(window, workspace)
            }
            PagerEvent::RemoveWindow(window) => self.remove_window(window),
            PagerEvent::RaiseWindow(window) => self.raise_window(window),
            PagerEvent::LowerWindow(window) => self.lower_window(window),
            PagerEvent::FocusWindow(window) => self.set_focused_window(window),
            PagerEvent::WindowList(list) => self.add_windows(&list),
        }
    }

    //  Window registry

    /// Show `window` in `workspace`, then let its hints decide where else it
    /// belongs.
    pub fn add_window(&mut self, window: WindowId, workspace: u32) {
        let Some(ws) = self.workspaces.get_mut(workspace as usize) else {
            debug!("{:#x} is on workspace {} which is not shown", window, workspace);
            return;
        };
        ws.add(&self.display, &mut self.router, window);
        ws.update_focused_window(&self.display, self.focused);
        self.windows.insert(window);
        self.reconcile(window, Some(workspace as usize));
    }

    /// Move `window` to `workspace`. An unassigned workspace means the
    /// window's hints are authoritative.
    pub fn move_to_workspace(&mut self, window: WindowId, workspace: u32) {
        if workspace >= UNASSIGNED_WORKSPACE {
            self.update_window_hints(window);
            return;
        }
        if workspace as usize >= self.workspaces.len() {
            return;
        }
        for (index, ws) in self.workspaces.iter_mut().enumerate() {
            if index != workspace as usize {
                ws.remove(&self.display, &mut self.router, window);
            }
        }
        self.add_window(window, workspace);
    }

    /// Forget `window` everywhere.
    pub fn remove_window(&mut self, window: WindowId) {
        for ws in &mut self.workspaces {
            ws.remove(&self.display, &mut self.router, window);
        }
        self.router.unregister(window);
        self.windows.remove(&window);
        if self.focused == window {
            self.focused = NONE;
        }
    }

    /// Reconcile with a complete `(window, workspace)` list.
    pub fn add_windows(&mut self, list: &[(WindowId, u32)]) {
        let listed: BTreeSet<WindowId> = list.iter().map(|(w, _)| *w).collect();
        let stale: Vec<WindowId> = self.windows.difference(&listed).copied().collect();
        for window in stale {
            self.remove_window(window);
        }

        for &(window, workspace) in list {
            let already_there = self
                .workspaces
                .get(workspace as usize)
                .is_some_and(|ws| ws.contains(window));
            if already_there {
                self.update_window_hints(window);
            } else if workspace >= UNASSIGNED_WORKSPACE {
                self.track(window);
                self.update_window_hints(window);
            } else {
                self.move_to_workspace(window, workspace);
            }
        }
    }

    pub fn set_focused_window(&mut self, window: WindowId) {
        self.focused = window;
        for ws in &mut self.workspaces {
            ws.update_focused_window(&self.display, window);
        }
    }

    pub fn raise_window(&mut self, window: WindowId) {
        for ws in &self.workspaces {
            ws.raise_window(&self.display, window);
        }
    }

    pub fn lower_window(&mut self, window: WindowId) {
        for ws in &self.workspaces {
            ws.lower_window(&self.display, window);
        }
    }

    /// Re-read the hints of `window` and update membership and state of its
    /// proxies in every workspace.
    pub fn update_window_hints(&mut self, window: WindowId) {
        self.reconcile(window, None);
    }

    /// `keep` is a workspace the window was just placed in; a stale desktop
    /// hint does not take it out of there.
    fn reconcile(&mut self, window: WindowId, keep: Option<usize>) {
        // the lifted proxy owns its geometry until the drop
        let held = match &self.gesture {
            GestureState::Dragging(drag) if drag.client == window => Some(drag.origin),
            _ => None,
        };
        let mut hints = WindowHints::default();
        for adapter in &self.adapters {
            adapter.get_hints(&self.display, window, &mut hints);
        }
        let sticky = hints.is_sticky();
        let excluded = hints.skip_pager() || hints.is_dock();

        for (index, ws) in self.workspaces.iter_mut().enumerate() {
            if !ws.contains(window) {
                if !sticky || excluded {
                    continue;
                }
                ws.add(&self.display, &mut self.router, window);
                ws.update_focused_window(&self.display, self.focused);
                self.windows.insert(window);
            } else if excluded
                || (!sticky
                    && keep != Some(index)
                    && hints.workspace.is_some_and(|w| w as usize != index))
            {
                ws.remove(&self.display, &mut self.router, window);
                continue;
            }

            if held == Some(index) {
                continue;
            }
            ws.update_geometry(&self.display, window);
            if hints.is_shaded() {
                ws.shade_window(&self.display, window);
            } else {
                ws.unshade_window(&self.display, window);
                if hints.is_iconic() {
                    ws.iconify_window(&self.display, window);
                } else {
                    ws.deiconify_window(&self.display, window);
                }
            }
        }
    }

    /// Follow a window that is not shown anywhere yet, so that later hint
    /// changes reach [`update_window_hints`](Self::update_window_hints).
    fn track(&mut self, window: WindowId) {
        if !self.windows.insert(window) {
            return;
        }
        self.display
            .select_input(
                window,
                EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY,
            )
            .tolerate("select client input");
        self.router.register(window, Target::Client);
    }

    //  Workspaces

    /// Grow or shrink the set of thumbnails to `count` and relayout.
    pub fn update_workspace_count(&mut self, count: usize) {
        if count == 0 || count == self.workspaces.len() {
            return;
        }
        info!("workspace count {} -> {}", self.workspaces.len(), count);

        if count > self.workspaces.len() {
            let thumb = self.config.thumbnail_size(self.display.screen_size());
            let style = self.proxy_style();
            for index in self.workspaces.len()..count {
                match Workspace::new(
                    &self.display,
                    &mut self.router,
                    self.window,
                    index,
                    Rect::new(0, 0, thumb.width, thumb.height),
                    style,
                ) {
                    Ok(ws) => {
                        self.paint_frame(&ws, index == self.current);
                        self.workspaces.push(ws);
                    }
                    Err(e) => {
                        warn!("failed to create workspace {}: {}", index, e);
                        break;
                    }
                }
            }
        } else {
            while self.workspaces.len() > count {
                if let Some(ws) = self.workspaces.pop() {
                    ws.destroy(&self.display, &mut self.router);
                }
            }
            if self.current >= self.workspaces.len() {
                self.current = self.workspaces.len().saturating_sub(1);
                if let Some(ws) = self.workspaces.get(self.current) {
                    self.paint_frame(ws, true);
                }
            }
        }

        self.align_workspaces();
    }

    /// Mark `index` as the current workspace. Repeating the current index is
    /// a no-op.
    pub fn set_current_workspace(&mut self, index: usize) {
        if index >= self.workspaces.len() || index == self.current {
            return;
        }
        debug!("current workspace {} -> {}", self.current, index);
        if let Some(old) = self.workspaces.get(self.current) {
            self.paint_frame(old, false);
        }
        let new = &self.workspaces[index];
        self.paint_frame(new, true);
        self.display
            .raise_window(new.window())
            .tolerate("raise current workspace");
        self.current = index;
    }

    /// Lay the thumbnails out, resize the pager window to fit and tell the
    /// window manager about the new size and desktop grid.
    pub fn align_workspaces(&mut self) {
        if self.workspaces.is_empty() {
            return;
        }
        let thumb = self.config.thumbnail_size(self.display.screen_size());
        let bevel = self.config.borders.active.width;
        let layout = layout_thumbnails(
            self.workspaces.len(),
            thumb,
            bevel,
            self.config.workspace.align,
            self.config.workspace.per_row,
        );

        for (ws, (x, y)) in self.workspaces.iter_mut().zip(&layout.positions) {
            ws.place(&self.display, Rect::new(*x, *y, thumb.width, thumb.height));
        }

        self.geometry.width = layout.container.width;
        self.geometry.height = layout.container.height;
        self.display
            .move_resize(self.window, self.geometry)
            .tolerate("resize pager");
        self.display
            .set_fixed_size(self.window, layout.container)
            .tolerate("pager size hints");
        for adapter in &self.adapters {
            adapter
                .move_resize(&self.display, self.window, self.geometry)
                .tolerate("request pager size");
        }

        if self.config.publish_desktop_layout {
            let layout = DesktopLayout {
                orientation: match self.config.workspace.align {
                    Alignment::LeftToRight => 0,
                    Alignment::TopToBottom => 1,
                },
                columns: layout.columns,
                rows: layout.rows,
                starting_corner: 0,
            };
            for adapter in &self.adapters {
                adapter
                    .set_desktop_layout(&self.display, &layout)
                    .tolerate("publish desktop layout");
            }
        }
    }

    /// Ask the window manager to switch to `index`.
    pub fn send_change_to_workspace(&self, index: usize) {
        info!("change to workspace {}", index);
        for adapter in &self.adapters {
            adapter
                .change_workspace(&self.display, index as u32)
                .tolerate("change workspace");
        }
    }

    /// Replace the settings and repaint everything with them.
    pub fn apply_config(&mut self, config: Config) {
        self.config = config;
        self.palette = Palette::resolve(&self.display, &self.config);
        let style = self.proxy_style();

        self.display
            .set_background(self.window, self.palette.pager)
            .tolerate("pager background");
        self.display.clear(self.window).tolerate("clear pager");
        for ws in &mut self.workspaces {
            ws.set_style(&self.display, style);
        }
        for (index, ws) in self.workspaces.iter().enumerate() {
            self.paint_frame(ws, index == self.current);
        }
        self.align_workspaces();
    }

    fn proxy_style(&self) -> ProxyStyle {
        ProxyStyle {
            window: self.palette.window,
            focused: self.palette.focused,
            border: self.palette.window_border,
            border_width: self.config.window_border_width,
        }
    }

    fn paint_frame(&self, ws: &Workspace, current: bool) {
        if current {
            ws.set_frame(
                &self.display,
                self.palette.current_background,
                self.palette.active_border,
                self.config.borders.active.width,
            );
        } else {
            ws.set_frame(
                &self.display,
                self.palette.background,
                self.palette.inactive_border,
                self.config.borders.inactive.width,
            );
        }
    }

    //  Event routing

    /// Process one display event. Returns [`ControlFlow::Break`] when the
    /// pager should exit.
    pub fn handle_event(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::ButtonPress(b) => self.button_press(&b),
            Event::ButtonRelease(b) => return self.button_release(&b),
            Event::Motion { x, y, .. } => self.motion(x, y),
            Event::Expose { window } => {
                if self.router.target(window).is_some() {
                    self.display.clear(window).tolerate("repaint");
                }
            }
            Event::Property(p) => self.property_changed(&p),
            Event::ClientMessage(m) => return self.client_message(&m),
            Event::Configure {
                window,
                geometry,
                synthetic,
            } => self.configured(window, geometry, synthetic),
            Event::Destroy { window } => {
                if self.has_window(window) {
                    debug!("{:#x} destroyed", window);
                    self.remove_window(window);
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Offer an inbound message to each adapter in turn; the first one to
    /// claim it wins.
    fn offer(&mut self, mut f: impl FnMut(&mut Adapter, &D) -> Handled) {
        let mut event = None;
        for adapter in &mut self.adapters {
            match f(adapter, &self.display) {
                Handled::No => continue,
                Handled::Ignored => break,
                Handled::Event(ev) => {
                    event = Some(ev);
                    break;
                }
            }
        }
        if let Some(ev) = event {
            self.apply(ev);
        }
    }

    fn client_message(&mut self, message: &ClientMessageEvent) -> ControlFlow<()> {
        if message.window == self.window
            && message.message_type == self.wm_protocols
            && message.message_type != NONE
            && message.data[0] == self.wm_delete_window
        {
            info!("pager window closed");
            return ControlFlow::Break(());
        }
        self.offer(|adapter, display| adapter.handle_client_request(display, message));
        ControlFlow::Continue(())
    }

    fn property_changed(&mut self, event: &PropertyEvent) {
        let claimed = self
            .adapters
            .iter_mut()
            .map(|adapter| adapter.handle_protocol_notification(&self.display, event))
            .find(Handled::consumed);
        match claimed {
            Some(Handled::Event(ev)) => self.apply(ev),
            Some(_) => {}
            None => {
                if self.router.target(event.window) == Some(Target::Client) {
                    self.update_window_hints(event.window);
                }
            }
        }
    }

    fn configured(&mut self, window: WindowId, geometry: Rect, synthetic: bool) {
        if window == self.window {
            if synthetic && geometry != self.geometry {
                self.geometry = geometry;
                for ws in &self.workspaces {
                    ws.clear_windows(&self.display);
                }
            }
        } else if self.router.target(window) == Some(Target::Client) {
            self.update_window_hints(window);
        }
    }
}
