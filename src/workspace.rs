//! A workspace thumbnail and the window proxies it contains.
//!
//! Each [`Workspace`] owns one child window of the pager and a registry of
//! [`Proxy`] windows keyed by the real (client) window they represent. A
//! proxy's geometry is the client's root geometry scaled by
//! `thumbnail / screen`.
//!
//! Display failures are absorbed: a client can be destroyed between the
//! notification and the query that follows it, and the next notification
//! brings the model back in line anyway.

use crate::dispatch::{Router, Target};
use crate::event::{EventMask, WindowId, NONE};
use crate::geometry::{Rect, Scale};
use crate::traits::{Display, Tolerate};
use log::debug;
use std::collections::BTreeMap;

/// Initial size of a proxy before its first geometry update.
const PROXY_INITIAL_SIZE: u32 = 10;

/// Shaded proxies are this fraction of the workspace height.
const SHADE_DIVISOR: u32 = 30;

/// Resolved colours and border for window proxies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyStyle {
    pub window: u32,
    pub focused: u32,
    pub border: u32,
    pub border_width: u32,
}

/// Miniature of one client window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proxy {
    pub window: WindowId,
    /// Relative to the current parent (normally the workspace window).
    pub geometry: Rect,
    pub visible: bool,
    pub shaded: bool,
}

/// One workspace thumbnail.
#[derive(Debug)]
pub struct Workspace {
    index: usize,
    name: String,
    window: WindowId,
    geometry: Rect,
    proxies: BTreeMap<WindowId, Proxy>,
    highlighted: Option<WindowId>,
    style: ProxyStyle,
}

impl Workspace {
    /// Create the thumbnail window under `parent` and register it.
    pub fn new<D: Display>(
        display: &D,
        router: &mut Router,
        parent: WindowId,
        index: usize,
        geometry: Rect,
        style: ProxyStyle,
    ) -> Result<Self, D::Error> {
        let window = display.create_window(
            parent,
            geometry,
            EventMask::BUTTON_PRESS
                | EventMask::BUTTON_RELEASE
                | EventMask::BUTTON_MOTION
                | EventMask::EXPOSURE,
        )?;
        display.map_window(window)?;
        router.register(window, Target::Workspace(index));
        router.set_parent(window, parent);
        Ok(Self {
            index,
            name: format!("workspace {}", index + 1),
            window,
            geometry,
            proxies: BTreeMap::new(),
            highlighted: None,
            style,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Position and size inside the pager window.
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    pub fn proxy(&self, client: WindowId) -> Option<&Proxy> {
        self.proxies.get(&client)
    }

    pub fn highlighted(&self) -> Option<WindowId> {
        self.highlighted
    }

    //  Registry

    /// Start tracking `client`, replacing any proxy it already has here.
    pub fn add<D: Display>(&mut self, display: &D, router: &mut Router, client: WindowId) {
        if self.proxies.contains_key(&client) {
            self.remove(display, router, client);
        }

        let initial = Rect::new(0, 0, PROXY_INITIAL_SIZE, PROXY_INITIAL_SIZE);
        let Some(proxy) = display
            .create_window(self.window, initial, EventMask::EXPOSURE)
            .tolerate("create proxy")
        else {
            return;
        };

        display
            .select_input(
                client,
                EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY,
            )
            .tolerate("select client input");

        router.register(
            proxy,
            Target::Proxy {
                workspace: self.index,
                client,
            },
        );
        router.set_parent(proxy, self.window);
        router.register(client, Target::Client);

        self.proxies.insert(
            client,
            Proxy {
                window: proxy,
                geometry: initial,
                visible: true,
                shaded: false,
            },
        );

        self.update_geometry(display, client);
        display.map_window(proxy).tolerate("map proxy");
        display
            .set_border(proxy, self.style.border, self.style.border_width)
            .tolerate("proxy border");
        display
            .set_background(proxy, self.style.window)
            .tolerate("proxy background");
        debug!("{}: added {:#x} as proxy {:#x}", self.name, client, proxy);
    }

    /// Stop tracking `client` here. The client's own router entry is left
    /// alone since a sticky client lives in several workspaces.
    pub fn remove<D: Display>(&mut self, display: &D, router: &mut Router, client: WindowId) {
        let Some(proxy) = self.proxies.remove(&client) else {
            return;
        };
        router.unregister(proxy.window);
        display.destroy_window(proxy.window).tolerate("destroy proxy");
        if self.highlighted == Some(client) {
            self.highlighted = None;
        }
    }

    /// Detach the proxy of `client` without destroying it.
    pub fn take_proxy(&mut self, router: &mut Router, client: WindowId) -> Option<Proxy> {
        let proxy = self.proxies.remove(&client)?;
        router.unregister(proxy.window);
        if self.highlighted == Some(client) {
            self.highlighted = None;
        }
        Some(proxy)
    }

    /// Take ownership of a proxy detached from another workspace. The proxy
    /// window must already be a child of this workspace's window.
    pub fn adopt_proxy<D: Display>(
        &mut self,
        display: &D,
        router: &mut Router,
        client: WindowId,
        proxy: Proxy,
    ) {
        if self.proxies.contains_key(&client) {
            self.remove(display, router, client);
        }
        router.register(
            proxy.window,
            Target::Proxy {
                workspace: self.index,
                client,
            },
        );
        router.set_parent(proxy.window, self.window);
        // repainted by the next update_focused_window if it holds the focus
        display
            .set_background(proxy.window, self.style.window)
            .tolerate("restyle adopted proxy");
        display.clear(proxy.window).tolerate("clear proxy");
        self.proxies.insert(client, proxy);
    }

    /// Client represented by `window`, which may be the client itself or
    /// its proxy handle.
    pub fn find(&self, window: WindowId) -> Option<WindowId> {
        if self.proxies.contains_key(&window) {
            return Some(window);
        }
        self.find_client(window)
    }

    /// Client whose proxy handle is `proxy`.
    pub fn find_client(&self, proxy: WindowId) -> Option<WindowId> {
        self.proxies
            .iter()
            .find(|(_, p)| p.window == proxy)
            .map(|(client, _)| *client)
    }

    pub fn contains(&self, client: WindowId) -> bool {
        self.proxies.contains_key(&client)
    }

    /// Record a proxy's geometry after it was moved by a drag.
    pub fn set_proxy_geometry(&mut self, client: WindowId, geometry: Rect) {
        if let Some(p) = self.proxies.get_mut(&client) {
            p.geometry = geometry;
        }
    }

    //  Geometry

    /// Recompute the proxy of `client` from the client's root geometry.
    pub fn update_geometry<D: Display>(&mut self, display: &D, client: WindowId) {
        let Some(proxy) = self.proxies.get_mut(&client) else {
            return;
        };
        let Some((x, y)) = display
            .translate_coordinates(display.root(), client, 0, 0)
            .tolerate("translate client")
        else {
            return;
        };
        let Some(real) = display.geometry(client).tolerate("client geometry") else {
            return;
        };

        let scale = Scale::between(display.screen_size(), self.geometry.size());
        let (x, y) = scale.point(-x, -y);
        let (width, height) = scale.size(real.width, real.height);
        let rect = Rect::new(
            x,
            y,
            width.saturating_sub(self.style.border_width).max(1),
            height.max(1),
        );

        if display.move_resize(proxy.window, rect).tolerate("resize proxy").is_some() {
            proxy.geometry = rect;
        }
    }

    /// Move and resize the thumbnail, rescaling every proxy if the size
    /// changed.
    pub fn place<D: Display>(&mut self, display: &D, geometry: Rect) {
        let resized = geometry.size() != self.geometry.size();
        display
            .move_resize(self.window, geometry)
            .tolerate("place workspace");
        self.geometry = geometry;
        if resized {
            let clients: Vec<WindowId> = self.proxies.keys().copied().collect();
            for client in clients {
                self.update_geometry(display, client);
            }
        }
    }

    //  Window state

    pub fn shade_window<D: Display>(&mut self, display: &D, client: WindowId) {
        let height = (self.geometry.height / SHADE_DIVISOR).max(1);
        let Some(proxy) = self.proxies.get_mut(&client) else {
            return;
        };
        let rect = Rect {
            height,
            ..proxy.geometry
        };
        if display.move_resize(proxy.window, rect).tolerate("shade proxy").is_some() {
            proxy.geometry = rect;
            proxy.shaded = true;
        }
    }

    pub fn unshade_window<D: Display>(&mut self, display: &D, client: WindowId) {
        if let Some(proxy) = self.proxies.get_mut(&client) {
            proxy.shaded = false;
        }
        self.update_geometry(display, client);
    }

    pub fn iconify_window<D: Display>(&mut self, display: &D, client: WindowId) {
        if let Some(proxy) = self.proxies.get_mut(&client) {
            if display.unmap_window(proxy.window).tolerate("hide proxy").is_some() {
                proxy.visible = false;
            }
        }
    }

    pub fn deiconify_window<D: Display>(&mut self, display: &D, client: WindowId) {
        if let Some(proxy) = self.proxies.get_mut(&client) {
            if display.map_window(proxy.window).tolerate("show proxy").is_some() {
                proxy.visible = true;
            }
        }
    }

    pub fn raise_window<D: Display>(&self, display: &D, client: WindowId) {
        if let Some(proxy) = self.proxies.get(&client) {
            display.raise_window(proxy.window).tolerate("raise proxy");
        }
    }

    pub fn lower_window<D: Display>(&self, display: &D, client: WindowId) {
        if let Some(proxy) = self.proxies.get(&client) {
            display.lower_window(proxy.window).tolerate("lower proxy");
        }
    }

    //  Appearance

    /// Move the highlight to `focused` (a client or proxy handle).
    /// [`NONE`] clears it.
    pub fn update_focused_window<D: Display>(&mut self, display: &D, focused: WindowId) {
        let target = if focused == NONE {
            None
        } else {
            self.find(focused)
        };
        if target == self.highlighted {
            return;
        }

        if let Some(old) = self.highlighted.take() {
            if let Some(proxy) = self.proxies.get(&old) {
                display
                    .set_background(proxy.window, self.style.window)
                    .tolerate("unhighlight proxy");
                display.clear(proxy.window).tolerate("clear proxy");
            }
        }

        if let Some(client) = target {
            if let Some(proxy) = self.proxies.get(&client) {
                display
                    .set_background(proxy.window, self.style.focused)
                    .tolerate("highlight proxy");
                display.clear(proxy.window).tolerate("clear proxy");
                self.highlighted = Some(client);
            }
        }
    }

    /// Apply new proxy colours to every proxy.
    pub fn set_style<D: Display>(&mut self, display: &D, style: ProxyStyle) {
        self.style = style;
        for (client, proxy) in &self.proxies {
            let pixel = if self.highlighted == Some(*client) {
                style.focused
            } else {
                style.window
            };
            display
                .set_border(proxy.window, style.border, style.border_width)
                .tolerate("proxy border");
            display.set_background(proxy.window, pixel).tolerate("proxy background");
            display.clear(proxy.window).tolerate("clear proxy");
        }
    }

    /// Set the thumbnail's own background and border and repaint it.
    pub fn set_frame<D: Display>(&self, display: &D, background: u32, border: u32, width: u32) {
        display
            .set_background(self.window, background)
            .tolerate("workspace background");
        display
            .set_border(self.window, border, width)
            .tolerate("workspace border");
        display.clear(self.window).tolerate("clear workspace");
    }

    /// Repaint the thumbnail and its proxies.
    pub fn clear_windows<D: Display>(&self, display: &D) {
        display.clear(self.window).tolerate("clear workspace");
        for proxy in self.proxies.values() {
            display.clear(proxy.window).tolerate("clear proxy");
        }
    }

    /// Tear down the thumbnail, its proxies and their router entries.
    pub fn destroy<D: Display>(self, display: &D, router: &mut Router) {
        for proxy in self.proxies.values() {
            router.unregister(proxy.window);
        }
        router.unregister(self.window);
        display
            .destroy_window(self.window)
            .tolerate("destroy workspace");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockDisplay, ROOT};

    const STYLE: ProxyStyle = ProxyStyle {
        window: 0xaa,
        focused: 0xbb,
        border: 0xcc,
        border_width: 1,
    };

    fn workspace(display: &MockDisplay, router: &mut Router) -> Workspace {
        // screen is 1000x800, thumbnail 100x80: a factor of ten on both axes
        Workspace::new(display, router, ROOT, 0, Rect::new(0, 0, 100, 80), STYLE).unwrap()
    }

    #[test]
    fn add_creates_scaled_proxy() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(200, 100, 400, 300));

        ws.add(&d, &mut r, 0x500);

        let proxy = *ws.proxy(0x500).unwrap();
        assert_eq!(proxy.geometry, Rect::new(20, 10, 39, 30));
        assert!(proxy.visible);
        let w = d.window(proxy.window).unwrap();
        assert_eq!(w.parent, ws.window());
        assert_eq!(w.background, Some(STYLE.window));
        assert!(w.mapped);
        assert_eq!(
            r.target(proxy.window),
            Some(Target::Proxy {
                workspace: 0,
                client: 0x500
            })
        );
        assert_eq!(r.target(0x500), Some(Target::Client));
        assert!(d
            .window(0x500)
            .unwrap()
            .events
            .contains(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY));
    }

    #[test]
    fn tiny_client_gets_minimum_size() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 5, 5));

        ws.add(&d, &mut r, 0x500);

        let g = ws.proxy(0x500).unwrap().geometry;
        assert_eq!((g.width, g.height), (1, 1));
    }

    #[test]
    fn add_twice_replaces_proxy() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));

        ws.add(&d, &mut r, 0x500);
        let first = ws.proxy(0x500).unwrap().window;
        ws.add(&d, &mut r, 0x500);
        let second = ws.proxy(0x500).unwrap().window;

        assert_ne!(first, second);
        assert!(ws.contains(0x500));
        assert!(d.window(first).is_none());
        assert_eq!(r.target(first), None);
    }

    #[test]
    fn remove_clears_highlight() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        ws.update_focused_window(&d, 0x500);
        assert_eq!(ws.highlighted(), Some(0x500));

        ws.remove(&d, &mut r, 0x500);

        assert_eq!(ws.highlighted(), None);
        assert!(!ws.contains(0x500));
        // the client entry survives for other workspaces
        assert_eq!(r.target(0x500), Some(Target::Client));
    }

    #[test]
    fn find_matches_client_and_proxy() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        let proxy = ws.proxy(0x500).unwrap().window;

        assert_eq!(ws.find(0x500), Some(0x500));
        assert_eq!(ws.find(proxy), Some(0x500));
        assert_eq!(ws.find_client(proxy), Some(0x500));
        assert_eq!(ws.find(0x999), None);
    }

    #[test]
    fn shade_and_unshade() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 400, 400));
        ws.add(&d, &mut r, 0x500);

        ws.shade_window(&d, 0x500);
        let shaded = *ws.proxy(0x500).unwrap();
        assert!(shaded.shaded);
        assert_eq!(shaded.geometry.height, 2); // 80 / 30

        ws.unshade_window(&d, 0x500);
        let p = *ws.proxy(0x500).unwrap();
        assert!(!p.shaded);
        assert_eq!(p.geometry.height, 40);
    }

    #[test]
    fn iconify_and_deiconify() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        let proxy = ws.proxy(0x500).unwrap().window;

        ws.iconify_window(&d, 0x500);
        assert!(!d.window(proxy).unwrap().mapped);
        assert!(!ws.proxy(0x500).unwrap().visible);

        ws.deiconify_window(&d, 0x500);
        assert!(d.window(proxy).unwrap().mapped);
        assert!(ws.proxy(0x500).unwrap().visible);
    }

    #[test]
    fn focus_moves_highlight() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        d.add_client(0x600, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        ws.add(&d, &mut r, 0x600);
        let p5 = ws.proxy(0x500).unwrap().window;
        let p6 = ws.proxy(0x600).unwrap().window;

        ws.update_focused_window(&d, 0x500);
        assert_eq!(d.window(p5).unwrap().background, Some(STYLE.focused));

        d.take_calls();
        ws.update_focused_window(&d, 0x600);
        assert_eq!(d.window(p5).unwrap().background, Some(STYLE.window));
        assert_eq!(d.window(p6).unwrap().background, Some(STYLE.focused));
        let calls = d.take_calls();
        assert!(calls.contains(&Call::Clear(p5)));
        assert!(calls.contains(&Call::Clear(p6)));

        // same focus again: nothing to repaint
        ws.update_focused_window(&d, 0x600);
        assert!(d.take_calls().is_empty());

        ws.update_focused_window(&d, NONE);
        assert_eq!(ws.highlighted(), None);
        assert_eq!(d.window(p6).unwrap().background, Some(STYLE.window));
    }

    #[test]
    fn focus_elsewhere_clears_local_highlight() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        ws.update_focused_window(&d, 0x500);

        ws.update_focused_window(&d, 0x777);

        assert_eq!(ws.highlighted(), None);
    }

    #[test]
    fn place_rescales_proxies() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(500, 400, 100, 100));
        ws.add(&d, &mut r, 0x500);

        ws.place(&d, Rect::new(10, 0, 200, 160));

        assert_eq!(ws.geometry(), Rect::new(10, 0, 200, 160));
        assert_eq!(ws.proxy(0x500).unwrap().geometry, Rect::new(100, 80, 19, 20));
    }

    #[test]
    fn vanished_client_is_ignored() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        let before = ws.proxy(0x500).unwrap().geometry;

        d.fail(0x500);
        ws.update_geometry(&d, 0x500);

        assert_eq!(ws.proxy(0x500).unwrap().geometry, before);
    }

    #[test]
    fn take_and_adopt_transfer_registry_entry() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut a = workspace(&d, &mut r);
        let mut b =
            Workspace::new(&d, &mut r, ROOT, 1, Rect::new(100, 0, 100, 80), STYLE).unwrap();
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        a.add(&d, &mut r, 0x500);

        let proxy = a.take_proxy(&mut r, 0x500).unwrap();
        b.adopt_proxy(&d, &mut r, 0x500, proxy);

        assert!(!a.contains(0x500));
        assert!(b.contains(0x500));
        assert_eq!(
            r.target(proxy.window),
            Some(Target::Proxy {
                workspace: 1,
                client: 0x500
            })
        );
    }

    #[test]
    fn set_style_restyles_proxies() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        let proxy = ws.proxy(0x500).unwrap().window;

        let style = ProxyStyle {
            window: 0x11,
            focused: 0x22,
            border: 0x33,
            border_width: 2,
        };
        ws.set_style(&d, style);

        let w = d.window(proxy).unwrap();
        assert_eq!(w.background, Some(0x11));
        assert_eq!((w.border_pixel, w.border_width), (0x33, 2));
    }

    #[test]
    fn destroy_unregisters_everything() {
        let d = MockDisplay::default();
        let mut r = Router::new();
        let mut ws = workspace(&d, &mut r);
        d.add_client(0x500, Rect::new(0, 0, 100, 100));
        ws.add(&d, &mut r, 0x500);
        let proxy = ws.proxy(0x500).unwrap().window;
        let window = ws.window();

        ws.destroy(&d, &mut r);

        assert_eq!(r.target(proxy), None);
        assert_eq!(r.target(window), None);
        assert!(d.window(window).is_none());
        assert!(d.window(proxy).is_none());
    }
}
