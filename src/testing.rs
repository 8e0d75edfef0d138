//! In-memory [`Display`] used by the unit tests.
//!
//! Keeps a window tree with geometry, properties and styling, and records
//! every request that has a visible effect so tests can assert on it.

use crate::event::{Atom, EventMask, WindowId, NONE};
use crate::geometry::{Rect, Size};
use crate::traits::{Display, Property, WmProperties};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub const ROOT: WindowId = 1;

#[derive(Debug, Clone, Default)]
pub struct MockWindow {
    pub parent: WindowId,
    /// Relative to `parent`.
    pub rect: Rect,
    pub border_width: u32,
    pub border_pixel: u32,
    pub background: Option<u32>,
    pub mapped: bool,
    pub events: EventMask,
    pub props: HashMap<Atom, Property>,
}

/// A recorded client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: WindowId,
    pub window: WindowId,
    pub message_type: Atom,
    pub data: [u32; 5],
}

/// A recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Raise(WindowId),
    Lower(WindowId),
    Clear(WindowId),
    Background(WindowId, u32),
    Border(WindowId, u32, u32),
    Move(WindowId, i32, i32),
    MoveResize(WindowId, Rect),
    Reparent(WindowId, WindowId, i32, i32),
    Map(WindowId),
    Unmap(WindowId),
    Destroy(WindowId),
}

#[derive(Debug, thiserror::Error)]
#[error("bad window {0:#x}")]
pub struct MockError(pub WindowId);

#[derive(Debug)]
pub struct MockDisplay {
    screen: Size,
    next_id: Cell<WindowId>,
    windows: RefCell<HashMap<WindowId, MockWindow>>,
    atoms: RefCell<HashMap<String, Atom>>,
    colors: RefCell<HashMap<String, u32>>,
    failing: RefCell<HashSet<WindowId>>,
    pub messages: RefCell<Vec<SentMessage>>,
    pub calls: RefCell<Vec<Call>>,
    pub wm_props: RefCell<HashMap<WindowId, WmProperties>>,
    pub fixed_sizes: RefCell<Vec<(WindowId, Size)>>,
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new(Size::new(1000, 800))
    }
}

impl MockDisplay {
    pub fn new(screen: Size) -> Self {
        let mut windows = HashMap::new();
        windows.insert(
            ROOT,
            MockWindow {
                rect: Rect::new(0, 0, screen.width, screen.height),
                mapped: true,
                ..MockWindow::default()
            },
        );
        Self {
            screen,
            next_id: Cell::new(0x1000),
            windows: RefCell::new(windows),
            atoms: RefCell::new(
                [("ATOM", 4), ("CARDINAL", 6), ("WINDOW", 33)]
                    .into_iter()
                    .map(|(name, atom)| (name.to_string(), atom))
                    .collect(),
            ),
            colors: RefCell::new(HashMap::new()),
            failing: RefCell::new(HashSet::new()),
            messages: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            wm_props: RefCell::new(HashMap::new()),
            fixed_sizes: RefCell::new(Vec::new()),
        }
    }

    //  Helpers

    /// Add a mapped top-level window.
    pub fn add_client(&self, id: WindowId, rect: Rect) {
        self.windows.borrow_mut().insert(
            id,
            MockWindow {
                parent: ROOT,
                rect,
                mapped: true,
                ..MockWindow::default()
            },
        );
    }

    /// Simulate the window disappearing from the server.
    pub fn remove_client(&self, id: WindowId) {
        self.windows.borrow_mut().remove(&id);
    }

    /// Make every request on `id` fail.
    pub fn fail(&self, id: WindowId) {
        self.failing.borrow_mut().insert(id);
    }

    pub fn atom(&self, name: &str) -> Atom {
        let mut atoms = self.atoms.borrow_mut();
        let next = 100 + atoms.len() as Atom;
        *atoms.entry(name.to_string()).or_insert(next)
    }

    pub fn pixel(&self, name: &str) -> u32 {
        let mut colors = self.colors.borrow_mut();
        let next = 0x10 + colors.len() as u32;
        *colors.entry(name.to_string()).or_insert(next)
    }

    pub fn set_property32(&self, window: WindowId, name: &str, type_name: &str, value: &[u32]) {
        let property = self.atom(name);
        let type_ = self.atom(type_name);
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.props.insert(
                property,
                Property {
                    type_,
                    format: 32,
                    value: value.to_vec(),
                },
            );
        }
    }

    pub fn property(&self, window: WindowId, name: &str) -> Option<Property> {
        let property = self.atom(name);
        self.windows
            .borrow()
            .get(&window)
            .and_then(|w| w.props.get(&property).cloned())
    }

    pub fn window(&self, id: WindowId) -> Option<MockWindow> {
        self.windows.borrow().get(&id).cloned()
    }

    pub fn children_of(&self, parent: WindowId) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self
            .windows
            .borrow()
            .iter()
            .filter(|(id, w)| w.parent == parent && **id != ROOT)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Messages of the named type, in send order.
    pub fn messages_of(&self, name: &str) -> Vec<SentMessage> {
        let type_ = self.atom(name);
        self.messages
            .borrow()
            .iter()
            .filter(|m| m.message_type == type_)
            .cloned()
            .collect()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn check(&self, id: WindowId) -> Result<(), MockError> {
        if self.failing.borrow().contains(&id) || !self.windows.borrow().contains_key(&id) {
            Err(MockError(id))
        } else {
            Ok(())
        }
    }

    fn with_window<T>(
        &self,
        id: WindowId,
        f: impl FnOnce(&mut MockWindow) -> T,
    ) -> Result<T, MockError> {
        self.check(id)?;
        let mut windows = self.windows.borrow_mut();
        let w = windows.get_mut(&id).ok_or(MockError(id))?;
        Ok(f(w))
    }

    fn absolute(&self, id: WindowId) -> Result<(i32, i32), MockError> {
        let windows = self.windows.borrow();
        let (mut x, mut y) = (0, 0);
        let mut current = id;
        while current != ROOT {
            let w = windows.get(&current).ok_or(MockError(id))?;
            x += w.rect.x;
            y += w.rect.y;
            current = w.parent;
        }
        Ok((x, y))
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Display for MockDisplay {
    type Error = MockError;

    fn root(&self) -> WindowId {
        ROOT
    }

    fn screen_size(&self) -> Size {
        self.screen
    }

    fn intern_atom(&self, name: &str) -> Result<Atom, MockError> {
        Ok(self.atom(name))
    }

    fn alloc_color(&self, name: &str) -> Result<u32, MockError> {
        Ok(self.pixel(name))
    }

    fn create_window(
        &self,
        parent: WindowId,
        geometry: Rect,
        events: EventMask,
    ) -> Result<WindowId, MockError> {
        self.check(parent)?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.windows.borrow_mut().insert(
            id,
            MockWindow {
                parent,
                rect: geometry,
                events,
                ..MockWindow::default()
            },
        );
        Ok(id)
    }

    fn destroy_window(&self, window: WindowId) -> Result<(), MockError> {
        self.check(window)?;
        let mut windows = self.windows.borrow_mut();
        windows.remove(&window);
        windows.retain(|_, w| w.parent != window);
        drop(windows);
        self.record(Call::Destroy(window));
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> Result<(), MockError> {
        self.with_window(window, |w| w.mapped = true)?;
        self.record(Call::Map(window));
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> Result<(), MockError> {
        self.with_window(window, |w| w.mapped = false)?;
        self.record(Call::Unmap(window));
        Ok(())
    }

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), MockError> {
        self.with_window(window, |w| {
            w.rect.x = x;
            w.rect.y = y;
        })?;
        self.record(Call::Move(window, x, y));
        Ok(())
    }

    fn move_resize(&self, window: WindowId, geometry: Rect) -> Result<(), MockError> {
        self.with_window(window, |w| w.rect = geometry)?;
        self.record(Call::MoveResize(window, geometry));
        Ok(())
    }

    fn reparent_window(
        &self,
        window: WindowId,
        parent: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(), MockError> {
        self.check(parent)?;
        self.with_window(window, |w| {
            w.parent = parent;
            w.rect.x = x;
            w.rect.y = y;
        })?;
        self.record(Call::Reparent(window, parent, x, y));
        Ok(())
    }

    fn raise_window(&self, window: WindowId) -> Result<(), MockError> {
        self.check(window)?;
        self.record(Call::Raise(window));
        Ok(())
    }

    fn lower_window(&self, window: WindowId) -> Result<(), MockError> {
        self.check(window)?;
        self.record(Call::Lower(window));
        Ok(())
    }

    fn geometry(&self, window: WindowId) -> Result<Rect, MockError> {
        self.with_window(window, |w| w.rect)
    }

    fn translate_coordinates(
        &self,
        src: WindowId,
        dst: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(i32, i32), MockError> {
        self.check(src)?;
        self.check(dst)?;
        let (sx, sy) = self.absolute(src)?;
        let (dx, dy) = self.absolute(dst)?;
        Ok((sx + x - dx, sy + y - dy))
    }

    fn set_background(&self, window: WindowId, pixel: u32) -> Result<(), MockError> {
        self.with_window(window, |w| w.background = Some(pixel))?;
        self.record(Call::Background(window, pixel));
        Ok(())
    }

    fn set_border(&self, window: WindowId, pixel: u32, width: u32) -> Result<(), MockError> {
        self.with_window(window, |w| {
            w.border_pixel = pixel;
            w.border_width = width;
        })?;
        self.record(Call::Border(window, pixel, width));
        Ok(())
    }

    fn clear(&self, window: WindowId) -> Result<(), MockError> {
        self.check(window)?;
        self.record(Call::Clear(window));
        Ok(())
    }

    fn get_property(
        &self,
        window: WindowId,
        property: Atom,
        type_: Atom,
        max_len: u32,
    ) -> Result<Property, MockError> {
        self.with_window(window, |w| match w.props.get(&property) {
            None => Property::default(),
            Some(p) if type_ != NONE && p.type_ != type_ => Property {
                type_: p.type_,
                format: p.format,
                value: Vec::new(),
            },
            Some(p) => Property {
                type_: p.type_,
                format: p.format,
                value: p.value.iter().take(max_len as usize).copied().collect(),
            },
        })
    }

    fn change_property32(
        &self,
        window: WindowId,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<(), MockError> {
        self.with_window(window, |w| {
            w.props.insert(
                property,
                Property {
                    type_,
                    format: 32,
                    value: data.to_vec(),
                },
            );
        })
    }

    fn send_client_message(
        &self,
        destination: WindowId,
        window: WindowId,
        message_type: Atom,
        data: [u32; 5],
    ) -> Result<(), MockError> {
        self.check(destination)?;
        self.messages.borrow_mut().push(SentMessage {
            destination,
            window,
            message_type,
            data,
        });
        Ok(())
    }

    fn select_input(&self, window: WindowId, events: EventMask) -> Result<(), MockError> {
        self.with_window(window, |w| w.events = events)
    }

    fn set_wm_properties(&self, window: WindowId, props: &WmProperties) -> Result<(), MockError> {
        self.check(window)?;
        self.wm_props.borrow_mut().insert(window, props.clone());
        Ok(())
    }

    fn set_fixed_size(&self, window: WindowId, size: Size) -> Result<(), MockError> {
        self.check(window)?;
        self.fixed_sizes.borrow_mut().push((window, size));
        Ok(())
    }

    fn flush(&self) -> Result<(), MockError> {
        Ok(())
    }
}
