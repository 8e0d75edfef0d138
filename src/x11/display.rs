//! [`Display`] implementation over an x11rb connection.

use crate::event::{Atom, EventMask, WindowId};
use crate::geometry::{Rect, Size};
use crate::traits::{Display, Property, WmProperties};
use log::debug;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureWindowAux, ConnectionExt,
    CreateWindowAux, EventMask as XEventMask, PropMode, StackMode, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

/// `WM_HINTS` flags.
const INPUT_HINT: u32 = 1;
const STATE_HINT: u32 = 1 << 1;
const ICON_WINDOW_HINT: u32 = 1 << 3;
const WINDOW_GROUP_HINT: u32 = 1 << 6;

const WITHDRAWN_STATE: u32 = 0;
const NORMAL_STATE: u32 = 1;

/// `WM_NORMAL_HINTS` flags.
const P_MIN_SIZE: u32 = 1 << 4;
const P_MAX_SIZE: u32 = 1 << 5;

/// Possible errors from the X11 backend.
#[derive(Debug, thiserror::Error)]
pub enum X11Error {
    #[error("cannot open display: {0}")]
    Connect(#[from] ConnectError),
    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("X11 request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),
    #[error("display has no screen {0}")]
    NoScreen(usize),
    #[error("cannot parse colour {0:?}")]
    Color(String),
}

/// A connection to an X server, bound to one screen.
pub struct X11Display {
    conn: RustConnection,
    root: WindowId,
    screen: Size,
    colormap: u32,
    wm_protocols: Atom,
}

impl X11Display {
    /// Connect to `display` (or `$DISPLAY`), using `screen` instead of the
    /// display's default screen if given.
    pub fn connect(display: Option<&str>, screen: Option<usize>) -> Result<Self, X11Error> {
        let (conn, default_screen) = RustConnection::connect(display)?;
        let screen_num = screen.unwrap_or(default_screen);
        let (root, size, colormap) = {
            let s = conn
                .setup()
                .roots
                .get(screen_num)
                .ok_or(X11Error::NoScreen(screen_num))?;
            (
                s.root,
                Size::new(u32::from(s.width_in_pixels), u32::from(s.height_in_pixels)),
                s.default_colormap,
            )
        };
        let wm_protocols = conn.intern_atom(false, b"WM_PROTOCOLS")?.reply()?.atom;
        debug!(
            "connected to screen {} ({}x{})",
            screen_num, size.width, size.height
        );
        Ok(Self {
            conn,
            root,
            screen: size,
            colormap,
            wm_protocols,
        })
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }
}

/// `#rrggbb` as 16-bit channels.
fn parse_hex_color(name: &str) -> Option<(u16, u16, u16)> {
    let hex = name.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|c| u16::from(c) * 257);
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn extent(value: u32) -> u16 {
    value.clamp(1, u32::from(u16::MAX)) as u16
}

fn coord(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

impl Display for X11Display {
    type Error = X11Error;

    fn root(&self) -> WindowId {
        self.root
    }

    fn screen_size(&self) -> Size {
        self.screen
    }

    fn intern_atom(&self, name: &str) -> Result<Atom, X11Error> {
        Ok(self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
    }

    fn alloc_color(&self, name: &str) -> Result<u32, X11Error> {
        if name.starts_with('#') {
            let (r, g, b) = parse_hex_color(name).ok_or_else(|| X11Error::Color(name.into()))?;
            return Ok(self.conn.alloc_color(self.colormap, r, g, b)?.reply()?.pixel);
        }
        Ok(self
            .conn
            .alloc_named_color(self.colormap, name.as_bytes())?
            .reply()?
            .pixel)
    }

    fn create_window(
        &self,
        parent: WindowId,
        geometry: Rect,
        events: EventMask,
    ) -> Result<WindowId, X11Error> {
        let window = self.conn.generate_id()?;
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            parent,
            coord(geometry.x),
            coord(geometry.y),
            extent(geometry.width),
            extent(geometry.height),
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().event_mask(XEventMask::from(events.0)),
        )?;
        Ok(window)
    }

    fn destroy_window(&self, window: WindowId) -> Result<(), X11Error> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> Result<(), X11Error> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> Result<(), X11Error> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), X11Error> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn move_resize(&self, window: WindowId, geometry: Rect) -> Result<(), X11Error> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(u32::from(extent(geometry.width)))
                .height(u32::from(extent(geometry.height))),
        )?;
        Ok(())
    }

    fn reparent_window(
        &self,
        window: WindowId,
        parent: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(), X11Error> {
        self.conn
            .reparent_window(window, parent, coord(x), coord(y))?;
        Ok(())
    }

    fn raise_window(&self, window: WindowId) -> Result<(), X11Error> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn lower_window(&self, window: WindowId) -> Result<(), X11Error> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::BELOW),
        )?;
        Ok(())
    }

    fn geometry(&self, window: WindowId) -> Result<Rect, X11Error> {
        let g = self.conn.get_geometry(window)?.reply()?;
        Ok(Rect::new(
            i32::from(g.x),
            i32::from(g.y),
            u32::from(g.width),
            u32::from(g.height),
        ))
    }

    fn translate_coordinates(
        &self,
        src: WindowId,
        dst: WindowId,
        x: i32,
        y: i32,
    ) -> Result<(i32, i32), X11Error> {
        let reply = self
            .conn
            .translate_coordinates(src, dst, coord(x), coord(y))?
            .reply()?;
        Ok((i32::from(reply.dst_x), i32::from(reply.dst_y)))
    }

    fn set_background(&self, window: WindowId, pixel: u32) -> Result<(), X11Error> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().background_pixel(pixel),
        )?;
        Ok(())
    }

    fn set_border(&self, window: WindowId, pixel: u32, width: u32) -> Result<(), X11Error> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().border_pixel(pixel),
        )?;
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().border_width(width))?;
        Ok(())
    }

    fn clear(&self, window: WindowId) -> Result<(), X11Error> {
        self.conn.clear_area(false, window, 0, 0, 0, 0)?;
        Ok(())
    }

    fn get_property(
        &self,
        window: WindowId,
        property: Atom,
        type_: Atom,
        max_len: u32,
    ) -> Result<Property, X11Error> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, max_len)?
            .reply()?;
        let value = reply
            .value32()
            .map(|values| values.collect())
            .unwrap_or_default();
        Ok(Property {
            type_: reply.type_,
            format: reply.format,
            value,
        })
    }

    fn change_property32(
        &self,
        window: WindowId,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<(), X11Error> {
        self.conn
            .change_property32(PropMode::REPLACE, window, property, type_, data)?;
        Ok(())
    }

    fn send_client_message(
        &self,
        destination: WindowId,
        window: WindowId,
        message_type: Atom,
        data: [u32; 5],
    ) -> Result<(), X11Error> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn.send_event(
            false,
            destination,
            XEventMask::SUBSTRUCTURE_NOTIFY | XEventMask::SUBSTRUCTURE_REDIRECT,
            event,
        )?;
        Ok(())
    }

    fn select_input(&self, window: WindowId, events: EventMask) -> Result<(), X11Error> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(XEventMask::from(events.0)),
        )?;
        Ok(())
    }

    fn set_wm_properties(&self, window: WindowId, props: &WmProperties) -> Result<(), X11Error> {
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            props.name.as_bytes(),
        )?;

        let class = format!("{}\0{}\0", props.class.0, props.class.1);
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            class.as_bytes(),
        )?;

        // flags, input, initial_state, icon_pixmap, icon_window, icon_x,
        // icon_y, icon_mask, window_group
        let mut hints = [0u32; 9];
        hints[0] = INPUT_HINT | STATE_HINT;
        if props.withdrawn {
            hints[0] |= ICON_WINDOW_HINT | WINDOW_GROUP_HINT;
            hints[2] = WITHDRAWN_STATE;
            hints[4] = window;
            hints[8] = window;
        } else {
            hints[2] = NORMAL_STATE;
        }
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_HINTS,
            AtomEnum::WM_HINTS,
            &hints,
        )?;

        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.wm_protocols,
            AtomEnum::ATOM,
            &props.protocols,
        )?;
        Ok(())
    }

    fn set_fixed_size(&self, window: WindowId, size: Size) -> Result<(), X11Error> {
        let mut hints = [0u32; 18];
        hints[0] = P_MIN_SIZE | P_MAX_SIZE;
        hints[5] = size.width;
        hints[6] = size.height;
        hints[7] = size.width;
        hints[8] = size.height;
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NORMAL_HINTS,
            AtomEnum::WM_SIZE_HINTS,
            &hints,
        )?;
        Ok(())
    }

    fn flush(&self) -> Result<(), X11Error> {
        self.conn.flush()?;
        Ok(())
    }
}
