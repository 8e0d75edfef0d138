//! X11 backend built on `x11rb`.
//!
//! [`X11Display`] implements [`Display`](crate::traits::Display) over a
//! `RustConnection`; [`run`] is the blocking event loop feeding
//! [`PagerController::handle_event`].

pub mod display;

pub use display::{X11Display, X11Error};

use crate::event::{ButtonEvent, ClientMessageEvent, Event, PropertyEvent};
use crate::geometry::Rect;
use crate::pager::PagerController;
use crate::traits::Display;
use log::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::Event as XEvent;

/// Set in `response_type` for events sent with `SendEvent`.
const SEND_EVENT_BIT: u8 = 0x80;

/// Reduce an X event to what the pager consumes.
pub fn translate(event: XEvent) -> Option<Event> {
    let ev = match event {
        XEvent::ButtonPress(e) => Event::ButtonPress(ButtonEvent {
            window: e.event,
            subwindow: e.child,
            button: e.detail,
            x: i32::from(e.event_x),
            y: i32::from(e.event_y),
            time: e.time,
        }),
        XEvent::ButtonRelease(e) => Event::ButtonRelease(ButtonEvent {
            window: e.event,
            subwindow: e.child,
            button: e.detail,
            x: i32::from(e.event_x),
            y: i32::from(e.event_y),
            time: e.time,
        }),
        XEvent::MotionNotify(e) => Event::Motion {
            window: e.event,
            x: i32::from(e.event_x),
            y: i32::from(e.event_y),
            time: e.time,
        },
        // only the last of a series
        XEvent::Expose(e) if e.count == 0 => Event::Expose { window: e.window },
        XEvent::PropertyNotify(e) => Event::Property(PropertyEvent {
            window: e.window,
            atom: e.atom,
        }),
        XEvent::ClientMessage(e) if e.format == 32 => Event::ClientMessage(ClientMessageEvent {
            window: e.window,
            message_type: e.type_,
            data: e.data.as_data32(),
        }),
        XEvent::ConfigureNotify(e) => Event::Configure {
            window: e.window,
            geometry: Rect::new(
                i32::from(e.x),
                i32::from(e.y),
                u32::from(e.width),
                u32::from(e.height),
            ),
            synthetic: e.response_type & SEND_EVENT_BIT != 0,
        },
        XEvent::DestroyNotify(e) => Event::Destroy { window: e.window },
        XEvent::Error(e) => {
            debug!("X error: {:?}", e);
            return None;
        }
        _ => return None,
    };
    Some(ev)
}

/// Block on the connection and dispatch events until the pager asks to
/// exit or the connection breaks.
pub fn run(pager: &mut PagerController<X11Display>) -> Result<(), X11Error> {
    loop {
        pager.display().flush()?;
        let event = pager.display().connection().wait_for_event()?;
        let Some(event) = translate(event) else {
            continue;
        };
        if pager.handle_event(event).is_break() {
            info!("event loop finished");
            pager.display().flush()?;
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::xproto::{ConfigureNotifyEvent, ExposeEvent};

    fn configure(response_type: u8) -> XEvent {
        XEvent::ConfigureNotify(ConfigureNotifyEvent {
            response_type,
            sequence: 0,
            event: 7,
            window: 7,
            above_sibling: 0,
            x: 10,
            y: 20,
            width: 300,
            height: 80,
            border_width: 0,
            override_redirect: false,
        })
    }

    #[test]
    fn configure_carries_send_event_flag() {
        assert_eq!(
            translate(configure(22)),
            Some(Event::Configure {
                window: 7,
                geometry: Rect::new(10, 20, 300, 80),
                synthetic: false,
            })
        );
        assert!(matches!(
            translate(configure(22 | SEND_EVENT_BIT)),
            Some(Event::Configure {
                synthetic: true,
                ..
            })
        ));
    }

    #[test]
    fn expose_series_collapses() {
        let expose = |count| {
            XEvent::Expose(ExposeEvent {
                response_type: 12,
                sequence: 0,
                window: 9,
                x: 0,
                y: 0,
                width: 10,
                height: 10,
                count,
            })
        };
        assert_eq!(translate(expose(2)), None);
        assert_eq!(translate(expose(0)), Some(Event::Expose { window: 9 }));
    }
}
