//! **xpager** is a workspace pager for X11 window managers.
//!
//! The pager shows one thumbnail per workspace, with a small proxy
//! rectangle for every window on it. Clicking a thumbnail switches
//! workspace; dragging a proxy moves the window, within its workspace or
//! onto another one.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::Display`] abstracts the window system (window creation,
//!   geometry, properties, client messages) so the pager logic is not coupled
//!   to a particular X binding and can be tested against an in-memory display.
//! * [`traits::ProtocolAdapter`] abstracts a window-manager protocol. The
//!   [`protocol`] module provides EWMH and the Fluxbox/Blackbox structure
//!   messages; several adapters can be active at once.
//!
//! [`pager::PagerController`] ties them together. The concrete backend lives
//! in [`x11`] (x11rb).

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod hints;
pub mod pager;
pub mod protocol;
pub mod traits;
pub mod workspace;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(test)]
mod testing;
