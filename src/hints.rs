//! Per-window hints as reported (or requested) through the protocol adapters.

/// Window state flags plus an optional workspace assignment.
///
/// A fresh value is built for every query; adapters OR their findings into
/// it. `workspace` stays `None` unless some adapter reported one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowHints {
    pub flags: u32,
    pub workspace: Option<u32>,
}

impl WindowHints {
    pub const ICONIC: u32 = 0x001;
    pub const STICKY: u32 = 0x002;
    pub const SHADED: u32 = 0x004;
    pub const SKIP_PAGER: u32 = 0x008;
    pub const SKIP_TASKBAR: u32 = 0x010;
    pub const NO_DECOR: u32 = 0x020;
    pub const HIDDEN: u32 = 0x040;
    pub const TYPE_DOCK: u32 = 0x080;
    pub const LAYER_BOTTOM: u32 = 0x100;
    pub const LAYER_TOP: u32 = 0x200;

    pub fn new(flags: u32) -> Self {
        Self {
            flags,
            workspace: None,
        }
    }

    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn add(&mut self, flag: u32) {
        self.flags |= flag;
    }

    pub fn is_sticky(&self) -> bool {
        self.has(Self::STICKY)
    }

    pub fn is_iconic(&self) -> bool {
        self.has(Self::ICONIC)
    }

    pub fn is_shaded(&self) -> bool {
        self.has(Self::SHADED)
    }

    pub fn skip_pager(&self) -> bool {
        self.has(Self::SKIP_PAGER)
    }

    pub fn is_dock(&self) -> bool {
        self.has(Self::TYPE_DOCK)
    }
}
