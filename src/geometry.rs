//! Rectangles, coordinate scaling between the screen and a thumbnail, and
//! the thumbnail grid layout.
//!
//! # Scaling
//!
//! A [`Scale`] maps coordinates from one extent to another using independent
//! x and y ratios:
//!
//! ```text
//!   x' = x * to.width  / from.width
//!   y' = y * to.height / from.height
//! ```
//!
//! Results are truncated toward zero, matching integer window coordinates.
//! A zero-sized source collapses everything to `0`.
//!
//! # Layout
//!
//! [`layout_thumbnails`] places `count` equally-sized thumbnails along a
//! primary axis, wrapping onto a new line after `per_row` of them.

use serde::{Deserialize, Serialize};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A window rectangle; `x`/`y` are relative to the parent window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// `true` if `(px, py)` lies inside the rectangle (right/bottom edges exclusive).
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && i64::from(px) < i64::from(self.x) + i64::from(self.width)
            && i64::from(py) < i64::from(self.y) + i64::from(self.height)
    }
}

/// Independent x/y ratio between two extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    from: Size,
    to: Size,
}

impl Scale {
    /// Scale mapping coordinates in `from` space into `to` space.
    pub fn between(from: Size, to: Size) -> Self {
        Self { from, to }
    }

    fn axis(value: i64, from: u32, to: u32) -> i64 {
        if from == 0 {
            0
        } else {
            value * i64::from(to) / i64::from(from)
        }
    }

    pub fn point(&self, x: i32, y: i32) -> (i32, i32) {
        (
            Self::axis(i64::from(x), self.from.width, self.to.width) as i32,
            Self::axis(i64::from(y), self.from.height, self.to.height) as i32,
        )
    }

    pub fn size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            Self::axis(i64::from(width), self.from.width, self.to.width) as u32,
            Self::axis(i64::from(height), self.from.height, self.to.height) as u32,
        )
    }
}

/// Clamp a proposed position of `current` inside `bounds`.
///
/// Each axis is accepted only if at least a quarter of the rectangle stays
/// inside: `-3/4 * extent <= pos <= bound - extent/4`. A rejected axis keeps
/// its current coordinate.
pub fn constrain(proposed: (i32, i32), current: Rect, bounds: Size) -> (i32, i32) {
    let axis = |pos: i32, cur: i32, extent: u32, bound: u32| {
        let extent = i64::from(extent);
        let low = -(3 * extent / 4);
        let high = i64::from(bound) - extent / 4;
        let pos64 = i64::from(pos);
        if pos64 >= low && pos64 <= high {
            pos
        } else {
            cur
        }
    };
    (
        axis(proposed.0, current.x, current.width, bounds.width),
        axis(proposed.1, current.y, current.height, bounds.height),
    )
}

/// Direction in which workspace thumbnails are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    LeftToRight,
    TopToBottom,
}

/// Result of [`layout_thumbnails`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Top-left of each thumbnail, in container coordinates.
    pub positions: Vec<(i32, i32)>,
    /// Size of the container window.
    pub container: Size,
    /// Thumbnails per line and number of lines.
    pub columns: u32,
    pub rows: u32,
}

/// Place `count` thumbnails of size `thumb`.
///
/// Steps advance by `extent + bevel` along the primary axis. After
/// `per_row` thumbnails the primary coordinate resets to `bevel` and the
/// secondary one advances by `extent + bevel`. The container is the bounding
/// box of all thumbnails plus `2 * bevel`.
pub fn layout_thumbnails(
    count: usize,
    thumb: Size,
    bevel: u32,
    align: Alignment,
    per_row: usize,
) -> Layout {
    let per_row = per_row.max(1);
    let bevel_i = bevel as i32;
    let w = thumb.width as i32;
    let h = thumb.height as i32;
    let (step_x, step_y) = match align {
        Alignment::LeftToRight => (w + bevel_i, 0),
        Alignment::TopToBottom => (0, h + bevel_i),
    };

    let mut positions = Vec::with_capacity(count);
    let (mut x, mut y) = (0i32, 0i32);
    let (mut max_x, mut max_y) = (0i32, 0i32);
    let mut in_line = 0usize;
    for _ in 0..count {
        if in_line >= per_row {
            in_line = 0;
            match align {
                Alignment::LeftToRight => {
                    x = bevel_i;
                    y += h + bevel_i;
                }
                Alignment::TopToBottom => {
                    y = bevel_i;
                    x += w + bevel_i;
                }
            }
        }
        max_x = max_x.max(x + w);
        max_y = max_y.max(y + h);
        positions.push((x, y));
        x += step_x;
        y += step_y;
        in_line += 1;
    }

    let lines = if count == 0 {
        0
    } else {
        count.div_ceil(per_row) as u32
    };
    let in_first_line = count.min(per_row) as u32;
    let (columns, rows) = match align {
        Alignment::LeftToRight => (in_first_line, lines),
        Alignment::TopToBottom => (lines, in_first_line),
    };

    Layout {
        positions,
        container: Size::new(
            (max_x + 2 * bevel_i).max(1) as u32,
            (max_y + 2 * bevel_i).max(1) as u32,
        ),
        columns,
        rows,
    }
}
