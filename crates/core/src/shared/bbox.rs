/// Axis-aligned face bounding box in pixel units.
///
/// Edge order follows the detector convention (top, right, bottom, left);
/// `right` and `bottom` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl BoundingBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn center(&self) -> Anchor {
        Anchor {
            x: (self.left + self.right) as f64 / 2.0,
            y: (self.top + self.bottom) as f64 / 2.0,
        }
    }

    /// Grows the box by `margin` of its own size on every side, clamped to
    /// the frame bounds.
    pub fn expanded(&self, margin: f64, frame_width: u32, frame_height: u32) -> BoundingBox {
        let margin_v = (self.height() as f64 * margin) as i32;
        let margin_h = (self.width() as f64 * margin) as i32;
        BoundingBox {
            top: (self.top - margin_v).max(0),
            left: (self.left - margin_h).max(0),
            bottom: (self.bottom + margin_v).min(frame_height as i32),
            right: (self.right + margin_h).min(frame_width as i32),
        }
    }

    /// Clamps all edges into the frame, preserving edge order. A box lying
    /// entirely outside the frame collapses to a zero-area box on the edge.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        BoundingBox {
            top: self.top.clamp(0, frame_height as i32),
            left: self.left.clamp(0, frame_width as i32),
            bottom: self.bottom.clamp(0, frame_height as i32),
            right: self.right.clamp(0, frame_width as i32),
        }
    }
}

/// Screen position keying a capture session or cooldown entry.
///
/// A structured coordinate rather than a formatted string, so distance
/// checks never round-trip through parsing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Anchor) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}
