//! Bounding box data structure

use std::fmt;

/// Values per sample in a box output: x1, y1, x2, y2
pub const BOX_VALUES: usize = 4;

/// A predicted box in integer pixel coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    /// First corner X
    pub x1: i32,
    /// First corner Y
    pub y1: i32,
    /// Opposite corner X
    pub x2: i32,
    /// Opposite corner Y
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a box from one sample of a box output
    ///
    /// Values are truncated toward zero. Returns `None` unless exactly four
    /// values are given.
    pub fn from_values(values: &[f32]) -> Option<Self> {
        match *values {
            [x1, y1, x2, y2] => Some(Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)),
            _ => None,
        }
    }

    /// Corners in drawing order: (x1,y1), (x2,y1), (x2,y2), (x1,y2)
    pub fn corners(&self) -> [(i32, i32); 4] {
        [
            (self.x1, self.y1),
            (self.x2, self.y1),
            (self.x2, self.y2),
            (self.x1, self.y2),
        ]
    }

    /// The four edges of the outline, each closing onto the next corner
    pub fn edges(&self) -> [((i32, i32), (i32, i32)); 4] {
        let c = self.corners();
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x1 {} y1 {} x2 {} y2 {}",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}
