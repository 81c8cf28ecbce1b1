use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct DisplayRectangle {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl DisplayRectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.origin.x
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.origin.y
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.height
    }

    pub fn mid_x(&self) -> f64 {
        self.origin.x + self.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.origin.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.mid_x(), self.mid_y())
    }

    /// Scales origin and size by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(
            self.origin.x * factor,
            self.origin.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Translates this rectangle by the origin of `other`.
    pub fn shift_by(&self, other: &DisplayRectangle) -> Self {
        Self::new(
            self.origin.x + other.origin.x,
            self.origin.y + other.origin.y,
            self.width,
            self.height,
        )
    }
}
