//! Page-space geometry.
//!
//! Points and rectangles are in page space as MuPDF reports it: origin at
//! the top-left corner of the page, x to the right, y down. [`Matrix`] is a
//! PDF content-stream transform and works in PDF user space.

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Creates a rectangle from two corners in any order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Smallest rectangle containing all `points`, or `None` for no points.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            rect.x0 = rect.x0.min(p.x);
            rect.y0 = rect.y0.min(p.y);
            rect.x1 = rect.x1.max(p.x);
            rect.y1 = rect.y1.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(
            self.x0 - margin,
            self.y0 - margin,
            self.x1 + margin,
            self.y1 + margin,
        )
    }

    pub fn union(&self, other: &Rect) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }
}

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Returns `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x * self.a + p.y * self.c + self.e,
            p.x * self.b + p.y * self.d + self.f,
        )
    }

    /// Bounding box of `rect` after transformation.
    pub fn apply_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x1, rect.y1),
        ];
        Rect::bounding(corners.into_iter().map(|p| self.apply(p))).unwrap_or(*rect)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(10.0, 20.0, 5.0, 2.0);
        assert_eq!(r, Rect::new(5.0, 2.0, 10.0, 20.0));
        assert!(r.x0 <= r.x1 && r.y0 <= r.y1);
    }

    #[test]
    fn test_expand_by_margin() {
        let r = Rect::new(50.0, 700.0, 300.0, 715.0).expand(3.0);
        assert_eq!(r, Rect::new(47.0, 697.0, 303.0, 718.0));
    }

    #[test]
    fn test_matrix_concatenation_order() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translate(10.0, 5.0);
        let p = scale.then(&shift).apply(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 7.0));
    }

    #[test]
    fn test_apply_rect_under_translation() {
        let m = Matrix::translate(100.0, 200.0);
        let r = m.apply_rect(&Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(r, Rect::new(100.0, 200.0, 110.0, 210.0));
    }
}
