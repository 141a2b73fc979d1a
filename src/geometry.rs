//! Geometric primitives shared by candidates and constraint arguments
//!
//! Coordinates follow screen conventions: x grows to the right and y grows
//! downward, so the "top" of a box is its smallest y.

/// A 2D point in the sketch coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An ordered run of sampled pen points
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stroke {
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build a stroke from `(x, y)` pairs
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().copied())
    }
}

/// A bounding box representing the spatial extent of a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized bounding box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Smallest box containing every point, or `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let start = BoundingBox::new(first.x, first.y, 0.0, 0.0);
        Some(iter.fold(start, |bb, p| bb.expand_to_include(p)))
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn top_center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y)
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.y)
    }

    pub fn center_left(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }

    pub fn center_right(&self) -> Point {
        Point::new(self.right(), self.y + self.height / 2.0)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.x, self.bottom())
    }

    pub fn bottom_center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.bottom())
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f64 {
        (self.width.powi(2) + self.height.powi(2)).sqrt()
    }

    /// Check if this bounding box contains a point
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Compute the union of two bounding boxes (smallest box containing both)
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }

    /// Expand this bounding box to include a point
    pub fn expand_to_include(&self, point: Point) -> BoundingBox {
        let x = self.x.min(point.x);
        let y = self.y.min(point.y);
        let right = self.right().max(point.x);
        let bottom = self.bottom().max(point.y);
        BoundingBox::new(x, y, right - x, bottom - y)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_covers_all() {
        let bb = BoundingBox::from_points(vec![
            Point::new(3.0, 4.0),
            Point::new(-1.0, 10.0),
            Point::new(5.0, 0.0),
        ])
        .unwrap();
        assert_eq!(bb, BoundingBox::new(-1.0, 0.0, 6.0, 10.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_named_points_use_screen_orientation() {
        let bb = BoundingBox::new(0.0, 0.0, 10.0, 20.0);
        assert_eq!(bb.top_left(), Point::new(0.0, 0.0));
        assert_eq!(bb.bottom_right(), Point::new(10.0, 20.0));
        assert_eq!(bb.center(), Point::new(5.0, 10.0));
        assert_eq!(bb.center_left(), Point::new(0.0, 10.0));
        assert_eq!(bb.bottom_center(), Point::new(5.0, 20.0));
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 15.0, 15.0));
    }

    #[test]
    fn test_stroke_endpoints() {
        let stroke = Stroke::from_coords(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        assert_eq!(stroke.first_point(), Some(Point::new(0.0, 0.0)));
        assert_eq!(stroke.last_point(), Some(Point::new(2.0, 0.0)));
        assert!(Stroke::default().first_point().is_none());
    }

    #[test]
    fn test_distance() {
        assert_eq!(Point::new(0.0, 0.0).distance(&Point::new(3.0, 4.0)), 5.0);
    }
}
