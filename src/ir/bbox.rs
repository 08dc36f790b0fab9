//! Axis-aligned boxes in top-left XYWH form.

use std::fmt;

use super::coord::Coord;
use super::space::{CoordSpace, Normalized, Pixel};

/// An axis-aligned box given by its top-left corner and its size.
///
/// This is the layout annotation tools and COCO use for `bbox`. Nothing
/// stops a box from having a negative size; the normalizer divides whatever
/// it is given.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYWH<TSpace> {
    pub origin: Coord<TSpace>,
    pub width: f64,
    pub height: f64,
}

impl<TSpace> BBoxXYWH<TSpace> {
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Coord::new(x, y),
            width,
            height,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.origin.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.origin.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Center point and size: `(cx, cy, w, h)`.
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (
            self.origin.x + self.width / 2.0,
            self.origin.y + self.height / 2.0,
            self.width,
            self.height,
        )
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.origin.x, self.origin.y, self.width, self.height]
    }

    /// Smallest box containing every point, or `None` for no points.
    pub fn enclosing(points: &[Coord<TSpace>]) -> Option<Self> {
        let first = points.first()?;
        let (mut xmin, mut ymin, mut xmax, mut ymax) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            xmin = xmin.min(point.x);
            ymin = ymin.min(point.y);
            xmax = xmax.max(point.x);
            ymax = ymax.max(point.y);
        }
        Some(Self::from_xywh(xmin, ymin, xmax - xmin, ymax - ymin))
    }
}

impl BBoxXYWH<Pixel> {
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYWH<Normalized> {
        BBoxXYWH {
            origin: self.origin.to_normalized(image_width, image_height),
            width: self.width / image_width,
            height: self.height / image_height,
        }
    }
}

impl<TSpace: CoordSpace> fmt::Debug for BBoxXYWH<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBoxXYWH")
            .field("space", &TSpace::NAME)
            .field("x", &self.origin.x)
            .field("y", &self.origin.y)
            .field("w", &self.width)
            .field("h", &self.height)
            .finish()
    }
}
