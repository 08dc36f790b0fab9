//! Segmentation polygons.

use std::fmt;

use super::bbox::BBoxXYWH;
use super::coord::Coord;
use super::space::{CoordSpace, Normalized, Pixel};

/// An ordered ring of vertices.
#[derive(Clone, PartialEq)]
pub struct Polygon<TSpace> {
    pub points: Vec<Coord<TSpace>>,
}

impl<TSpace> Polygon<TSpace> {
    pub fn new(points: Vec<Coord<TSpace>>) -> Self {
        Self { points }
    }

    /// Builds a polygon from alternating `x, y` values.
    ///
    /// Fails with a short description when the sequence is empty or has
    /// odd length.
    pub fn from_flat(values: &[f64]) -> Result<Self, String> {
        if values.is_empty() {
            return Err("segmentation has no points".to_string());
        }
        if values.len() % 2 != 0 {
            return Err(format!(
                "segmentation has odd length {} (expected x,y pairs)",
                values.len()
            ));
        }
        let points = values
            .chunks_exact(2)
            .map(|pair| Coord::new(pair[0], pair[1]))
            .collect();
        Ok(Self::new(points))
    }

    /// Flat `x, y, x, y, ...` layout, as COCO stores it.
    pub fn to_flat(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BBoxXYWH<TSpace>> {
        BBoxXYWH::enclosing(&self.points)
    }

    /// Enclosed area by the shoelace formula. Fewer than three points give 0.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let (a, b) = (&self.points[i], &self.points[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }
}

impl<TSpace: CoordSpace> fmt::Debug for Polygon<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polygon")
            .field("space", &TSpace::NAME)
            .field("points", &self.points)
            .finish()
    }
}

impl Polygon<Pixel> {
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> Polygon<Normalized> {
        Polygon {
            points: self
                .points
                .iter()
                .map(|p| p.to_normalized(image_width, image_height))
                .collect(),
        }
    }
}
