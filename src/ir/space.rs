//! Coordinate space markers.
//!
//! Annotation JSON carries absolute pixel values; label files carry values
//! divided by the image size. The markers keep the two apart at the type
//! level so a pixel coordinate is never written where a normalized one is
//! expected.

/// A coordinate space a [`Coord`](super::Coord) can live in.
pub trait CoordSpace {
    /// Short name used in `Debug` output.
    const NAME: &'static str;
}

/// Absolute pixel units, top-left origin.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Pixel {}

/// Pixel values divided by the image width/height.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Normalized {}

impl CoordSpace for Pixel {
    const NAME: &'static str = "px";
}

impl CoordSpace for Normalized {
    const NAME: &'static str = "norm";
}
