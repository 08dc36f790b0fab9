//! Typed representation of annotation documents.
//!
//! Raw JSON is parsed once, at the boundary, into the types here. Later
//! stages work on checked geometry and never inspect untyped fields.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: marker types keep pixel and normalized coordinates
//!    apart, and class ids are a newtype rather than a bare integer.
//!
//! 2. **Skip, don't fail**: a malformed annotation is kept as an
//!    [`AnnotationEntry::Skipped`] with its reason, so one bad entry never
//!    costs the rest of the image.
//!
//! 3. **Deterministic ids**: [`CategoryMap`] numbers class names in sorted
//!    order, independent of the order images appear in.
//!
//! # Example
//!
//! ```
//! use labelprep::ir::{Annotation, AnnotationCollection, CategoryMap, IdBase, ImageRecord};
//!
//! let collection = AnnotationCollection::new(vec![ImageRecord::new("tile_001.tif")
//!     .with_size(640, 480)
//!     .with_annotation(Annotation::bbox("lot", 10.0, 20.0, 100.0, 50.0))]);
//!
//! let map = CategoryMap::from_collection(&collection, IdBase::Zero);
//! assert_eq!(map.id_of("lot").map(|id| id.as_u64()), Some(0));
//! ```

mod bbox;
mod category_map;
mod coord;
mod ids;
pub mod io_annotations;
pub mod io_coco_json;
mod model;
mod polygon;
mod space;

pub use bbox::BBoxXYWH;
pub use category_map::{CategoryMap, IdBase};
pub use coord::Coord;
pub use ids::{AnnotationId, ClassId, ImageId};
pub use model::{
    Annotation, AnnotationCollection, AnnotationEntry, Geometry, ImageRecord, SkipReason,
};
pub use polygon::Polygon;
pub use space::{CoordSpace, Normalized, Pixel};
