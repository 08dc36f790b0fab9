//! Newtype IDs.
//!
//! `ClassId` is what lands in the first column of every label line; the
//! image and annotation IDs only exist in exported COCO JSON.

use serde::Serialize;
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Dense integer assigned to a class name by a
    /// [`CategoryMap`](super::CategoryMap).
    ClassId
);

id_newtype!(
    /// 1-based position of an image in exported COCO JSON.
    ImageId
);

id_newtype!(
    /// Running 1-based annotation number in exported COCO JSON.
    AnnotationId
);
