//! Deterministic class-name → id assignment.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::ClassId;
use super::model::AnnotationCollection;

/// First id handed out by a [`CategoryMap`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IdBase {
    /// `0..N`, the convention of YOLO label files.
    #[default]
    Zero,
    /// `1..=N`, the convention of COCO category lists.
    One,
}

impl IdBase {
    #[inline]
    pub fn offset(self) -> u64 {
        match self {
            IdBase::Zero => 0,
            IdBase::One => 1,
        }
    }
}

impl TryFrom<u8> for IdBase {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IdBase::Zero),
            1 => Ok(IdBase::One),
            other => Err(format!("id_base must be 0 or 1, got {other}")),
        }
    }
}

impl From<IdBase> for u8 {
    fn from(base: IdBase) -> Self {
        base.offset() as u8
    }
}

/// Class names sorted by byte order, numbered from an [`IdBase`].
///
/// Built fresh for every conversion call from the collection being
/// converted, so the same document always yields the same ids no matter
/// how its images are ordered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryMap {
    ids: BTreeMap<String, ClassId>,
}

impl CategoryMap {
    /// Collects every distinct class name in `collection` and numbers them.
    pub fn from_collection(collection: &AnnotationCollection, base: IdBase) -> Self {
        Self::from_names(collection.class_names(), base)
    }

    pub fn from_names<I, S>(names: I, base: IdBase) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let ids = distinct
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name, ClassId::new(index as u64 + base.offset())))
            .collect();
        Self { ids }
    }

    pub fn id_of(&self, class_name: &str) -> Option<ClassId> {
        self.ids.get(class_name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Names in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    /// `(name, id)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ClassId)> {
        self.ids.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl fmt::Display for CategoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, id)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", name, id)?;
        }
        write!(f, "}}")
    }
}
