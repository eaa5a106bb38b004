//! Element entity: a positioned, sized, rotated, z-ordered object.

#[cfg(test)]
#[path = "element_test.rs"]
mod element_test;

use serde::{Deserialize, Serialize};

use super::ElementId;
use super::object::{Border, ObjectVariant};
use crate::geometry::Vector2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// Top-left corner in slide coordinates.
    pub position: Vector2,
    /// Rotation around the box center, in radians.
    pub rotation: f64,
    pub size: Vector2,
    /// Stacking order within the slide; unique per slide.
    pub z: i64,
    pub object: ObjectVariant,
}

impl Element {
    /// Same entity, regardless of payload or position in any array.
    #[must_use]
    pub fn same_entity(&self, other: &Self) -> bool {
        self.id == other.id
    }

    #[must_use]
    pub fn center(&self) -> Vector2 {
        self.position + self.size / 2.0
    }

    /// Apply a transform-group patch. Returns true when anything changed.
    pub fn apply_transform(&mut self, patch: &TransformPatch) -> bool {
        let before = (self.position, self.rotation, self.size, self.z, self.object.border().cloned());
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(z) = patch.z {
            self.z = z;
        }
        if let Some(border) = &patch.border {
            if let Some(current) = self.object.border_mut() {
                current.clone_from(border);
            }
        }
        before != (self.position, self.rotation, self.size, self.z, self.object.border().cloned())
    }
}

/// Sparse update for the element transform write group
/// (position, rotation, size, z, border).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformPatch {
    pub position: Option<Vector2>,
    pub rotation: Option<f64>,
    pub size: Option<Vector2>,
    pub z: Option<i64>,
    pub border: Option<Border>,
}

impl TransformPatch {
    #[must_use]
    pub fn position(position: Vector2) -> Self {
        Self { position: Some(position), ..Self::default() }
    }

    #[must_use]
    pub fn rotation(rotation: f64) -> Self {
        Self { rotation: Some(rotation), ..Self::default() }
    }

    #[must_use]
    pub fn size(size: Vector2) -> Self {
        Self { size: Some(size), ..Self::default() }
    }

    #[must_use]
    pub fn border(border: Border) -> Self {
        Self { border: Some(border), ..Self::default() }
    }
}

/// An element the user asked for that the server has not assigned an id to yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDraft {
    pub position: Vector2,
    pub rotation: f64,
    pub size: Vector2,
    pub object: ObjectVariant,
}

impl ElementDraft {
    #[must_use]
    pub fn new(position: Vector2, size: Vector2, object: ObjectVariant) -> Self {
        Self { position, rotation: 0.0, size, object }
    }

    /// Attach the durable id and stacking slot returned by the server.
    #[must_use]
    pub fn into_element(self, id: ElementId, z: i64) -> Element {
        Element { id, position: self.position, rotation: self.rotation, size: self.size, z, object: self.object }
    }
}
