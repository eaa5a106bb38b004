//! Selection set: elements of the current slide under manipulation.
//!
//! The selection stores element ids only; the elements themselves are looked
//! up in the current slide on demand. Every mutator reports whether the set
//! actually changed so the sync engine knows when to flush pending writes.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use super::ElementId;
use super::element::Element;
use super::slide::Slide;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    /// Add an element. Returns false if it was already selected.
    pub fn select(&mut self, id: ElementId) -> bool {
        if self.is_selected(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove an element. Returns false if it was not selected.
    pub fn deselect(&mut self, id: ElementId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| *selected != id);
        self.ids.len() != before
    }

    /// Clear the set. Returns false if it was already empty.
    pub fn deselect_all(&mut self) -> bool {
        if self.ids.is_empty() {
            return false;
        }
        self.ids.clear();
        true
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resolve the selection against `slide`, skipping ids it does not contain.
    #[must_use]
    pub fn elements<'a>(&self, slide: &'a Slide) -> Vec<&'a Element> {
        self.ids.iter().filter_map(|id| slide.element(*id)).collect()
    }
}
