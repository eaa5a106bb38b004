//! Design document: ordered slides, the current-slide cursor, and metadata.
//!
//! The document always holds at least one slide and `selected_slide_index`
//! always points at one of them. Every navigation mutator keeps both true.

#[cfg(test)]
#[path = "design_test.rs"]
mod design_test;

use std::collections::HashMap;

use super::element::Element;
use super::slide::Slide;
use super::{DesignId, ElementId, SlideId};
use crate::error::{DeckError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct DesignDocument {
    pub id: DesignId,
    pub title: String,
    pub shared: bool,
    pub published_as_post: bool,
    slides: Vec<Slide>,
    selected_slide_index: usize,
    /// Downloaded image and model content keyed by source url.
    assets: HashMap<String, Vec<u8>>,
}

impl DesignDocument {
    /// Create a document. An empty `slides` list is replaced by one blank
    /// slide with id `0`, which the caller must persist before editing.
    #[must_use]
    pub fn new(id: DesignId, title: impl Into<String>, mut slides: Vec<Slide>) -> Self {
        if slides.is_empty() {
            slides.push(Slide::new(0));
        }
        Self {
            id,
            title: title.into(),
            shared: false,
            published_as_post: false,
            slides,
            selected_slide_index: 0,
            assets: HashMap::new(),
        }
    }

    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    #[must_use]
    pub fn slide_index_of(&self, id: SlideId) -> Option<usize> {
        self.slides.iter().position(|s| s.id == id)
    }

    #[must_use]
    pub fn selected_slide_index(&self) -> usize {
        self.selected_slide_index
    }

    #[must_use]
    pub fn current_slide(&self) -> &Slide {
        &self.slides[self.selected_slide_index]
    }

    pub fn current_slide_mut(&mut self) -> &mut Slide {
        &mut self.slides[self.selected_slide_index]
    }

    /// Find an element anywhere in the document.
    #[must_use]
    pub fn find_element(&self, id: ElementId) -> Option<(usize, &Element)> {
        self.slides
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.element(id).map(|e| (i, e)))
    }

    pub fn find_element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.slides.iter_mut().find_map(|s| s.element_mut(id))
    }

    /// Check that `index` names an existing slide.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` otherwise.
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.slides.len() {
            Ok(())
        } else {
            Err(DeckError::SlideIndexOutOfRange { index, len: self.slides.len() })
        }
    }

    /// Move the cursor.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` if `index` is past the end.
    pub fn select_slide(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.selected_slide_index = index;
        Ok(())
    }

    /// Append a slide and select it.
    pub fn push_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
        self.selected_slide_index = self.slides.len() - 1;
    }

    /// Insert a slide directly after `after` and select it.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` if `after` is past the end.
    pub fn insert_slide(&mut self, after: usize, slide: Slide) -> Result<()> {
        self.check_index(after)?;
        self.slides.insert(after + 1, slide);
        self.selected_slide_index = after + 1;
        Ok(())
    }

    /// Remove a slide, keeping the cursor on the same slide when possible and
    /// clamping it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `LastSlide` when only one slide remains and
    /// `SlideIndexOutOfRange` for a bad index.
    pub fn remove_slide(&mut self, index: usize) -> Result<Slide> {
        self.check_index(index)?;
        if self.slides.len() <= 1 {
            return Err(DeckError::LastSlide);
        }
        let removed = self.slides.remove(index);
        if index < self.selected_slide_index {
            self.selected_slide_index -= 1;
        }
        self.selected_slide_index = self.selected_slide_index.min(self.slides.len() - 1);
        Ok(removed)
    }

    /// Move a slide to a new position; the cursor follows the selected slide.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` if either index is past the end.
    pub fn move_slide(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let selected_id = self.current_slide().id;
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        self.selected_slide_index = self.slide_index_of(selected_id).unwrap_or(to);
        Ok(())
    }

    /// Slide ids in presentation order.
    #[must_use]
    pub fn slide_order(&self) -> Vec<SlideId> {
        self.slides.iter().map(|s| s.id).collect()
    }

    #[must_use]
    pub fn asset(&self, url: &str) -> Option<&[u8]> {
        self.assets.get(url).map(Vec::as_slice)
    }

    pub fn store_asset(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(url.into(), bytes);
    }
}
