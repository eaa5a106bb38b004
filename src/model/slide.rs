//! Slide aggregate: z-ordered elements, their animations, and a thumbnail.
//!
//! INVARIANTS
//! ==========
//! - `elements` is sorted ascending by `z` and no two elements share a `z`.
//! - every animation targets an element present in `elements`.
//!
//! Mutators keep both invariants; [`Slide::from_parts`] restores them for
//! data arriving from the server.

#[cfg(test)]
#[path = "slide_test.rs"]
mod slide_test;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::element::Element;
use super::object::Frame;
use super::{AnimationId, ElementId, SlideId};

// =============================================================================
// THUMBNAIL
// =============================================================================

/// Cached rendering of a slide, kept as raw image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail(pub Vec<u8>);

impl Thumbnail {
    /// Decode the base64 form the server sends inline.
    ///
    /// # Errors
    ///
    /// Returns a decode error if `encoded` is not valid base64.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded.trim()).map(Self)
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// `data:` URI suitable for inline display.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

// =============================================================================
// ANIMATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Appear,
    Disappear,
    FrameTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timing {
    OnClick,
    WithPrevious,
    AfterPrevious,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub id: AnimationId,
    pub target: ElementId,
    pub effect: Effect,
    pub timing: Timing,
    pub duration_ms: u32,
    /// Camera pose to move to; only meaningful for `FrameTransition`.
    pub frame: Option<Frame>,
}

/// An animation awaiting a server id.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDraft {
    pub target: ElementId,
    pub effect: Effect,
    pub timing: Timing,
    pub duration_ms: u32,
    pub frame: Option<Frame>,
}

impl AnimationDraft {
    #[must_use]
    pub fn into_animation(self, id: AnimationId) -> Animation {
        Animation {
            id,
            target: self.target,
            effect: self.effect,
            timing: self.timing,
            duration_ms: self.duration_ms,
            frame: self.frame,
        }
    }
}

// =============================================================================
// SLIDE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: SlideId,
    pub thumbnail: Option<Thumbnail>,
    pub(crate) elements: Vec<Element>,
    pub(crate) animations: Vec<Animation>,
}

impl Slide {
    #[must_use]
    pub fn new(id: SlideId) -> Self {
        Self { id, thumbnail: None, elements: Vec::new(), animations: Vec::new() }
    }

    /// Build a slide from loosely ordered parts.
    ///
    /// Elements are sorted by `(z, id)`; a `z` that collides with its
    /// predecessor is bumped to the next free value. Animations whose target
    /// is missing are dropped.
    #[must_use]
    pub fn from_parts(
        id: SlideId,
        thumbnail: Option<Thumbnail>,
        mut elements: Vec<Element>,
        animations: Vec<Animation>,
    ) -> Self {
        elements.sort_by(|a, b| a.z.cmp(&b.z).then_with(|| a.id.cmp(&b.id)));
        for i in 1..elements.len() {
            let floor = elements[i - 1].z + 1;
            if elements[i].z < floor {
                warn!(slide_id = id, element_id = elements[i].id, z = elements[i].z, "duplicate z; renumbering");
                elements[i].z = floor;
            }
        }

        let (animations, dangling): (Vec<_>, Vec<_>) = animations
            .into_iter()
            .partition(|a| elements.iter().any(|e| e.id == a.target));
        for a in dangling {
            warn!(slide_id = id, animation_id = a.id, target_id = a.target, "dropping animation with missing target");
        }

        Self { id, thumbnail, elements, animations }
    }

    /// Elements in draw order (ascending z).
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    #[must_use]
    pub fn min_z(&self) -> i64 {
        self.elements.first().map_or(0, |e| e.z)
    }

    #[must_use]
    pub fn max_z(&self) -> i64 {
        self.elements.last().map_or(0, |e| e.z)
    }

    /// Stacking slot for a newly created element: above everything else.
    #[must_use]
    pub fn next_z(&self) -> i64 {
        if self.elements.is_empty() { 0 } else { self.max_z() + 1 }
    }

    /// Insert at the array position matching `element.z`.
    ///
    /// If the z is already taken the element goes on top instead.
    pub fn insert_element(&mut self, mut element: Element) {
        if self.elements.iter().any(|e| e.z == element.z) {
            element.z = self.next_z();
        }
        let at = self.elements.partition_point(|e| e.z < element.z);
        self.elements.insert(at, element);
    }

    /// Remove an element together with every animation that targets it.
    pub fn remove_element(&mut self, id: ElementId) -> Option<(Element, Vec<Animation>)> {
        let index = self.index_of(id)?;
        let element = self.elements.remove(index);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.animations)
            .into_iter()
            .partition(|a| a.target == id);
        self.animations = kept;
        Some((element, removed))
    }

    #[must_use]
    pub fn animation(&self, id: AnimationId) -> Option<&Animation> {
        self.animations.iter().find(|a| a.id == id)
    }

    /// Append an animation. Returns false, leaving the slide unchanged, when
    /// its target is not on this slide.
    pub fn push_animation(&mut self, animation: Animation) -> bool {
        if self.element(animation.target).is_none() {
            return false;
        }
        self.animations.push(animation);
        true
    }

    pub fn remove_animation(&mut self, id: AnimationId) -> Option<Animation> {
        let index = self.animations.iter().position(|a| a.id == id)?;
        Some(self.animations.remove(index))
    }

    /// True when elements are strictly ascending by z.
    #[must_use]
    pub fn is_z_ordered(&self) -> bool {
        self.elements.windows(2).all(|w| w[0].z < w[1].z)
    }
}
