//! Design document model: slides, elements, object variants, animations.
//!
//! ARCHITECTURE
//! ============
//! Everything here is plain owned data with accessor/mutator methods and no
//! I/O. The sync engine owns one [`DesignDocument`] plus a [`Selection`] and
//! is the only writer; renderers and tests read through the accessors.
//!
//! Identifiers are server-assigned integers. An entity is inserted into the
//! model only after the remote store has returned its durable id.

pub mod design;
pub mod element;
pub mod object;
pub mod selection;
pub mod slide;

pub use design::DesignDocument;
pub use element::{Element, ElementDraft, TransformPatch};
pub use object::{
    Background, Border, BorderKind, CameraMode, CameraTransform, Frame, ImageObject, Model, ModelTransform,
    ObjectKind, ObjectVariant, Shader, ShapeObject, ShapePatch, SpatialObject, SpatialPatch, TextAlign,
    TextBoxObject, TextPatch,
};
pub use selection::Selection;
pub use slide::{Animation, AnimationDraft, Effect, Slide, Thumbnail, Timing};

pub type DesignId = i64;
pub type SlideId = i64;
pub type ElementId = i64;
pub type AnimationId = i64;
pub type ModelId = i64;
pub type FrameId = i64;
pub type UserId = i64;
