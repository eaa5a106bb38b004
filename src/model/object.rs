//! Object variants: the typed visual payload carried by an element.
//!
//! An element holds exactly one [`ObjectVariant`]. The variant is an explicit
//! enum tag; nothing in the crate infers the kind of an object from which
//! fields happen to be present.
//!
//! Each editable variant has a sparse patch type (`ShapePatch`, `TextPatch`,
//! `SpatialPatch`) used by the object-fields write group. Only present
//! fields are applied.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use serde::{Deserialize, Serialize};

use super::{FrameId, ModelId};
use crate::geometry::Vector3;

// =============================================================================
// BORDER
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderKind {
    #[default]
    None,
    Solid,
}

/// Outline drawn around any object variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub kind: BorderKind,
    pub color: String,
    pub thickness: f64,
}

impl Default for Border {
    fn default() -> Self {
        Self { kind: BorderKind::None, color: "#000000".to_owned(), thickness: 0.0 }
    }
}

// =============================================================================
// SHAPE / TEXT / IMAGE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeObject {
    /// SVG path data in the element's local box.
    pub path: String,
    pub fill_color: String,
    pub border: Border,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBoxObject {
    pub text: String,
    pub size: f64,
    pub weight: u16,
    pub font_family: String,
    pub align: TextAlign,
    pub border: Border,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub source_url: String,
    /// Bytes chosen locally that have not been uploaded yet.
    #[serde(skip)]
    pub pending_upload: Option<Vec<u8>>,
    pub border: Border,
}

// =============================================================================
// SPATIAL
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    Free,
    Orbit,
}

impl CameraMode {
    /// Name understood by the render host.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Orbit => "orbit",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraTransform {
    pub position: Vector3,
    pub rotation: Vector3,
}

/// Scene background: the host's skybox or a flat color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Background {
    #[default]
    Skybox,
    Color(String),
}

impl Background {
    pub const SKYBOX: &'static str = "skybox";

    /// Parse the wire form, where the literal `"skybox"` selects the skybox.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        if raw == Self::SKYBOX { Self::Skybox } else { Self::Color(raw.to_owned()) }
    }

    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Skybox => Self::SKYBOX.to_owned(),
            Self::Color(color) => color.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shader {
    #[default]
    None,
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self { position: Vector3::ZERO, rotation: Vector3::ZERO, scale: Vector3::ONE }
    }
}

/// A 3D asset placed inside a spatial scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub url: String,
    pub transform: ModelTransform,
    pub shader: Shader,
}

/// A named camera pose, the target of frame-transition animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    pub name: String,
    pub camera_transform: CameraTransform,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialObject {
    pub camera_mode: CameraMode,
    pub camera_transform: CameraTransform,
    pub models: Vec<Model>,
    pub frames: Vec<Frame>,
    pub background: Background,
    /// Model file chosen locally that has not been uploaded yet.
    #[serde(skip)]
    pub pending_model_upload: Option<Vec<u8>>,
    pub border: Border,
}

impl SpatialObject {
    #[must_use]
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn model_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.id == id)
    }

    #[must_use]
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }
}

// =============================================================================
// VARIANT
// =============================================================================

/// Discriminant of an [`ObjectVariant`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Shape,
    TextBox,
    Image,
    Spatial,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectVariant {
    Shape(ShapeObject),
    TextBox(TextBoxObject),
    Image(ImageObject),
    Spatial(SpatialObject),
    /// Placeholder for a remote object whose type could not be understood.
    Invalid,
}

impl ObjectVariant {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Shape(_) => ObjectKind::Shape,
            Self::TextBox(_) => ObjectKind::TextBox,
            Self::Image(_) => ObjectKind::Image,
            Self::Spatial(_) => ObjectKind::Spatial,
            Self::Invalid => ObjectKind::Invalid,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    #[must_use]
    pub fn border(&self) -> Option<&Border> {
        match self {
            Self::Shape(o) => Some(&o.border),
            Self::TextBox(o) => Some(&o.border),
            Self::Image(o) => Some(&o.border),
            Self::Spatial(o) => Some(&o.border),
            Self::Invalid => None,
        }
    }

    pub fn border_mut(&mut self) -> Option<&mut Border> {
        match self {
            Self::Shape(o) => Some(&mut o.border),
            Self::TextBox(o) => Some(&mut o.border),
            Self::Image(o) => Some(&mut o.border),
            Self::Spatial(o) => Some(&mut o.border),
            Self::Invalid => None,
        }
    }

    #[must_use]
    pub fn as_spatial(&self) -> Option<&SpatialObject> {
        match self {
            Self::Spatial(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_spatial_mut(&mut self) -> Option<&mut SpatialObject> {
        match self {
            Self::Spatial(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// PATCHES
// =============================================================================

/// Sparse update for a shape's own fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub path: Option<String>,
    pub fill_color: Option<String>,
}

impl ShapePatch {
    pub fn apply(&self, shape: &mut ShapeObject) {
        if let Some(path) = &self.path {
            shape.path.clone_from(path);
        }
        if let Some(color) = &self.fill_color {
            shape.fill_color.clone_from(color);
        }
    }
}

/// Sparse update for a text box's content and style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPatch {
    pub text: Option<String>,
    pub size: Option<f64>,
    pub weight: Option<u16>,
    pub font_family: Option<String>,
    pub align: Option<TextAlign>,
}

impl TextPatch {
    pub fn apply(&self, text_box: &mut TextBoxObject) {
        if let Some(text) = &self.text {
            text_box.text.clone_from(text);
        }
        if let Some(size) = self.size {
            text_box.size = size;
        }
        if let Some(weight) = self.weight {
            text_box.weight = weight;
        }
        if let Some(family) = &self.font_family {
            text_box.font_family.clone_from(family);
        }
        if let Some(align) = self.align {
            text_box.align = align;
        }
    }
}

/// Sparse update for a spatial scene's camera and background.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialPatch {
    pub camera_mode: Option<CameraMode>,
    pub camera_transform: Option<CameraTransform>,
    pub background: Option<Background>,
}

impl SpatialPatch {
    pub fn apply(&self, spatial: &mut SpatialObject) {
        if let Some(mode) = self.camera_mode {
            spatial.camera_mode = mode;
        }
        if let Some(transform) = self.camera_transform {
            spatial.camera_transform = transform;
        }
        if let Some(background) = &self.background {
            spatial.background = background.clone();
        }
    }
}
