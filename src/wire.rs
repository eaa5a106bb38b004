//! Wire format for the persistence API and conversion to/from the model.
//!
//! DESIGN
//! ======
//! Object payloads are tagged on the wire by an explicit uppercase `type`
//! field (`SHAPE`, `TEXTBOX`, `IMAGE`, `SPATIAL`) and map one-to-one onto
//! [`ObjectVariant`]. A tag this client does not know deserializes to
//! [`ObjectDto::Unknown`] and becomes [`ObjectVariant::Invalid`].
//!
//! Elements are parsed one at a time from raw JSON values
//! ([`element_from_value`]) so a single malformed element cannot fail the
//! slide that contains it.

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::{Vector2, Vector3};
use crate::model::{
    AnimationId, Background, Border, BorderKind, CameraMode, CameraTransform, DesignId, Effect, Element, ElementId,
    Frame, FrameId, ImageObject, Model, ModelId, ModelTransform, ObjectVariant, Shader, ShapeObject, SlideId,
    SpatialObject, TextAlign, TextBoxObject, Timing, UserId,
};

// =============================================================================
// OBJECT PAYLOADS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BorderTypeDto {
    None,
    Solid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderDto {
    pub border_type: BorderTypeDto,
    pub border_color: String,
    pub border_thickness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeDto {
    pub path: String,
    pub color: String,
    #[serde(flatten)]
    pub border: BorderDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlignDto {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBoxDto {
    pub text: String,
    pub size: f64,
    pub weight: u16,
    pub font_family: String,
    pub align: AlignDto,
    #[serde(flatten)]
    pub border: BorderDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDto {
    pub url: String,
    #[serde(flatten)]
    pub border: BorderDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CameraModeDto {
    Free,
    Orbit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransformDto {
    pub position: Vector3,
    pub rotation: Vector3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShaderDto {
    None,
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDto {
    pub id: ModelId,
    pub name: String,
    pub url: String,
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
    pub shader: ShaderDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialDto {
    pub camera_mode: CameraModeDto,
    pub camera_transform: CameraTransformDto,
    pub background_color: String,
    #[serde(default)]
    pub models: Vec<ModelDto>,
    #[serde(flatten)]
    pub border: BorderDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDto {
    pub id: FrameId,
    pub name: String,
    pub camera_transform: CameraTransformDto,
}

/// Object payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectDto {
    #[serde(rename = "SHAPE")]
    Shape(ShapeDto),
    #[serde(rename = "TEXTBOX")]
    TextBox(TextBoxDto),
    #[serde(rename = "IMAGE")]
    Image(ImageDto),
    #[serde(rename = "SPATIAL")]
    Spatial(SpatialDto),
    #[serde(other)]
    Unknown,
}

// =============================================================================
// ELEMENTS / SLIDES / DESIGNS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDto {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub z: i64,
    #[serde(flatten)]
    pub object: ObjectDto,
}

/// Geometry-only view of an element, used to salvage an element whose
/// payload failed to parse.
#[derive(Debug, Deserialize)]
struct ElementHeaderDto {
    id: ElementId,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    z: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDto {
    pub id: SlideId,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Raw element payloads; parsed individually.
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDto {
    pub id: DesignId,
    pub name: String,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub slides: Vec<SlideDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectDto {
    Appear,
    Disappear,
    FrameTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimingDto {
    OnClick,
    WithPrevious,
    AfterPrevious,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDto {
    pub id: AnimationId,
    pub element_id: ElementId,
    pub effect: EffectDto,
    pub timing: TimingDto,
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub jwt_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub id: UserId,
    pub name: String,
    pub email: String,
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlideRequest {
    pub user_id: UserId,
    pub design_id: DesignId,
    /// Position of the new slide in the design.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSlideRequest {
    pub user_id: UserId,
    pub slide_id: SlideId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSlidesRequest {
    pub user_id: UserId,
    pub slide_ids: Vec<SlideId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameDesignRequest {
    pub user_id: UserId,
    pub design_id: DesignId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDesignRequest {
    pub user_id: UserId,
    pub design_id: DesignId,
    pub shared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostRequest {
    pub user_id: UserId,
    pub design_id: DesignId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElementRequest {
    pub user_id: UserId,
    pub slide_id: SlideId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub z: i64,
    #[serde(flatten)]
    pub object: ObjectDto,
}

/// Transform write group: geometry, stacking, and border.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElementRequest {
    pub user_id: UserId,
    pub element_id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub z: i64,
    #[serde(flatten)]
    pub border: BorderDto,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteElementRequest {
    pub user_id: UserId,
    pub element_id: ElementId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShapeRequest {
    pub user_id: UserId,
    pub element_id: ElementId,
    pub path: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextBoxRequest {
    pub user_id: UserId,
    pub element_id: ElementId,
    pub text: String,
    pub size: f64,
    pub weight: u16,
    pub font_family: String,
    pub align: AlignDto,
}

/// Sent as multipart form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpatialRequest {
    pub user_id: UserId,
    pub element_id: ElementId,
    pub camera_mode: CameraModeDto,
    pub camera_transform: CameraTransformDto,
    pub background_color: String,
}

/// Sent as multipart; `file` is the raw image.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadImageRequest {
    pub user_id: UserId,
    pub element_id: ElementId,
    pub file: Vec<u8>,
}

/// Sent as multipart; `file` is the raw model.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateModelRequest {
    pub user_id: UserId,
    pub spatial_id: ElementId,
    pub name: String,
    pub file: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelRequest {
    pub user_id: UserId,
    pub model_id: ModelId,
    pub position: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
    pub shader: ShaderDto,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnimationRequest {
    pub user_id: UserId,
    pub slide_id: SlideId,
    pub element_id: ElementId,
    pub effect: EffectDto,
    pub timing: TimingDto,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAnimationRequest {
    pub user_id: UserId,
    pub animation_id: AnimationId,
}

/// Thumbnail owner for the multipart thumbnail endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailTarget {
    Design(DesignId),
    Slide(SlideId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadThumbnailRequest {
    pub user_id: UserId,
    pub target: ThumbnailTarget,
    pub file: Vec<u8>,
}

// =============================================================================
// CONVERSIONS: WIRE -> MODEL
// =============================================================================

impl From<&BorderDto> for Border {
    fn from(dto: &BorderDto) -> Self {
        Self {
            kind: match dto.border_type {
                BorderTypeDto::None => BorderKind::None,
                BorderTypeDto::Solid => BorderKind::Solid,
            },
            color: dto.border_color.clone(),
            thickness: dto.border_thickness,
        }
    }
}

impl From<AlignDto> for TextAlign {
    fn from(dto: AlignDto) -> Self {
        match dto {
            AlignDto::Left => Self::Left,
            AlignDto::Center => Self::Center,
            AlignDto::Right => Self::Right,
            AlignDto::Justify => Self::Justify,
        }
    }
}

impl From<CameraModeDto> for CameraMode {
    fn from(dto: CameraModeDto) -> Self {
        match dto {
            CameraModeDto::Free => Self::Free,
            CameraModeDto::Orbit => Self::Orbit,
        }
    }
}

impl From<CameraTransformDto> for CameraTransform {
    fn from(dto: CameraTransformDto) -> Self {
        Self { position: dto.position, rotation: dto.rotation }
    }
}

impl From<ShaderDto> for Shader {
    fn from(dto: ShaderDto) -> Self {
        match dto {
            ShaderDto::None => Self::None,
            ShaderDto::Highlight => Self::Highlight,
        }
    }
}

impl From<&ModelDto> for Model {
    fn from(dto: &ModelDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.clone(),
            url: dto.url.clone(),
            transform: ModelTransform { position: dto.position, rotation: dto.rotation, scale: dto.scale },
            shader: dto.shader.into(),
        }
    }
}

impl From<&FrameDto> for Frame {
    fn from(dto: &FrameDto) -> Self {
        Self { id: dto.id, name: dto.name.clone(), camera_transform: dto.camera_transform.into() }
    }
}

impl From<EffectDto> for Effect {
    fn from(dto: EffectDto) -> Self {
        match dto {
            EffectDto::Appear => Self::Appear,
            EffectDto::Disappear => Self::Disappear,
            EffectDto::FrameTransition => Self::FrameTransition,
        }
    }
}

impl From<TimingDto> for Timing {
    fn from(dto: TimingDto) -> Self {
        match dto {
            TimingDto::OnClick => Self::OnClick,
            TimingDto::WithPrevious => Self::WithPrevious,
            TimingDto::AfterPrevious => Self::AfterPrevious,
        }
    }
}

impl From<&ObjectDto> for ObjectVariant {
    fn from(dto: &ObjectDto) -> Self {
        match dto {
            ObjectDto::Shape(s) => Self::Shape(ShapeObject {
                path: s.path.clone(),
                fill_color: s.color.clone(),
                border: (&s.border).into(),
            }),
            ObjectDto::TextBox(t) => Self::TextBox(TextBoxObject {
                text: t.text.clone(),
                size: t.size,
                weight: t.weight,
                font_family: t.font_family.clone(),
                align: t.align.into(),
                border: (&t.border).into(),
            }),
            ObjectDto::Image(i) => Self::Image(ImageObject {
                source_url: i.url.clone(),
                pending_upload: None,
                border: (&i.border).into(),
            }),
            ObjectDto::Spatial(s) => Self::Spatial(SpatialObject {
                camera_mode: s.camera_mode.into(),
                camera_transform: s.camera_transform.into(),
                models: s.models.iter().map(Model::from).collect(),
                frames: Vec::new(),
                background: Background::from_wire(&s.background_color),
                pending_model_upload: None,
                border: (&s.border).into(),
            }),
            ObjectDto::Unknown => Self::Invalid,
        }
    }
}

impl From<&ElementDto> for Element {
    fn from(dto: &ElementDto) -> Self {
        Self {
            id: dto.id,
            position: Vector2::new(dto.x, dto.y),
            rotation: dto.rotation,
            size: Vector2::new(dto.width, dto.height),
            z: dto.z,
            object: (&dto.object).into(),
        }
    }
}

/// Parse one element without letting a bad payload escape.
///
/// - well-formed, known type: the element
/// - unknown type code or malformed payload with usable geometry: the element
///   with an [`ObjectVariant::Invalid`] payload
/// - nothing usable (no id): `None`
#[must_use]
pub fn element_from_value(value: &serde_json::Value) -> Option<Element> {
    match ElementDto::deserialize(value) {
        Ok(dto) => {
            if dto.object == ObjectDto::Unknown {
                let code = value.get("type").and_then(serde_json::Value::as_str).unwrap_or("<missing>");
                warn!(element_id = dto.id, type_code = code, "unrecognized element type");
            }
            Some(Element::from(&dto))
        }
        Err(e) => match ElementHeaderDto::deserialize(value) {
            Ok(header) => {
                warn!(element_id = header.id, error = %e, "malformed element payload");
                Some(Element {
                    id: header.id,
                    position: Vector2::new(header.x, header.y),
                    rotation: header.rotation,
                    size: Vector2::new(header.width, header.height),
                    z: header.z,
                    object: ObjectVariant::Invalid,
                })
            }
            Err(_) => {
                warn!(error = %e, "skipping element without an id");
                None
            }
        },
    }
}

// =============================================================================
// CONVERSIONS: MODEL -> WIRE
// =============================================================================

impl From<&Border> for BorderDto {
    fn from(border: &Border) -> Self {
        Self {
            border_type: match border.kind {
                BorderKind::None => BorderTypeDto::None,
                BorderKind::Solid => BorderTypeDto::Solid,
            },
            border_color: border.color.clone(),
            border_thickness: border.thickness,
        }
    }
}

impl From<TextAlign> for AlignDto {
    fn from(align: TextAlign) -> Self {
        match align {
            TextAlign::Left => Self::Left,
            TextAlign::Center => Self::Center,
            TextAlign::Right => Self::Right,
            TextAlign::Justify => Self::Justify,
        }
    }
}

impl From<CameraMode> for CameraModeDto {
    fn from(mode: CameraMode) -> Self {
        match mode {
            CameraMode::Free => Self::Free,
            CameraMode::Orbit => Self::Orbit,
        }
    }
}

impl From<CameraTransform> for CameraTransformDto {
    fn from(t: CameraTransform) -> Self {
        Self { position: t.position, rotation: t.rotation }
    }
}

impl From<Shader> for ShaderDto {
    fn from(shader: Shader) -> Self {
        match shader {
            Shader::None => Self::None,
            Shader::Highlight => Self::Highlight,
        }
    }
}

impl From<&Model> for ModelDto {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            url: model.url.clone(),
            position: model.transform.position,
            rotation: model.transform.rotation,
            scale: model.transform.scale,
            shader: model.shader.into(),
        }
    }
}

impl From<&Frame> for FrameDto {
    fn from(frame: &Frame) -> Self {
        Self { id: frame.id, name: frame.name.clone(), camera_transform: frame.camera_transform.into() }
    }
}

impl From<Effect> for EffectDto {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Appear => Self::Appear,
            Effect::Disappear => Self::Disappear,
            Effect::FrameTransition => Self::FrameTransition,
        }
    }
}

impl From<Timing> for TimingDto {
    fn from(timing: Timing) -> Self {
        match timing {
            Timing::OnClick => Self::OnClick,
            Timing::WithPrevious => Self::WithPrevious,
            Timing::AfterPrevious => Self::AfterPrevious,
        }
    }
}

impl ObjectDto {
    /// Wire form of a variant. `Invalid` has none and yields `None`.
    #[must_use]
    pub fn from_variant(object: &ObjectVariant) -> Option<Self> {
        Some(match object {
            ObjectVariant::Shape(s) => Self::Shape(ShapeDto {
                path: s.path.clone(),
                color: s.fill_color.clone(),
                border: (&s.border).into(),
            }),
            ObjectVariant::TextBox(t) => Self::TextBox(TextBoxDto {
                text: t.text.clone(),
                size: t.size,
                weight: t.weight,
                font_family: t.font_family.clone(),
                align: t.align.into(),
                border: (&t.border).into(),
            }),
            ObjectVariant::Image(i) => Self::Image(ImageDto { url: i.source_url.clone(), border: (&i.border).into() }),
            ObjectVariant::Spatial(s) => Self::Spatial(SpatialDto {
                camera_mode: s.camera_mode.into(),
                camera_transform: s.camera_transform.into(),
                background_color: s.background.to_wire(),
                models: s.models.iter().map(ModelDto::from).collect(),
                border: (&s.border).into(),
            }),
            ObjectVariant::Invalid => return None,
        })
    }
}

impl ElementDto {
    /// Wire form of an element. `None` for elements with an `Invalid` payload.
    #[must_use]
    pub fn from_element(element: &Element) -> Option<Self> {
        Some(Self {
            id: element.id,
            x: element.position.x,
            y: element.position.y,
            width: element.size.x,
            height: element.size.y,
            rotation: element.rotation,
            z: element.z,
            object: ObjectDto::from_variant(&element.object)?,
        })
    }
}

impl UpdateElementRequest {
    /// Snapshot of an element's transform group.
    #[must_use]
    pub fn snapshot(user_id: UserId, element: &Element) -> Self {
        Self {
            user_id,
            element_id: element.id,
            x: element.position.x,
            y: element.position.y,
            width: element.size.x,
            height: element.size.y,
            rotation: element.rotation,
            z: element.z,
            border: element.object.border().map(BorderDto::from).unwrap_or_else(|| (&Border::default()).into()),
        }
    }
}
