//! Shared fixtures for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{DeckError, Result};
use crate::geometry::Vector2;
use crate::model::{
    Border, DesignId, Element, ElementId, ObjectVariant, ShapeObject, SlideId, SpatialObject, TextBoxObject,
};
use crate::remote::{AuthSession, CredentialRefresh, Credentials, RemoteStore};
use crate::wire::{
    AnimationDto, CreateAnimationRequest, CreateElementRequest, CreateModelRequest, CreateSlideRequest,
    DeleteAnimationRequest, DeleteElementRequest, DeleteSlideRequest, DesignDto, ElementDto, FrameDto, ImageDto,
    ModelDto, PostDto, PublishPostRequest, RenameDesignRequest, ReorderSlidesRequest, ShareDesignRequest, ShaderDto,
    SlideDto, UpdateElementRequest, UpdateModelRequest, UpdateShapeRequest, UpdateSpatialRequest,
    UpdateTextBoxRequest, UploadImageRequest, UploadThumbnailRequest,
};

pub const USER_ID: i64 = 42;

// =============================================================================
// MODEL FIXTURES
// =============================================================================

#[must_use]
pub fn shape_element(id: ElementId, z: i64) -> Element {
    Element {
        id,
        position: Vector2::new(10.0, 20.0),
        rotation: 0.0,
        size: Vector2::new(100.0, 50.0),
        z,
        object: ObjectVariant::Shape(ShapeObject {
            path: "M0 0 L1 1".into(),
            fill_color: "#ff0000".into(),
            border: Border::default(),
        }),
    }
}

#[must_use]
pub fn text_element(id: ElementId, z: i64) -> Element {
    Element {
        object: ObjectVariant::TextBox(TextBoxObject {
            text: "hello".into(),
            size: 16.0,
            weight: 400,
            font_family: "Inter".into(),
            align: crate::model::TextAlign::Left,
            border: Border::default(),
        }),
        ..shape_element(id, z)
    }
}

#[must_use]
pub fn spatial_element(id: ElementId, z: i64) -> Element {
    Element { object: ObjectVariant::Spatial(SpatialObject::default()), ..shape_element(id, z) }
}

fn test_credentials() -> Credentials {
    Credentials {
        access_token: "token".into(),
        refresh_token: None,
        user_id: USER_ID,
        name: "Test".into(),
        email: "test@example.com".into(),
    }
}

#[must_use]
pub fn signed_in() -> Arc<AuthSession> {
    Arc::new(AuthSession::with_credentials(test_credentials()))
}

/// Hands out a new access token on every refresh.
pub struct RenewToken;

#[async_trait::async_trait]
impl CredentialRefresh for RenewToken {
    async fn refresh(&self, current: &Credentials) -> Result<Credentials> {
        Ok(Credentials { access_token: format!("{}-renewed", current.access_token), ..current.clone() })
    }
}

/// Signed-in session whose refresh always succeeds.
#[must_use]
pub fn signed_in_renewable() -> Arc<AuthSession> {
    let session = AuthSession::new(RenewToken);
    session.login(crate::wire::LoginResponse {
        jwt_token: "token".into(),
        refresh_token: Some("refresh".into()),
        id: USER_ID,
        name: "Test".into(),
        email: "test@example.com".into(),
    });
    Arc::new(session)
}

// =============================================================================
// RECORDING STORE
// =============================================================================

type CallMatcher = Box<dyn Fn(&Call) -> bool + Send>;

/// Every request the store has seen, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetDesign(DesignId),
    GetAnimations(SlideId),
    GetFrames(ElementId),
    FetchContent(String),
    ReorderSlides(DesignId, ReorderSlidesRequest),
    RenameDesign(RenameDesignRequest),
    ShareDesign(ShareDesignRequest),
    PublishPost(PublishPostRequest),
    UploadThumbnail(UploadThumbnailRequest),
    CreateSlide(CreateSlideRequest),
    DeleteSlide(DeleteSlideRequest),
    CreateElement(CreateElementRequest),
    UpdateElement(UpdateElementRequest),
    DeleteElement(DeleteElementRequest),
    UpdateShape(UpdateShapeRequest),
    UpdateTextBox(UpdateTextBoxRequest),
    UpdateSpatial(UpdateSpatialRequest),
    UploadImage(UploadImageRequest),
    CreateModel(CreateModelRequest),
    UpdateModel(UpdateModelRequest),
    CreateAnimation(CreateAnimationRequest),
    DeleteAnimation(DeleteAnimationRequest),
}

/// In-memory [`RemoteStore`] that records calls, hands out sequential ids
/// starting at 1000, and fails the next N calls on request.
#[derive(Default)]
pub struct RecordingStore {
    pub design: Mutex<Option<DesignDto>>,
    pub animations: Mutex<HashMap<SlideId, Vec<AnimationDto>>>,
    pub frames: Mutex<HashMap<ElementId, Vec<FrameDto>>>,
    pub content: Mutex<HashMap<String, Vec<u8>>>,
    /// Added to the requested z of every created element, standing in for a
    /// server that assigns its own stacking slots.
    pub z_offset: AtomicI64,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<DeckError>>,
    targeted: Mutex<Vec<(CallMatcher, DeckError)>>,
    next_id: AtomicI64,
}

impl RecordingStore {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self { next_id: AtomicI64::new(1000), ..Self::default() })
    }

    #[must_use]
    pub fn with_design(design: DesignDto) -> Arc<Self> {
        let store = Self::new();
        *store.design.lock().unwrap() = Some(design);
        store
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: DeckError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Fail the first later call accepted by `matcher` with `err`, once.
    pub fn fail_when(&self, matcher: impl Fn(&Call) -> bool + Send + 'static, err: DeckError) {
        self.targeted.lock().unwrap().push((Box::new(matcher), err));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    #[must_use]
    pub fn element_updates(&self) -> Vec<UpdateElementRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateElement(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<()> {
        let targeted = {
            let mut targeted = self.targeted.lock().unwrap();
            targeted
                .iter()
                .position(|(matcher, _)| matcher(&call))
                .map(|i| targeted.remove(i).1)
        };
        self.calls.lock().unwrap().push(call);
        if let Some(err) = targeted {
            return Err(err);
        }
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fresh_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RemoteStore for RecordingStore {
    async fn get_design(&self, design_id: DesignId) -> Result<DesignDto> {
        self.record(Call::GetDesign(design_id))?;
        self.design
            .lock()
            .unwrap()
            .clone()
            .ok_or(DeckError::Status { status: 404, body: "no design".into() })
    }

    async fn get_animations(&self, slide_id: SlideId) -> Result<Vec<AnimationDto>> {
        self.record(Call::GetAnimations(slide_id))?;
        Ok(self.animations.lock().unwrap().get(&slide_id).cloned().unwrap_or_default())
    }

    async fn get_frames(&self, spatial_id: ElementId) -> Result<Vec<FrameDto>> {
        self.record(Call::GetFrames(spatial_id))?;
        Ok(self.frames.lock().unwrap().get(&spatial_id).cloned().unwrap_or_default())
    }

    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>> {
        self.record(Call::FetchContent(url.to_owned()))?;
        self.content
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(DeckError::Status { status: 404, body: url.to_owned() })
    }

    async fn reorder_slides(&self, design_id: DesignId, request: &ReorderSlidesRequest) -> Result<()> {
        self.record(Call::ReorderSlides(design_id, request.clone()))
    }

    async fn rename_design(&self, request: &RenameDesignRequest) -> Result<()> {
        self.record(Call::RenameDesign(request.clone()))
    }

    async fn share_design(&self, request: &ShareDesignRequest) -> Result<()> {
        self.record(Call::ShareDesign(request.clone()))
    }

    async fn publish_post(&self, request: &PublishPostRequest) -> Result<PostDto> {
        self.record(Call::PublishPost(request.clone()))?;
        Ok(PostDto { id: self.fresh_id() })
    }

    async fn upload_thumbnail(&self, request: &UploadThumbnailRequest) -> Result<()> {
        self.record(Call::UploadThumbnail(request.clone()))
    }

    async fn create_slide(&self, request: &CreateSlideRequest) -> Result<SlideDto> {
        self.record(Call::CreateSlide(request.clone()))?;
        Ok(SlideDto { id: self.fresh_id(), thumbnail: None, elements: Vec::new() })
    }

    async fn delete_slide(&self, request: &DeleteSlideRequest) -> Result<()> {
        self.record(Call::DeleteSlide(request.clone()))
    }

    async fn create_element(&self, request: &CreateElementRequest) -> Result<ElementDto> {
        self.record(Call::CreateElement(request.clone()))?;
        Ok(ElementDto {
            id: self.fresh_id(),
            x: request.x,
            y: request.y,
            width: request.width,
            height: request.height,
            rotation: request.rotation,
            z: request.z + self.z_offset.load(Ordering::SeqCst),
            object: request.object.clone(),
        })
    }

    async fn update_element(&self, request: &UpdateElementRequest) -> Result<()> {
        self.record(Call::UpdateElement(request.clone()))
    }

    async fn delete_element(&self, request: &DeleteElementRequest) -> Result<()> {
        self.record(Call::DeleteElement(request.clone()))
    }

    async fn update_shape(&self, request: &UpdateShapeRequest) -> Result<()> {
        self.record(Call::UpdateShape(request.clone()))
    }

    async fn update_text_box(&self, request: &UpdateTextBoxRequest) -> Result<()> {
        self.record(Call::UpdateTextBox(request.clone()))
    }

    async fn update_spatial(&self, request: &UpdateSpatialRequest) -> Result<()> {
        self.record(Call::UpdateSpatial(request.clone()))
    }

    async fn upload_image(&self, request: &UploadImageRequest) -> Result<ImageDto> {
        self.record(Call::UploadImage(request.clone()))?;
        Ok(ImageDto { url: format!("/content/image-{}", self.fresh_id()), border: (&Border::default()).into() })
    }

    async fn create_model(&self, request: &CreateModelRequest) -> Result<ModelDto> {
        self.record(Call::CreateModel(request.clone()))?;
        let id = self.fresh_id();
        Ok(ModelDto {
            id,
            name: request.name.clone(),
            url: format!("/content/model-{id}"),
            position: crate::geometry::Vector3::ZERO,
            rotation: crate::geometry::Vector3::ZERO,
            scale: crate::geometry::Vector3::ONE,
            shader: ShaderDto::None,
        })
    }

    async fn update_model(&self, request: &UpdateModelRequest) -> Result<()> {
        self.record(Call::UpdateModel(request.clone()))
    }

    async fn create_animation(&self, request: &CreateAnimationRequest) -> Result<AnimationDto> {
        self.record(Call::CreateAnimation(request.clone()))?;
        Ok(AnimationDto {
            id: self.fresh_id(),
            element_id: request.element_id,
            effect: request.effect,
            timing: request.timing,
            duration: request.duration,
            frame_id: request.frame_id,
        })
    }

    async fn delete_animation(&self, request: &DeleteAnimationRequest) -> Result<()> {
        self.record(Call::DeleteAnimation(request.clone()))
    }
}
