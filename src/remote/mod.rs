//! Remote collaborators: the persistence API and the auth session.
//!
//! DESIGN
//! ======
//! [`RemoteStore`] is the seam between the sync engine and the backend. The
//! production implementation is [`http::HttpStore`] (reqwest); tests swap in
//! an in-memory recorder. Methods map one-to-one onto API endpoints and take
//! the request bodies defined in [`crate::wire`].
//!
//! Implementations report 401/403 as [`crate::DeckError::Unauthorized`] and
//! do not retry; the engine applies the retry policy from [`auth`].

pub mod auth;
pub mod http;

use crate::error::Result;
use crate::model::{DesignId, ElementId, SlideId};
use crate::wire::{
    AnimationDto, CreateAnimationRequest, CreateElementRequest, CreateModelRequest, CreateSlideRequest,
    DeleteAnimationRequest, DeleteElementRequest, DeleteSlideRequest, DesignDto, ElementDto, FrameDto, ImageDto,
    ModelDto, PostDto, PublishPostRequest, RenameDesignRequest, ReorderSlidesRequest, ShareDesignRequest, SlideDto,
    UpdateElementRequest, UpdateModelRequest, UpdateShapeRequest, UpdateSpatialRequest, UpdateTextBoxRequest,
    UploadImageRequest, UploadThumbnailRequest,
};

pub use auth::{AuthSession, CredentialRefresh, Credentials, NoRefresh, with_auth_retry};
pub use http::HttpStore;

#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    // --- reads ---------------------------------------------------------------

    /// `GET /design/{id}`
    async fn get_design(&self, design_id: DesignId) -> Result<DesignDto>;
    /// `GET /animation?slideId=`
    async fn get_animations(&self, slide_id: SlideId) -> Result<Vec<AnimationDto>>;
    /// `GET /frame/all?spatialId=`
    async fn get_frames(&self, spatial_id: ElementId) -> Result<Vec<FrameDto>>;
    /// Raw bytes behind an image or model url.
    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>>;

    // --- design --------------------------------------------------------------

    /// `PATCH /design/{id}` with the full slide order.
    async fn reorder_slides(&self, design_id: DesignId, request: &ReorderSlidesRequest) -> Result<()>;
    /// `PATCH /design/name`
    async fn rename_design(&self, request: &RenameDesignRequest) -> Result<()>;
    /// `PATCH /design/share`
    async fn share_design(&self, request: &ShareDesignRequest) -> Result<()>;
    /// `POST /post`
    async fn publish_post(&self, request: &PublishPostRequest) -> Result<PostDto>;
    /// `PATCH /design/thumbnail` or `PATCH /slide/thumbnail` (multipart).
    async fn upload_thumbnail(&self, request: &UploadThumbnailRequest) -> Result<()>;

    // --- slides --------------------------------------------------------------

    /// `POST /slide`
    async fn create_slide(&self, request: &CreateSlideRequest) -> Result<SlideDto>;
    /// `DELETE /slide`
    async fn delete_slide(&self, request: &DeleteSlideRequest) -> Result<()>;

    // --- elements ------------------------------------------------------------

    /// `POST /element`
    async fn create_element(&self, request: &CreateElementRequest) -> Result<ElementDto>;
    /// `PATCH /element`
    async fn update_element(&self, request: &UpdateElementRequest) -> Result<()>;
    /// `DELETE /element`
    async fn delete_element(&self, request: &DeleteElementRequest) -> Result<()>;
    /// `PATCH /element/shape`
    async fn update_shape(&self, request: &UpdateShapeRequest) -> Result<()>;
    /// `PATCH /element/textbox`
    async fn update_text_box(&self, request: &UpdateTextBoxRequest) -> Result<()>;
    /// `PATCH /element/spatial` (multipart)
    async fn update_spatial(&self, request: &UpdateSpatialRequest) -> Result<()>;
    /// `PATCH /element/image` (multipart)
    async fn upload_image(&self, request: &UploadImageRequest) -> Result<ImageDto>;

    // --- models / animations -------------------------------------------------

    /// `POST /model` (multipart)
    async fn create_model(&self, request: &CreateModelRequest) -> Result<ModelDto>;
    /// `PATCH /model`
    async fn update_model(&self, request: &UpdateModelRequest) -> Result<()>;
    /// `POST /animation`
    async fn create_animation(&self, request: &CreateAnimationRequest) -> Result<AnimationDto>;
    /// `DELETE /animation`
    async fn delete_animation(&self, request: &DeleteAnimationRequest) -> Result<()>;
}
