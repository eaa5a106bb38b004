//! reqwest-backed [`RemoteStore`] for the persistence API.
//!
//! Thin HTTP wrapper: every call attaches the session's bearer headers,
//! maps 401/403 to `Unauthorized` and any other non-2xx status to `Status`
//! with the response body. JSON bodies for everything except binary uploads,
//! which go out as multipart forms.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::RemoteStore;
use super::auth::AuthSession;
use crate::config::DeckConfig;
use crate::error::{DeckError, Result};
use crate::model::{DesignId, ElementId, SlideId};
use crate::wire::{
    AnimationDto, CreateAnimationRequest, CreateElementRequest, CreateModelRequest, CreateSlideRequest,
    DeleteAnimationRequest, DeleteElementRequest, DeleteSlideRequest, DesignDto, ElementDto, FrameDto, ImageDto,
    ModelDto, PostDto, PublishPostRequest, RenameDesignRequest, ReorderSlidesRequest, ShareDesignRequest, SlideDto,
    ThumbnailTarget, UpdateElementRequest, UpdateModelRequest, UpdateShapeRequest, UpdateSpatialRequest,
    UpdateTextBoxRequest, UploadImageRequest, UploadThumbnailRequest,
};

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthSession>,
}

impl HttpStore {
    /// # Errors
    ///
    /// Returns `Http` if the underlying client cannot be built.
    pub fn new(config: &DeckConfig, auth: Arc<AuthSession>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, base_url: config.api_base_url.clone(), auth })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.headers(self.auth.request_headers()).send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let text = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.send(request).await.map(drop)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(DeckError::Unauthorized { status: status.as_u16() });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DeckError::Status { status: status.as_u16(), body });
    }
    Ok(response)
}

fn file_part(bytes: &[u8], name: &str) -> Part {
    Part::bytes(bytes.to_vec()).file_name(name.to_owned())
}

// =============================================================================
// ENDPOINTS
// =============================================================================

#[async_trait::async_trait]
impl RemoteStore for HttpStore {
    async fn get_design(&self, design_id: DesignId) -> Result<DesignDto> {
        self.send_json(self.http.get(self.url(&format!("/design/{design_id}"))))
            .await
    }

    async fn get_animations(&self, slide_id: SlideId) -> Result<Vec<AnimationDto>> {
        self.send_json(
            self.http
                .get(self.url("/animation"))
                .query(&[("slideId", slide_id)]),
        )
        .await
    }

    async fn get_frames(&self, spatial_id: ElementId) -> Result<Vec<FrameDto>> {
        self.send_json(
            self.http
                .get(self.url("/frame/all"))
                .query(&[("spatialId", spatial_id)]),
        )
        .await
    }

    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>> {
        // Relative urls live on the API host and need credentials.
        let request = if url.starts_with('/') {
            self.http.get(self.url(url)).headers(self.auth.request_headers())
        } else {
            self.http.get(url)
        };
        let response = check_status(request.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn reorder_slides(&self, design_id: DesignId, request: &ReorderSlidesRequest) -> Result<()> {
        self.send_empty(
            self.http
                .patch(self.url(&format!("/design/{design_id}")))
                .json(request),
        )
        .await
    }

    async fn rename_design(&self, request: &RenameDesignRequest) -> Result<()> {
        self.send_empty(self.http.patch(self.url("/design/name")).json(request))
            .await
    }

    async fn share_design(&self, request: &ShareDesignRequest) -> Result<()> {
        self.send_empty(self.http.patch(self.url("/design/share")).json(request))
            .await
    }

    async fn publish_post(&self, request: &PublishPostRequest) -> Result<PostDto> {
        self.send_json(self.http.post(self.url("/post")).json(request))
            .await
    }

    async fn upload_thumbnail(&self, request: &UploadThumbnailRequest) -> Result<()> {
        let (path, id_field, id) = match request.target {
            ThumbnailTarget::Design(id) => ("/design/thumbnail", "designId", id),
            ThumbnailTarget::Slide(id) => ("/slide/thumbnail", "slideId", id),
        };
        let form = Form::new()
            .text("userId", request.user_id.to_string())
            .text(id_field, id.to_string())
            .part("thumbnail", file_part(&request.file, "thumbnail.png"));
        self.send_empty(self.http.patch(self.url(path)).multipart(form))
            .await
    }

    async fn create_slide(&self, request: &CreateSlideRequest) -> Result<SlideDto> {
        self.send_json(self.http.post(self.url("/slide")).json(request))
            .await
    }

    async fn delete_slide(&self, request: &DeleteSlideRequest) -> Result<()> {
        self.send_empty(self.http.delete(self.url("/slide")).json(request))
            .await
    }

    async fn create_element(&self, request: &CreateElementRequest) -> Result<ElementDto> {
        self.send_json(self.http.post(self.url("/element")).json(request))
            .await
    }

    async fn update_element(&self, request: &UpdateElementRequest) -> Result<()> {
        self.send_empty(self.http.patch(self.url("/element")).json(request))
            .await
    }

    async fn delete_element(&self, request: &DeleteElementRequest) -> Result<()> {
        self.send_empty(self.http.delete(self.url("/element")).json(request))
            .await
    }

    async fn update_shape(&self, request: &UpdateShapeRequest) -> Result<()> {
        self.send_empty(self.http.patch(self.url("/element/shape")).json(request))
            .await
    }

    async fn update_text_box(&self, request: &UpdateTextBoxRequest) -> Result<()> {
        self.send_empty(self.http.patch(self.url("/element/textbox")).json(request))
            .await
    }

    async fn update_spatial(&self, request: &UpdateSpatialRequest) -> Result<()> {
        let camera_mode = serde_json::to_value(request.camera_mode)?;
        let form = Form::new()
            .text("userId", request.user_id.to_string())
            .text("elementId", request.element_id.to_string())
            .text("cameraMode", camera_mode.as_str().unwrap_or_default().to_owned())
            .text("cameraTransform", serde_json::to_string(&request.camera_transform)?)
            .text("backgroundColor", request.background_color.clone());
        self.send_empty(self.http.patch(self.url("/element/spatial")).multipart(form))
            .await
    }

    async fn upload_image(&self, request: &UploadImageRequest) -> Result<ImageDto> {
        let form = Form::new()
            .text("userId", request.user_id.to_string())
            .text("elementId", request.element_id.to_string())
            .part("file", file_part(&request.file, "image"));
        self.send_json(self.http.patch(self.url("/element/image")).multipart(form))
            .await
    }

    async fn create_model(&self, request: &CreateModelRequest) -> Result<ModelDto> {
        let form = Form::new()
            .text("userId", request.user_id.to_string())
            .text("spatialId", request.spatial_id.to_string())
            .text("name", request.name.clone())
            .part("file", file_part(&request.file, &request.name));
        self.send_json(self.http.post(self.url("/model")).multipart(form))
            .await
    }

    async fn update_model(&self, request: &UpdateModelRequest) -> Result<()> {
        self.send_empty(self.http.patch(self.url("/model")).json(request))
            .await
    }

    async fn create_animation(&self, request: &CreateAnimationRequest) -> Result<AnimationDto> {
        self.send_json(self.http.post(self.url("/animation")).json(request))
            .await
    }

    async fn delete_animation(&self, request: &DeleteAnimationRequest) -> Result<()> {
        self.send_empty(self.http.delete(self.url("/animation")).json(request))
            .await
    }
}
