//! Synchronization engine: the single writer of the design document.
//!
//! ARCHITECTURE
//! ============
//! The engine owns the [`DesignDocument`], the [`Selection`], the keyed
//! [`Debouncer`] and the listener list. It is driven through `&mut self`
//! by one task, so local mutation is totally ordered; the only suspension
//! points are remote calls and flushes.
//!
//! Two write paths:
//!
//! - **Structural** (create/delete slide or element, slide reorder,
//!   animation create/delete, uploads, design metadata): validate locally,
//!   call the store, and apply to the model only once the server has
//!   answered, using the id it assigned. Failures propagate.
//! - **Field groups** (element transform, object fields, model transform):
//!   apply locally at once, then schedule a debounced write keyed by
//!   `(group, target)` carrying a snapshot of the latest values. Failures
//!   are logged; nothing is rolled back.
//!
//! Any change to the selection, including the clear on slide switch, fires
//! every pending debounced write before returning. Listeners run after
//! every successful local update.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::debounce::{Debouncer, WriteJob, WriteKey};
use super::ingest;
use super::listeners::{ListenerId, Listeners};
use crate::config::DeckConfig;
use crate::error::{DeckError, Result};
use crate::geometry::Vector2;
use crate::model::{
    Animation, AnimationDraft, AnimationId, Border, DesignDocument, DesignId, Effect, Element, ElementDraft,
    ElementId, Model, ModelId, ModelTransform, ObjectVariant, Selection, Shader, ShapePatch, Slide, SlideId,
    SpatialPatch, TextPatch, Thumbnail, TransformPatch, UserId,
};
use crate::remote::{AuthSession, RemoteStore, with_auth_retry};
use crate::stacking::{self, StackCommand};
use crate::wire::{
    CreateAnimationRequest, CreateElementRequest, CreateModelRequest, CreateSlideRequest, DeleteAnimationRequest,
    DeleteElementRequest, DeleteSlideRequest, ElementDto, ModelDto, ObjectDto, PublishPostRequest,
    RenameDesignRequest, ReorderSlidesRequest, ShareDesignRequest, ThumbnailTarget, UpdateElementRequest,
    UpdateModelRequest, UpdateShapeRequest, UpdateSpatialRequest, UpdateTextBoxRequest, UploadImageRequest,
    UploadThumbnailRequest,
};

// =============================================================================
// DEBOUNCED WRITES
// =============================================================================

/// Snapshot of one field group, ready to send.
#[derive(Debug, Clone)]
enum PendingWrite {
    Element(UpdateElementRequest),
    Shape(UpdateShapeRequest),
    TextBox(UpdateTextBoxRequest),
    Spatial(UpdateSpatialRequest),
    Model(UpdateModelRequest),
}

impl PendingWrite {
    async fn send(&self, store: &dyn RemoteStore) -> Result<()> {
        match self {
            Self::Element(r) => store.update_element(r).await,
            Self::Shape(r) => store.update_shape(r).await,
            Self::TextBox(r) => store.update_text_box(r).await,
            Self::Spatial(r) => store.update_spatial(r).await,
            Self::Model(r) => store.update_model(r).await,
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

pub struct SyncEngine {
    document: DesignDocument,
    selection: Selection,
    store: Arc<dyn RemoteStore>,
    auth: Arc<AuthSession>,
    debouncer: Debouncer<WriteKey>,
    listeners: Listeners,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        document: DesignDocument,
        store: Arc<dyn RemoteStore>,
        auth: Arc<AuthSession>,
        config: &DeckConfig,
    ) -> Self {
        Self {
            document,
            selection: Selection::new(),
            store,
            auth,
            debouncer: Debouncer::new(config.debounce),
            listeners: Listeners::new(),
        }
    }

    /// Load a design from the store and wrap it in an engine.
    ///
    /// # Errors
    ///
    /// See [`ingest::load_design`].
    pub async fn load(
        store: Arc<dyn RemoteStore>,
        auth: Arc<AuthSession>,
        config: &DeckConfig,
        design_id: DesignId,
    ) -> Result<Self> {
        let document = ingest::load_design(store.as_ref(), &auth, design_id).await?;
        Ok(Self::new(document, store, auth, config))
    }

    // --- read access ---------------------------------------------------------

    #[must_use]
    pub fn document(&self) -> &DesignDocument {
        &self.document
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn current_slide(&self) -> &Slide {
        self.document.current_slide()
    }

    #[must_use]
    pub fn selected_elements(&self) -> Vec<&Element> {
        self.selection.elements(self.document.current_slide())
    }

    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.debouncer.pending_count()
    }

    // --- listeners -----------------------------------------------------------

    pub fn subscribe(&mut self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Fire every pending debounced write now. Returns how many were sent.
    pub async fn flush(&mut self) -> usize {
        let fired = self.debouncer.flush_all().await;
        if fired > 0 {
            debug!(fired, "flushed pending writes");
        }
        fired
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Add an element of the current slide to the selection.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if the element is not on the current slide.
    pub async fn select(&mut self, id: ElementId) -> Result<bool> {
        if self.document.current_slide().element(id).is_none() {
            return Err(DeckError::ElementNotFound(id));
        }
        let changed = self.selection.select(id);
        if changed {
            self.selection_changed().await;
        }
        Ok(changed)
    }

    pub async fn deselect(&mut self, id: ElementId) -> bool {
        let changed = self.selection.deselect(id);
        if changed {
            self.selection_changed().await;
        }
        changed
    }

    pub async fn deselect_all(&mut self) -> bool {
        let changed = self.selection.deselect_all();
        if changed {
            self.selection_changed().await;
        }
        changed
    }

    async fn selection_changed(&mut self) {
        self.flush().await;
        self.listeners.notify();
    }

    /// Context switch: clear the selection and flush regardless of whether
    /// anything was selected.
    async fn leave_slide(&mut self) {
        self.selection.deselect_all();
        self.flush().await;
    }

    // =========================================================================
    // SLIDES
    // =========================================================================

    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` for a bad index.
    pub async fn select_slide(&mut self, index: usize) -> Result<()> {
        self.document.check_index(index)?;
        self.leave_slide().await;
        self.document.select_slide(index)?;
        self.listeners.notify();
        Ok(())
    }

    /// Append a new blank slide and select it.
    ///
    /// # Errors
    ///
    /// Propagates remote failures; the document is unchanged on error.
    pub async fn add_slide(&mut self) -> Result<SlideId> {
        let index = self.document.slide_count();
        let slide = self.create_remote_slide(index).await?;
        let id = slide.id;
        self.leave_slide().await;
        self.document.push_slide(slide);
        info!(design_id = self.document.id, slide_id = id, "slide added");
        self.listeners.notify();
        Ok(id)
    }

    /// Insert a new blank slide directly after `after` and select it.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` before any remote call for a bad index.
    pub async fn insert_slide(&mut self, after: usize) -> Result<SlideId> {
        self.document.check_index(after)?;
        let slide = self.create_remote_slide(after + 1).await?;
        let id = slide.id;
        self.leave_slide().await;
        self.document.insert_slide(after, slide)?;
        info!(design_id = self.document.id, slide_id = id, position = after + 1, "slide inserted");
        self.listeners.notify();
        Ok(id)
    }

    /// Deep-copy the slide at `index` into a new slide placed right after it.
    ///
    /// Every element and animation is re-created remotely so the copy has its
    /// own ids; animations are retargeted at the copied elements. Elements
    /// with an `Invalid` payload cannot be sent and are left out.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` for a bad index, otherwise the first
    /// remote failure. Entities created before the failure stay on the server.
    pub async fn duplicate_slide(&mut self, index: usize) -> Result<SlideId> {
        self.document.check_index(index)?;
        self.flush().await;
        let user_id = self.auth.user_id()?;
        let source = self.document.slides()[index].clone();

        let created = self.create_remote_slide(index + 1).await?;
        let slide_id = created.id;

        let mut elements = Vec::with_capacity(source.elements().len());
        let mut id_map: HashMap<ElementId, ElementId> = HashMap::new();
        for element in source.elements() {
            let Some(dto) = ElementDto::from_element(element) else {
                warn!(slide_id = source.id, element_id = element.id, "skipping invalid element in duplicate");
                continue;
            };
            let request = create_element_request(user_id, slide_id, &dto);
            let store = Arc::clone(&self.store);
            let response = with_auth_retry(&self.auth, || store.create_element(&request)).await?;
            id_map.insert(element.id, response.id);
            elements.push(Element { id: response.id, z: response.z, ..element.clone() });
        }

        let mut animations = Vec::with_capacity(source.animations().len());
        for animation in source.animations() {
            let Some(&target) = id_map.get(&animation.target) else {
                continue;
            };
            let request = CreateAnimationRequest {
                user_id,
                slide_id,
                element_id: target,
                effect: animation.effect.into(),
                timing: animation.timing.into(),
                duration: animation.duration_ms,
                frame_id: animation.frame.as_ref().map(|f| f.id),
            };
            let store = Arc::clone(&self.store);
            let response = with_auth_retry(&self.auth, || store.create_animation(&request)).await?;
            animations.push(Animation { id: response.id, target, ..animation.clone() });
        }

        let copy = Slide::from_parts(slide_id, source.thumbnail.clone(), elements, animations);
        self.leave_slide().await;
        self.document.insert_slide(index, copy)?;
        info!(design_id = self.document.id, source = source.id, slide_id, "slide duplicated");
        self.listeners.notify();
        Ok(slide_id)
    }

    /// Delete the slide at `index`, dropping pending writes for its elements
    /// the same way [`Self::remove_element`] does.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` or `LastSlide` without a remote call,
    /// otherwise propagates remote failures.
    pub async fn remove_slide(&mut self, index: usize) -> Result<()> {
        self.document.check_index(index)?;
        if self.document.slide_count() <= 1 {
            return Err(DeckError::LastSlide);
        }
        let user_id = self.auth.user_id()?;
        let slide = &self.document.slides()[index];
        let slide_id = slide.id;
        let keys: Vec<WriteKey> = slide.elements().iter().flat_map(write_keys).collect();

        if index == self.document.selected_slide_index() {
            self.leave_slide().await;
        }
        let withdrawn = self.withdraw_writes(&keys);
        let request = DeleteSlideRequest { user_id, slide_id };
        let store = Arc::clone(&self.store);
        if let Err(e) = with_auth_retry(&self.auth, || store.delete_slide(&request)).await {
            join_all(withdrawn).await;
            return Err(e);
        }

        self.document.remove_slide(index)?;
        info!(design_id = self.document.id, slide_id, "slide removed");
        self.listeners.notify();
        Ok(())
    }

    /// Move the slide at `from` to position `to`, persisting the full order.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` for a bad index, otherwise propagates
    /// remote failures.
    pub async fn move_slide(&mut self, from: usize, to: usize) -> Result<()> {
        self.document.check_index(from)?;
        self.document.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let user_id = self.auth.user_id()?;
        let mut slide_ids = self.document.slide_order();
        let moved = slide_ids.remove(from);
        slide_ids.insert(to, moved);

        let design_id = self.document.id;
        let request = ReorderSlidesRequest { user_id, slide_ids };
        let store = Arc::clone(&self.store);
        with_auth_retry(&self.auth, || store.reorder_slides(design_id, &request)).await?;

        self.document.move_slide(from, to)?;
        self.listeners.notify();
        Ok(())
    }

    async fn create_remote_slide(&self, index: usize) -> Result<Slide> {
        let request = CreateSlideRequest { user_id: self.auth.user_id()?, design_id: self.document.id, index };
        let store = Arc::clone(&self.store);
        let dto = with_auth_retry(&self.auth, || store.create_slide(&request)).await?;
        Ok(Slide::new(dto.id))
    }

    // =========================================================================
    // ELEMENTS
    // =========================================================================

    /// Create an element on top of the current slide.
    ///
    /// A staged image blob is uploaded right after creation and the element
    /// takes the url the server returns for it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownObjectType` for an `Invalid` draft, otherwise
    /// propagates remote failures.
    pub async fn add_element(&mut self, mut draft: ElementDraft) -> Result<ElementId> {
        let user_id = self.auth.user_id()?;
        let slide = self.document.current_slide();
        let slide_id = slide.id;
        let z = slide.next_z();

        let pending_image = match &mut draft.object {
            ObjectVariant::Image(image) => image.pending_upload.take(),
            ObjectVariant::Invalid => return Err(DeckError::UnknownObjectType("INVALID".into())),
            _ => None,
        };
        let object = ObjectDto::from_variant(&draft.object)
            .ok_or_else(|| DeckError::UnknownObjectType("INVALID".into()))?;
        let request = CreateElementRequest {
            user_id,
            slide_id,
            x: draft.position.x,
            y: draft.position.y,
            width: draft.size.x,
            height: draft.size.y,
            rotation: draft.rotation,
            z,
            object,
        };
        let store = Arc::clone(&self.store);
        let response = with_auth_retry(&self.auth, || store.create_element(&request)).await?;

        let id = response.id;
        self.document.current_slide_mut().insert_element(draft.into_element(id, response.z));
        info!(slide_id, element_id = id, z = response.z, "element added");
        self.listeners.notify();

        if let Some(bytes) = pending_image {
            self.replace_image(id, bytes).await?;
        }
        Ok(id)
    }

    /// Delete an element and every animation targeting it. Debounced writes
    /// still pending for the element are dropped once the delete succeeds
    /// and sent if it fails.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` without a remote call, otherwise propagates
    /// remote failures.
    pub async fn remove_element(&mut self, id: ElementId) -> Result<()> {
        let Some((slide_index, element)) = self.document.find_element(id) else {
            return Err(DeckError::ElementNotFound(id));
        };
        let keys = write_keys(element);
        let user_id = self.auth.user_id()?;
        if self.selection.deselect(id) {
            self.selection_changed().await;
        }

        let withdrawn = self.withdraw_writes(&keys);
        let request = DeleteElementRequest { user_id, element_id: id };
        let store = Arc::clone(&self.store);
        if let Err(e) = with_auth_retry(&self.auth, || store.delete_element(&request)).await {
            join_all(withdrawn).await;
            return Err(e);
        }

        if let Some(slide) = self.document.slide_mut(slide_index) {
            if let Some((_, animations)) = slide.remove_element(id) {
                info!(element_id = id, animations = animations.len(), "element removed");
            }
        }
        self.listeners.notify();
        Ok(())
    }

    // =========================================================================
    // ANIMATIONS
    // =========================================================================

    /// Add an animation to the current slide.
    ///
    /// # Errors
    ///
    /// Validation happens before any remote call: `ElementNotFound` if the
    /// target is not on the current slide; for a frame, `WrongObjectType` if
    /// the target is not spatial and `FrameNotFound` if the frame is not one
    /// of its frames.
    pub async fn add_animation(&mut self, draft: AnimationDraft) -> Result<AnimationId> {
        let slide = self.document.current_slide();
        let slide_id = slide.id;
        let target = slide.element(draft.target).ok_or(DeckError::ElementNotFound(draft.target))?;
        if let Some(frame) = &draft.frame {
            let spatial = target.object.as_spatial().ok_or(DeckError::WrongObjectType(target.id))?;
            if spatial.frame(frame.id).is_none() {
                return Err(DeckError::FrameNotFound { element: target.id, frame: frame.id });
            }
        } else if draft.effect == Effect::FrameTransition {
            warn!(element_id = draft.target, "frame transition without a frame");
        }

        let request = CreateAnimationRequest {
            user_id: self.auth.user_id()?,
            slide_id,
            element_id: draft.target,
            effect: draft.effect.into(),
            timing: draft.timing.into(),
            duration: draft.duration_ms,
            frame_id: draft.frame.as_ref().map(|f| f.id),
        };
        let store = Arc::clone(&self.store);
        let response = with_auth_retry(&self.auth, || store.create_animation(&request)).await?;

        let id = response.id;
        self.document.current_slide_mut().push_animation(draft.into_animation(id));
        self.listeners.notify();
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `AnimationNotFound` if the current slide has no such
    /// animation, otherwise propagates remote failures.
    pub async fn remove_animation(&mut self, id: AnimationId) -> Result<()> {
        if self.document.current_slide().animation(id).is_none() {
            return Err(DeckError::AnimationNotFound(id));
        }
        let request = DeleteAnimationRequest { user_id: self.auth.user_id()?, animation_id: id };
        let store = Arc::clone(&self.store);
        with_auth_retry(&self.auth, || store.delete_animation(&request)).await?;

        self.document.current_slide_mut().remove_animation(id);
        self.listeners.notify();
        Ok(())
    }

    // =========================================================================
    // STACKING
    // =========================================================================

    /// Apply a stacking command to the selection. Every element whose `z`
    /// changed gets a debounced transform write. Returns those ids.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out.
    pub fn restack(&mut self, command: StackCommand) -> Result<Vec<ElementId>> {
        if self.selection.is_empty() {
            return Ok(Vec::new());
        }
        let user_id = self.auth.user_id()?;
        let selected = self.selection.ids().to_vec();
        let changed = stacking::apply(self.document.current_slide_mut(), &selected, command);
        for &id in &changed {
            if let Some(element) = self.document.current_slide().element(id) {
                let write = PendingWrite::Element(UpdateElementRequest::snapshot(user_id, element));
                self.schedule(WriteKey::element_transform(id), write);
            }
        }
        if !changed.is_empty() {
            debug!(?command, changed = changed.len(), "restacked selection");
            self.listeners.notify();
        }
        Ok(changed)
    }

    // =========================================================================
    // FIELD GROUPS
    // =========================================================================

    /// Patch an element's transform group and schedule the write.
    ///
    /// Stacking order belongs to [`Self::restack`]; a `z` in `patch` is
    /// ignored. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` or `NotAuthenticated`.
    pub fn update_transform(&mut self, id: ElementId, patch: &TransformPatch) -> Result<bool> {
        let user_id = self.auth.user_id()?;
        let element = self.document.find_element_mut(id).ok_or(DeckError::ElementNotFound(id))?;
        let patch = TransformPatch { z: None, ..patch.clone() };
        if !element.apply_transform(&patch) {
            return Ok(false);
        }
        let write = PendingWrite::Element(UpdateElementRequest::snapshot(user_id, element));
        self.schedule(WriteKey::element_transform(id), write);
        self.listeners.notify();
        Ok(true)
    }

    /// # Errors
    ///
    /// See [`Self::update_transform`].
    pub fn move_by(&mut self, id: ElementId, delta: Vector2) -> Result<bool> {
        let position = self.element(id)?.position + delta;
        self.update_transform(id, &TransformPatch::position(position))
    }

    /// # Errors
    ///
    /// See [`Self::update_transform`].
    pub fn resize(&mut self, id: ElementId, size: Vector2) -> Result<bool> {
        self.update_transform(id, &TransformPatch::size(size))
    }

    /// Rotate by `radians` around the element's center.
    ///
    /// # Errors
    ///
    /// See [`Self::update_transform`].
    pub fn rotate_by(&mut self, id: ElementId, radians: f64) -> Result<bool> {
        let rotation = self.element(id)?.rotation + radians;
        self.update_transform(id, &TransformPatch::rotation(rotation))
    }

    /// # Errors
    ///
    /// See [`Self::update_transform`]. Also `WrongObjectType` for an
    /// `Invalid` element, which has no border.
    pub fn set_border(&mut self, id: ElementId, border: Border) -> Result<bool> {
        if self.element(id)?.object.border().is_none() {
            return Err(DeckError::WrongObjectType(id));
        }
        self.update_transform(id, &TransformPatch::border(border))
    }

    /// # Errors
    ///
    /// Returns `ElementNotFound`, `WrongObjectType` if the element is not a
    /// shape, or `NotAuthenticated`.
    pub fn update_shape(&mut self, id: ElementId, patch: &ShapePatch) -> Result<()> {
        let user_id = self.auth.user_id()?;
        let element = self.document.find_element_mut(id).ok_or(DeckError::ElementNotFound(id))?;
        let ObjectVariant::Shape(shape) = &mut element.object else {
            return Err(DeckError::WrongObjectType(id));
        };
        patch.apply(shape);
        let write = PendingWrite::Shape(UpdateShapeRequest {
            user_id,
            element_id: id,
            path: shape.path.clone(),
            color: shape.fill_color.clone(),
        });
        self.schedule(WriteKey::object_fields(id), write);
        self.listeners.notify();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ElementNotFound`, `WrongObjectType` if the element is not a
    /// text box, or `NotAuthenticated`.
    pub fn update_text(&mut self, id: ElementId, patch: &TextPatch) -> Result<()> {
        let user_id = self.auth.user_id()?;
        let element = self.document.find_element_mut(id).ok_or(DeckError::ElementNotFound(id))?;
        let ObjectVariant::TextBox(text_box) = &mut element.object else {
            return Err(DeckError::WrongObjectType(id));
        };
        patch.apply(text_box);
        let write = PendingWrite::TextBox(UpdateTextBoxRequest {
            user_id,
            element_id: id,
            text: text_box.text.clone(),
            size: text_box.size,
            weight: text_box.weight,
            font_family: text_box.font_family.clone(),
            align: text_box.align.into(),
        });
        self.schedule(WriteKey::object_fields(id), write);
        self.listeners.notify();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ElementNotFound`, `WrongObjectType` if the element is not
    /// spatial, or `NotAuthenticated`.
    pub fn update_spatial(&mut self, id: ElementId, patch: &SpatialPatch) -> Result<()> {
        let user_id = self.auth.user_id()?;
        let element = self.document.find_element_mut(id).ok_or(DeckError::ElementNotFound(id))?;
        let spatial = element.object.as_spatial_mut().ok_or(DeckError::WrongObjectType(id))?;
        patch.apply(spatial);
        let write = PendingWrite::Spatial(UpdateSpatialRequest {
            user_id,
            element_id: id,
            camera_mode: spatial.camera_mode.into(),
            camera_transform: spatial.camera_transform.into(),
            background_color: spatial.background.to_wire(),
        });
        self.schedule(WriteKey::object_fields(id), write);
        self.listeners.notify();
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Self::update_model`].
    pub fn update_model_transform(
        &mut self,
        spatial_id: ElementId,
        model_id: ModelId,
        transform: ModelTransform,
    ) -> Result<()> {
        self.update_model(spatial_id, model_id, |model| model.transform = transform)
    }

    /// # Errors
    ///
    /// See [`Self::update_model`].
    pub fn set_model_shader(&mut self, spatial_id: ElementId, model_id: ModelId, shader: Shader) -> Result<()> {
        self.update_model(spatial_id, model_id, |model| model.shader = shader)
    }

    /// Returns `ElementNotFound`, `WrongObjectType` if the element is not
    /// spatial, `ModelNotFound`, or `NotAuthenticated`.
    fn update_model(&mut self, spatial_id: ElementId, model_id: ModelId, edit: impl FnOnce(&mut Model)) -> Result<()> {
        let user_id = self.auth.user_id()?;
        let element = self.document.find_element_mut(spatial_id).ok_or(DeckError::ElementNotFound(spatial_id))?;
        let spatial = element.object.as_spatial_mut().ok_or(DeckError::WrongObjectType(spatial_id))?;
        let model = spatial.model_mut(model_id).ok_or(DeckError::ModelNotFound(model_id))?;
        edit(model);
        let write = PendingWrite::Model(UpdateModelRequest {
            user_id,
            model_id,
            position: model.transform.position,
            rotation: model.transform.rotation,
            scale: model.transform.scale,
            shader: model.shader.into(),
        });
        self.schedule(WriteKey::model_transform(model_id), write);
        self.listeners.notify();
        Ok(())
    }

    fn element(&self, id: ElementId) -> Result<&Element> {
        self.document
            .find_element(id)
            .map(|(_, e)| e)
            .ok_or(DeckError::ElementNotFound(id))
    }

    /// Take pending writes for `keys` out of the debouncer so none of them
    /// can land after their record is deleted. If the delete fails the
    /// caller runs them instead.
    fn withdraw_writes(&mut self, keys: &[WriteKey]) -> Vec<WriteJob> {
        let jobs: Vec<WriteJob> = keys.iter().filter_map(|key| self.debouncer.cancel(key)).collect();
        if !jobs.is_empty() {
            debug!(withdrawn = jobs.len(), "withdrew pending writes for deleted records");
        }
        jobs
    }

    fn schedule(&mut self, key: WriteKey, write: PendingWrite) {
        let store = Arc::clone(&self.store);
        let auth = Arc::clone(&self.auth);
        self.debouncer.schedule(
            key,
            Box::pin(async move {
                let result = with_auth_retry(&auth, || write.send(store.as_ref())).await;
                if let Err(e) = result {
                    error!(group = ?key.group, target_id = key.target, error = %e, "debounced write failed");
                }
            }),
        );
    }

    // =========================================================================
    // UPLOADS
    // =========================================================================

    /// Upload new image content for an image element and point it at the
    /// url the server stores it under.
    ///
    /// # Errors
    ///
    /// Returns `NothingToUpload` for empty content, `ElementNotFound`,
    /// `WrongObjectType` for a non-image, otherwise remote failures.
    pub async fn replace_image(&mut self, id: ElementId, content: Vec<u8>) -> Result<()> {
        if !matches!(self.element(id)?.object, ObjectVariant::Image(_)) {
            return Err(DeckError::WrongObjectType(id));
        }
        if content.is_empty() {
            return Err(DeckError::NothingToUpload(id));
        }
        let request = UploadImageRequest { user_id: self.auth.user_id()?, element_id: id, file: content };
        let store = Arc::clone(&self.store);
        let response = with_auth_retry(&self.auth, || store.upload_image(&request)).await?;

        if let Some(Element { object: ObjectVariant::Image(image), .. }) = self.document.find_element_mut(id) {
            image.source_url.clone_from(&response.url);
            image.pending_upload = None;
        }
        self.document.store_asset(response.url, request.file);
        self.listeners.notify();
        Ok(())
    }

    /// Upload a model into a spatial element. Uses `content` when given,
    /// otherwise the blob staged on the element.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound`, `WrongObjectType` for a non-spatial
    /// element, `NothingToUpload` when there is no content, otherwise remote
    /// failures.
    pub async fn add_model(&mut self, spatial_id: ElementId, name: &str, content: Option<Vec<u8>>) -> Result<ModelId> {
        let spatial = self
            .element(spatial_id)?
            .object
            .as_spatial()
            .ok_or(DeckError::WrongObjectType(spatial_id))?;
        let file = content
            .or_else(|| spatial.pending_model_upload.clone())
            .filter(|bytes| !bytes.is_empty())
            .ok_or(DeckError::NothingToUpload(spatial_id))?;

        let request = CreateModelRequest { user_id: self.auth.user_id()?, spatial_id, name: name.to_owned(), file };
        let store = Arc::clone(&self.store);
        let response: ModelDto = with_auth_retry(&self.auth, || store.create_model(&request)).await?;

        let model = Model::from(&response);
        if let Some(spatial) = self.document.find_element_mut(spatial_id).and_then(|e| e.object.as_spatial_mut()) {
            spatial.models.push(model);
            spatial.pending_model_upload = None;
        }
        self.document.store_asset(response.url, request.file);
        info!(element_id = spatial_id, model_id = response.id, "model uploaded");
        self.listeners.notify();
        Ok(response.id)
    }

    // =========================================================================
    // DESIGN METADATA
    // =========================================================================

    /// # Errors
    ///
    /// Propagates remote failures; the title is unchanged on error.
    pub async fn rename_design(&mut self, title: &str) -> Result<()> {
        let request =
            RenameDesignRequest { user_id: self.auth.user_id()?, design_id: self.document.id, name: title.to_owned() };
        let store = Arc::clone(&self.store);
        with_auth_retry(&self.auth, || store.rename_design(&request)).await?;
        self.document.title = request.name;
        self.listeners.notify();
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates remote failures.
    pub async fn set_shared(&mut self, shared: bool) -> Result<()> {
        let request = ShareDesignRequest { user_id: self.auth.user_id()?, design_id: self.document.id, shared };
        let store = Arc::clone(&self.store);
        with_auth_retry(&self.auth, || store.share_design(&request)).await?;
        self.document.shared = shared;
        self.listeners.notify();
        Ok(())
    }

    /// Publish the design as a post. Returns the post id.
    ///
    /// # Errors
    ///
    /// Propagates remote failures.
    pub async fn publish_post(&mut self) -> Result<i64> {
        let request = PublishPostRequest { user_id: self.auth.user_id()?, design_id: self.document.id };
        let store = Arc::clone(&self.store);
        let post = with_auth_retry(&self.auth, || store.publish_post(&request)).await?;
        self.document.published_as_post = true;
        info!(design_id = self.document.id, post_id = post.id, "design published");
        self.listeners.notify();
        Ok(post.id)
    }

    /// # Errors
    ///
    /// Propagates remote failures.
    pub async fn upload_design_thumbnail(&mut self, png: Vec<u8>) -> Result<()> {
        let request = UploadThumbnailRequest {
            user_id: self.auth.user_id()?,
            target: ThumbnailTarget::Design(self.document.id),
            file: png,
        };
        let store = Arc::clone(&self.store);
        with_auth_retry(&self.auth, || store.upload_thumbnail(&request)).await
    }

    /// Upload a rendered thumbnail for the slide at `index` and cache it.
    ///
    /// # Errors
    ///
    /// Returns `SlideIndexOutOfRange` for a bad index, otherwise remote
    /// failures.
    pub async fn upload_slide_thumbnail(&mut self, index: usize, png: Vec<u8>) -> Result<()> {
        self.document.check_index(index)?;
        let slide_id = self.document.slides()[index].id;
        let request =
            UploadThumbnailRequest { user_id: self.auth.user_id()?, target: ThumbnailTarget::Slide(slide_id), file: png };
        let store = Arc::clone(&self.store);
        with_auth_retry(&self.auth, || store.upload_thumbnail(&request)).await?;
        if let Some(slide) = self.document.slide_mut(index) {
            slide.thumbnail = Some(Thumbnail(request.file));
        }
        self.listeners.notify();
        Ok(())
    }
}

/// Every debounce key that can hold a write for `element`.
fn write_keys(element: &Element) -> Vec<WriteKey> {
    let mut keys = vec![WriteKey::element_transform(element.id), WriteKey::object_fields(element.id)];
    if let Some(spatial) = element.object.as_spatial() {
        keys.extend(spatial.models.iter().map(|m| WriteKey::model_transform(m.id)));
    }
    keys
}

fn create_element_request(user_id: UserId, slide_id: SlideId, dto: &ElementDto) -> CreateElementRequest {
    CreateElementRequest {
        user_id,
        slide_id,
        x: dto.x,
        y: dto.y,
        width: dto.width,
        height: dto.height,
        rotation: dto.rotation,
        z: dto.z,
        object: dto.object.clone(),
    }
}
