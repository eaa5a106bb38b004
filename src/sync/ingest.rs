//! Design ingestion: remote payloads into a [`DesignDocument`].
//!
//! DESIGN
//! ======
//! Loading walks the document top-down: the design with its ordered slides,
//! then per slide the frames of every spatial element and the slide's
//! animations, and finally the binary content behind image and model urls.
//!
//! Degradation is per entity. A malformed element becomes `Invalid`, an
//! undecodable thumbnail is dropped, a missing animation frame is cleared,
//! and a failed content download leaves the asset cache without that entry.
//! Each is logged at `warn`. Failures fetching the design, its frames, or its
//! animations abort the load.
//!
//! A design stored without slides gets one blank slide created remotely, so
//! the document never holds a slide the server has not assigned an id to.
//! Content downloads go through the same refresh-and-retry policy as every
//! other request.

#[cfg(test)]
#[path = "ingest_test.rs"]
mod ingest_test;

use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{DeckError, Result};
use crate::model::{Animation, DesignDocument, DesignId, Element, Frame, ObjectVariant, Slide, Thumbnail};
use crate::remote::{AuthSession, RemoteStore, with_auth_retry};
use crate::wire::{AnimationDto, CreateSlideRequest, SlideDto, element_from_value};

/// Fetch and assemble a complete design document.
///
/// # Errors
///
/// Returns the first failure fetching the design, a slide's animations, or
/// a spatial element's frames, or creating the first slide of an empty
/// design.
pub async fn load_design(store: &dyn RemoteStore, auth: &AuthSession, design_id: DesignId) -> Result<DesignDocument> {
    let dto = with_auth_retry(auth, || store.get_design(design_id)).await?;
    info!(design_id, slides = dto.slides.len(), "loading design");

    let mut slides = Vec::with_capacity(dto.slides.len().max(1));
    for slide in &dto.slides {
        slides.push(load_slide(store, auth, slide).await?);
    }
    if slides.is_empty() {
        slides.push(create_first_slide(store, auth, dto.id).await?);
    }

    let mut document = DesignDocument::new(dto.id, dto.name, slides);
    document.shared = dto.shared;
    document.published_as_post = dto.published;
    prefetch_assets(store, auth, &mut document).await;

    info!(design_id, slides = document.slide_count(), "design loaded");
    Ok(document)
}

/// A design must hold at least one slide; an empty one gets a blank slide
/// persisted before anything can be placed on it.
async fn create_first_slide(store: &dyn RemoteStore, auth: &AuthSession, design_id: DesignId) -> Result<Slide> {
    let request = CreateSlideRequest { user_id: auth.user_id()?, design_id, index: 0 };
    let dto = with_auth_retry(auth, || store.create_slide(&request)).await?;
    info!(design_id, slide_id = dto.id, "created first slide for empty design");
    Ok(Slide::new(dto.id))
}

async fn load_slide(store: &dyn RemoteStore, auth: &AuthSession, dto: &SlideDto) -> Result<Slide> {
    let mut elements: Vec<Element> = dto.elements.iter().filter_map(element_from_value).collect();

    for element in &mut elements {
        let id = element.id;
        if let ObjectVariant::Spatial(spatial) = &mut element.object {
            let frames = with_auth_retry(auth, || store.get_frames(id)).await?;
            spatial.frames = frames.iter().map(Frame::from).collect();
        }
    }

    let slide_id = dto.id;
    let animations = with_auth_retry(auth, || store.get_animations(slide_id))
        .await?
        .iter()
        .map(|a| animation_from_dto(a, &elements))
        .collect();

    let thumbnail = dto.thumbnail.as_deref().filter(|raw| !raw.trim().is_empty()).and_then(|raw| {
        Thumbnail::from_base64(raw)
            .map_err(DeckError::from)
            .inspect_err(|e| warn!(slide_id, error = %e, "dropping undecodable thumbnail"))
            .ok()
    });

    Ok(Slide::from_parts(slide_id, thumbnail, elements, animations))
}

/// Resolve an animation's frame id against the spatial elements of its
/// slide, preferring the animation's own target.
fn animation_from_dto(dto: &AnimationDto, elements: &[Element]) -> Animation {
    let frame = dto.frame_id.and_then(|frame_id| {
        let target = elements.iter().filter(|e| e.id == dto.element_id);
        let others = elements.iter().filter(|e| e.id != dto.element_id);
        let found = target
            .chain(others)
            .filter_map(|e| e.object.as_spatial())
            .find_map(|s| s.frame(frame_id))
            .cloned();
        if found.is_none() {
            warn!(animation_id = dto.id, frame_id, "animation frame not found; clearing");
        }
        found
    });

    Animation {
        id: dto.id,
        target: dto.element_id,
        effect: dto.effect.into(),
        timing: dto.timing.into(),
        duration_ms: dto.duration,
        frame,
    }
}

/// Urls of every image and model in the document, deduplicated.
fn asset_urls(document: &DesignDocument) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    for element in document.slides().iter().flat_map(Slide::elements) {
        match &element.object {
            ObjectVariant::Image(image) if !image.source_url.is_empty() => {
                urls.insert(image.source_url.clone());
            }
            ObjectVariant::Spatial(spatial) => {
                urls.extend(spatial.models.iter().filter(|m| !m.url.is_empty()).map(|m| m.url.clone()));
            }
            _ => {}
        }
    }
    urls
}

async fn prefetch_assets(store: &dyn RemoteStore, auth: &AuthSession, document: &mut DesignDocument) {
    let urls: Vec<String> = asset_urls(document).into_iter().collect();
    if urls.is_empty() {
        return;
    }

    let fetches = urls
        .iter()
        .map(|url| with_auth_retry(auth, move || store.fetch_content(url)));
    let results = join_all(fetches).await;
    let mut fetched = 0usize;
    for (url, result) in urls.into_iter().zip(results) {
        match result {
            Ok(bytes) => {
                document.store_asset(url, bytes);
                fetched += 1;
            }
            Err(e) => warn!(url = %url, error = %e, "asset download failed"),
        }
    }
    info!(design_id = document.id, fetched, "assets cached");
}
