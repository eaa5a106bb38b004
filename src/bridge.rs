//! Render bridge: the asynchronous channel to the 3D scene host.
//!
//! DESIGN
//! ======
//! The scene renderer runs in a separate host reached only through string
//! messages addressed to a named handler. The bridge boots the host once
//! (concurrent callers share the same boot), waits a fixed warm-up for the
//! host to finish loading, and only then flips its readiness flag.
//!
//! Messages sent before readiness are rejected and logged, never queued.

#[cfg(test)]
#[path = "bridge_test.rs"]
mod bridge_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::DeckConfig;
use crate::error::{DeckError, Result};
use crate::model::{Background, SpatialObject};
use crate::wire::{CameraTransformDto, ModelDto};

/// Handler object inside the host that receives every message.
pub const MESSAGE_HANDLER: &str = "Web Message Handler";

/// The scene host process, as seen from the editor.
#[async_trait::async_trait]
pub trait RenderHost: Send + Sync {
    /// Load and start the host.
    async fn boot(&self) -> Result<()>;
    /// Move the host's output onto the given surface and make it visible.
    async fn attach(&self, surface: &str) -> Result<()>;
    async fn post(&self, handler: &str, method: &str, payload: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMethod {
    LoadModel,
    SetCameraMode,
    SetCameraPositionAndRotation,
    SetCameraBackgroundMode,
    SetCameraBackgroundColor,
    SetPlayMode,
    EnableInput,
}

impl BridgeMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadModel => "LoadModel",
            Self::SetCameraMode => "SetCameraMode",
            Self::SetCameraPositionAndRotation => "SetCameraPositionAndRotation",
            Self::SetCameraBackgroundMode => "SetCameraBackgroundMode",
            Self::SetCameraBackgroundColor => "SetCameraBackgroundColor",
            Self::SetPlayMode => "SetPlayMode",
            Self::EnableInput => "EnableInput",
        }
    }
}

pub struct RenderBridge {
    host: Box<dyn RenderHost>,
    warmup: Duration,
    booted: OnceCell<()>,
    ready: AtomicBool,
}

impl RenderBridge {
    #[must_use]
    pub fn new(host: impl RenderHost + 'static, config: &DeckConfig) -> Self {
        Self { host: Box::new(host), warmup: config.bridge_warmup, booted: OnceCell::new(), ready: AtomicBool::new(false) }
    }

    /// Boot the host and wait out the warm-up. Idempotent: later and
    /// concurrent calls wait for the first boot instead of starting another.
    ///
    /// # Errors
    ///
    /// Returns the host's boot failure; a later call will try again.
    pub async fn instantiate(&self) -> Result<()> {
        self.booted
            .get_or_try_init(|| async {
                self.host.boot().await?;
                tokio::time::sleep(self.warmup).await;
                self.ready.store(true, Ordering::Release);
                info!(warmup = ?self.warmup, "render host ready");
                Ok::<_, DeckError>(())
            })
            .await
            .map(|_| ())
    }

    #[must_use]
    pub fn has_instance(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Show a spatial scene on `surface`: camera, background, then every model.
    ///
    /// # Errors
    ///
    /// Returns `BridgeNotReady` before [`Self::instantiate`] has finished,
    /// otherwise the host's failure.
    pub async fn render(&self, surface: &str, spatial: &SpatialObject) -> Result<()> {
        if !self.has_instance() {
            error!(surface, "render host must be instantiated before rendering");
            return Err(DeckError::BridgeNotReady);
        }

        self.send_message(BridgeMethod::SetCameraMode, spatial.camera_mode.as_str())
            .await?;
        let pose = serde_json::to_string(&CameraTransformDto::from(spatial.camera_transform))?;
        self.send_message(BridgeMethod::SetCameraPositionAndRotation, &pose)
            .await?;
        match &spatial.background {
            Background::Skybox => {
                self.send_message(BridgeMethod::SetCameraBackgroundMode, Background::SKYBOX)
                    .await?;
            }
            Background::Color(color) => {
                self.send_message(BridgeMethod::SetCameraBackgroundMode, "color")
                    .await?;
                self.send_message(BridgeMethod::SetCameraBackgroundColor, color)
                    .await?;
            }
        }
        for model in &spatial.models {
            let payload = serde_json::to_string(&ModelDto::from(model))?;
            self.send_message(BridgeMethod::LoadModel, &payload).await?;
        }

        self.host.attach(surface).await
    }

    /// # Errors
    ///
    /// Returns `BridgeNotReady` before readiness, otherwise the host's failure.
    pub async fn send_message(&self, method: BridgeMethod, params: &str) -> Result<()> {
        if !self.has_instance() {
            error!(method = method.as_str(), "render host must be instantiated before sending messages");
            return Err(DeckError::BridgeNotReady);
        }
        self.host
            .post(MESSAGE_HANDLER, method.as_str(), params)
            .await
    }

    /// # Errors
    ///
    /// See [`Self::send_message`].
    pub async fn set_play_mode(&self, playing: bool) -> Result<()> {
        self.send_message(BridgeMethod::SetPlayMode, if playing { "true" } else { "false" })
            .await
    }

    /// # Errors
    ///
    /// See [`Self::send_message`].
    pub async fn enable_input(&self, enabled: bool) -> Result<()> {
        self.send_message(BridgeMethod::EnableInput, if enabled { "true" } else { "false" })
            .await
    }
}
