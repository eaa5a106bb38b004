//! Crate error type.
//!
//! DESIGN
//! ======
//! Every fallible operation returns [`DeckError`]. Variants fall into four
//! classes (see [`ErrorKind`]) that decide how the engine reacts:
//! validation failures never reach the network, authorization failures go
//! through the one-shot refresh-and-retry policy, parse failures degrade a
//! single entity, and transport failures are logged and surfaced.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::model::{AnimationId, ElementId, FrameId, ModelId};

pub type Result<T, E = DeckError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("slide index out of range: {index} (slide count {len})")]
    SlideIndexOutOfRange { index: usize, len: usize },
    #[error("cannot remove the last remaining slide")]
    LastSlide,
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("animation not found: {0}")]
    AnimationNotFound(AnimationId),
    #[error("model not found: {0}")]
    ModelNotFound(ModelId),
    #[error("frame {frame} does not belong to element {element}")]
    FrameNotFound { element: ElementId, frame: FrameId },
    #[error("element {0} has the wrong object type for this edit")]
    WrongObjectType(ElementId),
    #[error("nothing to upload for element {0}")]
    NothingToUpload(ElementId),
    #[error("not signed in")]
    NotAuthenticated,
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unauthorized: HTTP {status}")]
    Unauthorized { status: u16 },
    #[error("session expired; sign in again")]
    SessionExpired,

    #[error("unrecognized object type: {0}")]
    UnknownObjectType(String),
    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed thumbnail: {0}")]
    Thumbnail(#[from] base64::DecodeError),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("render bridge is not ready")]
    BridgeNotReady,
    #[error("render host failed: {0}")]
    RenderHost(String),
}

/// Error classes from the handling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally; no request was issued.
    Validation,
    /// 401/403 or a torn-down session.
    Authorization,
    /// Remote payload could not be understood.
    Parse,
    /// Network, server, or external host failure.
    Transport,
}

impl DeckError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SlideIndexOutOfRange { .. }
            | Self::LastSlide
            | Self::ElementNotFound(_)
            | Self::AnimationNotFound(_)
            | Self::ModelNotFound(_)
            | Self::FrameNotFound { .. }
            | Self::WrongObjectType(_)
            | Self::NothingToUpload(_)
            | Self::Config(_) => ErrorKind::Validation,
            Self::NotAuthenticated | Self::Unauthorized { .. } | Self::SessionExpired => ErrorKind::Authorization,
            Self::UnknownObjectType(_) | Self::Parse(_) | Self::Thumbnail(_) => ErrorKind::Parse,
            Self::Status { .. } | Self::Http(_) | Self::BridgeNotReady | Self::RenderHost(_) => ErrorKind::Transport,
        }
    }

    /// Stable machine-readable code for UI and logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SlideIndexOutOfRange { .. } => "E_SLIDE_INDEX",
            Self::LastSlide => "E_LAST_SLIDE",
            Self::ElementNotFound(_) => "E_ELEMENT_NOT_FOUND",
            Self::AnimationNotFound(_) => "E_ANIMATION_NOT_FOUND",
            Self::ModelNotFound(_) => "E_MODEL_NOT_FOUND",
            Self::FrameNotFound { .. } => "E_FRAME_NOT_FOUND",
            Self::WrongObjectType(_) => "E_WRONG_OBJECT_TYPE",
            Self::NothingToUpload(_) => "E_NOTHING_TO_UPLOAD",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::Config(_) => "E_CONFIG",
            Self::Unauthorized { .. } => "E_UNAUTHORIZED",
            Self::SessionExpired => "E_SESSION_EXPIRED",
            Self::UnknownObjectType(_) => "E_UNKNOWN_OBJECT_TYPE",
            Self::Parse(_) => "E_PARSE",
            Self::Thumbnail(_) => "E_THUMBNAIL",
            Self::Status { .. } => "E_STATUS",
            Self::Http(_) => "E_HTTP",
            Self::BridgeNotReady => "E_BRIDGE_NOT_READY",
            Self::RenderHost(_) => "E_RENDER_HOST",
        }
    }

    /// True for 401/403 responses, which trigger the refresh-and-retry path.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
