//! Slide deck document model and synchronization engine.
//!
//! ARCHITECTURE
//! ============
//! Leaves first: [`geometry`] vectors, the [`model`] (object variants,
//! elements, slides, the design document, the selection), the [`stacking`]
//! z-order engine, the [`wire`] format, the [`remote`] collaborators (store
//! trait, reqwest client, auth session), the [`sync`] engine that ties them
//! together, and the [`bridge`] to the 3D render host.

pub mod bridge;
pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod remote;
pub mod stacking;
pub mod sync;
pub mod wire;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use bridge::{BridgeMethod, RenderBridge, RenderHost};
pub use config::DeckConfig;
pub use error::{DeckError, ErrorKind, Result};
pub use remote::{AuthSession, HttpStore, RemoteStore};
pub use stacking::StackCommand;
pub use sync::SyncEngine;
