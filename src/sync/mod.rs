//! Synchronization between the local document and the persistence API.

pub mod debounce;
pub mod engine;
pub mod ingest;
pub mod listeners;

pub use debounce::{Debouncer, FieldGroup, WriteJob, WriteKey};
pub use engine::SyncEngine;
pub use ingest::load_design;
pub use listeners::{ListenerId, Listeners};
