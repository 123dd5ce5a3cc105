//! Domain models shared across the API surface.

pub mod generation;

pub use generation::{GenerationJob, GenerationStatus, ImageAsset};
