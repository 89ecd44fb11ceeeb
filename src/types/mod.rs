// ABOUTME: Validated leaf value types shared across the pipeline.
// ABOUTME: Image references, attempt IDs, retag options, registry scope.

mod attempt_id;
mod image_option;
mod image_ref;
mod registry_scope;

pub use attempt_id::AttemptId;
pub use image_option::{ImageOption, ImageOptions, InvalidImageOption};
pub use image_ref::{ImageRef, MalformedReferenceError};
pub use registry_scope::RegistryScope;
