//! Core value types shared by the retail prompt layer.

#![warn(missing_docs, clippy::pedantic)]

mod disposition;
mod error;
mod ids;
mod media;
mod violation;

/// Closed routing decision for returned items.
pub use disposition::Disposition;
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Correlation identifier attached to every invocation.
pub use ids::InvocationId;
/// Validated `data:` URI carrying a base64 image.
pub use media::ImageDataUri;
/// A single input field that failed validation.
pub use violation::FieldViolation;
