//! Custom extractors for Axum handlers.
//!
//! Both reject with the standard error envelope instead of axum's plain-text
//! rejections.

pub mod id_path;
pub mod validated_json;

pub use id_path::IdPath;
pub use validated_json::ValidatedJson;
