//! Shared utility functions.

mod mime;

pub use mime::{detect_mime, OCTET_STREAM};
