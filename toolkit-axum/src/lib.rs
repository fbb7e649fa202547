//! toolkit-axum: axum bindings for toolkit.
//!
//! Multipart upload intake, attachment downloads and strict JSON
//! request/response helpers on top of `toolkit-core`.

pub mod download;
pub mod json;
pub mod state;
pub mod upload;
mod error;
pub use error::ApiError;
pub use state::ToolkitState;

pub use download::send_file;
pub use json::{error_json, read_json, write_json, StrictJson};
pub use upload::{upload_files, upload_one, UploadFailure, UploadedFile};

pub use axum;
pub use toolkit_core as core;
