//! toolkit-core: framework-agnostic web helpers.
//!
//! Random identifiers, slugs, directory creation, content sniffing and
//! strict JSON decoding. The transport bindings live in `toolkit-axum`.

pub mod config;
pub mod envelope;
pub mod errors;
pub mod fs;
pub mod ids;
pub mod json;
pub mod slug;
pub mod sniff;

pub use config::{Settings, ToolkitConfig, DEFAULT_MAX_JSON_BYTES, DEFAULT_MAX_UPLOAD_BYTES};
pub use envelope::JsonResponse;
pub use errors::{BoxError, ErrorKind, ToolkitError, ToolkitResult};
pub use fs::ensure_dir;
pub use ids::{generate_random_string, Alphabet, DEFAULT_ALPHABET};
pub use json::decode_json;
pub use slug::slugify;
pub use sniff::{sniff_content_type, SNIFF_LEN};
