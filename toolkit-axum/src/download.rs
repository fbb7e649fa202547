use std::path::{Component, Path};

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Stream `directory/file_name` as an attachment named `display_name`.
///
/// Range and conditional requests (`Range`, `If-Modified-Since`, ...) are
/// handled by [`ServeFile`]. A missing file is a plain 404 from the same
/// service. File names that climb out of `directory` get a 404 without
/// touching the filesystem.
pub async fn send_file(
    req: Request,
    directory: impl AsRef<Path>,
    file_name: &str,
    display_name: &str,
) -> Response {
    if escapes_directory(file_name) {
        tracing::warn!(file = %file_name, "refused download outside of directory");
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = directory.as_ref().join(file_name);
    let mut response = match ServeFile::new(&path).oneshot(req).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, attachment_header(display_name));
    } else {
        tracing::debug!(path = %path.display(), %status, "download not served");
    }

    response
}

fn escapes_directory(file_name: &str) -> bool {
    Path::new(file_name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

fn attachment_header(display_name: &str) -> HeaderValue {
    let cleaned: String = display_name
        .chars()
        .map(|c| {
            if matches!(c, ' '..='~') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    HeaderValue::from_str(&format!("attachment; filename=\"{cleaned}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
