use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use toolkit_core::ToolkitError;

use crate::json::error_json;
use crate::upload::UploadFailure;

#[derive(Debug)]
pub struct ApiError(pub ToolkitError);

impl From<ToolkitError> for ApiError {
    fn from(e: ToolkitError) -> Self {
        Self(e)
    }
}

impl From<UploadFailure> for ApiError {
    fn from(e: UploadFailure) -> Self {
        Self(e.error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Server-side failures keep their details out of the response body.
        let rendered = if status.is_server_error() {
            let kind = self.0.kind();
            tracing::error!(
                kind = kind.name(),
                class = kind.class_name(),
                error = %self.0,
                "request failed"
            );
            error_json(&"internal server error", Some(status))
        } else {
            error_json(&self.0, Some(status))
        };

        match rendered {
            Ok(response) => response,
            Err(_) => {
                let mut response = (status, self.0.to_string()).into_response();
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                response
            }
        }
    }
}
