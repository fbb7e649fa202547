use std::fmt::Display;

use axum::{
    body::Body,
    extract::{FromRef, FromRequest, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::{de::DeserializeOwned, Serialize};
use toolkit_core::{decode_json, JsonResponse, ToolkitConfig, ToolkitError, ToolkitResult};

use crate::{ApiError, ToolkitState};

/// Read a request body, capped at the configured JSON limit, and decode
/// exactly one JSON value from it.
pub async fn read_json<T>(config: &ToolkitConfig, body: Body) -> ToolkitResult<T>
where
    T: DeserializeOwned,
{
    let limit = config.effective_max_json_bytes();

    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::debug!(limit, "rejected oversized JSON body");
            return Err(ToolkitError::BodyTooLarge { limit });
        }
        Err(err) => return Err(ToolkitError::transport(err)),
    };

    decode_json(config, &bytes)
}

/// Serialize `data` into a JSON response.
///
/// Serialization happens first; on failure nothing is built. Each header
/// name in `extra_headers` replaces any value the response already has for
/// it, then `Content-Type` is forced to `application/json`.
pub fn write_json<T>(
    status: StatusCode,
    data: &T,
    extra_headers: Option<&HeaderMap>,
) -> ToolkitResult<Response>
where
    T: Serialize + ?Sized,
{
    let out = serde_json::to_vec(data)?;

    let mut response = Response::new(Body::from(out));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    if let Some(extra) = extra_headers {
        for name in extra.keys() {
            headers.remove(name);
            for value in extra.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok(response)
}

/// Render `err` as `{"error": true, "message": ...}` with `status`,
/// defaulting to 400 Bad Request.
pub fn error_json<E>(err: &E, status: Option<StatusCode>) -> ToolkitResult<Response>
where
    E: Display + ?Sized,
{
    let payload: JsonResponse = JsonResponse::failure(err.to_string());
    write_json(status.unwrap_or(StatusCode::BAD_REQUEST), &payload, None)
}

/// Extractor running [`read_json`] with the router's [`ToolkitState`] config.
///
/// Rejections render through [`ApiError`], so handlers get the classified
/// error envelope without extra mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictJson<T>(pub T);

impl<T, S> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    ToolkitState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let toolkit = ToolkitState::from_ref(state);
        let value = read_json(&toolkit.config, req.into_body()).await?;
        Ok(StrictJson(value))
    }
}
