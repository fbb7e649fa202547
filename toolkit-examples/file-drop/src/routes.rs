use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use toolkit_axum::{send_file, upload_files, upload_one, write_json, ApiError, StrictJson};
use toolkit_core::{slugify, JsonResponse};

use crate::AppState;

const MAX_ID_LEN: usize = 256;

pub async fn upload_many(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    let files = upload_files(&state.toolkit.config, req, state.upload_dir.as_path(), true)
        .await
        .map_err(|failure| {
            if !failure.uploaded.is_empty() {
                tracing::warn!(kept = failure.uploaded.len(), "upload stopped after storing some files");
            }
            failure
        })?;

    let message = format!("{} file(s) uploaded", files.len());
    Ok(write_json(StatusCode::CREATED, &JsonResponse::success(message, files), None)?)
}

pub async fn upload_original(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, ApiError> {
    let file = upload_one(&state.toolkit.config, req, state.upload_dir.as_path(), false).await?;
    Ok(write_json(StatusCode::CREATED, &JsonResponse::success("uploaded", file), None)?)
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(rename = "as")]
    display_name: Option<String>,
}

pub async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<DownloadQuery>,
    req: Request,
) -> Response {
    let display_name = query.display_name.unwrap_or_else(|| name.clone());
    send_file(req, state.upload_dir.as_path(), &name, &display_name).await
}

#[derive(Debug, Deserialize)]
pub struct SlugRequest {
    text: String,
}

pub async fn create_slug(StrictJson(body): StrictJson<SlugRequest>) -> Result<Response, ApiError> {
    let slug = slugify(&body.text)?;
    Ok(write_json(StatusCode::OK, &JsonResponse::success("slug created", json!({ "slug": slug })), None)?)
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    len: Option<usize>,
}

pub async fn random_id(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Response, ApiError> {
    let len = query.len.unwrap_or(25).min(MAX_ID_LEN);
    let id = state.toolkit.config.random_string(len);
    Ok(write_json(StatusCode::OK, &JsonResponse::success("id generated", json!({ "id": id })), None)?)
}
