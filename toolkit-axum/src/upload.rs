//! Multipart upload intake.
//!
//! File parts are streamed to disk one at a time. Each part's leading bytes
//! are sniffed before its destination file is created, so a part whose
//! type is not allowed never reaches the filesystem. A part is only
//! visible under its final name once it has been read to the end.

use std::path::{Path, PathBuf};

use axum::{
    extract::Request,
    http::header,
};
use bytes::BytesMut;
use multer::{Constraints, Field, Multipart, SizeLimit};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use toolkit_core::{
    ensure_dir, generate_random_string, sniff_content_type, ToolkitConfig, ToolkitError,
    SNIFF_LEN,
};

/// Length of generated names for renamed uploads, extension excluded.
pub const RENAMED_FILE_LEN: usize = 25;

const STAGING_NAME_LEN: usize = 16;
const STAGING_SUFFIX: &str = ".part";

/// One file written by [`upload_files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Name of the file inside the target directory
    pub new_file_name: String,
    /// Name the client sent, reduced to its final path component
    pub original_file_name: String,
    /// Bytes written
    pub file_size: u64,
}

/// Upload error together with the files written before it happened.
///
/// Files in `uploaded` stay on disk.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct UploadFailure {
    pub uploaded: Vec<UploadedFile>,
    #[source]
    pub error: ToolkitError,
}

impl UploadFailure {
    fn new(uploaded: Vec<UploadedFile>, error: ToolkitError) -> Self {
        Self { uploaded, error }
    }
}

impl From<ToolkitError> for UploadFailure {
    fn from(error: ToolkitError) -> Self {
        Self::new(Vec::new(), error)
    }
}

/// Persist every file part of a `multipart/form-data` request into
/// `target_dir`.
///
/// With `rename` each file is stored under a fresh random name that keeps
/// the original extension; otherwise the client's file name is used and
/// an existing file with that name is overwritten.
pub async fn upload_files(
    config: &ToolkitConfig,
    req: Request,
    target_dir: impl AsRef<Path>,
    rename: bool,
) -> Result<Vec<UploadedFile>, UploadFailure> {
    let target_dir = target_dir.as_ref();
    ensure_dir(target_dir).await?;

    let limit = config.effective_max_upload_bytes();
    let mut multipart = open_multipart(req, limit)?;

    let mut uploaded = Vec::new();
    match intake(config, &mut multipart, target_dir, rename, &mut uploaded).await {
        Ok(()) => Ok(uploaded),
        Err(error) => Err(UploadFailure::new(uploaded, error)),
    }
}

/// [`upload_files`] for forms expected to carry a single file; returns the
/// first stored file.
pub async fn upload_one(
    config: &ToolkitConfig,
    req: Request,
    target_dir: impl AsRef<Path>,
    rename: bool,
) -> Result<UploadedFile, UploadFailure> {
    let files = upload_files(config, req, target_dir, rename).await?;
    files
        .into_iter()
        .next()
        .ok_or_else(|| UploadFailure::new(Vec::new(), ToolkitError::NoFiles))
}

fn open_multipart(req: Request, limit: u64) -> Result<Multipart<'static>, ToolkitError> {
    let headers = req.headers();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| ToolkitError::multipart(e.to_string()))?;

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(length) = declared {
        if length > limit {
            return Err(ToolkitError::UploadTooLarge { limit });
        }
    }

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    Ok(Multipart::with_constraints(
        req.into_body().into_data_stream(),
        boundary,
        constraints,
    ))
}

async fn intake(
    config: &ToolkitConfig,
    multipart: &mut Multipart<'static>,
    target_dir: &Path,
    rename: bool,
    uploaded: &mut Vec<UploadedFile>,
) -> Result<(), ToolkitError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        // Parts without a file name are plain form values.
        let Some(client_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let original_file_name = base_name(&client_name)?;

        let mut head = BytesMut::with_capacity(SNIFF_LEN);
        while head.len() < SNIFF_LEN {
            match field.chunk().await.map_err(multipart_error)? {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => break,
            }
        }

        let content_type = sniff_content_type(&head);
        if !config.is_content_type_allowed(&content_type) {
            tracing::warn!(
                file = %original_file_name,
                %content_type,
                "rejected upload with disallowed content type"
            );
            return Err(ToolkitError::TypeNotAllowed { content_type });
        }

        let new_file_name = if rename {
            format!(
                "{}{}",
                config.random_string(RENAMED_FILE_LEN),
                extension(&original_file_name)
            )
        } else {
            original_file_name.clone()
        };

        let path = target_dir.join(&new_file_name);
        let file_size = store_part(&mut field, &head, &path).await?;

        tracing::debug!(
            file = %new_file_name,
            original = %original_file_name,
            %content_type,
            size = file_size,
            "stored upload"
        );

        uploaded.push(UploadedFile {
            new_file_name,
            original_file_name,
            file_size,
        });
    }

    Ok(())
}

/// Stream the rest of `field` into `path`.
///
/// Bytes go to a hidden staging file next to `path` that is renamed into
/// place once the part has ended; on failure the staging file is removed
/// and `path` is left untouched.
async fn store_part(
    field: &mut Field<'static>,
    head: &[u8],
    path: &Path,
) -> Result<u64, ToolkitError> {
    let staging = staging_path(path);

    match write_staged(field, head, &staging).await {
        Ok(file_size) => {
            tokio::fs::rename(&staging, path).await?;
            Ok(file_size)
        }
        Err(err) => {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        file = %staging.display(),
                        error = %cleanup,
                        "could not remove partial upload"
                    );
                }
            }
            Err(err)
        }
    }
}

async fn write_staged(
    field: &mut Field<'static>,
    head: &[u8],
    staging: &Path,
) -> Result<u64, ToolkitError> {
    let mut outfile = tokio::fs::File::create(staging).await?;

    outfile.write_all(head).await?;
    let mut file_size = head.len() as u64;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        outfile.write_all(&chunk).await?;
        file_size += chunk.len() as u64;
    }
    outfile.flush().await?;

    Ok(file_size)
}

fn staging_path(path: &Path) -> PathBuf {
    let name = format!(".{}{}", generate_random_string(STAGING_NAME_LEN), STAGING_SUFFIX);
    path.with_file_name(name)
}

fn multipart_error(err: multer::Error) -> ToolkitError {
    match err {
        multer::Error::StreamSizeExceeded { limit } => ToolkitError::UploadTooLarge { limit },
        multer::Error::StreamReadFailed(source) => ToolkitError::transport(source),
        other => ToolkitError::multipart(other.to_string()),
    }
}

// Clients may send full paths; only the last component is kept.
fn base_name(client_name: &str) -> Result<String, ToolkitError> {
    let normalized = client_name.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ToolkitError::InvalidFileName {
            name: client_name.to_string(),
        })
}

/// Extension of `name` including its leading dot, or an empty string.
fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}
