use std::path::Path;

use tokio::fs::DirBuilder;

use crate::errors::ToolkitResult;

/// Permission bits for directories created by the toolkit (rwxr-xr-x).
pub const DIR_MODE: u32 = 0o755;

/// Make sure `path` exists as a directory, creating missing parents.
///
/// Succeeds without touching anything when the directory is already there.
/// A path that exists but is not a directory is reported as an error.
pub async fn ensure_dir(path: impl AsRef<Path>) -> ToolkitResult<()> {
    let path = path.as_ref();

    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", path.display()),
            )
            .into())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(path).await?;

    tracing::debug!(path = %path.display(), "created directory");
    Ok(())
}
