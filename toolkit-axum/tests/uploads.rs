use axum::body::{Body, Bytes};
use axum::http::Request;
use toolkit_axum::{upload_files, upload_one};
use toolkit_core::{ToolkitConfig, ToolkitError};

const BOUNDARY: &str = "XtoolkitBoundary";

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0\x1f\x15\xc4\x89";

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    data: &'a [u8],
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.name, filename
                    )
                    .as_bytes(),
                );
                // Deliberately wrong: the sniffed type must win over the client's label.
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let body = multipart_body(parts);
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len().to_string())
        .body(Body::from(body))
        .unwrap()
}

fn png_part<'a>(filename: &'a str) -> Part<'a> {
    Part {
        name: "file",
        filename: Some(filename),
        data: PNG,
    }
}

fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn allowed_type_is_stored_under_a_new_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::new()
        .allow_content_type("image/jpeg")
        .allow_content_type("image/png");

    let files = upload_files(&config, multipart_request(&[png_part("img.png")]), dir.path(), true)
        .await
        .unwrap();

    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file.original_file_name, "img.png");
    assert!(file.new_file_name.ends_with(".png"));
    assert_eq!(file.new_file_name.len(), 25 + ".png".len());
    assert_eq!(file.file_size, PNG.len() as u64);

    let stored = std::fs::read(dir.path().join(&file.new_file_name)).unwrap();
    assert_eq!(stored, PNG);
}

#[tokio::test]
async fn disallowed_type_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::new().allow_content_type("image/jpeg");

    let failure = upload_files(&config, multipart_request(&[png_part("img.png")]), dir.path(), true)
        .await
        .unwrap_err();

    assert!(failure.uploaded.is_empty());
    assert!(matches!(
        failure.error,
        ToolkitError::TypeNotAllowed { ref content_type } if content_type == "image/png"
    ));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn rename_false_keeps_the_client_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::default();

    let file = upload_one(&config, multipart_request(&[png_part("photo.png")]), dir.path(), false)
        .await
        .unwrap();

    assert_eq!(file.new_file_name, "photo.png");
    assert_eq!(files_in(dir.path()), vec!["photo.png".to_string()]);
}

#[tokio::test]
async fn client_paths_are_reduced_to_the_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::default();

    let file = upload_one(
        &config,
        multipart_request(&[png_part("../../escape.png")]),
        dir.path(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(file.original_file_name, "escape.png");
    assert!(dir.path().join("escape.png").exists());
}

#[tokio::test]
async fn text_fields_are_skipped_and_every_file_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::default();

    let request = multipart_request(&[
        Part {
            name: "title",
            filename: None,
            data: b"holiday",
        },
        png_part("one.png"),
        Part {
            name: "notes",
            filename: Some("notes.txt"),
            data: b"plain text notes",
        },
    ]);

    let files = upload_files(&config, request, dir.path(), false).await.unwrap();

    let names: Vec<&str> = files.iter().map(|f| f.new_file_name.as_str()).collect();
    assert_eq!(names, vec!["one.png", "notes.txt"]);
    assert_eq!(files[1].file_size, "plain text notes".len() as u64);
}

#[tokio::test]
async fn failure_midway_returns_files_already_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::new().allow_content_type("image/png");

    let request = multipart_request(&[
        png_part("first.png"),
        Part {
            name: "file",
            filename: Some("second.txt"),
            data: b"not an image",
        },
        png_part("third.png"),
    ]);

    let failure = upload_files(&config, request, dir.path(), false)
        .await
        .unwrap_err();

    assert_eq!(failure.uploaded.len(), 1);
    assert_eq!(failure.uploaded[0].new_file_name, "first.png");
    assert!(matches!(failure.error, ToolkitError::TypeNotAllowed { .. }));
    assert_eq!(files_in(dir.path()), vec!["first.png".to_string()]);
}

#[tokio::test]
async fn missing_target_directory_is_created() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("nested").join("uploads");
    let config = ToolkitConfig::default();

    upload_files(&config, multipart_request(&[png_part("img.png")]), &target, true)
        .await
        .unwrap();

    assert_eq!(files_in(&target).len(), 1);
}

#[tokio::test]
async fn declared_length_over_the_cap_is_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::new().with_max_upload_bytes(16);

    let failure = upload_files(&config, multipart_request(&[png_part("img.png")]), dir.path(), true)
        .await
        .unwrap_err();

    assert!(matches!(failure.error, ToolkitError::UploadTooLarge { limit: 16 }));
    assert_eq!(failure.error.status_code(), 413);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn undeclared_length_over_the_cap_is_rejected_while_streaming() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::new().with_max_upload_bytes(32);

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(&[png_part("img.png"), png_part("two.png")])))
        .unwrap();

    let failure = upload_files(&config, request, dir.path(), true)
        .await
        .unwrap_err();

    assert!(matches!(failure.error, ToolkitError::UploadTooLarge { limit: 32 }));
}

fn text_part<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        filename: Some(filename),
        data,
    }
}

/// Request without Content-Length whose body arrives in 256-byte chunks,
/// yielding to the runtime between them. With `fail_after` set the stream
/// errors once that many chunks have been sent.
fn trickled_request(body: Vec<u8>, fail_after: Option<usize>) -> Request<Body> {
    let chunks: Vec<Bytes> = body.chunks(256).map(Bytes::copy_from_slice).collect();
    let stream = futures::stream::unfold((chunks.into_iter(), 0usize), move |(mut chunks, sent)| async move {
        tokio::task::yield_now().await;
        if fail_after == Some(sent) {
            let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away");
            return Some((Err(err), (chunks, sent + 1)));
        }
        let chunk = chunks.next()?;
        Some((Ok(chunk), (chunks, sent + 1)))
    });

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from_stream(stream))
        .unwrap()
}

#[tokio::test]
async fn cap_crossed_mid_part_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::new().with_max_upload_bytes(2000);
    let big = vec![b'a'; 4000];
    let body = multipart_body(&[
        text_part("one.txt", b"sixteen bytes!!!"),
        text_part("two.txt", &big),
    ]);

    let failure = upload_files(&config, trickled_request(body, None), dir.path(), false)
        .await
        .unwrap_err();

    assert!(matches!(failure.error, ToolkitError::UploadTooLarge { limit: 2000 }));
    assert_eq!(failure.uploaded.len(), 1);
    assert_eq!(failure.uploaded[0].new_file_name, "one.txt");
    assert_eq!(failure.uploaded[0].file_size, 16);
    assert_eq!(files_in(dir.path()), vec!["one.txt".to_string()]);
}

#[tokio::test]
async fn broken_stream_keeps_existing_file_intact() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("two.txt"), b"old contents").unwrap();
    let config = ToolkitConfig::default();
    let big = vec![b'a'; 4000];
    let body = multipart_body(&[text_part("two.txt", &big)]);

    let failure = upload_files(&config, trickled_request(body, Some(6)), dir.path(), false)
        .await
        .unwrap_err();

    assert!(failure.uploaded.is_empty());
    assert!(!failure.error.is_client_error());
    assert_eq!(files_in(dir.path()), vec!["two.txt".to_string()]);
    assert_eq!(
        std::fs::read(dir.path().join("two.txt")).unwrap(),
        b"old contents"
    );
}

#[tokio::test]
async fn trickled_body_within_the_cap_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::default();
    let big = vec![b'a'; 4000];
    let body = multipart_body(&[text_part("two.txt", &big)]);

    let files = upload_files(&config, trickled_request(body, None), dir.path(), false)
        .await
        .unwrap();

    assert_eq!(files[0].file_size, 4000);
    assert_eq!(files_in(dir.path()), vec!["two.txt".to_string()]);
}

#[tokio::test]
async fn non_multipart_request_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::default();

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let failure = upload_files(&config, request, dir.path(), true)
        .await
        .unwrap_err();
    assert!(matches!(failure.error, ToolkitError::Multipart { .. }));
}

#[tokio::test]
async fn upload_one_without_files_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolkitConfig::default();

    let request = multipart_request(&[Part {
        name: "title",
        filename: None,
        data: b"no files here",
    }]);

    let failure = upload_one(&config, request, dir.path(), true)
        .await
        .unwrap_err();
    assert!(matches!(failure.error, ToolkitError::NoFiles));
}
