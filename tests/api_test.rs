use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use filebrowser::api::{router, AppState, ServerOptions};
use filebrowser::core::config::RootDirectory;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "X-FILEBROWSER-BOUNDARY";

struct Fixture {
    _temp: TempDir,
    root: PathBuf,
    app: Router,
}

fn fixture_with(options: ServerOptions) -> Result<Fixture> {
    let temp = tempdir()?;
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("docs").join("nested"))?;
    fs::write(root.join("docs").join("readme.md"), "# docs")?;
    fs::write(root.join("docs").join("nested").join("Notes.txt"), "n")?;
    fs::write(root.join("big.bin"), vec![7u8; 2048])?;
    fs::write(temp.path().join("secret.txt"), "hidden")?;

    let root_dir = RootDirectory::new(&root)?;
    let app = router(AppState::new(&root_dir), &options);
    Ok(Fixture {
        root: root_dir.path().to_path_buf(),
        _temp: temp,
        app,
    })
}

fn fixture() -> Result<Fixture> {
    fixture_with(ServerOptions::default())
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, body.to_vec()))
}

async fn call(app: &Router, method: Method, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder().method(method).uri(uri).body(Body::empty())?;
    let (status, body) = send(app, request).await?;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok((status, json))
}

fn multipart_upload(uri: &str, file_name: &str, content: &[u8]) -> Result<Request<Body>> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Ok(Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))?)
}

fn item_names(json: &Value) -> Vec<String> {
    json["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn list_returns_view_envelope() -> Result<()> {
    let fx = fixture()?;
    let (status, json) = call(&fx.app, Method::GET, "/api/files?path=/").await?;
    assert_eq!(status, StatusCode::OK);

    // Default ordering is by size ascending; the folder ranks as zero bytes.
    assert_eq!(item_names(&json), ["docs/", "big.bin"]);
    assert_eq!(json["path"], "/");
    assert_eq!(json["items"][0]["type"], "folder");
    assert!(json["items"][0]["size"].is_null());
    assert_eq!(json["items"][1]["type"], "file");
    assert_eq!(json["items"][1]["size"], 2048);
    assert!(json["items"][1]["lastModified"].is_string());
    assert_eq!(json["fileCount"], 1);
    assert_eq!(json["folderCount"], 1);
    assert_eq!(json["totalSize"], 2048);
    assert_eq!(json["totalItems"], 2);
    assert_eq!(json["page"], 1);
    assert_eq!(json["currentPage"], 1);
    assert_eq!(json["pageSize"], 100);
    assert_eq!(json["totalPages"], 1);
    assert_eq!(json["sortBy"], "size");
    assert_eq!(json["sortDirection"], "asc");
    Ok(())
}

#[tokio::test]
async fn list_rejects_bad_paths_with_400() -> Result<()> {
    let fx = fixture()?;
    for uri in [
        "/api/files",
        "/api/files?path=",
        "/api/files?path=%20",
        "/api/files?path=/missing",
        "/api/files?path=/big.bin",
        "/api/files?path=../",
        "/api/files?path=/docs/../../",
        "/api/files?path=/&pageSize=0",
    ] {
        let (status, json) = call(&fx.app, Method::GET, uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].is_string(), "{uri}");
    }

    let (_, json) = call(&fx.app, Method::GET, "/api/files?path=../").await?;
    let message = json["error"].as_str().unwrap_or_default();
    assert!(!message.contains(fx.root.to_string_lossy().as_ref()));
    Ok(())
}

#[tokio::test]
async fn search_walks_the_subtree() -> Result<()> {
    let fx = fixture()?;
    fs::create_dir(fx.root.join("docs").join("Notes"))?;

    let (status, json) = call(
        &fx.app,
        Method::GET,
        "/api/files?path=/&search=NOTES&sortBy=name",
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    // Search results carry bare folder names.
    assert_eq!(item_names(&json), ["Notes", "Notes.txt"]);
    assert_eq!(json["folderCount"], 1);
    assert_eq!(json["fileCount"], 1);
    Ok(())
}

#[tokio::test]
async fn list_paginates_with_full_totals() -> Result<()> {
    let fx = fixture()?;
    let dir = fx.root.join("many");
    fs::create_dir(&dir)?;
    for i in 0..25 {
        fs::write(dir.join(format!("file-{i:02}.txt")), vec![0u8; 10])?;
    }

    let (status, json) = call(
        &fx.app,
        Method::GET,
        "/api/files?path=/many&page=3&pageSize=10&sortBy=name&sortDirection=desc",
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        item_names(&json),
        ["file-04.txt", "file-03.txt", "file-02.txt", "file-01.txt", "file-00.txt"]
    );
    assert_eq!(json["totalPages"], 3);
    assert_eq!(json["totalItems"], 25);
    assert_eq!(json["fileCount"], 25);
    assert_eq!(json["totalSize"], 250);
    assert_eq!(json["currentPage"], 3);
    Ok(())
}

#[tokio::test]
async fn upload_then_download_round_trips() -> Result<()> {
    let fx = fixture()?;
    let content = b"line one\nline two\x00\xff".to_vec();

    let request = multipart_upload("/api/files/upload?path=/docs", "a.txt", &content)?;
    let (status, body) = send(&fx.app, request).await?;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body)?;
    assert_eq!(json["fileName"], "a.txt");

    let request = Request::builder()
        .uri("/api/files/download?path=/docs/a.txt")
        .body(Body::empty())?;
    let response = fx.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a.txt\""
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(body.to_vec(), content);
    Ok(())
}

#[tokio::test]
async fn upload_overwrites_existing_file() -> Result<()> {
    let fx = fixture()?;
    let request = multipart_upload("/api/files/upload?path=/docs", "readme.md", b"new")?;
    let (status, _) = send(&fx.app, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fs::read_to_string(fx.root.join("docs").join("readme.md"))?, "new");
    Ok(())
}

#[tokio::test]
async fn upload_rejections() -> Result<()> {
    let fx = fixture()?;

    let empty = multipart_upload("/api/files/upload?path=/docs", "empty.txt", b"")?;
    assert_eq!(send(&fx.app, empty).await?.0, StatusCode::BAD_REQUEST);

    let no_path = multipart_upload("/api/files/upload", "a.txt", b"x")?;
    assert_eq!(send(&fx.app, no_path).await?.0, StatusCode::BAD_REQUEST);

    let escape = multipart_upload("/api/files/upload?path=../", "a.txt", b"x")?;
    assert_eq!(send(&fx.app, escape).await?.0, StatusCode::BAD_REQUEST);
    assert!(!fx.root.parent().map(|p| p.join("a.txt").exists()).unwrap_or(false));
    Ok(())
}

#[tokio::test]
async fn download_missing_or_escaping_is_400() -> Result<()> {
    let fx = fixture()?;
    for uri in [
        "/api/files/download?path=/nope.txt",
        "/api/files/download?path=/docs",
        "/api/files/download?path=../secret.txt",
        "/api/files/download",
    ] {
        let (status, _) = call(&fx.app, Method::GET, uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn delete_then_delete_again_is_404() -> Result<()> {
    let fx = fixture()?;
    let (status, json) = call(&fx.app, Method::DELETE, "/api/files/delete?path=/docs").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(!fx.root.join("docs").exists());

    let (status, _) = call(&fx.app, Method::DELETE, "/api/files/delete?path=/docs").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&fx.app, Method::DELETE, "/api/files/delete?path=../secret.txt").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn action_moves_and_copies() -> Result<()> {
    let fx = fixture()?;

    let (status, json) = call(
        &fx.app,
        Method::POST,
        "/api/files/action?sourcePath=/docs&destinationPath=/docs-copy&action=copy",
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(
        fs::read_to_string(fx.root.join("docs-copy").join("nested").join("Notes.txt"))?,
        "n"
    );

    let (status, _) = call(
        &fx.app,
        Method::POST,
        "/api/files/action?sourcePath=/big.bin&destinationPath=/docs/big.bin&action=move",
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(fx.root.join("docs").join("big.bin").is_file());
    assert!(!fx.root.join("big.bin").exists());
    Ok(())
}

#[tokio::test]
async fn action_error_statuses() -> Result<()> {
    let fx = fixture()?;
    let cases = [
        ("sourcePath=/docs&destinationPath=/x&action=link", StatusCode::BAD_REQUEST),
        ("sourcePath=/docs&destinationPath=/x", StatusCode::BAD_REQUEST),
        ("sourcePath=/docs&action=copy", StatusCode::BAD_REQUEST),
        ("sourcePath=/missing&destinationPath=/x&action=move", StatusCode::NOT_FOUND),
        ("sourcePath=/missing&destinationPath=/x&action=copy", StatusCode::NOT_FOUND),
        ("sourcePath=/docs&destinationPath=../x&action=copy", StatusCode::BAD_REQUEST),
        (
            "sourcePath=/big.bin&destinationPath=/docs/readme.md&action=copy",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];
    for (query, expected) in cases {
        let uri = format!("/api/files/action?{query}");
        let (status, _) = call(&fx.app, Method::POST, &uri).await?;
        assert_eq!(status, expected, "{query}");
    }
    Ok(())
}

#[tokio::test]
async fn directories_are_listed_relative_to_root() -> Result<()> {
    let fx = fixture()?;
    let (status, json) = call(&fx.app, Method::GET, "/api/files/directories?root=/docs").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!([{ "name": "nested", "fullPath": "docs/nested" }])
    );

    for uri in [
        "/api/files/directories?root=../",
        "/api/files/directories?root=/missing",
        "/api/files/directories",
    ] {
        let (status, _) = call(&fx.app, Method::GET, uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn static_dir_serves_the_ui() -> Result<()> {
    let assets = tempdir()?;
    fs::write(assets.path().join("index.html"), "<html>browser</html>")?;
    let fx = fixture_with(ServerOptions {
        static_dir: Some(assets.path().to_path_buf()),
        ..ServerOptions::default()
    })?;

    let request = Request::builder().uri("/").body(Body::empty())?;
    let (status, body) = send(&fx.app, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>browser</html>");

    let (status, _) = call(&fx.app, Method::GET, "/api/files?path=/").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
