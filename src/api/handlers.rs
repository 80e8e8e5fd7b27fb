use super::error::ApiError;
use super::{blocking, AppState};
use crate::models::file_entry::DirectoryOption;
use crate::services::fs::view::{
    ViewQuery, ViewResult, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT_BY,
    DEFAULT_SORT_DIRECTION,
};
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub path: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionQuery {
    pub source_path: Option<String>,
    pub destination_path: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectoriesQuery {
    pub root: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub path: String,
    #[serde(flatten)]
    pub view: ViewResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(format!("missing {name}"))),
    }
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let path = required(query.path, "path")?;
    let view_query = ViewQuery {
        sort_by: query.sort_by.unwrap_or_else(|| DEFAULT_SORT_BY.to_string()),
        sort_direction: query
            .sort_direction
            .unwrap_or_else(|| DEFAULT_SORT_DIRECTION.to_string()),
        page: query.page.unwrap_or(DEFAULT_PAGE),
        page_size: query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    };
    let search = query.search;

    let browser = state.browser.clone();
    let dir = path.clone();
    let view = blocking(move || browser.browse(&dir, search.as_deref(), &view_query))
        .await
        .map_err(ApiError::missing_as_bad_request)?;

    info!(
        path = path.as_str(),
        total = view.total_items,
        page = view.page,
        "list files"
    );
    Ok(Json(ListResponse { path, view }))
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let dir = required(query.path, "path")?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        upload = Some((file_name, content));
        break;
    }

    let (file_name, content) = match upload {
        Some((name, content)) if !content.is_empty() => (name, content),
        _ => return Err(ApiError::BadRequest("Empty file".to_string())),
    };

    let ops = state.ops.clone();
    let entry = blocking(move || ops.upload(&dir, &file_name, &content))
        .await
        .map_err(ApiError::missing_as_bad_request)?;

    Ok(Json(UploadResponse {
        file_name: entry.name().to_string(),
    }))
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let path = required(query.path, "path")?;

    let ops = state.ops.clone();
    let download = blocking(move || ops.download(&path))
        .await
        .map_err(ApiError::missing_as_bad_request)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download.file_name.replace(['"', '\\'], "_")
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    info!(file = download.file_name.as_str(), bytes = download.content.len(), "download");
    Ok((StatusCode::OK, headers, download.content).into_response())
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let path = required(query.path, "path")?;

    let ops = state.ops.clone();
    blocking(move || ops.delete(&path)).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let source = required(query.source_path, "sourcePath")?;
    let destination = required(query.destination_path, "destinationPath")?;
    let action = query.action.unwrap_or_default();

    let ops = state.ops.clone();
    blocking(move || ops.move_or_copy(&source, &destination, &action)).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn directories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DirectoriesQuery>,
) -> Result<Json<Vec<DirectoryOption>>, ApiError> {
    let root = required(query.root, "root")?;

    let ops = state.ops.clone();
    let options = blocking(move || ops.list_subdirectories(&root))
        .await
        .map_err(ApiError::missing_as_bad_request)?;
    Ok(Json(options))
}
