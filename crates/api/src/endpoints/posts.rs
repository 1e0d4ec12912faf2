//! Post endpoints.
//!
//! Creates and updates are multipart requests: a JSON `data` part, optional
//! repeated `tag_ids` / `category_ids` text parts, and `images` file parts.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use boardhop_common::{AppError, AppResult};
use boardhop_core::{CreatePostInput, MediaUpload, UpdatePostInput};
use boardhop_db::{
    composer::ListingQuery,
    views::{MessageView, PostAggregate, PostListing},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{
    extractors::CurrentUser,
    middleware::AppState,
    response::{self, ApiResponse, Created},
};

/// Parts of a post write request.
#[derive(Debug, Default)]
struct PostForm {
    data: Option<Bytes>,
    tag_ids: Option<Vec<i32>>,
    category_ids: Option<Vec<i32>>,
    files: Vec<MediaUpload>,
}

impl PostForm {
    fn data<T: DeserializeOwned>(&self) -> AppResult<T> {
        let raw = self
            .data
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Missing data part".to_string()))?;
        serde_json::from_slice(raw).map_err(|e| AppError::BadRequest(format!("data: {e}")))
    }
}

fn bad_multipart(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(e.to_string())
}

/// Parse one id list part. Each part may hold one id or a comma-separated list.
fn parse_ids(field: &str, text: &str, into: &mut Vec<i32>) -> AppResult<()> {
    for raw in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id = raw
            .parse::<i32>()
            .map_err(|_| AppError::Validation(format!("{field}: '{raw}' is not an id")))?;
        into.push(id);
    }
    Ok(())
}

async fn read_form(mut multipart: Multipart) -> AppResult<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "data" => {
                form.data = Some(field.bytes().await.map_err(bad_multipart)?);
            }
            "tag_ids" => {
                let text = field.text().await.map_err(bad_multipart)?;
                parse_ids(&name, &text, form.tag_ids.get_or_insert_with(Vec::new))?;
            }
            "category_ids" => {
                let text = field.text().await.map_err(bad_multipart)?;
                parse_ids(&name, &text, form.category_ids.get_or_insert_with(Vec::new))?;
            }
            "images" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                form.files.push(MediaUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

/// List posts matching the query filters.
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> AppResult<ApiResponse<Vec<PostListing>>> {
    let posts = state.post_service.list(&query).await?;
    Ok(ApiResponse::ok(posts))
}

/// Get a post with its categories, tags and media.
async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<PostAggregate>> {
    let post = state.post_service.get(&post_id).await?;
    Ok(ApiResponse::ok(post))
}

/// Create a post.
async fn create_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<Created>> {
    let mut form = read_form(multipart).await?;
    let mut input: CreatePostInput = form.data()?;
    if let Some(ids) = form.tag_ids.take() {
        input.tag_ids = ids;
    }
    if let Some(ids) = form.category_ids.take() {
        input.category_ids = ids;
    }

    let id = state.post_service.create(&user.id, input, form.files).await?;
    Ok(ApiResponse::created(Created { id }))
}

/// Update a post the caller owns.
async fn update_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<PostAggregate>> {
    let mut form = read_form(multipart).await?;
    let mut input: UpdatePostInput = match form.data {
        Some(_) => form.data()?,
        None => UpdatePostInput::default(),
    };
    if form.tag_ids.is_some() {
        input.tag_ids = form.tag_ids.take();
    }
    if form.category_ids.is_some() {
        input.category_ids = form.category_ids.take();
    }

    let post = state
        .post_service
        .update(&user.id, &post_id, input, form.files)
        .await?;
    Ok(ApiResponse::ok(post))
}

/// Soft-delete a post the caller owns.
async fn delete_post(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(&user.id, &post_id).await?;
    Ok(response::ok())
}

/// Messages left on a post.
async fn list_post_messages(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<Vec<MessageView>>> {
    let messages = state.message_service.list_for_post(&post_id).await?;
    Ok(ApiResponse::ok(messages))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/{id}/messages", get(list_post_messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids_accepts_repeated_and_comma_separated() {
        let mut ids = Vec::new();
        parse_ids("tag_ids", "3", &mut ids).unwrap();
        parse_ids("tag_ids", "4, 5", &mut ids).unwrap();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn test_parse_ids_rejects_garbage() {
        let mut ids = Vec::new();
        let err = parse_ids("category_ids", "1,two", &mut ids).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("'two'")));
    }

    #[test]
    fn test_empty_part_clears_list() {
        let mut form = PostForm::default();
        parse_ids("tag_ids", "", form.tag_ids.get_or_insert_with(Vec::new)).unwrap();
        assert_eq!(form.tag_ids, Some(Vec::new()));
    }

    #[test]
    fn test_missing_data_part_is_bad_request() {
        let form = PostForm::default();
        let result: AppResult<CreatePostInput> = form.data();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
