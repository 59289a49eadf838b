//! Admin JSON API: create, read, update and delete posts, categories and tags

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::auth::AuthenticatedAuthor;
use super::SharedState;
use crate::content::{Category, Post, PostInput, Tag, TermInput};
use crate::error::Result;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/posts/", get(list_posts).post(create_post))
        .route(
            "/posts/:id/",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/categories/", get(list_categories).post(create_category))
        .route(
            "/categories/:id/",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/tags/", get(list_tags).post(create_tag))
        .route("/tags/:id/", get(get_tag).put(update_tag).delete(delete_tag))
}

/// A post as the API returns it, with its canonical path
#[derive(Debug, Serialize)]
pub struct PostResource {
    #[serde(flatten)]
    pub post: Post,
    pub path: String,
}

impl PostResource {
    fn new(post: Post, state: &SharedState) -> Self {
        let path = post.canonical_path(&state.store.tz());
        Self { post, path }
    }
}

// Posts

async fn list_posts(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
) -> Json<Vec<PostResource>> {
    let posts = state
        .store
        .posts()
        .into_iter()
        .map(|p| PostResource::new(p, &state))
        .collect();
    Json(posts)
}

async fn create_post(
    State(state): State<SharedState>,
    author: AuthenticatedAuthor,
    Json(mut input): Json<PostInput>,
) -> Result<impl IntoResponse> {
    if input.author.is_none() {
        input.author = Some(author.username.clone());
    }
    let post = state.store.create_post(input)?;
    tracing::info!("{} created post {}", author.username, post.id);
    Ok((StatusCode::CREATED, Json(PostResource::new(post, &state))))
}

async fn get_post(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Path(id): Path<u64>,
) -> Result<Json<PostResource>> {
    let post = state.store.post(id)?;
    Ok(Json(PostResource::new(post, &state)))
}

async fn update_post(
    State(state): State<SharedState>,
    author: AuthenticatedAuthor,
    Path(id): Path<u64>,
    Json(input): Json<PostInput>,
) -> Result<Json<PostResource>> {
    let post = state.store.update_post(id, input)?;
    tracing::info!("{} updated post {}", author.username, id);
    Ok(Json(PostResource::new(post, &state)))
}

async fn delete_post(
    State(state): State<SharedState>,
    author: AuthenticatedAuthor,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    state.store.delete_post(id)?;
    tracing::info!("{} deleted post {}", author.username, id);
    Ok(StatusCode::NO_CONTENT)
}

// Categories

async fn list_categories(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
) -> Json<Vec<Category>> {
    Json(state.store.categories())
}

async fn create_category(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Json(input): Json<TermInput>,
) -> Result<impl IntoResponse> {
    let category = state.store.create_category(input)?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Path(id): Path<u64>,
) -> Result<Json<Category>> {
    Ok(Json(state.store.category(id)?))
}

async fn update_category(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Path(id): Path<u64>,
    Json(input): Json<TermInput>,
) -> Result<Json<Category>> {
    Ok(Json(state.store.update_category(id, input)?))
}

async fn delete_category(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    state.store.delete_category(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Tags

async fn list_tags(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
) -> Json<Vec<Tag>> {
    Json(state.store.tags())
}

async fn create_tag(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Json(input): Json<TermInput>,
) -> Result<impl IntoResponse> {
    let tag = state.store.create_tag(input)?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn get_tag(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Path(id): Path<u64>,
) -> Result<Json<Tag>> {
    Ok(Json(state.store.tag(id)?))
}

async fn update_tag(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Path(id): Path<u64>,
    Json(input): Json<TermInput>,
) -> Result<Json<Tag>> {
    Ok(Json(state.store.update_tag(id, input)?))
}

async fn delete_tag(
    State(state): State<SharedState>,
    _author: AuthenticatedAuthor,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    state.store.delete_tag(id)?;
    Ok(StatusCode::NO_CONTENT)
}
