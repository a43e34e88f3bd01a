use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{permissions, PERM_ADD_NEWS};
use crate::db::models::{Post, PostKind};
use crate::db::{authors, categories, posts};
use crate::error::{AppError, AppResult, FieldError};
use crate::extractors::CurrentUser;
use crate::filters::{ListingParams, PostFilter};
use crate::pagination::{Page, Paginated};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/search", get(search_posts))
        .route(
            "/posts/{id}",
            get(post_detail).put(update_post).delete(delete_post),
        )
        .route("/articles", post(create_article))
}

/// A page of posts plus the filter that produced it.
#[derive(Debug, Serialize)]
struct ListResponse {
    #[serde(flatten)]
    page: Paginated<Post>,
    filter: PostFilter,
}

/// General browsing listing, newest first.
async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> AppResult<Json<ListResponse>> {
    let filter = PostFilter::from_params(&params)?;
    let page = Page::new(params.page_number()?, state.config.listing.page_size);
    let page = posts::list(&state.db, &filter, page)?;
    Ok(Json(ListResponse { page, filter }))
}

/// Search listing. Same filter contract as the general listing, smaller pages.
async fn search_posts(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> AppResult<Json<ListResponse>> {
    let filter = PostFilter::from_params(&params)?;
    let page = Page::new(params.page_number()?, state.config.listing.search_page_size);
    let page = posts::list(&state.db, &filter, page)?;
    Ok(Json(ListResponse { page, filter }))
}

async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Post>> {
    Ok(Json(posts::get(&state.db, id)?))
}

/// Raw create/update submission. Validation collects every bad field before
/// reporting.
#[derive(Debug, Deserialize)]
struct PostForm {
    title: Option<String>,
    body: Option<String>,
    category_id: Option<i64>,
    kind: Option<String>,
}

impl PostForm {
    fn validate(&self, state: &AppState) -> AppResult<posts::NewPost> {
        let mut errors = Vec::new();

        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            errors.push(FieldError::new("title", "must not be empty"));
        }

        let body = self.body.as_deref().map(str::trim).unwrap_or_default();
        if body.is_empty() {
            errors.push(FieldError::new("body", "must not be empty"));
        }

        let category_id = match self.category_id {
            Some(id) if categories::exists(&state.db, id)? => Some(id),
            Some(_) => {
                errors.push(FieldError::new("category_id", "unknown category"));
                None
            }
            None => {
                errors.push(FieldError::new("category_id", "is required"));
                None
            }
        };

        let kind = match self.kind.as_deref() {
            None => PostKind::News,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.push(FieldError::new("kind", "must be 'news' or 'article'"));
                PostKind::News
            }),
        };

        match (errors.is_empty(), category_id) {
            (true, Some(category_id)) => Ok(posts::NewPost {
                title: title.to_string(),
                body: body.to_string(),
                category_id,
                kind,
            }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

fn resolve_author(state: &AppState, user: &CurrentUser) -> AppResult<i64> {
    authors::find_by_user(&state.db, &user.id)?
        .map(|author| author.id)
        .ok_or_else(|| AppError::Forbidden("not registered as an author".into()))
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<PostForm>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let new = form.validate(&state)?;
    let author_id = resolve_author(&state, &user)?;
    let post = posts::insert(&state.db, author_id, &new)?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Article creation requires the `add_news` grant and always stores an
/// article, whatever kind the form claimed.
async fn create_article(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<PostForm>,
) -> AppResult<(StatusCode, Json<Post>)> {
    if !permissions::has_permission(&state.db, &user.id, PERM_ADD_NEWS)? {
        return Err(AppError::Forbidden(
            "missing permission to publish articles".into(),
        ));
    }
    let mut new = form.validate(&state)?;
    new.kind = PostKind::Article;
    let author_id = resolve_author(&state, &user)?;
    let post = posts::insert(&state.db, author_id, &new)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    _user: CurrentUser,
    Json(form): Json<PostForm>,
) -> AppResult<Json<Post>> {
    let new = form.validate(&state)?;
    Ok(Json(posts::update(&state.db, id, &new)?))
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: bool,
    /// Where clients should land after a delete: the general listing.
    redirect: &'static str,
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    _user: CurrentUser,
) -> AppResult<Json<DeleteResponse>> {
    posts::delete(&state.db, id)?;
    Ok(Json(DeleteResponse {
        deleted: true,
        redirect: "/posts",
    }))
}
