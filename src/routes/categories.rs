use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::db::categories;
use crate::db::models::{Category, Post};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories/{id}", get(category_view))
        .route("/categories/{id}/subscribe", post(subscribe))
}

#[derive(Debug, Serialize)]
struct CategoryViewResponse {
    category: Category,
    posts: Vec<Post>,
    is_subscribed: bool,
}

/// Every post in one category, newest first, plus whether the requester is
/// subscribed. Anonymous requesters are never subscribed.
async fn category_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    MaybeUser(user): MaybeUser,
) -> AppResult<Json<CategoryViewResponse>> {
    let category = categories::get(&state.db, id)?;
    let posts = categories::posts_in(&state.db, id)?;
    let is_subscribed = match &user {
        Some(user) => categories::is_subscribed(&state.db, id, &user.id)?,
        None => false,
    };
    Ok(Json(CategoryViewResponse {
        category,
        posts,
        is_subscribed,
    }))
}

#[derive(Debug, Serialize)]
struct SubscribeResponse {
    category: Category,
    message: String,
}

async fn subscribe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Json<SubscribeResponse>> {
    categories::subscribe(&state.db, id, &user.id)?;
    let category = categories::get(&state.db, id)?;
    Ok(Json(SubscribeResponse {
        category,
        message: "Subscribed to category updates".to_string(),
    }))
}
