pub mod categories;
pub mod posts;

use axum::Router;

use crate::state::AppState;

/// The full operation surface, ready to be layered and given state.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(categories::router())
}
