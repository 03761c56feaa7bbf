mod dto;
pub mod handlers;

pub(crate) use dto::UserQuery;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::catalog_routes())
        .merge(handlers::enrollment_routes())
}
