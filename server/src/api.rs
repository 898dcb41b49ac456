use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use platform_api::ApiResult;
use platform_authn::SessionUser;
use products_hr::NotificationView;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{http::AppState, session::CurrentUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(current_session))
        .route("/api/notifications", get(notifications))
        .route("/api/notifications/read-all", post(read_all))
        .route("/api/notifications/{id}/read", post(read_one))
}

async fn current_session(CurrentUser(user): CurrentUser) -> Json<SessionUser> {
    Json(user)
}

#[derive(Serialize)]
struct NotificationFeed {
    unread: usize,
    items: Vec<NotificationView>,
}

/// Polled by the client; there is no push channel.
async fn notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<NotificationFeed> {
    let items = state.hr.notifications_for(&user.id).await;
    let unread = items.iter().filter(|n| !n.read).count();
    Json(NotificationFeed { unread, items })
}

async fn read_one(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.hr.mark_read(&id, &user.id).await?;
    Ok(Json(json!({ "ok": true })))
}

async fn read_all(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<Value> {
    let updated = state.hr.mark_all_read(&user.id).await;
    Json(json!({ "ok": true, "updated": updated }))
}
