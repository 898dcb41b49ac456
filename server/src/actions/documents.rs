use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use platform_api::ApiResult;
use platform_authz::ADMIN_OR_MANAGER;
use products_hr::NewDocument;

use super::{ANY_ROLE, ActionOk, Done, FormFields, authorize, finish};
use crate::{http::AppState, session::Session};

const PAGE: &str = "/dashboard/documents";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions/documents/create", post(upload))
        .route("/actions/documents/{id}/archive", post(archive))
}

/// Records document metadata; the file itself is not stored.
async fn upload(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ANY_ROLE, "documents.create")?;
    let form = FormFields::from(form);
    let document = state
        .hr
        .upload_document(NewDocument {
            name: form.required("name")?,
            category: form.required("category")?,
            owner_id: user.id.clone(),
            size_bytes: form.parsed("size_bytes")?.unwrap_or_default(),
        })
        .await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "documents.create",
            entity: "document",
            summary: format!("{} ({} bytes)", document.name, document.size_bytes),
            id: document.id,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn archive(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "documents.archive")?;
    let document = state.hr.archive_document(&id).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "documents.archive",
            entity: "document",
            summary: format!("archived {}", document.name),
            id: document.id,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}
