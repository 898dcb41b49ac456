use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use platform_api::ApiResult;
use platform_authz::ADMIN_OR_MANAGER;
use products_hr::{CandidateStage, NewCandidate, NewPosting};

use super::{ActionOk, Done, FormFields, authorize, finish};
use crate::{http::AppState, session::Session};

const PAGE: &str = "/dashboard/recruitment";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions/recruitment/postings/create", post(create_posting))
        .route("/actions/recruitment/postings/{id}/close", post(close_posting))
        .route("/actions/recruitment/candidates/create", post(add_candidate))
        .route("/actions/recruitment/candidates/{id}/stage", post(move_candidate))
}

async fn create_posting(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "recruitment.postings.create")?;
    let form = FormFields::from(form);
    let posting = state
        .hr
        .create_posting(NewPosting {
            title: form.required("title")?,
            department: form.required("department")?,
            location: form.required("location")?,
        })
        .await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "recruitment.postings.create",
            entity: "job_posting",
            summary: format!("{} ({})", posting.title, posting.location),
            id: posting.id,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn close_posting(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "recruitment.postings.close")?;
    let posting = state.hr.close_posting(&id).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "recruitment.postings.close",
            entity: "job_posting",
            summary: format!("closed {}", posting.title),
            id: posting.id,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn add_candidate(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "recruitment.candidates.create")?;
    let form = FormFields::from(form);
    let candidate = state
        .hr
        .add_candidate(NewCandidate {
            posting_id: form.required("posting_id")?,
            name: form.required("name")?,
            email: form.required("email")?,
        })
        .await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "recruitment.candidates.create",
            entity: "candidate",
            summary: format!("{} applied to {}", candidate.name, candidate.posting_id),
            id: candidate.id,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn move_candidate(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "recruitment.candidates.stage")?;
    let stage: CandidateStage = FormFields::from(form).required_parsed("stage")?;
    let candidate = state.hr.move_candidate(&id, stage).await?;
    state
        .hr
        .notify(
            None,
            "Candidate update",
            format!("{} moved to {}", candidate.name, candidate.stage.as_str()),
        )
        .await;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "recruitment.candidates.stage",
            entity: "candidate",
            summary: format!("stage {}", candidate.stage.as_str()),
            id: candidate.id,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}
