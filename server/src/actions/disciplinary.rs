use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use platform_api::ApiResult;
use platform_authz::ADMIN_OR_MANAGER;
use products_hr::{CaseStatus, NewCase, Severity};

use super::{ActionOk, Done, FormFields, authorize, employee_page, finish};
use crate::{http::AppState, session::Session};

const PAGE: &str = "/dashboard/disciplinary";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions/disciplinary/create", post(open))
        .route("/actions/disciplinary/{id}/status", post(transition))
}

async fn open(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "disciplinary.create")?;
    let form = FormFields::from(form);
    let case = state
        .hr
        .open_case(NewCase {
            employee_id: form.required("employee_id")?,
            title: form.required("title")?,
            description: form.optional("description").unwrap_or_default(),
            severity: form.required_parsed::<Severity>("severity")?,
            opened_by: user.email.clone(),
        })
        .await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "disciplinary.create",
            entity: "disciplinary_case",
            summary: format!("{} against {}", case.title, case.employee_id),
            id: case.id,
            revalidate: vec![PAGE.into(), employee_page(&case.employee_id)],
        },
    )
    .await)
}

async fn transition(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "disciplinary.status")?;
    let next: CaseStatus = FormFields::from(form).required_parsed("status")?;
    let case = state.hr.transition_case(&id, next).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "disciplinary.status",
            entity: "disciplinary_case",
            summary: format!("status {}", case.status.as_str()),
            id: case.id,
            revalidate: vec![PAGE.into(), employee_page(&case.employee_id)],
        },
    )
    .await)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::http::testing::*;

    #[tokio::test]
    async fn closed_cases_stay_closed() {
        let app = app().await;
        let response = app
            .post_form(
                "/actions/disciplinary/create",
                "employee_id=EMP-0003&title=Policy+breach&severity=high",
                Some(MANAGER),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = json(response).await["id"].as_str().unwrap().to_string();

        let path = format!("/actions/disciplinary/{id}/status");
        let response = app.post_form(&path, "status=dismissed", Some(MANAGER)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.post_form(&path, "status=under_review", Some(MANAGER)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn severity_is_required() {
        let app = app().await;
        let response = app
            .post_form(
                "/actions/disciplinary/create",
                "employee_id=EMP-0003&title=Policy+breach",
                Some(ADMIN),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
