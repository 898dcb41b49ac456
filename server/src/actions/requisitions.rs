use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use platform_api::{ApiError, ApiResult};
use platform_authz::ADMIN_OR_MANAGER;
use platform_db::requisitions::{self, Decision, NewRequisition};

use super::{ANY_ROLE, ActionOk, Done, FormFields, authorize, employee_page, finish, parse_id};
use crate::{http::AppState, session::Session};

const PAGE: &str = "/dashboard/requisitions";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions/requisitions/create", post(create))
        .route("/actions/requisitions/{id}/approve", post(approve))
        .route("/actions/requisitions/{id}/reject", post(reject))
}

async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ANY_ROLE, "requisitions.create")?;
    let form = FormFields::from(form);
    let input = NewRequisition {
        title: form.required("title")?,
        description: form.optional("description"),
        department: form.required("department")?,
        requester_id: form.required("requester_id")?,
        quantity: form.required_parsed("quantity")?,
        estimated_cost_cents: form
            .money("estimated_cost")?
            .ok_or_else(|| ApiError::invalid("estimated_cost is required"))?,
    };
    if !state.hr.employee_exists(&input.requester_id).await {
        return Err(ApiError::not_found(format!("employee {}", input.requester_id)));
    }
    let requisition = requisitions::create(&state.pool, input).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "requisitions.create",
            entity: "requisition",
            id: requisition.id.to_string(),
            summary: format!(
                "{} x{} for {}",
                requisition.title, requisition.quantity, requisition.department
            ),
            revalidate: vec![PAGE.into(), employee_page(&requisition.requester_id)],
        },
    )
    .await)
}

async fn approve(
    state: State<AppState>,
    session: Session,
    id: Path<String>,
) -> ApiResult<Json<ActionOk>> {
    decide(state, session, id, Decision::Approve).await
}

async fn reject(
    state: State<AppState>,
    session: Session,
    id: Path<String>,
) -> ApiResult<Json<ActionOk>> {
    decide(state, session, id, Decision::Reject).await
}

async fn decide(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
    decision: Decision,
) -> ApiResult<Json<ActionOk>> {
    let action = match decision {
        Decision::Approve => "requisitions.approve",
        Decision::Reject => "requisitions.reject",
    };
    let user = authorize(session, ADMIN_OR_MANAGER, action)?;
    let id = parse_id(&raw_id, "requisition")?;
    let requisition = requisitions::decide(&state.pool, id, decision, &user.email).await?;
    let status = requisition.status.as_str().to_lowercase();
    state
        .hr
        .notify(
            None,
            format!("Requisition {status}"),
            format!("\"{}\" was {status} by {}", requisition.title, user.name),
        )
        .await;
    Ok(finish(
        &state,
        &user,
        Done {
            action,
            entity: "requisition",
            id: id.to_string(),
            summary: format!("{} {status}", requisition.title),
            revalidate: vec![PAGE.into(), employee_page(&requisition.requester_id)],
        },
    )
    .await)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::http::testing::*;

    const NEW: &str = "title=Standing+desk&department=Engineering&requester_id=EMP-0002&quantity=2&estimated_cost=640.00";

    async fn create(app: &TestApp, who: &str) -> String {
        let response = app
            .post_form("/actions/requisitions/create", NEW, Some(who))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        json(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn approval_is_final() {
        let app = app().await;
        let id = create(&app, EMPLOYEE).await;

        let approve = format!("/actions/requisitions/{id}/approve");
        let response = app.post_form(&approve, "", Some(MANAGER)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let again = app.post_form(&approve, "", Some(ADMIN)).await;
        assert_eq!(again.status(), StatusCode::CONFLICT);
        let reject = format!("/actions/requisitions/{id}/reject");
        let response = app.post_form(&reject, "", Some(ADMIN)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let stored = platform_db::requisitions::find(&app.state.pool, id.parse().unwrap())
            .await
            .unwrap();
        assert_eq!(stored.status, entity::requisitions::Status::Approved);
        assert_eq!(stored.decided_by.as_deref(), Some(MANAGER));
    }

    #[tokio::test]
    async fn employees_cannot_decide() {
        let app = app().await;
        let id = create(&app, EMPLOYEE).await;
        let response = app
            .post_form(&format!("/actions/requisitions/{id}/approve"), "", Some(EMPLOYEE))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_requester_is_not_found() {
        let app = app().await;
        let response = app
            .post_form(
                "/actions/requisitions/create",
                "title=Chair&department=Ops&requester_id=EMP-0404&quantity=1&estimated_cost=90",
                Some(MANAGER),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn decisions_are_broadcast() {
        let app = app().await;
        let id = create(&app, EMPLOYEE).await;
        let before = app.state.hr.unread_count("3").await;
        app.post_form(&format!("/actions/requisitions/{id}/reject"), "", Some(ADMIN))
            .await;
        assert_eq!(app.state.hr.unread_count("3").await, before + 1);
    }

    #[tokio::test]
    async fn zero_quantity_is_invalid() {
        let app = app().await;
        let response = app
            .post_form(
                "/actions/requisitions/create",
                "title=Chair&department=Ops&requester_id=EMP-0002&quantity=0&estimated_cost=90",
                Some(MANAGER),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_id_is_invalid_input() {
        let app = app().await;
        let response = app
            .post_form("/actions/requisitions/first/approve", "", Some(MANAGER))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "INVALID_INPUT");
    }
}
