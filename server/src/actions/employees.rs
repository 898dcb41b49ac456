use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use platform_api::ApiResult;
use platform_authz::{ADMIN_ONLY, ADMIN_OR_MANAGER};
use products_hr::{EmployeeStatus, EmployeeUpdate, NewEmployee};

use super::{ActionOk, Done, FormFields, authorize, employee_page, finish};
use crate::{http::AppState, session::Session};

const PAGE: &str = "/dashboard/employees";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions/employees/create", post(create))
        .route("/actions/employees/{id}/update", post(update))
        .route("/actions/employees/{id}/delete", post(delete))
}

async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "employees.create")?;
    let form = FormFields::from(form);
    let input = NewEmployee {
        name: form.required("name")?,
        email: form.required("email")?,
        role: form.required("role")?,
        department: form.required("department")?,
        salary_cents: form.money("salary")?.unwrap_or_default(),
        hired_on: form.date("hired_on")?,
    };
    let employee = state.hr.create_employee(input).await?;
    let summary = format!("hired {} into {}", employee.name, employee.department);
    Ok(finish(
        &state,
        &user,
        Done {
            action: "employees.create",
            entity: "employee",
            id: employee.id,
            summary,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "employees.update")?;
    let form = FormFields::from(form);
    let patch = EmployeeUpdate {
        name: form.optional("name"),
        email: form.optional("email"),
        role: form.optional("role"),
        department: form.optional("department"),
        status: form.parsed::<EmployeeStatus>("status")?,
        salary_cents: form.money("salary")?,
    };
    let employee = state.hr.update_employee(&id, patch).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "employees.update",
            entity: "employee",
            summary: format!("updated {} ({})", employee.name, employee.status.as_str()),
            id: employee.id,
            revalidate: vec![PAGE.into(), employee_page(&id)],
        },
    )
    .await)
}

async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_ONLY, "employees.delete")?;
    let employee = state.hr.delete_employee(&id).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "employees.delete",
            entity: "employee",
            summary: format!("removed {}", employee.name),
            id: employee.id,
            revalidate: vec![PAGE.into(), employee_page(&id)],
        },
    )
    .await)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::http::testing::*;

    #[tokio::test]
    async fn missing_name_or_role_always_fails() {
        let app = app().await;
        for form in [
            "email=new%40portal.local&role=Analyst&department=Finance",
            "name=New+Hire&email=new%40portal.local&department=Finance",
            "name=+&role=+&email=new%40portal.local&department=Finance",
        ] {
            let response = app
                .post_form("/actions/employees/create", form, Some(ADMIN))
                .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{form}");
            assert_eq!(json(response).await["code"], "INVALID_INPUT");
        }
    }

    #[tokio::test]
    async fn create_audits_and_refreshes_the_listing() {
        let app = app().await;
        let before = json(app.get("/dashboard/employees", Some(MANAGER)).await).await;
        let total = before["total"].as_u64().unwrap();

        let response = app
            .post_form(
                "/actions/employees/create",
                "name=Radia+Perlman&email=radia%40portal.local&role=Network+Engineer&department=Engineering&salary=98000",
                Some(MANAGER),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["ok"], true);

        let after = json(app.get("/dashboard/employees", Some(MANAGER)).await).await;
        assert_eq!(after["total"].as_u64().unwrap(), total + 1);

        let audit = app.state.hr.audit_logs(Default::default()).await;
        assert_eq!(audit.items[0].actor, MANAGER);
        assert_eq!(audit.items[0].entity_id, body["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn deleting_unknown_employee_is_not_found() {
        let app = app().await;
        let response = app
            .post_form("/actions/employees/EMP-9999/delete", "", Some(ADMIN))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn only_admins_delete() {
        let app = app().await;
        let response = app
            .post_form("/actions/employees/EMP-0002/delete", "", Some(MANAGER))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = app
            .post_form("/actions/employees/EMP-0002/delete", "", None)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = app
            .post_form("/actions/employees/EMP-0002/delete", "", Some(ADMIN))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!app.state.hr.employee_exists("EMP-0002").await);
    }

    #[tokio::test]
    async fn update_rejects_unknown_status() {
        let app = app().await;
        let response = app
            .post_form(
                "/actions/employees/EMP-0003/update",
                "status=retired",
                Some(ADMIN),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
