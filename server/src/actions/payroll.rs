use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use platform_api::ApiResult;
use platform_authz::{ADMIN_ONLY, ADMIN_OR_MANAGER};
use products_hr::PayslipRequest;

use super::{ActionOk, Done, FormFields, authorize, employee_page, finish};
use crate::{http::AppState, session::Session};

const PAGE: &str = "/dashboard/payroll";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions/payroll/generate", post(generate))
        .route("/actions/payroll/{id}/pay", post(pay))
}

async fn generate(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "payroll.generate")?;
    let form = FormFields::from(form);
    let request = PayslipRequest {
        employee_id: form.required("employee_id")?,
        period: form.required("period")?,
        bonus_cents: form.money("bonus")?.unwrap_or_default(),
        deductions_cents: form.money("deductions")?.unwrap_or_default(),
    };
    let slip = state.hr.generate_payslip(request).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "payroll.generate",
            entity: "payslip",
            summary: format!(
                "{} {} net {}",
                slip.employee_id, slip.period, slip.net_cents
            ),
            id: slip.id,
            revalidate: vec![PAGE.into(), employee_page(&slip.employee_id)],
        },
    )
    .await)
}

async fn pay(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_ONLY, "payroll.pay")?;
    let slip = state.hr.mark_payslip_paid(&id).await?;
    state
        .hr
        .notify(
            None,
            "Payslip paid",
            format!("{} payroll for {} has been paid", slip.period, slip.employee_name),
        )
        .await;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "payroll.pay",
            entity: "payslip",
            summary: format!("{} {} paid", slip.employee_id, slip.period),
            id: slip.id,
            revalidate: vec![PAGE.into(), employee_page(&slip.employee_id)],
        },
    )
    .await)
}
