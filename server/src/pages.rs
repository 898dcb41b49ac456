//! Dashboard page payloads.
//!
//! Each handler gathers what its screen needs and answers JSON. Pages that
//! look the same for every permitted viewer go through the page cache;
//! the overview is per user and always rendered fresh.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::Uri,
    routing::get,
};
use entity::requisitions::Status as RequisitionStatus;
use platform_api::{ApiError, ApiResult, PageRequest};
use platform_authn::demo_users;
use platform_db::{inventory, requisitions, suppliers};
use products_hr::{CaseStatus, ListQuery};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{http::AppState, session::CurrentUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(overview))
        .route("/dashboard/employees", get(employees))
        .route("/dashboard/employees/{id}", get(employee_detail))
        .route("/dashboard/requisitions", get(requisition_list))
        .route("/dashboard/payroll", get(payroll))
        .route("/dashboard/recruitment", get(recruitment))
        .route("/dashboard/disciplinary", get(disciplinary))
        .route("/dashboard/documents", get(documents))
        .route("/dashboard/inventory", get(inventory_page))
        .route("/dashboard/analytics", get(analytics))
        .route("/dashboard/admin/audit-logs", get(audit_logs))
        .route("/dashboard/admin/users", get(users))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    page: Option<u64>,
    per_page: Option<u64>,
    q: Option<String>,
    status: Option<String>,
    period: Option<String>,
}

impl ListParams {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(PageRequest::DEFAULT_PER_PAGE),
        )
    }

    fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }

    fn list_query(&self) -> ListQuery {
        ListQuery::new(self.page_request(), self.search())
    }
}

fn cache_key(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn to_value<T: serde::Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|err| ApiError::internal(err.into()))
}

async fn overview(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let summary = state.hr.summary().await;
    let requisitions = requisitions::counts_by_status(&state.pool).await?;
    let low_stock = inventory::low_stock(&state.pool).await?.len();
    let mut notifications = state.hr.notifications_for(&user.id).await;
    notifications.truncate(5);
    Ok(Json(json!({
        "user": user,
        "unread_notifications": state.hr.unread_count(&user.id).await,
        "headcount": summary.headcount,
        "open_postings": summary.open_postings,
        "requisitions": requisitions,
        "low_stock_items": low_stock,
        "recent_notifications": notifications,
    })))
}

async fn employees(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            to_value(state.hr.list_employees(&params.list_query()).await)
        })
        .await?;
    Ok(Json(body))
}

async fn employee_detail(
    State(state): State<AppState>,
    uri: Uri,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            let employee = state.hr.get_employee(&id).await?;
            let payslips: Vec<_> = state
                .hr
                .list_payslips(None)
                .await
                .into_iter()
                .filter(|p| p.employee_id == id)
                .collect();
            let cases: Vec<_> = state
                .hr
                .list_cases(None)
                .await
                .into_iter()
                .filter(|c| c.employee_id == id)
                .collect();
            let requisitions = requisitions::list(
                &state.pool,
                requisitions::RequisitionFilter {
                    requester_id: Some(id.clone()),
                    ..Default::default()
                },
            )
            .await?;
            Ok(json!({
                "employee": employee,
                "payslips": payslips,
                "cases": cases,
                "requisitions": requisitions,
            }))
        })
        .await?;
    Ok(Json(body))
}

async fn requisition_list(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let status = match params.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            RequisitionStatus::parse(raw)
                .ok_or_else(|| ApiError::invalid(format!("unknown requisition status {raw}")))?,
        ),
        None => None,
    };
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            let page = requisitions::list(
                &state.pool,
                requisitions::RequisitionFilter {
                    status,
                    requester_id: None,
                    page: params.page_request(),
                },
            )
            .await?;
            let counts = requisitions::counts_by_status(&state.pool).await?;
            Ok(json!({ "requisitions": page, "counts": counts }))
        })
        .await?;
    Ok(Json(body))
}

async fn payroll(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            let period = params.period.as_deref().map(str::trim).filter(|p| !p.is_empty());
            let payslips = state.hr.list_payslips(period).await;
            let gross: i64 = payslips.iter().map(|p| p.gross_cents).sum();
            let net: i64 = payslips.iter().map(|p| p.net_cents).sum();
            Ok(json!({
                "period": period,
                "payslips": payslips,
                "totals": { "gross_cents": gross, "net_cents": net },
            }))
        })
        .await?;
    Ok(Json(body))
}

async fn recruitment(State(state): State<AppState>, uri: Uri) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            Ok(json!({
                "postings": state.hr.list_postings().await,
                "candidates": state.hr.list_candidates(None).await,
            }))
        })
        .await?;
    Ok(Json(body))
}

async fn disciplinary(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<CaseStatus>)
        .transpose()
        .map_err(ApiError::from)?;
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            Ok(json!({ "cases": state.hr.list_cases(status).await }))
        })
        .await?;
    Ok(Json(body))
}

async fn documents(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            to_value(state.hr.list_documents(&params.list_query()).await)
        })
        .await?;
    Ok(Json(body))
}

async fn inventory_page(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            let search = params.search();
            let items =
                inventory::list_items(&state.pool, search.as_deref(), params.page_request())
                    .await?;
            let suppliers = suppliers::list(&state.pool).await?;
            let low_stock = inventory::low_stock(&state.pool).await?;
            Ok(json!({
                "items": items,
                "suppliers": suppliers,
                "low_stock": low_stock,
            }))
        })
        .await?;
    Ok(Json(body))
}

async fn analytics(State(state): State<AppState>, uri: Uri) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            let requisitions = requisitions::counts_by_status(&state.pool).await?;
            let low_stock = inventory::low_stock(&state.pool).await?.len();
            Ok(json!({
                "hr": state.hr.summary().await,
                "requisitions": requisitions,
                "low_stock_items": low_stock,
            }))
        })
        .await?;
    Ok(Json(body))
}

async fn audit_logs(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            to_value(state.hr.audit_logs(params.page_request()).await)
        })
        .await?;
    Ok(Json(body))
}

async fn users(State(state): State<AppState>, uri: Uri) -> ApiResult<Json<Value>> {
    let body = state
        .cache
        .get_or_render(&cache_key(&uri), || async {
            Ok(json!({ "users": demo_users() }))
        })
        .await?;
    Ok(Json(body))
}
