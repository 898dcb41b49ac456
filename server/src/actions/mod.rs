//! Form-driven mutations.
//!
//! Every action re-checks the caller's role, reads its fields from a
//! url-encoded form, calls exactly one data function, records an audit
//! entry and revalidates the dashboard pages it affects.

mod disciplinary;
mod documents;
mod employees;
mod inventory;
mod payroll;
mod recruitment;
mod requisitions;

use std::{collections::HashMap, fmt::Display, str::FromStr};

use axum::{Json, Router};
use chrono::NaiveDate;
use platform_api::{ApiError, ApiResult};
use platform_authn::{Role, SessionUser};
use products_hr::AuditEntry;
use serde::Serialize;

use crate::{http::AppState, session::Session};

pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Manager, Role::Employee];

/// Views that aggregate across collections; every action touches them.
const ALWAYS_REVALIDATED: &[&str] = &["/dashboard/admin/audit-logs", "/dashboard/analytics"];

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(employees::router())
        .merge(requisitions::router())
        .merge(payroll::router())
        .merge(recruitment::router())
        .merge(disciplinary::router())
        .merge(documents::router())
        .merge(inventory::router())
}

#[derive(Debug, Serialize)]
pub struct ActionOk {
    pub ok: bool,
    pub id: String,
}

/// The role re-check every action performs before touching data.
pub(crate) fn authorize(
    session: Session,
    allowed: &[Role],
    action: &str,
) -> ApiResult<SessionUser> {
    platform_authz::require_role(session.0.as_ref(), allowed, action)?;
    session.0.ok_or(ApiError::Unauthorized)
}

/// What a successful action reports to the audit trail and the cache.
pub(crate) struct Done {
    pub action: &'static str,
    pub entity: &'static str,
    pub id: String,
    pub summary: String,
    pub revalidate: Vec<String>,
}

/// Detail page of one employee, which lists their payslips, cases and
/// requisitions.
pub(crate) fn employee_page(id: &str) -> String {
    format!("/dashboard/employees/{id}")
}

pub(crate) async fn finish(state: &AppState, user: &SessionUser, done: Done) -> Json<ActionOk> {
    state
        .hr
        .record_audit(AuditEntry {
            actor: user.email.clone(),
            action: done.action.to_string(),
            entity: done.entity.to_string(),
            entity_id: done.id.clone(),
            summary: done.summary,
        })
        .await;
    let paths = done
        .revalidate
        .iter()
        .map(String::as_str)
        .chain(ALWAYS_REVALIDATED.iter().copied());
    for path in paths {
        state.cache.revalidate_path(path).await;
    }
    tracing::info!(action = done.action, id = %done.id, actor = %user.email, "action completed");
    Json(ActionOk {
        ok: true,
        id: done.id,
    })
}

/// Numeric path ids; anything else is a 400 with the usual error body.
pub(crate) fn parse_id(raw: &str, entity: &str) -> ApiResult<i32> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::invalid(format!("{entity} id must be a number, got {raw:?}")))
}

/// Raw url-encoded fields. Blank values count as missing.
#[derive(Debug, Default)]
pub(crate) struct FormFields(HashMap<String, String>);

impl From<HashMap<String, String>> for FormFields {
    fn from(value: HashMap<String, String>) -> Self {
        Self(value)
    }
}

impl FormFields {
    pub fn optional(&self, name: &str) -> Option<String> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, name: &str) -> ApiResult<String> {
        self.optional(name)
            .ok_or_else(|| ApiError::invalid(format!("{name} is required")))
    }

    pub fn parsed<T>(&self, name: &str) -> ApiResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|err| ApiError::invalid(format!("{name}: {err}")))
            })
            .transpose()
    }

    pub fn required_parsed<T>(&self, name: &str) -> ApiResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.parsed(name)?
            .ok_or_else(|| ApiError::invalid(format!("{name} is required")))
    }

    pub fn money(&self, name: &str) -> ApiResult<Option<i64>> {
        self.optional(name)
            .map(|raw| {
                parse_money(&raw)
                    .ok_or_else(|| ApiError::invalid(format!("{name} is not a valid amount")))
            })
            .transpose()
    }

    pub fn date(&self, name: &str) -> ApiResult<Option<NaiveDate>> {
        self.optional(name)
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|_| ApiError::invalid(format!("{name} must be YYYY-MM-DD")))
            })
            .transpose()
    }
}

/// Parses a non-negative decimal amount such as `1,250.5` into cents.
fn parse_money(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let (whole, frac) = match cleaned.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
        || frac.len() > 2
    {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(cents)
}
