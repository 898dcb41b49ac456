//! Authorization primitives for the dashboard routes and server actions.
//!
//! The model is a flat allow-list: a path either sits under a prefix that
//! needs a particular role set or it does not. There is no delegation and
//! no attribute-based rule.

use platform_api::ApiError;
use platform_authn::{Role, SessionUser};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("role {role} may not perform {action}")]
    Denied { role: Role, action: String },
}

impl From<AuthzError> for ApiError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthenticated => ApiError::Unauthorized,
            AuthzError::Denied { .. } => ApiError::Forbidden,
        }
    }
}

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const ADMIN_OR_MANAGER: &[Role] = &[Role::Admin, Role::Manager];

/// Outcome of evaluating a request path against the route policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuardDecision {
    Allow,
    /// Unauthenticated request to a protected path.
    RedirectToLogin,
    /// Already signed in, or the role may not see the path.
    RedirectToHome,
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub login_path: String,
    pub protected_prefix: String,
    pub admin_only: Vec<String>,
    pub admin_or_manager: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            login_path: "/login".into(),
            protected_prefix: "/dashboard".into(),
            admin_only: vec!["/dashboard/admin".into()],
            admin_or_manager: vec![
                "/dashboard/employees".into(),
                "/dashboard/payroll".into(),
                "/dashboard/recruitment".into(),
                "/dashboard/disciplinary".into(),
                "/dashboard/analytics".into(),
            ],
        }
    }
}

impl RoutePolicy {
    pub fn home_path(&self) -> &str {
        &self.protected_prefix
    }

    pub fn evaluate(&self, path: &str, role: Option<Role>) -> GuardDecision {
        let Some(role) = role else {
            return if is_under(path, &self.protected_prefix) {
                GuardDecision::RedirectToLogin
            } else {
                GuardDecision::Allow
            };
        };
        if path == self.login_path {
            return GuardDecision::RedirectToHome;
        }
        if role != Role::Admin && self.admin_only.iter().any(|p| is_under(path, p)) {
            tracing::info!(%role, path, "admin-only route denied");
            return GuardDecision::RedirectToHome;
        }
        if !ADMIN_OR_MANAGER.contains(&role)
            && self.admin_or_manager.iter().any(|p| is_under(path, p))
        {
            tracing::info!(%role, path, "manager route denied");
            return GuardDecision::RedirectToHome;
        }
        GuardDecision::Allow
    }
}

/// Segment-aware prefix test: `/a/b` is under `/a` but `/ab` is not.
fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Re-check performed by every server action before it touches data.
pub fn require_role(
    user: Option<&SessionUser>,
    allowed: &[Role],
    action: &str,
) -> Result<(), AuthzError> {
    let user = user.ok_or(AuthzError::Unauthenticated)?;
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        tracing::info!(role = %user.role, email = %user.email, action, "action denied");
        Err(AuthzError::Denied {
            role: user.role,
            action: action.to_string(),
        })
    }
}
