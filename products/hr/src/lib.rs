//! HR vertical slice.
//!
//! Employees, payroll, disciplinary cases, recruitment, documents,
//! notifications and the audit trail live in [`HrStore`], a process-local
//! collection set guarded by a single async `RwLock`. The methods mimic a
//! database API (paginate, substring filter, mutate in place) but there
//! are no transactions and nothing is persisted.

mod audit;
mod disciplinary;
mod documents;
mod employees;
mod notifications;
mod payroll;
mod recruitment;
mod seed;
mod summary;

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use platform_api::{ApiError, PageRequest};
use thiserror::Error;
use tokio::sync::RwLock;

pub use audit::{AuditEntry, AuditLog};
pub use disciplinary::{CaseStatus, DisciplinaryCase, NewCase, Severity};
pub use documents::{Document, DocumentStatus, NewDocument};
pub use employees::{Employee, EmployeeStatus, EmployeeUpdate, NewEmployee};
pub use notifications::{Notification, NotificationView};
pub use payroll::{Payslip, PayslipRequest, PayslipStatus};
pub use recruitment::{
    Candidate, CandidateStage, JobPosting, NewCandidate, NewPosting, PostingStatus,
};
pub use summary::HrSummary;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HrError {
    #[error("{kind} {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
}

impl HrError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type HrResult<T> = Result<T, HrError>;

impl From<HrError> for ApiError {
    fn from(value: HrError) -> Self {
        match value {
            HrError::NotFound { .. } => ApiError::not_found(value.to_string()),
            HrError::Invalid(msg) => ApiError::InvalidInput(msg),
            HrError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

/// Listing parameters shared by the searchable collections.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: PageRequest,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new(page: PageRequest, search: Option<String>) -> Self {
        Self { page, search }
    }

    /// Case-insensitive substring match over any of `fields`.
    pub(crate) fn matches(&self, fields: &[&str]) -> bool {
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                fields.iter().any(|f| f.to_lowercase().contains(&term))
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct Tables {
    pub employees: Vec<Employee>,
    pub payslips: Vec<Payslip>,
    pub cases: Vec<DisciplinaryCase>,
    pub postings: Vec<JobPosting>,
    pub candidates: Vec<Candidate>,
    pub documents: Vec<Document>,
    pub notifications: Vec<Notification>,
    pub audit: Vec<AuditLog>,
    seq: HashMap<&'static str, u64>,
}

impl Tables {
    pub fn next_id(&mut self, prefix: &'static str) -> String {
        let n = self.seq.entry(prefix).or_insert(0);
        *n += 1;
        format!("{prefix}-{n:04}")
    }

    pub fn employee(&self, id: &str) -> HrResult<&Employee> {
        self.employees
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| HrError::not_found("employee", id))
    }
}

pub struct HrStore {
    tables: RwLock<Tables>,
}

static GLOBAL: Lazy<Arc<HrStore>> = Lazy::new(|| Arc::new(HrStore::seeded()));

impl HrStore {
    /// The process-wide store, seeded with demo data on first use.
    pub fn global() -> Arc<HrStore> {
        GLOBAL.clone()
    }

    pub fn empty() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// An independent store holding the demo data set.
    pub fn seeded() -> Self {
        let mut tables = Tables::default();
        if let Err(err) = seed::populate(&mut tables) {
            tracing::error!(%err, "hr demo data incomplete");
        }
        Self {
            tables: RwLock::new(tables),
        }
    }
}

pub(crate) fn require(value: &str, field: &str) -> HrResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(HrError::Invalid(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}
