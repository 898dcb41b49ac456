use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HrError, HrResult, HrStore, Tables, require};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl FromStr for Severity {
    type Err = HrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(HrError::Invalid(format!("unknown severity {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    UnderReview,
    Resolved,
    Dismissed,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::UnderReview => "under_review",
            CaseStatus::Resolved => "resolved",
            CaseStatus::Dismissed => "dismissed",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, CaseStatus::Resolved | CaseStatus::Dismissed)
    }

    pub fn can_move_to(self, next: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (self, next),
            (Open, UnderReview | Resolved | Dismissed) | (UnderReview, Resolved | Dismissed)
        )
    }
}

impl FromStr for CaseStatus {
    type Err = HrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "under_review" | "under-review" => Ok(Self::UnderReview),
            "resolved" => Ok(Self::Resolved),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(HrError::Invalid(format!("unknown case status {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplinaryCase {
    pub id: String,
    pub employee_id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: CaseStatus,
    pub opened_by: String,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCase {
    pub employee_id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub opened_by: String,
}

impl Tables {
    pub fn insert_case(&mut self, input: NewCase) -> HrResult<DisciplinaryCase> {
        let title = require(&input.title, "title")?;
        self.employee(&input.employee_id)?;
        let now = Utc::now();
        let case = DisciplinaryCase {
            id: self.next_id("DC"),
            employee_id: input.employee_id,
            title,
            description: input.description.trim().to_string(),
            severity: input.severity,
            status: CaseStatus::Open,
            opened_by: input.opened_by,
            opened_at: now,
            updated_at: now,
        };
        self.cases.push(case.clone());
        Ok(case)
    }
}

impl HrStore {
    /// Open cases first, then by most recent activity.
    pub async fn list_cases(&self, status: Option<CaseStatus>) -> Vec<DisciplinaryCase> {
        let tables = self.tables.read().await;
        let mut cases: Vec<DisciplinaryCase> = tables
            .cases
            .iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        cases.sort_by(|a, b| {
            a.status
                .is_closed()
                .cmp(&b.status.is_closed())
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        cases
    }

    pub async fn open_case(&self, input: NewCase) -> HrResult<DisciplinaryCase> {
        self.tables.write().await.insert_case(input)
    }

    pub async fn transition_case(&self, id: &str, next: CaseStatus) -> HrResult<DisciplinaryCase> {
        let mut tables = self.tables.write().await;
        let case = tables
            .cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| HrError::not_found("disciplinary case", id))?;
        if !case.status.can_move_to(next) {
            return Err(HrError::Conflict(format!(
                "case {id} cannot move from {} to {}",
                case.status.as_str(),
                next.as_str()
            )));
        }
        case.status = next;
        case.updated_at = Utc::now();
        Ok(case.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_case(employee_id: &str) -> NewCase {
        NewCase {
            employee_id: employee_id.into(),
            title: "Repeated lateness".into(),
            description: "Late five times in September".into(),
            severity: Severity::Low,
            opened_by: "manager@portal.local".into(),
        }
    }

    #[tokio::test]
    async fn cases_follow_the_review_lifecycle() {
        let store = HrStore::seeded();
        let case = store.open_case(new_case("EMP-0001")).await.unwrap();
        assert_eq!(case.status, CaseStatus::Open);

        let reviewing = store
            .transition_case(&case.id, CaseStatus::UnderReview)
            .await
            .unwrap();
        assert_eq!(reviewing.status, CaseStatus::UnderReview);

        assert!(matches!(
            store.transition_case(&case.id, CaseStatus::Open).await,
            Err(HrError::Conflict(_))
        ));
        let resolved = store
            .transition_case(&case.id, CaseStatus::Resolved)
            .await
            .unwrap();
        assert!(resolved.status.is_closed());
        assert!(matches!(
            store.transition_case(&case.id, CaseStatus::Dismissed).await,
            Err(HrError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn cases_need_a_known_employee_and_title() {
        let store = HrStore::seeded();
        assert!(matches!(
            store.open_case(new_case("EMP-9999")).await,
            Err(HrError::NotFound { .. })
        ));
        let mut untitled = new_case("EMP-0001");
        untitled.title = " ".into();
        assert!(matches!(
            store.open_case(untitled).await,
            Err(HrError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn open_cases_sort_before_closed_ones() {
        let store = HrStore::empty();
        let cases = store.list_cases(None).await;
        assert!(cases.is_empty());

        let seeded = HrStore::seeded();
        let listed = seeded.list_cases(None).await;
        let first_closed = listed.iter().position(|c| c.status.is_closed());
        if let Some(idx) = first_closed {
            assert!(listed[idx..].iter().all(|c| c.status.is_closed()));
        }
    }
}
