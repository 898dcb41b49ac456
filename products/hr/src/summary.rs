use std::collections::BTreeMap;

use serde::Serialize;

use crate::{EmployeeStatus, HrStore, PostingStatus};

/// Aggregates behind the analytics dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HrSummary {
    /// Employees that are not terminated.
    pub headcount: usize,
    pub by_department: BTreeMap<String, usize>,
    pub by_status: BTreeMap<&'static str, usize>,
    pub payroll_net_by_period: BTreeMap<String, i64>,
    pub open_cases: usize,
    pub open_postings: usize,
    pub candidates_by_stage: BTreeMap<&'static str, usize>,
    pub documents: usize,
}

impl HrStore {
    pub async fn summary(&self) -> HrSummary {
        let tables = self.tables.read().await;
        let mut summary = HrSummary::default();

        for employee in &tables.employees {
            *summary.by_status.entry(employee.status.as_str()).or_default() += 1;
            if employee.status != EmployeeStatus::Terminated {
                summary.headcount += 1;
                *summary
                    .by_department
                    .entry(employee.department.clone())
                    .or_default() += 1;
            }
        }
        for slip in &tables.payslips {
            *summary
                .payroll_net_by_period
                .entry(slip.period.clone())
                .or_default() += slip.net_cents;
        }
        summary.open_cases = tables
            .cases
            .iter()
            .filter(|c| !c.status.is_closed())
            .count();
        summary.open_postings = tables
            .postings
            .iter()
            .filter(|p| p.status == PostingStatus::Open)
            .count();
        for candidate in &tables.candidates {
            *summary
                .candidates_by_stage
                .entry(candidate.stage.as_str())
                .or_default() += 1;
        }
        summary.documents = tables.documents.len();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmployeeUpdate, ListQuery};

    #[tokio::test]
    async fn terminated_staff_leave_headcount() {
        let store = HrStore::seeded();
        let before = store.summary().await;
        let total = store.list_employees(&ListQuery::default()).await.total as usize;
        assert_eq!(before.by_status.values().sum::<usize>(), total);

        store
            .update_employee(
                "EMP-0001",
                EmployeeUpdate {
                    status: Some(EmployeeStatus::Terminated),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let after = store.summary().await;
        assert_eq!(after.headcount, before.headcount - 1);
        assert_eq!(after.by_department.values().sum::<usize>(), after.headcount);
    }

    #[tokio::test]
    async fn empty_store_summarises_to_zero() {
        let summary = HrStore::empty().summary().await;
        assert_eq!(summary.headcount, 0);
        assert!(summary.payroll_net_by_period.is_empty());
    }
}
