use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use platform_api::Page;
use serde::{Deserialize, Serialize};

use crate::{HrError, HrResult, HrStore, ListQuery, Tables, require};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Terminated,
}

impl EmployeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::OnLeave => "on_leave",
            EmployeeStatus::Terminated => "terminated",
        }
    }
}

impl FromStr for EmployeeStatus {
    type Err = HrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "on_leave" | "on-leave" => Ok(Self::OnLeave),
            "terminated" => Ok(Self::Terminated),
            other => Err(HrError::Invalid(format!("unknown employee status {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Job title, e.g. "Payroll Specialist".
    pub role: String,
    pub department: String,
    pub status: EmployeeStatus,
    /// Annual salary.
    pub salary_cents: i64,
    pub hired_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub salary_cents: i64,
    pub hired_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub salary_cents: Option<i64>,
}

fn check_email(email: &str) -> HrResult<String> {
    let email = require(email, "email")?;
    if email.contains('@') {
        Ok(email)
    } else {
        Err(HrError::Invalid("email is not valid".into()))
    }
}

impl Tables {
    pub fn insert_employee(&mut self, input: NewEmployee) -> HrResult<Employee> {
        let name = require(&input.name, "name")?;
        let role = require(&input.role, "role")?;
        let department = require(&input.department, "department")?;
        let email = check_email(&input.email)?;
        if input.salary_cents < 0 {
            return Err(HrError::Invalid("salary cannot be negative".into()));
        }
        if self
            .employees
            .iter()
            .any(|e| e.email.eq_ignore_ascii_case(&email))
        {
            return Err(HrError::Conflict(format!("email {email} already in use")));
        }
        let now = Utc::now();
        let employee = Employee {
            id: self.next_id("EMP"),
            name,
            email,
            role,
            department,
            status: EmployeeStatus::Active,
            salary_cents: input.salary_cents,
            hired_on: input.hired_on.unwrap_or_else(|| now.date_naive()),
            created_at: now,
            updated_at: now,
        };
        self.employees.push(employee.clone());
        Ok(employee)
    }
}

impl HrStore {
    pub async fn list_employees(&self, query: &ListQuery) -> Page<Employee> {
        let tables = self.tables.read().await;
        let hits = tables
            .employees
            .iter()
            .filter(|e| query.matches(&[
                e.name.as_str(),
                e.email.as_str(),
                e.department.as_str(),
                e.role.as_str(),
            ]))
            .cloned()
            .collect();
        Page::from_vec(hits, query.page)
    }

    pub async fn get_employee(&self, id: &str) -> HrResult<Employee> {
        self.tables.read().await.employee(id).cloned()
    }

    pub async fn employee_exists(&self, id: &str) -> bool {
        self.tables.read().await.employee(id).is_ok()
    }

    pub async fn create_employee(&self, input: NewEmployee) -> HrResult<Employee> {
        let employee = self.tables.write().await.insert_employee(input)?;
        tracing::debug!(id = %employee.id, "employee created");
        Ok(employee)
    }

    pub async fn update_employee(&self, id: &str, patch: EmployeeUpdate) -> HrResult<Employee> {
        let name = patch.name.as_deref().map(|v| require(v, "name")).transpose()?;
        let role = patch.role.as_deref().map(|v| require(v, "role")).transpose()?;
        let department = patch
            .department
            .as_deref()
            .map(|v| require(v, "department"))
            .transpose()?;
        let email = patch.email.as_deref().map(check_email).transpose()?;
        if patch.salary_cents.is_some_and(|s| s < 0) {
            return Err(HrError::Invalid("salary cannot be negative".into()));
        }

        let mut tables = self.tables.write().await;
        if let Some(email) = &email {
            if tables
                .employees
                .iter()
                .any(|e| e.id != id && e.email.eq_ignore_ascii_case(email))
            {
                return Err(HrError::Conflict(format!("email {email} already in use")));
            }
        }
        let employee = tables
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| HrError::not_found("employee", id))?;
        if let Some(name) = name {
            employee.name = name;
        }
        if let Some(role) = role {
            employee.role = role;
        }
        if let Some(department) = department {
            employee.department = department;
        }
        if let Some(email) = email {
            employee.email = email;
        }
        if let Some(salary) = patch.salary_cents {
            employee.salary_cents = salary;
        }
        if let Some(status) = patch.status {
            employee.status = status;
        }
        employee.updated_at = Utc::now();
        Ok(employee.clone())
    }

    /// Hard delete. Unknown ids are an error, never a silent success.
    pub async fn delete_employee(&self, id: &str) -> HrResult<Employee> {
        let mut tables = self.tables.write().await;
        let index = tables
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| HrError::not_found("employee", id))?;
        Ok(tables.employees.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_api::PageRequest;

    fn hire(name: &str, role: &str) -> NewEmployee {
        NewEmployee {
            name: name.into(),
            email: format!("{}@portal.local", name.to_lowercase().replace(' ', ".")),
            role: role.into(),
            department: "Finance".into(),
            salary_cents: 6_000_000,
            hired_on: None,
        }
    }

    #[tokio::test]
    async fn missing_name_or_role_always_fails() {
        let store = HrStore::empty();
        for (name, role) in [("", "Analyst"), ("Nia Cole", ""), ("   ", "  ")] {
            let err = store.create_employee(hire(name, role)).await.unwrap_err();
            assert!(matches!(err, HrError::Invalid(_)), "{name:?}/{role:?}");
        }
        assert_eq!(store.list_employees(&ListQuery::default()).await.total, 0);
    }

    #[tokio::test]
    async fn create_then_search_and_update() {
        let store = HrStore::empty();
        let created = store.create_employee(hire("Nia Cole", "Analyst")).await.unwrap();
        assert_eq!(created.id, "EMP-0001");
        assert_eq!(created.status, EmployeeStatus::Active);

        let hits = store
            .list_employees(&ListQuery::new(PageRequest::default(), Some("nia".into())))
            .await;
        assert_eq!(hits.total, 1);

        let updated = store
            .update_employee(
                &created.id,
                EmployeeUpdate {
                    status: Some(EmployeeStatus::OnLeave),
                    role: Some("Senior Analyst".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, EmployeeStatus::OnLeave);
        assert_eq!(updated.role, "Senior Analyst");

        let blanked = store
            .update_employee(
                &created.id,
                EmployeeUpdate {
                    name: Some(" ".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(blanked, Err(HrError::Invalid(_))));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = HrStore::empty();
        store.create_employee(hire("Nia Cole", "Analyst")).await.unwrap();
        let err = store
            .create_employee(hire("Nia Cole", "Clerk"))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_unknown_employee_is_not_found() {
        let store = HrStore::seeded();
        let before = store.list_employees(&ListQuery::default()).await.total;
        let err = store.delete_employee("EMP-9999").await.unwrap_err();
        assert_eq!(
            err,
            HrError::NotFound {
                kind: "employee",
                id: "EMP-9999".into()
            }
        );
        assert_eq!(store.list_employees(&ListQuery::default()).await.total, before);

        let removed = store.delete_employee("EMP-0002").await.unwrap();
        assert_eq!(removed.id, "EMP-0002");
        assert!(!store.employee_exists("EMP-0002").await);
    }

    #[test]
    fn status_parses_loose_spellings() {
        assert_eq!("On-Leave".parse::<EmployeeStatus>().unwrap(), EmployeeStatus::OnLeave);
        assert!("retired".parse::<EmployeeStatus>().is_err());
    }
}
