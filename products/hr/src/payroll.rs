use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{EmployeeStatus, HrError, HrResult, HrStore, Tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayslipStatus {
    Draft,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payslip {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    /// `YYYY-MM`
    pub period: String,
    pub gross_cents: i64,
    pub deductions_cents: i64,
    pub net_cents: i64,
    pub status: PayslipStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct PayslipRequest {
    pub employee_id: String,
    pub period: String,
    pub bonus_cents: i64,
    pub deductions_cents: i64,
}

pub(crate) fn check_period(period: &str) -> HrResult<String> {
    let period = period.trim();
    let valid = period.len() == 7
        && NaiveDate::parse_from_str(&format!("{period}-01"), "%Y-%m-%d").is_ok();
    if valid {
        Ok(period.to_string())
    } else {
        Err(HrError::Invalid(format!("period {period} must look like YYYY-MM")))
    }
}

impl Tables {
    pub fn insert_payslip(&mut self, request: PayslipRequest) -> HrResult<Payslip> {
        let period = check_period(&request.period)?;
        if request.bonus_cents < 0 || request.deductions_cents < 0 {
            return Err(HrError::Invalid("bonus and deductions cannot be negative".into()));
        }
        let employee = self.employee(&request.employee_id)?;
        if employee.status == EmployeeStatus::Terminated {
            return Err(HrError::Invalid(format!(
                "employee {} is terminated",
                employee.id
            )));
        }
        let gross = employee.salary_cents / 12 + request.bonus_cents;
        if request.deductions_cents > gross {
            return Err(HrError::Invalid("deductions exceed gross pay".into()));
        }
        let (employee_id, employee_name) = (employee.id.clone(), employee.name.clone());
        if self
            .payslips
            .iter()
            .any(|p| p.employee_id == employee_id && p.period == period)
        {
            return Err(HrError::Conflict(format!(
                "payslip for {employee_id} in {period} already exists"
            )));
        }
        let payslip = Payslip {
            id: self.next_id("PAY"),
            employee_id,
            employee_name,
            period,
            gross_cents: gross,
            deductions_cents: request.deductions_cents,
            net_cents: gross - request.deductions_cents,
            status: PayslipStatus::Draft,
            created_at: Utc::now(),
            paid_at: None,
        };
        self.payslips.push(payslip.clone());
        Ok(payslip)
    }
}

impl HrStore {
    /// Newest period first.
    pub async fn list_payslips(&self, period: Option<&str>) -> Vec<Payslip> {
        let tables = self.tables.read().await;
        let mut slips: Vec<Payslip> = tables
            .payslips
            .iter()
            .filter(|p| period.is_none_or(|want| p.period == want))
            .cloned()
            .collect();
        slips.sort_by(|a, b| b.period.cmp(&a.period).then_with(|| a.id.cmp(&b.id)));
        slips
    }

    pub async fn generate_payslip(&self, request: PayslipRequest) -> HrResult<Payslip> {
        self.tables.write().await.insert_payslip(request)
    }

    pub async fn mark_payslip_paid(&self, id: &str) -> HrResult<Payslip> {
        let mut tables = self.tables.write().await;
        let slip = tables
            .payslips
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| HrError::not_found("payslip", id))?;
        if slip.status == PayslipStatus::Paid {
            return Err(HrError::Conflict(format!("payslip {id} is already paid")));
        }
        slip.status = PayslipStatus::Paid;
        slip.paid_at = Some(Utc::now());
        Ok(slip.clone())
    }
}
