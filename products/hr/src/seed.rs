use chrono::NaiveDate;

use crate::{
    AuditEntry, CandidateStage, EmployeeStatus, HrResult, NewCandidate, NewCase, NewDocument,
    NewEmployee, NewPosting, PayslipRequest, Severity, Tables,
};

const STAFF: [(&str, &str, &str, &str, i64, (i32, u32, u32)); 8] = [
    ("Grace Hopper", "grace@portal.local", "Engineering Manager", "Engineering", 14_500_000, (2019, 3, 4)),
    ("Alan Turing", "alan@portal.local", "Backend Engineer", "Engineering", 11_000_000, (2020, 6, 15)),
    ("Joan Clarke", "joan@portal.local", "Operations Lead", "Operations", 9_800_000, (2018, 9, 1)),
    ("Tommy Flowers", "tommy@portal.local", "Account Executive", "Sales", 7_600_000, (2021, 1, 11)),
    ("Hedy Lamarr", "hedy@portal.local", "Payroll Specialist", "Finance", 8_200_000, (2022, 4, 19)),
    ("Ada Lovelace", "ada@portal.local", "Marketing Analyst", "Marketing", 7_100_000, (2023, 2, 6)),
    ("Claude Shannon", "claude@portal.local", "HR Generalist", "People", 6_900_000, (2021, 8, 23)),
    ("Dennis Ritchie", "dennis@portal.local", "Support Engineer", "Engineering", 6_400_000, (2017, 5, 2)),
];

pub(crate) fn populate(tables: &mut Tables) -> HrResult<()> {
    for (name, email, role, department, salary, (y, m, d)) in STAFF {
        tables.insert_employee(NewEmployee {
            name: name.into(),
            email: email.into(),
            role: role.into(),
            department: department.into(),
            salary_cents: salary,
            hired_on: NaiveDate::from_ymd_opt(y, m, d),
        })?;
    }
    if let Some(on_leave) = tables.employees.get_mut(5) {
        on_leave.status = EmployeeStatus::OnLeave;
    }
    if let Some(departed) = tables.employees.get_mut(7) {
        departed.status = EmployeeStatus::Terminated;
    }

    for employee_id in ["EMP-0001", "EMP-0002", "EMP-0003", "EMP-0005"] {
        tables.insert_payslip(PayslipRequest {
            employee_id: employee_id.into(),
            period: "2026-09".into(),
            bonus_cents: 0,
            deductions_cents: 150_000,
        })?;
    }

    tables.insert_case(NewCase {
        employee_id: "EMP-0004".into(),
        title: "Missed client escalation".into(),
        description: "Escalation left unanswered for three days.".into(),
        severity: Severity::Medium,
        opened_by: "manager@portal.local".into(),
    })?;

    let backend = tables.insert_posting(NewPosting {
        title: "Senior Backend Engineer".into(),
        department: "Engineering".into(),
        location: "Remote".into(),
    })?;
    tables.insert_posting(NewPosting {
        title: "Recruiter".into(),
        department: "People".into(),
        location: "Berlin".into(),
    })?;
    for (name, email) in [
        ("Priya Natarajan", "priya@example.com"),
        ("Marcus Reed", "marcus@example.com"),
    ] {
        tables.insert_candidate(NewCandidate {
            posting_id: backend.id.clone(),
            name: name.into(),
            email: email.into(),
        })?;
    }
    if let Some(first) = tables.candidates.first_mut() {
        first.stage = CandidateStage::Interview;
    }

    for (name, category, size) in [
        ("Employee Handbook.pdf", "Policy", 482_133),
        ("Expense Guidelines.pdf", "Finance", 96_310),
        ("Onboarding Checklist.docx", "People", 22_784),
    ] {
        tables.insert_document(NewDocument {
            name: name.into(),
            category: category.into(),
            owner_id: "1".into(),
            size_bytes: size,
        })?;
    }

    tables.push_notification(
        None,
        "Welcome to the portal",
        "Dashboards refresh every minute.",
    );
    tables.push_notification(
        Some("2".into()),
        "Pending requisitions",
        "Two requisitions are waiting for your decision.",
    );

    tables.append_audit(AuditEntry {
        actor: "system".into(),
        action: "seed".into(),
        entity: "portal".into(),
        entity_id: "-".into(),
        summary: "demo data loaded".into(),
    });
    Ok(())
}
