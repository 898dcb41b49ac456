use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HrError, HrResult, HrStore, Tables, require};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStage {
    Applied,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl CandidateStage {
    pub const ALL: [CandidateStage; 6] = [
        CandidateStage::Applied,
        CandidateStage::Screening,
        CandidateStage::Interview,
        CandidateStage::Offer,
        CandidateStage::Hired,
        CandidateStage::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStage::Applied => "applied",
            CandidateStage::Screening => "screening",
            CandidateStage::Interview => "interview",
            CandidateStage::Offer => "offer",
            CandidateStage::Hired => "hired",
            CandidateStage::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CandidateStage::Hired | CandidateStage::Rejected)
    }

    /// Candidates move forward through the pipeline or drop out.
    pub fn can_move_to(self, next: CandidateStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == CandidateStage::Rejected || next > self
    }
}

impl FromStr for CandidateStage {
    type Err = HrError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == wanted)
            .ok_or_else(|| HrError::Invalid(format!("unknown candidate stage {wanted}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub department: String,
    pub location: String,
    pub status: PostingStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub posting_id: String,
    pub name: String,
    pub email: String,
    pub stage: CandidateStage,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPosting {
    pub title: String,
    pub department: String,
    pub location: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewCandidate {
    pub posting_id: String,
    pub name: String,
    pub email: String,
}

impl Tables {
    pub fn insert_posting(&mut self, input: NewPosting) -> HrResult<JobPosting> {
        let posting = JobPosting {
            title: require(&input.title, "title")?,
            department: require(&input.department, "department")?,
            location: input.location.trim().to_string(),
            id: self.next_id("JOB"),
            status: PostingStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
        };
        self.postings.push(posting.clone());
        Ok(posting)
    }

    pub fn insert_candidate(&mut self, input: NewCandidate) -> HrResult<Candidate> {
        let name = require(&input.name, "name")?;
        let email = require(&input.email, "email")?;
        let posting = self
            .postings
            .iter()
            .find(|p| p.id == input.posting_id)
            .ok_or_else(|| HrError::not_found("job posting", &input.posting_id))?;
        if posting.status == PostingStatus::Closed {
            return Err(HrError::Conflict(format!(
                "job posting {} is closed",
                posting.id
            )));
        }
        let now = Utc::now();
        let candidate = Candidate {
            id: self.next_id("CAN"),
            posting_id: input.posting_id,
            name,
            email,
            stage: CandidateStage::Applied,
            applied_at: now,
            updated_at: now,
        };
        self.candidates.push(candidate.clone());
        Ok(candidate)
    }
}

impl HrStore {
    pub async fn list_postings(&self) -> Vec<JobPosting> {
        let tables = self.tables.read().await;
        let mut postings = tables.postings.clone();
        postings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        postings
    }

    pub async fn create_posting(&self, input: NewPosting) -> HrResult<JobPosting> {
        self.tables.write().await.insert_posting(input)
    }

    pub async fn close_posting(&self, id: &str) -> HrResult<JobPosting> {
        let mut tables = self.tables.write().await;
        let posting = tables
            .postings
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| HrError::not_found("job posting", id))?;
        if posting.status == PostingStatus::Closed {
            return Err(HrError::Conflict(format!("job posting {id} is already closed")));
        }
        posting.status = PostingStatus::Closed;
        posting.closed_at = Some(Utc::now());
        Ok(posting.clone())
    }

    pub async fn list_candidates(&self, posting_id: Option<&str>) -> Vec<Candidate> {
        let tables = self.tables.read().await;
        tables
            .candidates
            .iter()
            .filter(|c| posting_id.is_none_or(|p| c.posting_id == p))
            .cloned()
            .collect()
    }

    pub async fn add_candidate(&self, input: NewCandidate) -> HrResult<Candidate> {
        self.tables.write().await.insert_candidate(input)
    }

    pub async fn move_candidate(&self, id: &str, next: CandidateStage) -> HrResult<Candidate> {
        let mut tables = self.tables.write().await;
        let candidate = tables
            .candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| HrError::not_found("candidate", id))?;
        if !candidate.stage.can_move_to(next) {
            return Err(HrError::Conflict(format!(
                "candidate {id} cannot move from {} to {}",
                candidate.stage.as_str(),
                next.as_str()
            )));
        }
        candidate.stage = next;
        candidate.updated_at = Utc::now();
        Ok(candidate.clone())
    }
}
