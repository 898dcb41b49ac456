use chrono::{DateTime, Utc};
use platform_api::Page;
use serde::{Deserialize, Serialize};

use crate::{HrError, HrResult, HrStore, ListQuery, Tables, require};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Active,
    Archived,
}

/// Metadata for an uploaded file; the bytes themselves are not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub category: String,
    pub owner_id: String,
    pub size_bytes: u64,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub name: String,
    pub category: String,
    pub owner_id: String,
    pub size_bytes: u64,
}

impl Tables {
    pub fn insert_document(&mut self, input: NewDocument) -> HrResult<Document> {
        let name = require(&input.name, "name")?;
        let category = require(&input.category, "category")?;
        let document = Document {
            id: self.next_id("DOC"),
            name,
            category,
            owner_id: input.owner_id,
            size_bytes: input.size_bytes,
            status: DocumentStatus::Active,
            uploaded_at: Utc::now(),
        };
        self.documents.push(document.clone());
        Ok(document)
    }
}

impl HrStore {
    /// Newest uploads first; archived documents are included.
    pub async fn list_documents(&self, query: &ListQuery) -> Page<Document> {
        let tables = self.tables.read().await;
        let mut hits: Vec<Document> = tables
            .documents
            .iter()
            .filter(|d| query.matches(&[d.name.as_str(), d.category.as_str()]))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| b.id.cmp(&a.id)));
        Page::from_vec(hits, query.page)
    }

    pub async fn upload_document(&self, input: NewDocument) -> HrResult<Document> {
        self.tables.write().await.insert_document(input)
    }

    pub async fn archive_document(&self, id: &str) -> HrResult<Document> {
        let mut tables = self.tables.write().await;
        let document = tables
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| HrError::not_found("document", id))?;
        if document.status == DocumentStatus::Archived {
            return Err(HrError::Conflict(format!("document {id} is already archived")));
        }
        document.status = DocumentStatus::Archived;
        Ok(document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_api::PageRequest;

    #[tokio::test]
    async fn upload_search_archive() {
        let store = HrStore::empty();
        let doc = store
            .upload_document(NewDocument {
                name: "Leave Policy 2026.pdf".into(),
                category: "Policy".into(),
                owner_id: "1".into(),
                size_bytes: 24_576,
            })
            .await
            .unwrap();
        store
            .upload_document(NewDocument {
                name: "Org chart.png".into(),
                category: "Reference".into(),
                owner_id: "2".into(),
                size_bytes: 1_024,
            })
            .await
            .unwrap();

        let policies = store
            .list_documents(&ListQuery::new(PageRequest::default(), Some("policy".into())))
            .await;
        assert_eq!(policies.total, 1);
        assert_eq!(policies.items[0].id, doc.id);

        let archived = store.archive_document(&doc.id).await.unwrap();
        assert_eq!(archived.status, DocumentStatus::Archived);
        assert!(matches!(
            store.archive_document(&doc.id).await,
            Err(HrError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn nameless_upload_is_invalid() {
        let store = HrStore::empty();
        let err = store
            .upload_document(NewDocument {
                category: "Policy".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, HrError::Invalid("name is required".into()));
    }
}
