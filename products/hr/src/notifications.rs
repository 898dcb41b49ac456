use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HrError, HrResult, HrStore, Tables};

/// A notification addressed to one user, or to everyone when
/// `recipient` is `None`. Read state is tracked per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient: Option<String>,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read_by: BTreeSet<String>,
}

impl Notification {
    fn visible_to(&self, user_id: &str) -> bool {
        self.recipient.as_deref().is_none_or(|r| r == user_id)
    }
}

/// A notification as one particular user sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationView {
    pub id: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Tables {
    pub fn push_notification(
        &mut self,
        recipient: Option<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> String {
        let id = self.next_id("NTF");
        self.notifications.push(Notification {
            id: id.clone(),
            recipient,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
            read_by: BTreeSet::new(),
        });
        id
    }
}

impl HrStore {
    pub async fn notify(
        &self,
        recipient: Option<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> String {
        self.tables
            .write()
            .await
            .push_notification(recipient, title, message)
    }

    /// Own and broadcast notifications, newest first.
    pub async fn notifications_for(&self, user_id: &str) -> Vec<NotificationView> {
        let tables = self.tables.read().await;
        tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.visible_to(user_id))
            .map(|n| NotificationView {
                id: n.id.clone(),
                title: n.title.clone(),
                message: n.message.clone(),
                created_at: n.created_at,
                read: n.read_by.contains(user_id),
            })
            .collect()
    }

    pub async fn unread_count(&self, user_id: &str) -> usize {
        let tables = self.tables.read().await;
        tables
            .notifications
            .iter()
            .filter(|n| n.visible_to(user_id) && !n.read_by.contains(user_id))
            .count()
    }

    pub async fn mark_read(&self, id: &str, user_id: &str) -> HrResult<()> {
        let mut tables = self.tables.write().await;
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.visible_to(user_id))
            .ok_or_else(|| HrError::not_found("notification", id))?;
        notification.read_by.insert(user_id.to_string());
        Ok(())
    }

    /// Returns how many notifications changed state.
    pub async fn mark_all_read(&self, user_id: &str) -> usize {
        let mut tables = self.tables.write().await;
        tables
            .notifications
            .iter_mut()
            .filter(|n| n.visible_to(user_id))
            .map(|n| n.read_by.insert(user_id.to_string()))
            .filter(|inserted| *inserted)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_read_state_is_per_user() {
        let store = HrStore::empty();
        let id = store.notify(None, "Payroll", "September payroll closed").await;
        store
            .notify(Some("2".into()), "Approval needed", "Requisition #4")
            .await;

        assert_eq!(store.unread_count("1").await, 1);
        assert_eq!(store.unread_count("2").await, 2);

        store.mark_read(&id, "1").await.unwrap();
        assert_eq!(store.unread_count("1").await, 0);
        assert_eq!(store.unread_count("2").await, 2);

        let views = store.notifications_for("2").await;
        assert_eq!(views[0].title, "Approval needed");
        assert!(!views[1].read);
    }

    #[tokio::test]
    async fn private_notifications_are_hidden_from_others() {
        let store = HrStore::empty();
        let id = store.notify(Some("2".into()), "Private", "For manager").await;
        assert!(store.notifications_for("3").await.is_empty());
        assert!(matches!(
            store.mark_read(&id, "3").await,
            Err(HrError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn mark_all_read_counts_changes_once() {
        let store = HrStore::empty();
        store.notify(None, "One", "1").await;
        store.notify(None, "Two", "2").await;
        assert_eq!(store.mark_all_read("3").await, 2);
        assert_eq!(store.mark_all_read("3").await, 0);
        assert_eq!(store.unread_count("3").await, 0);
    }
}
