use std::collections::BTreeMap;

use chrono::Utc;
use entity::requisitions::{self, Status};
use platform_api::{Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QueryTrait, Set,
};

use crate::{DbError, DbPool, DbResult};

#[derive(Clone, Debug)]
pub struct NewRequisition {
    pub title: String,
    pub description: Option<String>,
    pub department: String,
    pub requester_id: String,
    pub quantity: i32,
    pub estimated_cost_cents: i64,
}

#[derive(Clone, Debug, Default)]
pub struct RequisitionFilter {
    pub status: Option<Status>,
    pub requester_id: Option<String>,
    pub page: PageRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target(self) -> Status {
        match self {
            Decision::Approve => Status::Approved,
            Decision::Reject => Status::Rejected,
        }
    }
}

pub async fn create(pool: &DbPool, input: NewRequisition) -> DbResult<requisitions::Model> {
    if input.quantity <= 0 {
        return Err(DbError::Invalid("quantity must be positive".into()));
    }
    if input.estimated_cost_cents < 0 {
        return Err(DbError::Invalid("estimated cost cannot be negative".into()));
    }
    let now = Utc::now().fixed_offset();
    let model = requisitions::ActiveModel {
        title: Set(input.title),
        description: Set(input.description),
        department: Set(input.department),
        requester_id: Set(input.requester_id),
        quantity: Set(input.quantity),
        estimated_cost_cents: Set(input.estimated_cost_cents),
        status: Set(Status::Pending),
        decided_by: Set(None),
        decided_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(pool).await?)
}

pub async fn list(
    pool: &DbPool,
    filter: RequisitionFilter,
) -> DbResult<Page<requisitions::Model>> {
    let request = filter.page.normalized();
    let paginator = requisitions::Entity::find()
        .apply_if(filter.status, |q, status| {
            q.filter(requisitions::Column::Status.eq(status))
        })
        .apply_if(filter.requester_id, |q, requester| {
            q.filter(requisitions::Column::RequesterId.eq(requester))
        })
        .order_by_desc(requisitions::Column::CreatedAt)
        .order_by_desc(requisitions::Column::Id)
        .paginate(pool, request.per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.page - 1).await?;
    Ok(Page::new(items, total, request))
}

pub async fn find(pool: &DbPool, id: i32) -> DbResult<requisitions::Model> {
    requisitions::Entity::find_by_id(id)
        .one(pool)
        .await?
        .ok_or_else(|| DbError::not_found("requisition", id))
}

/// Moves a pending requisition to its final status.
///
/// The update is conditional on `status = PENDING`, so a decided
/// requisition never changes again.
pub async fn decide(
    pool: &DbPool,
    id: i32,
    decision: Decision,
    decided_by: &str,
) -> DbResult<requisitions::Model> {
    let now = Utc::now().fixed_offset();
    let patch = requisitions::ActiveModel {
        status: Set(decision.target()),
        decided_by: Set(Some(decided_by.to_string())),
        decided_at: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };
    let result = requisitions::Entity::update_many()
        .set(patch)
        .filter(requisitions::Column::Id.eq(id))
        .filter(requisitions::Column::Status.eq(Status::Pending))
        .exec(pool)
        .await?;
    let current = find(pool, id).await?;
    if result.rows_affected == 0 {
        return Err(DbError::AlreadyDecided {
            id,
            status: current.status.as_str(),
        });
    }
    tracing::info!(id, status = current.status.as_str(), decided_by, "requisition decided");
    Ok(current)
}

pub async fn counts_by_status(pool: &DbPool) -> DbResult<BTreeMap<&'static str, u64>> {
    let mut counts = BTreeMap::new();
    for status in [Status::Pending, Status::Approved, Status::Rejected] {
        let n = requisitions::Entity::find()
            .filter(requisitions::Column::Status.eq(status))
            .count(pool)
            .await?;
        counts.insert(status.as_str(), n);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_pool;

    fn laptop() -> NewRequisition {
        NewRequisition {
            title: "Laptops".into(),
            description: Some("Two dev laptops".into()),
            department: "Engineering".into(),
            requester_id: "EMP-0001".into(),
            quantity: 2,
            estimated_cost_cents: 480_000,
        }
    }

    #[tokio::test]
    async fn approve_moves_pending_to_approved_once() {
        let pool = memory_pool().await;
        let created = create(&pool, laptop()).await.unwrap();
        assert_eq!(created.status, Status::Pending);

        let approved = decide(&pool, created.id, Decision::Approve, "admin@portal.local")
            .await
            .unwrap();
        assert_eq!(approved.status, Status::Approved);
        assert_eq!(approved.decided_by.as_deref(), Some("admin@portal.local"));
        assert!(approved.decided_at.is_some());

        let again = decide(&pool, created.id, Decision::Reject, "manager@portal.local").await;
        assert!(matches!(
            again,
            Err(DbError::AlreadyDecided { status: "APPROVED", .. })
        ));
        let stored = find(&pool, created.id).await.unwrap();
        assert_eq!(stored.status, Status::Approved);
        assert_eq!(stored.decided_by.as_deref(), Some("admin@portal.local"));
    }

    #[tokio::test]
    async fn deciding_unknown_requisition_is_not_found() {
        let pool = memory_pool().await;
        let err = decide(&pool, 404, Decision::Approve, "admin@portal.local")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "requisition", .. }));
    }

    #[tokio::test]
    async fn list_filters_by_status_and_counts() {
        let pool = memory_pool().await;
        let first = create(&pool, laptop()).await.unwrap();
        create(&pool, laptop()).await.unwrap();
        create(&pool, laptop()).await.unwrap();
        decide(&pool, first.id, Decision::Reject, "manager@portal.local")
            .await
            .unwrap();

        let pending = list(
            &pool,
            RequisitionFilter {
                status: Some(Status::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.total, 2);
        assert!(pending.items.iter().all(|r| r.status == Status::Pending));

        let counts = counts_by_status(&pool).await.unwrap();
        assert_eq!(counts["PENDING"], 2);
        assert_eq!(counts["REJECTED"], 1);
        assert_eq!(counts["APPROVED"], 0);
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let pool = memory_pool().await;
        let mut input = laptop();
        input.quantity = 0;
        assert!(matches!(
            create(&pool, input).await,
            Err(DbError::Invalid(_))
        ));
    }
}
