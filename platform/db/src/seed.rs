use entity::{requisitions, suppliers as supplier_entity};
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::{
    DbPool, DbResult,
    inventory::{self, NewItem},
    requisitions::{self as reqs, Decision, NewRequisition},
    suppliers::{self, NewSupplier},
};

/// Inserts demo procurement data into empty tables. Safe to call on
/// every start.
pub async fn seed_demo(pool: &DbPool) -> DbResult<()> {
    if supplier_entity::Entity::find().count(pool).await? == 0 {
        let office = suppliers::create(
            pool,
            NewSupplier {
                name: "Northwind Office Supply".into(),
                contact_email: "orders@northwind.example".into(),
                phone: Some("+1-555-0100".into()),
            },
        )
        .await?;
        let tech = suppliers::create(
            pool,
            NewSupplier {
                name: "Contoso Hardware".into(),
                contact_email: "sales@contoso.example".into(),
                phone: None,
            },
        )
        .await?;
        let items = [
            ("PAP-A4", "A4 Paper (500 sheets)", "Office", 120, 40, 499, office.id),
            ("PEN-BLK", "Ballpoint Pens, black", "Office", 18, 25, 129, office.id),
            ("LAP-14", "14\" Laptop", "IT", 6, 3, 119_900, tech.id),
            ("MON-27", "27\" Monitor", "IT", 2, 4, 32_900, tech.id),
        ];
        for (sku, name, category, quantity, reorder_level, cost, supplier) in items {
            inventory::create_item(
                pool,
                NewItem {
                    sku: sku.into(),
                    name: name.into(),
                    category: category.into(),
                    quantity,
                    reorder_level,
                    unit_cost_cents: cost,
                    supplier_id: Some(supplier),
                },
            )
            .await?;
        }
        tracing::info!("seeded suppliers and inventory");
    }

    if requisitions::Entity::find().count(pool).await? == 0 {
        let demo = [
            ("Standing desks", "Operations", "EMP-0003", 4, 160_000),
            ("Conference headsets", "Sales", "EMP-0004", 10, 45_000),
            ("Design software licences", "Marketing", "EMP-0006", 3, 89_700),
        ];
        let mut created = Vec::new();
        for (title, department, requester, quantity, cost) in demo {
            created.push(
                reqs::create(
                    pool,
                    NewRequisition {
                        title: title.into(),
                        description: None,
                        department: department.into(),
                        requester_id: requester.into(),
                        quantity,
                        estimated_cost_cents: cost,
                    },
                )
                .await?,
            );
        }
        if let Some(first) = created.first() {
            reqs::decide(pool, first.id, Decision::Approve, "admin@portal.local").await?;
        }
        tracing::info!(count = created.len(), "seeded requisitions");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_pool;

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let pool = memory_pool().await;
        seed_demo(&pool).await.unwrap();
        seed_demo(&pool).await.unwrap();
        assert_eq!(requisitions::Entity::find().count(&pool).await.unwrap(), 3);
        assert_eq!(supplier_entity::Entity::find().count(&pool).await.unwrap(), 2);
        assert_eq!(inventory::low_stock(&pool).await.unwrap().len(), 2);
    }
}
