use chrono::Utc;
use entity::inventory_items;
use platform_api::{Page, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};

use crate::{DbError, DbPool, DbResult, suppliers};

#[derive(Clone, Debug)]
pub struct NewItem {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub reorder_level: i32,
    pub unit_cost_cents: i64,
    pub supplier_id: Option<i32>,
}

pub async fn create_item(pool: &DbPool, input: NewItem) -> DbResult<inventory_items::Model> {
    if input.quantity < 0 || input.reorder_level < 0 {
        return Err(DbError::Invalid("quantities cannot be negative".into()));
    }
    let existing = inventory_items::Entity::find()
        .filter(inventory_items::Column::Sku.eq(input.sku.as_str()))
        .one(pool)
        .await?;
    if existing.is_some() {
        return Err(DbError::Duplicate(format!("sku {} already exists", input.sku)));
    }
    if let Some(supplier_id) = input.supplier_id {
        suppliers::find(pool, supplier_id).await?;
    }
    let model = inventory_items::ActiveModel {
        sku: Set(input.sku),
        name: Set(input.name),
        category: Set(input.category),
        quantity: Set(input.quantity),
        reorder_level: Set(input.reorder_level),
        unit_cost_cents: Set(input.unit_cost_cents),
        supplier_id: Set(input.supplier_id),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    Ok(model.insert(pool).await?)
}

/// Substring search over name and SKU.
pub async fn list_items(
    pool: &DbPool,
    search: Option<&str>,
    request: PageRequest,
) -> DbResult<Page<inventory_items::Model>> {
    let request = request.normalized();
    let mut query = inventory_items::Entity::find();
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(inventory_items::Column::Name.contains(term))
                .add(inventory_items::Column::Sku.contains(term)),
        );
    }
    let paginator = query
        .order_by_asc(inventory_items::Column::Name)
        .paginate(pool, request.per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.page - 1).await?;
    Ok(Page::new(items, total, request))
}

pub async fn find_item(pool: &DbPool, id: i32) -> DbResult<inventory_items::Model> {
    inventory_items::Entity::find_by_id(id)
        .one(pool)
        .await?
        .ok_or_else(|| DbError::not_found("inventory item", id))
}

/// Applies a signed stock movement in a single conditional update, so
/// concurrent movements compose. Stock never drops below zero.
pub async fn adjust_stock(
    pool: &DbPool,
    id: i32,
    delta: i32,
) -> DbResult<inventory_items::Model> {
    let delta = i64::from(delta);
    let result = inventory_items::Entity::update_many()
        .col_expr(
            inventory_items::Column::Quantity,
            Expr::col(inventory_items::Column::Quantity).add(delta),
        )
        .col_expr(
            inventory_items::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(inventory_items::Column::Id.eq(id))
        .filter(inventory_items::Column::Quantity.gte(-delta))
        .filter(inventory_items::Column::Quantity.lte(i64::from(i32::MAX) - delta))
        .exec(pool)
        .await?;
    let item = find_item(pool, id).await?;
    if result.rows_affected == 0 {
        return Err(DbError::Invalid(format!(
            "insufficient stock for {}: have {}, change {}",
            item.sku, item.quantity, delta
        )));
    }
    tracing::debug!(id, delta, quantity = item.quantity, "stock adjusted");
    Ok(item)
}

pub async fn low_stock(pool: &DbPool) -> DbResult<Vec<inventory_items::Model>> {
    Ok(inventory_items::Entity::find()
        .filter(
            Expr::col(inventory_items::Column::Quantity)
                .lte(Expr::col(inventory_items::Column::ReorderLevel)),
        )
        .order_by_asc(inventory_items::Column::Quantity)
        .all(pool)
        .await?)
}
