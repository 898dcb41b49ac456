use chrono::Utc;
use entity::suppliers::{self, Status};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

use crate::{DbError, DbPool, DbResult};

#[derive(Clone, Debug)]
pub struct NewSupplier {
    pub name: String,
    pub contact_email: String,
    pub phone: Option<String>,
}

pub async fn create(pool: &DbPool, input: NewSupplier) -> DbResult<suppliers::Model> {
    if !input.contact_email.contains('@') {
        return Err(DbError::Invalid("contact email is not valid".into()));
    }
    let model = suppliers::ActiveModel {
        name: Set(input.name),
        contact_email: Set(input.contact_email),
        phone: Set(input.phone),
        status: Set(Status::Active),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    Ok(model.insert(pool).await?)
}

pub async fn list(pool: &DbPool) -> DbResult<Vec<suppliers::Model>> {
    Ok(suppliers::Entity::find()
        .order_by_asc(suppliers::Column::Name)
        .all(pool)
        .await?)
}

pub async fn find(pool: &DbPool, id: i32) -> DbResult<suppliers::Model> {
    suppliers::Entity::find_by_id(id)
        .one(pool)
        .await?
        .ok_or_else(|| DbError::not_found("supplier", id))
}

pub async fn set_status(pool: &DbPool, id: i32, status: Status) -> DbResult<suppliers::Model> {
    let mut model: suppliers::ActiveModel = find(pool, id).await?.into();
    model.status = Set(status);
    Ok(model.update(pool).await?)
}
