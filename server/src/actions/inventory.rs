use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use entity::suppliers::Status as SupplierStatus;
use platform_api::{ApiError, ApiResult};
use platform_authz::ADMIN_OR_MANAGER;
use platform_db::{
    inventory::{self, NewItem},
    suppliers::{self, NewSupplier},
};

use super::{ActionOk, Done, FormFields, authorize, finish, parse_id};
use crate::{http::AppState, session::Session};

const PAGE: &str = "/dashboard/inventory";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actions/inventory/suppliers/create", post(create_supplier))
        .route("/actions/inventory/suppliers/{id}/status", post(supplier_status))
        .route("/actions/inventory/items/create", post(create_item))
        .route("/actions/inventory/items/{id}/adjust", post(adjust_stock))
}

async fn create_supplier(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "inventory.suppliers.create")?;
    let form = FormFields::from(form);
    let supplier = suppliers::create(
        &state.pool,
        NewSupplier {
            name: form.required("name")?,
            contact_email: form.required("contact_email")?,
            phone: form.optional("phone"),
        },
    )
    .await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "inventory.suppliers.create",
            entity: "supplier",
            id: supplier.id.to_string(),
            summary: supplier.name,
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn supplier_status(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "inventory.suppliers.status")?;
    let id = parse_id(&raw_id, "supplier")?;
    let status = match FormFields::from(form).required("status")?.to_lowercase().as_str() {
        "active" => SupplierStatus::Active,
        "inactive" => SupplierStatus::Inactive,
        other => return Err(ApiError::invalid(format!("unknown supplier status {other}"))),
    };
    let supplier = suppliers::set_status(&state.pool, id, status).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "inventory.suppliers.status",
            entity: "supplier",
            id: supplier.id.to_string(),
            summary: format!("{} {:?}", supplier.name, supplier.status).to_lowercase(),
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn create_item(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "inventory.items.create")?;
    let form = FormFields::from(form);
    let item = inventory::create_item(
        &state.pool,
        NewItem {
            sku: form.required("sku")?.to_uppercase(),
            name: form.required("name")?,
            category: form.required("category")?,
            quantity: form.parsed("quantity")?.unwrap_or_default(),
            reorder_level: form.parsed("reorder_level")?.unwrap_or_default(),
            unit_cost_cents: form.money("unit_cost")?.unwrap_or_default(),
            supplier_id: form.parsed("supplier_id")?,
        },
    )
    .await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "inventory.items.create",
            entity: "inventory_item",
            id: item.id.to_string(),
            summary: format!("{} {} qty {}", item.sku, item.name, item.quantity),
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

async fn adjust_stock(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Json<ActionOk>> {
    let user = authorize(session, ADMIN_OR_MANAGER, "inventory.items.adjust")?;
    let id = parse_id(&raw_id, "inventory item")?;
    let delta: i32 = FormFields::from(form).required_parsed("delta")?;
    let item = inventory::adjust_stock(&state.pool, id, delta).await?;
    Ok(finish(
        &state,
        &user,
        Done {
            action: "inventory.items.adjust",
            entity: "inventory_item",
            id: item.id.to_string(),
            summary: format!("{} {delta:+} -> {}", item.sku, item.quantity),
            revalidate: vec![PAGE.into()],
        },
    )
    .await)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::http::testing::*;

    #[tokio::test]
    async fn item_lifecycle() {
        let app = app().await;
        let response = app
            .post_form(
                "/actions/inventory/items/create",
                "sku=hdmi-2m&name=HDMI+cable&category=Accessories&quantity=3&reorder_level=5&unit_cost=7.99",
                Some(MANAGER),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = json(response).await["id"].as_str().unwrap().to_string();

        let duplicate = app
            .post_form(
                "/actions/inventory/items/create",
                "sku=HDMI-2M&name=Other&category=Accessories",
                Some(MANAGER),
            )
            .await;
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let adjust = format!("/actions/inventory/items/{id}/adjust");
        assert_eq!(
            app.post_form(&adjust, "delta=-4", Some(MANAGER)).await.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            app.post_form(&adjust, "delta=-3", Some(MANAGER)).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            app.post_form(&adjust, "delta=1", Some(EMPLOYEE)).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn supplier_needs_contact_email() {
        let app = app().await;
        let response = app
            .post_form(
                "/actions/inventory/suppliers/create",
                "name=Globex&contact_email=not-an-email",
                Some(ADMIN),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .post_form(
                "/actions/inventory/suppliers/create",
                "name=Globex&contact_email=sales%40globex.example",
                Some(ADMIN),
            )
            .await;
        let id = json(response).await["id"].as_str().unwrap().to_string();
        let response = app
            .post_form(
                &format!("/actions/inventory/suppliers/{id}/status"),
                "status=inactive",
                Some(ADMIN),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_numeric_ids_get_an_error_body() {
        let app = app().await;
        for path in [
            "/actions/inventory/items/abc/adjust",
            "/actions/inventory/suppliers/abc/status",
        ] {
            let response = app.post_form(path, "delta=1&status=active", Some(MANAGER)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
            let body = json(response).await;
            assert_eq!(body["code"], "INVALID_INPUT");
        }
    }
}
