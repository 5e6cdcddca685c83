use std::collections::BTreeMap;

use super::models::{
    CreateMenuItemPayload, MenuFilters, MenuItem, MenuItemChanges, NewMenuItem,
    UpdateMenuItemPayload,
};
use crate::auth::token::StaffUser;
use crate::restaurant::models::Restaurant;
use crate::utils::{db_error, error::ApiError, types::ApiResult, types::Pool, ApiResponse, ValidatedJson};
use axum::extract::{Path, Query, State};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use uuid::Uuid;

pub async fn get_restaurant_menu(
    State(pool): State<Pool>,
    Path(restaurant_id): Path<Uuid>,
    Query(filters): Query<MenuFilters>,
) -> ApiResult<BTreeMap<String, Vec<MenuItem>>> {
    use axum_eats::schema::menu_items;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let mut query = menu_items::table
        .filter(menu_items::restaurant_id.eq(restaurant_id))
        .into_boxed();

    if filters.available.unwrap_or(true) {
        query = query.filter(menu_items::is_available.eq(true));
    }
    if let Some(category) = &filters.category {
        query = query.filter(menu_items::category.eq(category));
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search);
        query = query.filter(
            menu_items::name
                .ilike(pattern.clone())
                .or(menu_items::description.ilike(pattern)),
        );
    }

    let items = query
        .order((menu_items::category.asc(), menu_items::name.asc()))
        .select(MenuItem::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let mut grouped: BTreeMap<String, Vec<MenuItem>> = BTreeMap::new();
    for item in items {
        grouped.entry(item.category.clone()).or_default().push(item);
    }

    Ok(ApiResponse::ok(grouped))
}

pub async fn get_menu_item(State(pool): State<Pool>, Path(id): Path<Uuid>) -> ApiResult<MenuItem> {
    use axum_eats::schema::menu_items;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let res = menu_items::table
        .find(id)
        .select(MenuItem::as_select())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "Menu item"))?;

    Ok(ApiResponse::ok(res))
}

pub async fn create_menu_item(
    State(pool): State<Pool>,
    StaffUser(user): StaffUser,
    ValidatedJson(payload): ValidatedJson<CreateMenuItemPayload>,
) -> ApiResult<MenuItem> {
    use axum_eats::schema::{menu_items, restaurants};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let restaurant = restaurants::table
        .find(payload.restaurant)
        .select(Restaurant::as_select())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "Restaurant"))?;

    if !user.is_admin() && restaurant.owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to manage this restaurant's menu".to_string(),
        ));
    }

    let customizations =
        serde_json::to_value(&payload.customizations).unwrap_or(Value::Array(vec![]));

    let data = NewMenuItem {
        id: Uuid::new_v4(),
        restaurant_id: restaurant.id,
        name: payload.name,
        description: payload.description,
        category: payload.category,
        price: payload.price,
        image: payload.image,
        is_available: payload.is_available,
        customizations,
    };

    let res = diesel::insert_into(menu_items::table)
        .values(&data)
        .returning(MenuItem::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::created(res, "Menu item added successfully"))
}

pub async fn update_menu_item(
    State(pool): State<Pool>,
    StaffUser(user): StaffUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateMenuItemPayload>,
) -> ApiResult<MenuItem> {
    use axum_eats::schema::menu_items;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    authorize_item(&mut conn, id, &user).await?;

    let changes = MenuItemChanges::from(payload);
    let res = diesel::update(menu_items::table.find(id))
        .set(&changes)
        .returning(MenuItem::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(res).with_message("Menu item updated successfully"))
}

pub async fn delete_menu_item(
    State(pool): State<Pool>,
    StaffUser(user): StaffUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    use axum_eats::schema::menu_items;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    authorize_item(&mut conn, id, &user).await?;

    diesel::delete(menu_items::table.find(id))
        .execute(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::message("Menu item deleted successfully"))
}

/// Loads the item's owning restaurant and checks the acting user against it.
async fn authorize_item(
    conn: &mut diesel_async::AsyncPgConnection,
    item_id: Uuid,
    user: &crate::auth::models::SafeUser,
) -> Result<(), ApiError> {
    use axum_eats::schema::{menu_items, restaurants};

    let owner_id = menu_items::table
        .inner_join(restaurants::table)
        .filter(menu_items::id.eq(item_id))
        .select(restaurants::owner_id)
        .get_result::<Uuid>(conn)
        .await
        .map_err(|e| db_error(e, "Menu item"))?;

    if !user.is_admin() && owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to manage this restaurant's menu".to_string(),
        ));
    }
    Ok(())
}
