use std::collections::HashMap;

use super::models::{
    plan_addition, AddDecision, AddToCartPayload, Cart, CartEntryView, CartItem, CartTotals,
    CartView, NewCart, NewCartItem, RestaurantSummary, UpdateQuantityPayload,
};
use crate::auth::token::AuthUser;
use crate::menu::models::{customization_total, Customization, MenuItem};
use crate::order::pricing::effective_price;
use crate::restaurant::models::Restaurant;
use crate::utils::{error::ApiError, types::ApiResult, types::Pool, ApiResponse, ValidatedJson};
use axum::extract::{Path, State};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::Value;
use uuid::Uuid;

pub async fn get_cart(State(pool): State<Pool>, AuthUser(user): AuthUser) -> ApiResult<CartView> {
    let mut conn = pool.get().await.map_err(ApiError::internal)?;
    let view = load_cart_view(&mut conn, user.id).await?;
    Ok(ApiResponse::ok(view))
}

pub async fn add_to_cart(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<AddToCartPayload>,
) -> ApiResult<CartView> {
    use axum_eats::schema::{cart_items, carts, menu_items, restaurants};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let menu_item = menu_items::table
        .find(payload.menu_item)
        .select(MenuItem::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(ApiError::internal)?;

    let menu_item = match menu_item {
        Some(item) if item.is_available => item,
        _ => return Err(ApiError::validation("Menu item is not available")),
    };

    let restaurant = restaurants::table
        .find(menu_item.restaurant_id)
        .select(Restaurant::as_select())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    if !restaurant.is_orderable() {
        return Err(ApiError::validation("Restaurant is not available"));
    }

    let selection =
        serde_json::to_value(&payload.customizations).unwrap_or(Value::Array(vec![]));
    let user_id = user.id;
    let item_id = menu_item.id;
    let item_restaurant = menu_item.restaurant_id;
    let quantity = payload.quantity;
    let instructions = payload.special_instructions.clone();

    conn.transaction::<(), diesel::result::Error, _>(move |mut conn| {
        Box::pin(async move {
            let now = Utc::now();

            let cart = carts::table
                .filter(carts::user_id.eq(user_id))
                .select(Cart::as_select())
                .get_result(&mut conn)
                .await
                .optional()?;

            let cart = match cart {
                Some(cart) => cart,
                None => {
                    let data = NewCart {
                        id: Uuid::new_v4(),
                        user_id,
                        restaurant_id: item_restaurant,
                        updated_at: now,
                    };
                    diesel::insert_into(carts::table)
                        .values(&data)
                        .returning(Cart::as_returning())
                        .get_result(&mut conn)
                        .await?
                }
            };

            let entries = cart_items::table
                .filter(cart_items::cart_id.eq(cart.id))
                .select(CartItem::as_select())
                .load(&mut conn)
                .await?;

            match plan_addition(cart.restaurant_id, item_restaurant, &entries, item_id, &selection)
            {
                AddDecision::ClearAndRescope => {
                    diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart.id)))
                        .execute(&mut conn)
                        .await?;
                    diesel::update(carts::table.find(cart.id))
                        .set(carts::restaurant_id.eq(item_restaurant))
                        .execute(&mut conn)
                        .await?;

                    let data = NewCartItem {
                        id: Uuid::new_v4(),
                        cart_id: cart.id,
                        menu_item_id: item_id,
                        quantity,
                        customizations: selection,
                        special_instructions: instructions,
                    };
                    diesel::insert_into(cart_items::table)
                        .values(&data)
                        .execute(&mut conn)
                        .await?;
                }
                AddDecision::MergeInto(entry) => {
                    let new_instructions =
                        instructions.or_else(|| entry.special_instructions.clone());
                    diesel::update(cart_items::table.find(entry.id))
                        .set((
                            cart_items::quantity.eq(entry.quantity + quantity),
                            cart_items::special_instructions.eq(new_instructions),
                        ))
                        .execute(&mut conn)
                        .await?;
                }
                AddDecision::Append => {
                    let data = NewCartItem {
                        id: Uuid::new_v4(),
                        cart_id: cart.id,
                        menu_item_id: item_id,
                        quantity,
                        customizations: selection,
                        special_instructions: instructions,
                    };
                    diesel::insert_into(cart_items::table)
                        .values(&data)
                        .execute(&mut conn)
                        .await?;
                }
            }

            diesel::update(carts::table.find(cart.id))
                .set(carts::updated_at.eq(now))
                .execute(&mut conn)
                .await?;

            Ok(())
        })
    })
    .await
    .map_err(ApiError::internal)?;

    let view = load_cart_view(&mut conn, user.id).await?;
    Ok(ApiResponse::ok(view).with_message("Item added to cart"))
}

pub async fn update_quantity(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateQuantityPayload>,
) -> ApiResult<CartView> {
    use axum_eats::schema::{cart_items, carts};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let cart = user_cart(&mut conn, user.id).await?;
    let entry = cart_entry(&mut conn, cart.id, item_id).await?;

    if payload.quantity == 0 {
        diesel::delete(cart_items::table.find(entry.id))
            .execute(&mut conn)
            .await
            .map_err(ApiError::internal)?;
    } else {
        diesel::update(cart_items::table.find(entry.id))
            .set(cart_items::quantity.eq(payload.quantity))
            .execute(&mut conn)
            .await
            .map_err(ApiError::internal)?;
    }

    diesel::update(carts::table.find(cart.id))
        .set(carts::updated_at.eq(Utc::now()))
        .execute(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let view = load_cart_view(&mut conn, user.id).await?;
    Ok(ApiResponse::ok(view).with_message("Cart updated successfully"))
}

pub async fn remove_from_cart(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<Uuid>,
) -> ApiResult<CartView> {
    use axum_eats::schema::{cart_items, carts};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let cart = user_cart(&mut conn, user.id).await?;
    let entry = cart_entry(&mut conn, cart.id, item_id).await?;

    diesel::delete(cart_items::table.find(entry.id))
        .execute(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    diesel::update(carts::table.find(cart.id))
        .set(carts::updated_at.eq(Utc::now()))
        .execute(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let view = load_cart_view(&mut conn, user.id).await?;
    Ok(ApiResponse::ok(view).with_message("Item removed from cart"))
}

pub async fn clear_cart(State(pool): State<Pool>, AuthUser(user): AuthUser) -> ApiResult<()> {
    use axum_eats::schema::{cart_items, carts};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let user_id = user.id;
    conn.transaction::<(), diesel::result::Error, _>(move |mut conn| {
        Box::pin(async move {
            let cart_ids: Vec<Uuid> = carts::table
                .filter(carts::user_id.eq(user_id))
                .select(carts::id)
                .load(&mut conn)
                .await?;
            diesel::delete(cart_items::table.filter(cart_items::cart_id.eq_any(&cart_ids)))
                .execute(&mut conn)
                .await?;
            diesel::delete(carts::table.filter(carts::user_id.eq(user_id)))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    })
    .await
    .map_err(ApiError::internal)?;

    Ok(ApiResponse::message("Cart cleared successfully"))
}

async fn user_cart(conn: &mut AsyncPgConnection, user_id: Uuid) -> Result<Cart, ApiError> {
    use axum_eats::schema::carts;

    carts::table
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .get_result(conn)
        .await
        .map_err(|_| ApiError::NotFound("Cart not found".to_string()))
}

async fn cart_entry(
    conn: &mut AsyncPgConnection,
    cart_id: Uuid,
    item_id: Uuid,
) -> Result<CartItem, ApiError> {
    use axum_eats::schema::cart_items;

    cart_items::table
        .find(item_id)
        .filter(cart_items::cart_id.eq(cart_id))
        .select(CartItem::as_select())
        .get_result(conn)
        .await
        .map_err(|_| ApiError::NotFound("Item not found in cart".to_string()))
}

/// Resolves every entry against the live menu: entries whose item vanished or
/// went unavailable are dropped (and the filtered cart persisted), prices are
/// recomputed from base price plus selected option deltas.
pub async fn load_cart_view(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> Result<CartView, ApiError> {
    use axum_eats::schema::{cart_items, carts, menu_items, restaurants};

    let cart = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(Cart::as_select())
        .get_result(conn)
        .await
        .optional()
        .map_err(ApiError::internal)?;

    let Some(cart) = cart else {
        return Ok(CartView::empty());
    };

    let entries = cart_items::table
        .filter(cart_items::cart_id.eq(cart.id))
        .order(cart_items::added_at.asc())
        .select(CartItem::as_select())
        .load(conn)
        .await
        .map_err(ApiError::internal)?;

    let item_ids: Vec<Uuid> = entries.iter().map(|e| e.menu_item_id).collect();
    let live_items: HashMap<Uuid, MenuItem> = menu_items::table
        .filter(menu_items::id.eq_any(&item_ids))
        .select(MenuItem::as_select())
        .load(conn)
        .await
        .map_err(ApiError::internal)?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut views = Vec::new();
    let mut dropped = Vec::new();

    for entry in entries {
        match live_items.get(&entry.menu_item_id) {
            Some(item) if item.is_available => {
                let selection: Vec<Customization> =
                    serde_json::from_value(entry.customizations.clone()).unwrap_or_default();
                let unit_price = effective_price(item.price, customization_total(&selection));
                views.push(CartEntryView {
                    id: entry.id,
                    menu_item_id: item.id,
                    name: item.name.clone(),
                    base_price: item.price,
                    quantity: entry.quantity,
                    customizations: entry.customizations,
                    special_instructions: entry.special_instructions,
                    unit_price,
                    line_total: unit_price * entry.quantity as f64,
                });
            }
            _ => dropped.push(entry.id),
        }
    }

    if !dropped.is_empty() {
        diesel::delete(cart_items::table.filter(cart_items::id.eq_any(&dropped)))
            .execute(conn)
            .await
            .map_err(ApiError::internal)?;
    }

    let restaurant = restaurants::table
        .find(cart.restaurant_id)
        .select(Restaurant::as_select())
        .get_result(conn)
        .await
        .optional()
        .map_err(ApiError::internal)?
        .map(|r| RestaurantSummary {
            id: r.id,
            name: r.name,
            delivery_fee: r.delivery_fee,
            minimum_order: r.minimum_order,
        });

    let totals = CartTotals::from_entries(&views);

    Ok(CartView {
        restaurant,
        items: views,
        totals,
    })
}
