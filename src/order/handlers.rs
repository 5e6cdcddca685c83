use super::models::{
    average_rating, generate_order_number, CancelPayload, CreateOrderPayload, NewOrder,
    NewOrderEvent, Order, OrderEvent, OrderFilters, OrderItem, OrderStatus, OrderType, OrderView,
    RatePayload, UpdateStatusPayload, PAYMENT_METHODS,
};
use super::pricing;
use crate::auth::token::{AuthUser, StaffUser};
use crate::menu::models::{customization_total, MenuItem};
use crate::restaurant::models::Restaurant;
use crate::utils::{db_error, error::ApiError, types::ApiResult, types::Pool, ApiResponse, ValidatedJson};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

diesel::define_sql_function! {
    fn nextval(sequence: diesel::sql_types::Text) -> diesel::sql_types::BigInt;
}

pub async fn create_order(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateOrderPayload>,
) -> ApiResult<OrderView> {
    use axum_eats::schema::{menu_items, restaurants};

    if !PAYMENT_METHODS.contains(&payload.payment_method.as_str()) {
        return Err(ApiError::validation("Invalid payment method"));
    }
    let order_type = payload.order_type.unwrap_or(OrderType::Delivery);

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let restaurant = restaurants::table
        .find(payload.restaurant)
        .select(Restaurant::as_select())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(ApiError::internal)?;

    let restaurant = match restaurant {
        Some(r) if r.is_orderable() => r,
        _ => return Err(ApiError::validation("Restaurant is not available")),
    };

    // Every line item is validated and priced before anything is written;
    // one bad line fails the whole order.
    let mut subtotal = 0.0;
    let mut order_items = Vec::with_capacity(payload.items.len());

    for line in &payload.items {
        let item = menu_items::table
            .find(line.menu_item)
            .filter(menu_items::restaurant_id.eq(restaurant.id))
            .select(MenuItem::as_select())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(ApiError::internal)?;

        let item = match item {
            Some(item) if item.is_available => item,
            _ => {
                return Err(ApiError::validation(format!(
                    "Item {} is not available",
                    line.menu_item
                )))
            }
        };

        let unit_price =
            pricing::effective_price(item.price, customization_total(&line.customizations));
        let item_total = pricing::line_total(unit_price, line.quantity);
        subtotal += item_total;

        order_items.push(OrderItem {
            menu_item_id: item.id,
            name: item.name,
            price: item.price,
            quantity: line.quantity,
            customizations: line.customizations.clone(),
            item_total,
            special_instructions: line.special_instructions.clone(),
        });
    }

    let delivery_fee = match order_type {
        OrderType::Delivery => restaurant.delivery_fee,
        OrderType::Pickup => 0.0,
    };

    if order_type == OrderType::Delivery && subtotal < restaurant.minimum_order {
        return Err(ApiError::validation(format!(
            "Minimum order amount is ${}",
            restaurant.minimum_order
        )));
    }

    let service_fee = pricing::service_fee(subtotal);
    let tax = pricing::tax(subtotal);
    let total = pricing::order_total(subtotal, delivery_fee);

    let now = Utc::now();
    let estimated = now + Duration::minutes(order_type.delivery_minutes());

    let items_json = serde_json::to_value(&order_items).map_err(ApiError::internal)?;
    let customer_id = user.id;
    let restaurant_id = restaurant.id;

    // Order insert, timeline bootstrap, cart cleanup and restaurant stat
    // bumps commit or roll back together.
    let order = conn
        .transaction::<Order, diesel::result::Error, _>(move |mut conn| {
            Box::pin(async move {
                use axum_eats::schema::{cart_items, carts, order_events, orders, restaurants};

                // A dedicated sequence keeps the suffix unique even when two
                // checkouts land in the same millisecond.
                let sequence: i64 = diesel::select(nextval("order_number_seq"))
                    .get_result(&mut conn)
                    .await?;
                let order_number = generate_order_number(now, sequence);

                let data = NewOrder {
                    id: Uuid::new_v4(),
                    order_number,
                    customer_id,
                    restaurant_id,
                    items: items_json,
                    subtotal,
                    delivery_fee,
                    service_fee,
                    tax,
                    discount: 0.0,
                    total,
                    delivery_street: payload.delivery_address.street,
                    delivery_city: payload.delivery_address.city,
                    delivery_state: payload.delivery_address.state,
                    delivery_zip_code: payload.delivery_address.zip_code,
                    delivery_instructions: payload.delivery_address.instructions,
                    contact_phone: payload.contact_info.phone,
                    contact_email: payload.contact_info.email,
                    payment_method: payload.payment_method,
                    payment_status: "pending".to_string(),
                    status: OrderStatus::Pending.as_str().to_string(),
                    order_type: order_type.as_str().to_string(),
                    estimated_delivery_time: estimated,
                    special_instructions: payload.special_instructions,
                };

                let order = diesel::insert_into(orders::table)
                    .values(&data)
                    .returning(Order::as_returning())
                    .get_result(&mut conn)
                    .await?;

                diesel::insert_into(order_events::table)
                    .values(&NewOrderEvent {
                        order_id: order.id,
                        status: OrderStatus::Pending.as_str().to_string(),
                        note: "Order placed".to_string(),
                    })
                    .execute(&mut conn)
                    .await?;

                let cart_ids: Vec<Uuid> = carts::table
                    .filter(carts::user_id.eq(customer_id))
                    .select(carts::id)
                    .load(&mut conn)
                    .await?;
                diesel::delete(cart_items::table.filter(cart_items::cart_id.eq_any(&cart_ids)))
                    .execute(&mut conn)
                    .await?;
                diesel::delete(carts::table.filter(carts::user_id.eq(customer_id)))
                    .execute(&mut conn)
                    .await?;

                diesel::update(restaurants::table.find(restaurant_id))
                    .set((
                        restaurants::total_orders.eq(restaurants::total_orders + 1),
                        restaurants::total_revenue.eq(restaurants::total_revenue + total),
                    ))
                    .execute(&mut conn)
                    .await?;

                Ok(order)
            })
        })
        .await
        .map_err(ApiError::internal)?;

    tracing::info!(order = %order.order_number, total, "order placed");

    let timeline = order_timeline(&mut conn, order.id).await?;
    Ok(ApiResponse::created(
        OrderView { order, timeline },
        "Order placed successfully",
    ))
}

pub async fn get_my_orders(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    Query(filters): Query<OrderFilters>,
) -> ApiResult<Vec<Order>> {
    use axum_eats::schema::orders;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let base = || {
        let mut query = orders::table
            .filter(orders::customer_id.eq(user.id))
            .into_boxed();
        if let Some(status) = &filters.status {
            query = query.filter(orders::status.eq(status.clone()));
        }
        query
    };

    let page = filters.pagination();
    let total = base()
        .count()
        .get_result::<i64>(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let res = base()
        .order(orders::created_at.desc())
        .limit(page.limit())
        .offset(page.offset())
        .select(Order::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(res).with_pagination(page.meta(total)))
}

pub async fn get_order_by_id(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderView> {
    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let (order, owner_id) = order_with_owner(&mut conn, id).await?;

    let is_customer = order.customer_id == user.id;
    if !is_customer && owner_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }

    let timeline = order_timeline(&mut conn, order.id).await?;
    Ok(ApiResponse::ok(OrderView { order, timeline }))
}

pub async fn get_restaurant_orders(
    State(pool): State<Pool>,
    StaffUser(user): StaffUser,
    Path(restaurant_id): Path<Uuid>,
    Query(filters): Query<OrderFilters>,
) -> ApiResult<Vec<Order>> {
    use axum_eats::schema::{orders, restaurants};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let restaurant = restaurants::table
        .find(restaurant_id)
        .select(Restaurant::as_select())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "Restaurant"))?;

    if !user.is_admin() && restaurant.owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to view these orders".to_string(),
        ));
    }

    let base = || {
        let mut query = orders::table
            .filter(orders::restaurant_id.eq(restaurant_id))
            .into_boxed();
        if let Some(status) = &filters.status {
            query = query.filter(orders::status.eq(status.clone()));
        }
        if let Some(date) = filters.date {
            let start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
            let end = start + Duration::days(1);
            query = query
                .filter(orders::created_at.ge(start))
                .filter(orders::created_at.lt(end));
        }
        query
    };

    let page = filters.pagination();
    let total = base()
        .count()
        .get_result::<i64>(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let res = base()
        .order(orders::created_at.desc())
        .limit(page.limit())
        .offset(page.offset())
        .select(Order::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(res).with_pagination(page.meta(total)))
}

pub async fn update_order_status(
    State(pool): State<Pool>,
    StaffUser(user): StaffUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusPayload>,
) -> ApiResult<OrderView> {
    use axum_eats::schema::{order_events, orders};

    let new_status = OrderStatus::parse(&payload.status)
        .filter(|s| *s != OrderStatus::Pending && *s != OrderStatus::Refunded)
        .ok_or_else(|| ApiError::validation("Invalid status"))?;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let (order, owner_id) = order_with_owner(&mut conn, id).await?;

    if !user.is_admin() && owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to update this order".to_string(),
        ));
    }

    let current = order
        .status()
        .ok_or_else(|| ApiError::internal("order has unknown status"))?;
    if !current.can_transition_to(new_status) {
        return Err(ApiError::validation(format!(
            "Cannot change status from {} to {}",
            current.as_str(),
            new_status.as_str()
        )));
    }

    let note = payload
        .note
        .unwrap_or_else(|| format!("Order {}", new_status.as_str()));
    let delivered_at = (new_status == OrderStatus::Delivered).then(Utc::now);

    let order = conn
        .transaction::<Order, diesel::result::Error, _>(move |mut conn| {
            Box::pin(async move {
                let order = diesel::update(orders::table.find(id))
                    .set((
                        orders::status.eq(new_status.as_str()),
                        orders::actual_delivery_time.eq(delivered_at),
                    ))
                    .returning(Order::as_returning())
                    .get_result(&mut conn)
                    .await?;

                diesel::insert_into(order_events::table)
                    .values(&NewOrderEvent {
                        order_id: id,
                        status: new_status.as_str().to_string(),
                        note,
                    })
                    .execute(&mut conn)
                    .await?;

                Ok(order)
            })
        })
        .await
        .map_err(ApiError::internal)?;

    let timeline = order_timeline(&mut conn, order.id).await?;
    Ok(ApiResponse::ok(OrderView { order, timeline })
        .with_message("Order status updated successfully"))
}

pub async fn cancel_order(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelPayload>>,
) -> ApiResult<OrderView> {
    use axum_eats::schema::{order_events, orders};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let (order, owner_id) = order_with_owner(&mut conn, id).await?;

    let is_customer = order.customer_id == user.id;
    if !is_customer && owner_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "Not authorized to cancel this order".to_string(),
        ));
    }

    let current = order
        .status()
        .ok_or_else(|| ApiError::internal("order has unknown status"))?;
    if current.is_terminal() {
        return Err(ApiError::validation("Order cannot be cancelled"));
    }

    // Cancelling carries no required fields; a body-less request is fine.
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let reason = payload.reason.unwrap_or_else(|| "Cancelled by user".to_string());
    let note = reason.clone();

    let order = conn
        .transaction::<Order, diesel::result::Error, _>(move |mut conn| {
            Box::pin(async move {
                let order = diesel::update(orders::table.find(id))
                    .set((
                        orders::status.eq(OrderStatus::Cancelled.as_str()),
                        orders::cancellation_reason.eq(reason),
                    ))
                    .returning(Order::as_returning())
                    .get_result(&mut conn)
                    .await?;

                diesel::insert_into(order_events::table)
                    .values(&NewOrderEvent {
                        order_id: id,
                        status: OrderStatus::Cancelled.as_str().to_string(),
                        note,
                    })
                    .execute(&mut conn)
                    .await?;

                Ok(order)
            })
        })
        .await
        .map_err(ApiError::internal)?;

    let timeline = order_timeline(&mut conn, order.id).await?;
    Ok(ApiResponse::ok(OrderView { order, timeline }).with_message("Order cancelled successfully"))
}

pub async fn rate_order(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RatePayload>,
) -> ApiResult<Order> {
    use axum_eats::schema::{orders, restaurants};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let order = orders::table
        .find(id)
        .select(Order::as_select())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "Order"))?;

    if order.customer_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to rate this order".to_string(),
        ));
    }
    if order.status() != Some(OrderStatus::Delivered) {
        return Err(ApiError::validation("Can only rate delivered orders"));
    }
    if order.rated_at.is_some() {
        return Err(ApiError::Conflict("Order already rated".to_string()));
    }

    let restaurant_id = order.restaurant_id;
    let delivery = payload.delivery.unwrap_or(payload.food);

    let order = conn
        .transaction::<Order, diesel::result::Error, _>(move |mut conn| {
            Box::pin(async move {
                let order = diesel::update(orders::table.find(id))
                    .set((
                        orders::rating_food.eq(payload.food),
                        orders::rating_delivery.eq(delivery),
                        orders::rating_overall.eq(payload.overall),
                        orders::rating_comment.eq(payload.comment),
                        orders::rated_at.eq(Utc::now()),
                    ))
                    .returning(Order::as_returning())
                    .get_result(&mut conn)
                    .await?;

                // Aggregate rating is always recomputed from the rated orders,
                // never incrementally adjusted.
                let scores: Vec<Option<i32>> = orders::table
                    .filter(orders::restaurant_id.eq(restaurant_id))
                    .filter(orders::rated_at.is_not_null())
                    .select(orders::rating_overall)
                    .load(&mut conn)
                    .await?;
                let scores: Vec<i32> = scores.into_iter().flatten().collect();

                diesel::update(restaurants::table.find(restaurant_id))
                    .set((
                        restaurants::rating_average.eq(average_rating(&scores)),
                        restaurants::rating_count.eq(scores.len() as i32),
                    ))
                    .execute(&mut conn)
                    .await?;

                Ok(order)
            })
        })
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(order).with_message("Order rated successfully"))
}

async fn order_with_owner(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<(Order, Uuid), ApiError> {
    use axum_eats::schema::{orders, restaurants};

    orders::table
        .inner_join(restaurants::table)
        .filter(orders::id.eq(order_id))
        .select((Order::as_select(), restaurants::owner_id))
        .get_result::<(Order, Uuid)>(conn)
        .await
        .map_err(|e| db_error(e, "Order"))
}

async fn order_timeline(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<Vec<OrderEvent>, ApiError> {
    use axum_eats::schema::order_events;

    order_events::table
        .filter(order_events::order_id.eq(order_id))
        .order(order_events::created_at.asc())
        .select(OrderEvent::as_select())
        .load(conn)
        .await
        .map_err(ApiError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{FromRequest, Request};

    #[tokio::test]
    async fn cancel_body_is_optional() {
        let req = Request::builder().body(axum::body::Body::empty()).unwrap();
        let payload = Option::<Json<CancelPayload>>::from_request(req, &())
            .await
            .expect("body-less cancel should extract");
        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn cancel_reason_passes_through_when_given() {
        let req = Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"reason":"Changed my mind"}"#))
            .unwrap();
        let payload = Option::<Json<CancelPayload>>::from_request(req, &())
            .await
            .expect("json cancel body should extract")
            .expect("body should be present");
        assert_eq!(payload.reason.as_deref(), Some("Changed my mind"));
    }
}
