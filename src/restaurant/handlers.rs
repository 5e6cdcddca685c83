use super::models::{
    distance_km, CreateRestaurantPayload, NewRestaurant, Restaurant, RestaurantFilters,
    SetStatusPayload, UpdateRestaurantPayload, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED,
    STATUS_SUSPENDED,
};
use crate::auth::token::{AdminUser, AuthUser, StaffUser};
use crate::utils::{db_error, error::ApiError, types::ApiResult, types::Pool, ApiResponse, ValidatedJson};
use axum::extract::{Path, Query, State};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

pub async fn get_restaurants(
    State(pool): State<Pool>,
    Query(filters): Query<RestaurantFilters>,
) -> ApiResult<Vec<Restaurant>> {
    use axum_eats::schema::restaurants;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let base = || {
        let mut query = restaurants::table
            .filter(restaurants::status.eq(STATUS_APPROVED))
            .filter(restaurants::is_active.eq(true))
            .into_boxed();

        if let Some(cuisine) = &filters.cuisine {
            query = query.filter(restaurants::cuisines.contains(vec![cuisine.clone()]));
        }
        if let Some(rating) = filters.rating {
            query = query.filter(restaurants::rating_average.ge(rating));
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            query = query.filter(
                restaurants::name
                    .ilike(pattern.clone())
                    .or(restaurants::description.ilike(pattern)),
            );
        }
        query
    };

    let page = filters.pagination();

    // Geo queries resolve the haversine filter in process, so pagination
    // happens after the distance cut.
    if let (Some(lat), Some(lng)) = (filters.lat, filters.lng) {
        let radius = filters.radius.unwrap_or(10.0);
        let mut matching: Vec<Restaurant> = base()
            .order(restaurants::rating_average.desc())
            .select(Restaurant::as_select())
            .load(&mut conn)
            .await
            .map_err(ApiError::internal)?;

        matching.retain(|r| distance_km(lat, lng, r.lat, r.lng) <= radius.min(r.delivery_radius_km));

        let total = matching.len() as i64;
        let res: Vec<Restaurant> = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        return Ok(ApiResponse::ok(res).with_pagination(page.meta(total)));
    }

    let total = base()
        .count()
        .get_result::<i64>(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let res = base()
        .order(restaurants::rating_average.desc())
        .limit(page.limit())
        .offset(page.offset())
        .select(Restaurant::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(res).with_pagination(page.meta(total)))
}

pub async fn get_restaurant_by_id(
    State(pool): State<Pool>,
    Path(id): Path<Uuid>,
) -> ApiResult<Restaurant> {
    use axum_eats::schema::restaurants;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let res = restaurants::table
        .find(id)
        .select(Restaurant::as_select())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "Restaurant"))?;

    Ok(ApiResponse::ok(res))
}

pub async fn create_restaurant(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateRestaurantPayload>,
) -> ApiResult<Restaurant> {
    use axum_eats::schema::restaurants;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let existing = restaurants::table
        .filter(restaurants::owner_id.eq(user.id))
        .count()
        .get_result::<i64>(&mut conn)
        .await
        .map_err(ApiError::internal)?;
    if existing > 0 {
        return Err(ApiError::Conflict(
            "You already have a registered restaurant".to_string(),
        ));
    }

    let data = NewRestaurant {
        id: Uuid::new_v4(),
        owner_id: user.id,
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        description: payload.description,
        cuisines: payload.cuisines,
        street: payload.street,
        city: payload.city,
        state: payload.state,
        zip_code: payload.zip_code,
        lat: payload.lat,
        lng: payload.lng,
        delivery_fee: payload.delivery_fee,
        minimum_order: payload.minimum_order,
        delivery_radius_km: payload.delivery_radius_km,
        status: STATUS_PENDING.to_string(),
    };

    let res = diesel::insert_into(restaurants::table)
        .values(&data)
        .returning(Restaurant::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::created(
        res,
        "Restaurant registered successfully. Pending admin approval.",
    ))
}

pub async fn update_restaurant(
    State(pool): State<Pool>,
    StaffUser(user): StaffUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateRestaurantPayload>,
) -> ApiResult<Restaurant> {
    use axum_eats::schema::restaurants;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let restaurant = restaurants::table
        .find(id)
        .select(Restaurant::as_select())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "Restaurant"))?;

    if !user.is_admin() && restaurant.owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Not authorized to update this restaurant".to_string(),
        ));
    }

    let res = diesel::update(restaurants::table.find(id))
        .set(&payload)
        .returning(Restaurant::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(res).with_message("Restaurant updated successfully"))
}

pub async fn delete_restaurant(
    State(pool): State<Pool>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    use axum_eats::schema::{menu_items, restaurants};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let deleted = conn
        .transaction::<usize, diesel::result::Error, _>(move |mut conn| {
            Box::pin(async move {
                diesel::delete(menu_items::table.filter(menu_items::restaurant_id.eq(id)))
                    .execute(&mut conn)
                    .await?;
                diesel::delete(restaurants::table.find(id))
                    .execute(&mut conn)
                    .await
            })
        })
        .await
        .map_err(ApiError::internal)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Restaurant not found".to_string()));
    }

    Ok(ApiResponse::message("Restaurant deleted successfully"))
}

pub async fn set_restaurant_status(
    State(pool): State<Pool>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetStatusPayload>,
) -> ApiResult<Restaurant> {
    use axum_eats::schema::restaurants;

    if ![STATUS_APPROVED, STATUS_REJECTED, STATUS_SUSPENDED].contains(&payload.status.as_str()) {
        return Err(ApiError::validation("Invalid status"));
    }

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let res = diesel::update(restaurants::table.find(id))
        .set(restaurants::status.eq(&payload.status))
        .returning(Restaurant::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "Restaurant"))?;

    tracing::info!(restaurant = %id, status = %payload.status, "restaurant status changed");

    Ok(ApiResponse::ok(res).with_message(format!("Restaurant {} successfully", payload.status)))
}
