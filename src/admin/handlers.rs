use super::models::{Dashboard, DashboardCounts, SetUserStatusPayload, UserFilters};
use crate::auth::models::{Role, SafeUser};
use crate::auth::token::AdminUser;
use crate::order::models::{Order, OrderFilters, OrderStatus};
use crate::restaurant::models::{Restaurant, STATUS_APPROVED, STATUS_PENDING};
use crate::utils::{db_error, error::ApiError, types::ApiResult, types::Pool, ApiResponse, ValidatedJson};
use axum::extract::{Path, Query, State};
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

pub async fn get_dashboard(State(pool): State<Pool>, AdminUser(_): AdminUser) -> ApiResult<Dashboard> {
    use axum_eats::schema::{orders, restaurants, users};

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let customer_count: i64 = users::table
        .filter(users::role.eq(Role::Customer.as_str()))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;
    let restaurant_count: i64 = restaurants::table
        .filter(restaurants::status.eq(STATUS_APPROVED))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;
    let order_count: i64 = orders::table
        .count()
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;
    let active_statuses: Vec<&str> = OrderStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
    let active_orders: i64 = orders::table
        .filter(orders::status.eq_any(active_statuses))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;
    let pending: i64 = restaurants::table
        .filter(restaurants::status.eq(STATUS_PENDING))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    // Revenue only counts orders that actually completed.
    let revenue: Option<f64> = orders::table
        .filter(orders::status.eq(OrderStatus::Delivered.as_str()))
        .select(sum(orders::total))
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let recent_users = users::table
        .order(users::created_at.desc())
        .limit(5)
        .select(SafeUser::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let recent_orders = orders::table
        .order(orders::created_at.desc())
        .limit(5)
        .select(Order::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(Dashboard {
        counts: DashboardCounts {
            customers: customer_count,
            restaurants: restaurant_count,
            orders: order_count,
            active_orders,
            revenue: revenue.unwrap_or(0.0),
            pending_restaurants: pending,
        },
        recent_users,
        recent_orders,
    }))
}

pub async fn get_users(
    State(pool): State<Pool>,
    AdminUser(_): AdminUser,
    Query(filters): Query<UserFilters>,
) -> ApiResult<Vec<SafeUser>> {
    use axum_eats::schema::users;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let base = || {
        let mut query = users::table.into_boxed();
        if let Some(role) = &filters.role {
            query = query.filter(users::role.eq(role.clone()));
        }
        if let Some(active) = filters.is_active {
            query = query.filter(users::is_active.eq(active));
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            query = query.filter(
                users::name
                    .ilike(pattern.clone())
                    .or(users::email.ilike(pattern)),
            );
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
        .order(users::created_at.desc())
        .limit(page.limit())
        .offset(page.offset())
        .select(SafeUser::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(res).with_pagination(page.meta(total)))
}

pub async fn set_user_status(
    State(pool): State<Pool>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetUserStatusPayload>,
) -> ApiResult<SafeUser> {
    use axum_eats::schema::users;

    if id == admin.id {
        return Err(ApiError::validation("Cannot change your own account status"));
    }

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let user = diesel::update(users::table.find(id))
        .set(users::is_active.eq(payload.is_active))
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(|e| db_error(e, "User"))?;

    let message = if user.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    Ok(ApiResponse::ok(user).with_message(message))
}

pub async fn get_all_orders(
    State(pool): State<Pool>,
    AdminUser(_): AdminUser,
    Query(filters): Query<OrderFilters>,
) -> ApiResult<Vec<Order>> {
    use axum_eats::schema::orders;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let base = || {
        let mut query = orders::table.into_boxed();
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

pub async fn get_pending_restaurants(
    State(pool): State<Pool>,
    AdminUser(_): AdminUser,
) -> ApiResult<Vec<Restaurant>> {
    use axum_eats::schema::restaurants;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let res = restaurants::table
        .filter(restaurants::status.eq(STATUS_PENDING))
        .order(restaurants::created_at.asc())
        .select(Restaurant::as_select())
        .load(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(res))
}
