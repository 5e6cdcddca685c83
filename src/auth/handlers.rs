use super::models::{
    AuthData, ChangePasswordPayload, LoginPayload, NewUser, RegisterPayload, Role, SafeUser,
    UpdateProfilePayload, User,
};
use super::token::{issue_token, AuthUser};
use crate::utils::{error::ApiError, types::ApiResult, types::Pool, ApiResponse, ValidatedJson};
use axum::extract::State;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

pub async fn register(
    State(pool): State<Pool>,
    ValidatedJson(payload): ValidatedJson<RegisterPayload>,
) -> ApiResult<AuthData> {
    use axum_eats::schema::users;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let existing = users::table
        .filter(users::email.eq(&payload.email))
        .count()
        .get_result::<i64>(&mut conn)
        .await
        .map_err(ApiError::internal)?;
    if existing > 0 {
        return Err(ApiError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = create_password_hash(payload.password).await?;

    let role = payload.role.unwrap_or(Role::Customer);
    if role == Role::Admin {
        return Err(ApiError::validation("Invalid role"));
    }

    let address = payload.address.unwrap_or_else(|| super::models::AddressPayload {
        street: None,
        city: None,
        state: None,
        zip_code: None,
    });

    let user_data = NewUser {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        password_hash,
        phone: payload.phone,
        role: role.as_str().to_string(),
        street: address.street,
        city: address.city,
        state: address.state,
        zip_code: address.zip_code,
    };

    let user = diesel::insert_into(users::table)
        .values(&user_data)
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let token = issue_token(user.id)?;
    tracing::info!(user = %user.id, "registered");

    Ok(ApiResponse::created(
        AuthData { user, token },
        "User registered successfully",
    ))
}

pub async fn login(
    State(pool): State<Pool>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> ApiResult<AuthData> {
    use axum_eats::schema::users;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let user = users::table
        .filter(users::email.eq(&payload.email))
        .select(User::as_select())
        .get_result(&mut conn)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "Account has been deactivated".to_string(),
        ));
    }

    let matches = verify_password(payload.password, user.password_hash.clone()).await?;
    if !matches {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = diesel::update(users::table.find(user.id))
        .set(users::last_login.eq(Utc::now()))
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let token = issue_token(user.id)?;

    Ok(ApiResponse::ok(AuthData { user, token }).with_message("Login successful"))
}

pub async fn get_profile(AuthUser(user): AuthUser) -> ApiResult<SafeUser> {
    Ok(ApiResponse::ok(user))
}

pub async fn update_profile(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfilePayload>,
) -> ApiResult<SafeUser> {
    use axum_eats::schema::users;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let updated = diesel::update(users::table.find(user.id))
        .set(&payload)
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::ok(updated).with_message("Profile updated successfully"))
}

pub async fn change_password(
    State(pool): State<Pool>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordPayload>,
) -> ApiResult<()> {
    use axum_eats::schema::users;

    let mut conn = pool.get().await.map_err(ApiError::internal)?;

    let current_hash = users::table
        .find(user.id)
        .select(users::password_hash)
        .get_result::<String>(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    let matches = verify_password(payload.current_password, current_hash).await?;
    if !matches {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let new_hash = create_password_hash(payload.new_password).await?;

    diesel::update(users::table.find(user.id))
        .set(users::password_hash.eq(new_hash))
        .execute(&mut conn)
        .await
        .map_err(ApiError::internal)?;

    Ok(ApiResponse::message("Password changed successfully"))
}

pub async fn logout(AuthUser(user): AuthUser) -> ApiResult<()> {
    // Stateless tokens; the client discards its copy.
    tracing::debug!(user = %user.id, "logout");
    Ok(ApiResponse::message("Logged out successfully"))
}

async fn create_password_hash(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

async fn verify_password(password: String, hashed: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify(password, &hashed))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}
