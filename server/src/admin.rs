use axum::{
    Json,
    extract::{Path, State},
};
use platform_api::{ApiError, ApiResult};
use products_crm::{
    ActivityLog, User,
    stats::{AdminStats, admin_stats},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    convert::user_from_row,
    http::AppState,
    service::{self, RECENT_ACTIVITY_LIMIT},
};

#[derive(Debug, Deserialize)]
pub struct UserStatusUpdate {
    pub is_active: bool,
}

pub async fn activities(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    Ok(Json(
        service::recent_activities(&state.pool, RECENT_ACTIVITY_LIMIT).await?,
    ))
}

pub async fn users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(service::all_users(&state.pool).await?))
}

pub async fn set_user_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(update): Json<UserStatusUpdate>,
) -> ApiResult<Json<User>> {
    if id == admin.id && !update.is_active {
        return Err(ApiError::validation("admins cannot deactivate themselves"));
    }
    let row = platform_db::set_user_active(&state.pool, id, update.is_active)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %id, is_active = update.is_active, by = %admin.id, "user status changed");
    Ok(Json(user_from_row(&row)))
}

pub async fn stats(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<Json<AdminStats>> {
    let users = service::all_users(&state.pool).await?;
    let opportunities = service::list_opportunities(&state.pool, &admin, true).await?;
    let activities = service::all_activities(&state.pool).await?;
    Ok(Json(admin_stats(&users, &opportunities, &activities)))
}
