use axum::{
    Json, RequestPartsExt,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use platform_api::{ApiError, ApiResult};
use platform_authn::{CurrentUser, decode_token, hash_password, issue_token, verify_password};
use platform_db::{DbError, NewUser};
use products_crm::{
    AuthResponse, SignInRequest, SignUpRequest, User, user::normalize_email,
    validation::validate_signup,
};
use tracing::{info, warn};

use crate::{
    convert::{current_user, role_to_row, user_from_row},
    http::AppState,
};

const EMAIL_TAKEN: &str = "email already registered";

/// Bearer-authenticated caller. The account must still exist and be active.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

/// Same as [`AuthUser`] but rejects non-admins with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::Unauthorized)?;
        let claims = decode_token(bearer.token(), &state.config.auth).map_err(|err| {
            warn!(error = %err, "rejected bearer token");
            ApiError::Unauthorized
        })?;
        let row = platform_db::find_user(&state.pool, claims.sub)
            .await
            .map_err(ApiError::internal)?
            .filter(|row| row.is_active)
            .ok_or(ApiError::Unauthorized)?;
        Ok(Self(current_user(&row)))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(Self(user))
    }
}

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_signup(&request).map_err(|err| ApiError::validation(err.to_string()))?;
    let email = normalize_email(&request.email);
    if platform_db::find_user_by_email(&state.pool, &email)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
    }
    let password_hash = hash_password(&request.password).map_err(ApiError::internal)?;
    let row = platform_db::insert_user(
        &state.pool,
        NewUser {
            email: &email,
            name: request.name.trim(),
            role: role_to_row(request.role.unwrap_or_default()),
            password_hash,
        },
    )
    .await
    .map_err(signup_insert_error)?;
    info!(user_id = %row.id, role = ?row.role, "user signed up");
    let response = session_for(&state, &row)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&request.email);
    let row = platform_db::find_user_by_email(&state.pool, &email)
        .await
        .map_err(ApiError::internal)?
        .filter(|row| row.is_active && verify_password(&request.password, &row.password_hash))
        .ok_or_else(|| {
            warn!("sign-in rejected");
            ApiError::Unauthorized
        })?;
    info!(user_id = %row.id, "user signed in");
    Ok(Json(session_for(&state, &row)?))
}

pub async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<User>> {
    let row = platform_db::find_user(&state.pool, user.id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(user_from_row(&row)))
}

/// Tokens are stateless; the client discards its copy.
pub async fn signout(AuthUser(user): AuthUser) -> StatusCode {
    info!(user_id = %user.id, "user signed out");
    StatusCode::NO_CONTENT
}

fn signup_insert_error(err: DbError) -> ApiError {
    match err {
        DbError::Duplicate(_) => ApiError::Conflict(EMAIL_TAKEN.into()),
        other => ApiError::internal(other),
    }
}

fn session_for(state: &AppState, row: &entity::users::Model) -> ApiResult<AuthResponse> {
    let access_token =
        issue_token(&current_user(row), &state.config.auth).map_err(ApiError::internal)?;
    Ok(AuthResponse {
        user: user_from_row(row),
        access_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn racing_duplicate_signup_is_a_conflict() {
        let err = signup_insert_error(DbError::Duplicate("users_email_key".into()));
        assert!(matches!(err, ApiError::Conflict(ref message) if message == EMAIL_TAKEN));
    }

    #[test]
    fn other_insert_failures_stay_internal() {
        let err = signup_insert_error(DbError::Db(sea_orm::DbErr::Custom("boom".into())));
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
