use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use platform_api::ApiResult;
use products_crm::{Opportunity, OpportunityDraft, OpportunityPatch};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::AuthUser, http::AppState, service};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Mine,
    All,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub scope: Scope,
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<Vec<Opportunity>>> {
    let records = service::list_opportunities(&state.pool, &user, query.scope == Scope::All).await?;
    Ok(Json(records))
}

pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Opportunity>> {
    Ok(Json(service::get_opportunity(&state.pool, &user, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<OpportunityDraft>,
) -> ApiResult<(StatusCode, Json<Opportunity>)> {
    let record = service::create_opportunity(&state.pool, &state.hub, &user, draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<OpportunityPatch>,
) -> ApiResult<Json<Opportunity>> {
    let record = service::update_opportunity(&state.pool, &state.hub, &user, id, patch).await?;
    Ok(Json(record))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    service::delete_opportunity(&state.pool, &state.hub, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
