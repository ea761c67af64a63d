// edugate-core/src/http/routes/admin.rs

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use edugate_common::models::{CodeUsageFilter, NewCodePool, PageRequest, PoolFilter};

use crate::http::error::{json_rejection, path_rejection, query_rejection, reply};
use crate::http::extract::AdminAuth;
use crate::http::i18n::{Lang, Msg};
use crate::http::AppState;
use crate::Error;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/codesGroup", post(create_codes_group))
        .route("/codesGroups", get(list_codes_groups))
        .route("/codes/{id}", get(get_codes))
        .route("/codesGroup/{id}", delete(delete_codes_group))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub name: Option<String>,
    pub material: Option<Uuid>,
    pub course: Option<Uuid>,
    pub expiration_from: Option<DateTime<Utc>>,
    pub expiration_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CodesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub usage: CodeUsageFilter,
}

async fn create_codes_group(
    State(state): State<AppState>,
    lang: Lang,
    auth: AdminAuth,
    body: Result<Json<NewCodePool>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(req) = body.map_err(json_rejection)?;
        let created = state.codes.create_pool(req).await?;
        info!(admin_id = %auth.admin_id, pool_id = %created.pool_id, "Admin created codes group");
        Ok::<_, Error>(created)
    }
    .await;
    reply(lang, Msg::PoolCreated, result)
}

async fn list_codes_groups(
    State(state): State<AppState>,
    lang: Lang,
    _auth: AdminAuth,
    query: Result<Query<PoolListQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(q) = query.map_err(query_rejection)?;
        let page = PageRequest::new(q.page, q.limit)?;
        let filter = PoolFilter {
            name: q.name.filter(|n| !n.trim().is_empty()),
            material: q.material,
            course: q.course,
            expiration_from: q.expiration_from,
            expiration_to: q.expiration_to,
        };
        state.codes.list_pools(&filter, page).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn get_codes(
    State(state): State<AppState>,
    lang: Lang,
    _auth: AdminAuth,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<CodesQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Path(pool_id) = id.map_err(path_rejection)?;
        let Query(q) = query.map_err(query_rejection)?;
        let page = PageRequest::new(q.page, q.limit)?;
        state.codes.get_pool_codes(pool_id, q.usage, page).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn delete_codes_group(
    State(state): State<AppState>,
    lang: Lang,
    auth: AdminAuth,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let result = async {
        let Path(pool_id) = id.map_err(path_rejection)?;
        let deletion = state.codes.delete_pool(pool_id).await?;
        info!(admin_id = %auth.admin_id, %pool_id, "Admin deleted codes group");
        Ok::<_, Error>(deletion)
    }
    .await;
    reply(lang, Msg::PoolDeleted, result)
}
