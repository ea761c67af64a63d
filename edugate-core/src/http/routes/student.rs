// edugate-core/src/http/routes/student.rs

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use edugate_common::models::PageRequest;

use crate::http::error::{json_rejection, path_rejection, query_rejection, reply};
use crate::http::extract::StudentAuth;
use crate::http::i18n::{Lang, Msg};
use crate::http::AppState;
use crate::Error;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/redeemCode", post(redeem_code))
        .route("/redeemCodes", get(redeemed_codes))
        .route("/entitlements", get(entitlements))
        .route("/universities", get(universities))
        .route("/colleges", get(colleges))
        .route("/materials", get(materials))
        .route("/courses", get(courses))
        .route("/videos", get(videos))
        .route("/videos/{video}", get(video))
        .route("/questions", get(questions))
        .route("/lectures/{material}", get(lectures))
        .route("/courseFiles/{course}", get(course_files))
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub university: Option<Uuid>,
    pub college: Option<Uuid>,
    pub material: Option<Uuid>,
    pub course: Option<Uuid>,
}

impl ContentQuery {
    fn page(&self) -> Result<PageRequest, Error> {
        PageRequest::new(self.page, self.limit)
    }
}

fn required(value: Option<Uuid>, field: &str) -> Result<Uuid, Error> {
    value.ok_or_else(|| Error::invalid(field, format!("{field} is required")))
}

async fn redeem_code(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    body: Result<Json<RedeemRequest>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(req) = body.map_err(json_rejection)?;
        state.redemptions.redeem(auth.student_id, &req.code).await
    }
    .await;
    reply(lang, Msg::CodeRedeemed, result)
}

async fn redeemed_codes(State(state): State<AppState>, lang: Lang, auth: StudentAuth) -> Response {
    let result = state.redemptions.redemption_history(auth.student_id).await;
    reply(lang, Msg::RedemptionHistory, result)
}

async fn entitlements(State(state): State<AppState>, lang: Lang, auth: StudentAuth) -> Response {
    let result = state.gate.entitlements().resolve_access(auth.student_id).await;
    reply(lang, Msg::Entitlements, result)
}

async fn universities(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(q) = query.map_err(query_rejection)?;
        state.gate.universities(auth.student_id, q.page()?).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn colleges(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(q) = query.map_err(query_rejection)?;
        state.gate.colleges(auth.student_id, q.university, q.page()?).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn materials(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(q) = query.map_err(query_rejection)?;
        state.gate.materials(auth.student_id, q.college, q.page()?).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn courses(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(q) = query.map_err(query_rejection)?;
        let material = required(q.material, "material")?;
        state.gate.courses(auth.student_id, material, q.page()?).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn videos(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(q) = query.map_err(query_rejection)?;
        let course = required(q.course, "course")?;
        state.gate.videos(auth.student_id, course, q.page()?).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn video(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let result = async {
        let Path(video_id) = id.map_err(path_rejection)?;
        state.gate.video(auth.student_id, video_id).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn questions(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(q) = query.map_err(query_rejection)?;
        let material = required(q.material, "material")?;
        state.gate.questions(auth.student_id, material, q.page()?).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn lectures(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let result = async {
        let Path(material_id) = id.map_err(path_rejection)?;
        state.gate.lectures(auth.student_id, material_id).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}

async fn course_files(
    State(state): State<AppState>,
    lang: Lang,
    auth: StudentAuth,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let result = async {
        let Path(course_id) = id.map_err(path_rejection)?;
        state.gate.course_files(auth.student_id, course_id).await
    }
    .await;
    reply(lang, Msg::Fetched, result)
}
