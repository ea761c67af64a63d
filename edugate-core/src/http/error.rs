// edugate-core/src/http/error.rs

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use edugate_common::error::{ConflictCause, FieldError};

use crate::http::i18n::{message, Lang, Msg};
use crate::Error;

/// A core error on its way out, plus the language to explain it in.
#[derive(Debug)]
pub struct ApiError {
    pub error: Error,
    pub lang: Lang,
}

impl ApiError {
    pub fn new(error: Error, lang: Lang) -> Self {
        Self { error, lang }
    }
}

/// Status, machine-readable kind and message key for an error.
pub fn classify(error: &Error) -> (StatusCode, &'static str, Msg) {
    match error {
        Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation", Msg::Validation),
        Error::NotFound(what) if what == "code" => (StatusCode::NOT_FOUND, "not_found", Msg::CodeNotFound),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", Msg::NotFound),
        Error::CodeAlreadyUsed => (StatusCode::BAD_REQUEST, "code_already_used", Msg::CodeAlreadyUsed),
        Error::PoolExpired => (StatusCode::BAD_REQUEST, "pool_expired", Msg::PoolExpired),
        Error::DuplicateRedemptionInPool => (
            StatusCode::CONFLICT,
            "duplicate_redemption_in_pool",
            Msg::DuplicateRedemptionInPool,
        ),
        Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", Msg::Unauthorized),
        Error::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", Msg::Forbidden),
        Error::Conflict(ConflictCause::WriteConflict) => (StatusCode::CONFLICT, "write_conflict", Msg::WriteConflict),
        Error::Conflict(ConflictCause::PoolHasUsedCodes) => {
            (StatusCode::BAD_REQUEST, "pool_has_used_codes", Msg::PoolHasUsedCodes)
        }
        Error::Conflict(ConflictCause::CodeCollision) => (StatusCode::CONFLICT, "code_collision", Msg::CodeCollision),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal", Msg::Internal),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, msg) = classify(&self.error);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.error);
        }

        let mut body = json!({
            "error": message(self.lang, msg),
            "kind": kind,
        });
        if let Error::Validation(fields) = &self.error {
            body["errors"] = json!(fields);
        }
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    message: &'a str,
    data: T,
}

/// Renders a core result as the `{message, data}` envelope or an error.
pub fn reply<T: Serialize>(lang: Lang, msg: Msg, result: Result<T, Error>) -> Response {
    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(Envelope {
                message: message(lang, msg),
                data,
            }),
        )
            .into_response(),
        Err(e) => ApiError::new(e, lang).into_response(),
    }
}

pub fn json_rejection(rejection: JsonRejection) -> Error {
    Error::Validation(vec![FieldError::new("body", rejection.body_text())])
}

pub fn query_rejection(rejection: QueryRejection) -> Error {
    Error::Validation(vec![FieldError::new("query", rejection.body_text())])
}

pub fn path_rejection(rejection: PathRejection) -> Error {
    Error::Validation(vec![FieldError::new("id", rejection.body_text())])
}
