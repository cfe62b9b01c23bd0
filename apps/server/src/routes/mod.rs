//! # HTTP Routes
//!
//! ```text
//! /api/auth/*           register, login                 public
//! /api/me, /api/profile account of the caller           any user
//! /api/search*          product lookup                  any user
//! /api/checkout*        sales                           any user
//! /api/barcode/*        label images                    any user, bulk = admin
//! /api/admin/*          inventory, history              admin
//! /api/stats            dashboard report                admin
//! /api/health           liveness + row counts           public
//! ```

mod auth;
mod barcode;
mod checkout;
mod health;
mod products;
mod reports;

use axum::extract::{FromRequest, Request};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart framing on top of the upload size limit.
const UPLOAD_BODY_SLACK: usize = 64 * 1024;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router(state.config.max_upload_bytes + UPLOAD_BODY_SLACK))
        .merge(products::router())
        .merge(checkout::router())
        .merge(reports::router())
        .merge(barcode::router())
        .merge(health::router())
}

/// `Json<T>` whose rejections use the API error body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;

        Ok(ApiJson(value))
    }
}

/// `{ "success": true, "message": ... }` plus the payload's own fields.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Success {
            success: true,
            message: message.into(),
            data,
        })
    }
}
