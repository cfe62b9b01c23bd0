//! Checkout routes.
//!
//! ```text
//! POST /api/checkout          { items: [{ sku, qty }] }  regular, stock decremented
//! POST /api/checkout_lelang   { items: [{ sku }] }       auction, listings removed
//! GET  /api/transaction/{id}  admin
//! ```
//!
//! Failures come back as the standard error body with nothing written.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use justcani_core::{CartLine, CoreError, Transaction};

use super::{ApiJson, Success};
use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(checkout))
        .route("/api/checkout_lelang", post(checkout_lelang))
        .route("/api/transaction/{id}", get(get_transaction))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Deserialize)]
pub struct AuctionItem {
    pub sku: String,
}

#[derive(Debug, Deserialize)]
pub struct AuctionCheckoutRequest {
    #[serde(default)]
    pub items: Vec<AuctionItem>,
}

#[derive(Debug, Serialize)]
struct TransactionBody {
    transaction: Transaction,
}

fn receipt(transaction: Transaction) -> Json<Success<TransactionBody>> {
    Success::new(
        format!(
            "Transaction {} recorded, total {}",
            transaction.transaction_code, transaction.total_amount
        ),
        TransactionBody { transaction },
    )
}

async fn checkout(
    State(state): State<AppState>,
    AuthUser(cashier): AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<Json<Success<TransactionBody>>> {
    let transaction = state
        .db
        .transactions()
        .checkout_regular(&cashier, &req.items, Utc::now())
        .await?;

    info!(
        code = %transaction.transaction_code,
        user_id = cashier.id,
        total = transaction.total_amount.rupiah(),
        "Regular checkout"
    );
    Ok(receipt(transaction))
}

async fn checkout_lelang(
    State(state): State<AppState>,
    AuthUser(cashier): AuthUser,
    ApiJson(req): ApiJson<AuctionCheckoutRequest>,
) -> ApiResult<Json<Success<TransactionBody>>> {
    let skus: Vec<String> = req.items.into_iter().map(|item| item.sku).collect();

    let transaction = state
        .db
        .transactions()
        .checkout_auction(&cashier, &skus, Utc::now())
        .await?;

    info!(
        code = %transaction.transaction_code,
        user_id = cashier.id,
        total = transaction.total_amount.rupiah(),
        "Auction checkout"
    );
    Ok(receipt(transaction))
}

async fn get_transaction(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state
        .db
        .transactions()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

    Ok(Json(transaction))
}
