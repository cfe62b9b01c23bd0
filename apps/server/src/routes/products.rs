//! Inventory routes.
//!
//! ## Search
//! Case-insensitive substring of name or SKU, 50 results max, ordered by
//! name. An empty `q` lists everything.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use justcani_core::validation::{
    validate_auction_reason, validate_price, validate_product_name, validate_quantity,
    validate_search_query, validate_sku, validate_stock,
};
use justcani_core::{AuctionProduct, NewRegularProduct, RegularProduct};

use super::{ApiJson, Success};
use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::state::AppState;

const SEARCH_LIMIT: u32 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/search_lelang", get(search_lelang))
        .route("/api/admin/products", post(add_product))
        .route("/api/admin/restock", post(restock))
        .route("/api/admin/move_lelang", post(move_to_auction))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

async fn search(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<RegularProduct>>> {
    let query = validate_search_query(&params.q)?;
    let products = state.db.products().search(&query, SEARCH_LIMIT).await?;
    Ok(Json(products))
}

async fn search_lelang(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Vec<AuctionProduct>>> {
    let query = validate_search_query(&params.q)?;
    let listings = state.db.auctions().search(&query, SEARCH_LIMIT).await?;
    Ok(Json(listings))
}

#[derive(Debug, Serialize)]
struct AddProductBody {
    product: RegularProduct,
    barcode_generated: bool,
}

/// Adds a regular product, then tries to attach a barcode.
///
/// A barcode failure is logged and reported as `barcode_generated: false`;
/// the product stays.
async fn add_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(mut req): ApiJson<NewRegularProduct>,
) -> ApiResult<(StatusCode, Json<Success<AddProductBody>>)> {
    req.sku = req.sku.trim().to_string();
    req.name = req.name.trim().to_string();
    validate_sku(&req.sku)?;
    validate_product_name(&req.name)?;
    validate_price(req.price)?;
    validate_stock(req.stock)?;

    let product = state.db.products().insert(&req).await?;
    info!(sku = %product.sku, admin_id = admin.id, "Product added by admin");

    let barcode_generated = if state.barcodes.is_enabled() {
        match state.barcodes.get_or_create(&product.sku).await {
            Ok(_) => true,
            Err(e) => {
                warn!(sku = %product.sku, "Barcode not generated for new product: {}", e);
                false
            }
        }
    } else {
        false
    };

    Ok((
        StatusCode::CREATED,
        Success::new(
            format!("Product {} added", product.sku),
            AddProductBody {
                product,
                barcode_generated,
            },
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub sku: String,
    pub qty: i64,
}

#[derive(Debug, Serialize)]
struct ProductBody {
    product: RegularProduct,
}

async fn restock(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<RestockRequest>,
) -> ApiResult<Json<Success<ProductBody>>> {
    validate_quantity(req.qty)?;

    let product = state.db.products().restock(req.sku.trim(), req.qty).await?;
    info!(sku = %product.sku, qty = req.qty, stock = product.stock, admin_id = admin.id, "Restocked");

    Ok(Success::new(
        format!("Added {} to {}, stock now {}", req.qty, product.sku, product.stock),
        ProductBody { product },
    ))
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub sku: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
struct ListingBody {
    listing: AuctionProduct,
}

async fn move_to_auction(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<MoveRequest>,
) -> ApiResult<Json<Success<ListingBody>>> {
    let reason = validate_auction_reason(&req.reason)?;

    let listing = state
        .db
        .products()
        .move_to_auction(req.sku.trim(), &reason)
        .await?;
    info!(sku = %listing.sku, admin_id = admin.id, "Moved to auction");

    Ok(Success::new(
        format!("{} moved to auction", listing.sku),
        ListingBody { listing },
    ))
}
