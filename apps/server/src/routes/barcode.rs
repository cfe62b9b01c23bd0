//! Barcode routes.
//!
//! ```text
//! GET  /api/barcode/{sku}             cached or newly generated data URI
//! GET  /api/barcode/{sku}/image       stored data URI only
//! GET  /api/barcode/{sku}/download    fresh PNG attachment
//! GET  /api/barcode/status            coverage across both tables
//! GET  /api/barcode/status/{sku}      one product
//! POST /api/barcode/generate_all      admin
//! GET  /api/products/for_barcode      every product, both kinds
//! GET  /api/products/without_barcode  admin
//! GET  /api/print_barcode/{sku}       admin, printable HTML label
//! ```

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use justcani_core::validation::validate_sku;
use justcani_core::{Money, ProductKind, ProductSummary};
use justcani_db::{BarcodeRecord, BarcodeStatus};

use crate::auth::{AdminUser, AuthUser};
use crate::barcode::{BarcodeError, GenerateAllSummary};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Characters of the product name that fit on a 3in label.
const LABEL_NAME_CHARS: usize = 25;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/barcode/status", get(status))
        .route("/api/barcode/status/{sku}", get(product_status))
        .route("/api/barcode/generate_all", post(generate_all))
        .route("/api/barcode/{sku}", get(generate))
        .route("/api/barcode/{sku}/image", get(image))
        .route("/api/barcode/{sku}/download", get(download))
        .route("/api/products/for_barcode", get(for_barcode))
        .route("/api/products/without_barcode", get(without_barcode))
        .route("/api/print_barcode/{sku}", get(print_label))
}

#[derive(Debug, Serialize)]
struct ProductInfo {
    sku: String,
    name: String,
    price: Money,
    kind: ProductKind,
}

impl From<&BarcodeRecord> for ProductInfo {
    fn from(record: &BarcodeRecord) -> Self {
        ProductInfo {
            sku: record.sku.clone(),
            name: record.name.clone(),
            price: Money::from_rupiah(record.price),
            kind: record.kind,
        }
    }
}

#[derive(Debug, Serialize)]
struct BarcodeResponse {
    success: bool,
    sku: String,
    barcode: String,
    cached: bool,
    product: ProductInfo,
}

async fn generate(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(sku): Path<String>,
) -> ApiResult<Json<BarcodeResponse>> {
    let result = state.barcodes.get_or_create(&sku).await?;

    Ok(Json(BarcodeResponse {
        success: true,
        product: ProductInfo::from(&result.record),
        sku: result.record.sku,
        barcode: result.barcode,
        cached: result.cached,
    }))
}

#[derive(Debug, Serialize)]
struct ImageResponse {
    success: bool,
    sku: String,
    barcode: String,
}

async fn image(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(sku): Path<String>,
) -> ApiResult<Json<ImageResponse>> {
    let record = find(&state, &sku).await?;
    let barcode = record
        .cached_image()
        .ok_or_else(|| ApiError::not_found("Barcode", &sku))?
        .to_string();

    Ok(Json(ImageResponse {
        success: true,
        sku: record.sku,
        barcode,
    }))
}

async fn download(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(sku): Path<String>,
) -> ApiResult<Response> {
    // The SKU ends up in a header value
    validate_sku(&sku)?;

    let png = state.barcodes.encode_png(&sku).await?;
    let disposition = format!("attachment; filename=\"barcode_{}.png\"", sku);

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}

async fn status(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<BarcodeStatus>> {
    Ok(Json(state.db.barcodes().status().await?))
}

#[derive(Debug, Serialize)]
struct ProductStatusResponse {
    success: bool,
    sku: String,
    name: String,
    kind: ProductKind,
    has_barcode: bool,
}

async fn product_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(sku): Path<String>,
) -> ApiResult<Json<ProductStatusResponse>> {
    let record = find(&state, &sku).await?;

    Ok(Json(ProductStatusResponse {
        success: true,
        has_barcode: record.cached_image().is_some(),
        sku: record.sku,
        name: record.name,
        kind: record.kind,
    }))
}

async fn generate_all(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<GenerateAllSummary>> {
    Ok(Json(state.barcodes.generate_missing().await?))
}

async fn for_barcode(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<ProductSummary>>> {
    Ok(Json(state.db.barcodes().list_all().await?))
}

async fn without_barcode(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<ProductSummary>>> {
    Ok(Json(state.db.barcodes().without_barcode().await?))
}

async fn print_label(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(sku): Path<String>,
) -> ApiResult<Html<String>> {
    let result = state.barcodes.get_or_create(&sku).await?;
    Ok(Html(render_label(&result.record, &result.barcode)))
}

async fn find(state: &AppState, sku: &str) -> ApiResult<BarcodeRecord> {
    state
        .db
        .barcodes()
        .find(sku)
        .await?
        .ok_or_else(|| BarcodeError::ProductNotFound(sku.to_string()).into())
}

// =============================================================================
// Label HTML
// =============================================================================

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_label(record: &BarcodeRecord, barcode: &str) -> String {
    let name: String = record.name.chars().take(LABEL_NAME_CHARS).collect();
    let name = escape_html(&name);
    let sku = escape_html(&record.sku);
    let price = Money::from_rupiah(record.price);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Barcode Label - {sku}</title>
<style>
  @media print {{ body {{ margin: 0; padding: 0; }} .label {{ page-break-inside: avoid; }} }}
  body {{ font-family: Arial, sans-serif; padding: 10px; }}
  .label {{ width: 3in; height: 1.5in; border: 1px solid #000; padding: 8px; box-sizing: border-box; }}
  .product-name {{ font-size: 12px; font-weight: bold; height: 30px; overflow: hidden; }}
  .sku {{ font-size: 10px; color: #666; }}
  .price {{ font-size: 14px; font-weight: bold; color: #d00; }}
  .barcode {{ margin: 3px 0; text-align: center; }}
  .print-info {{ font-size: 8px; text-align: center; color: #666; }}
</style>
</head>
<body>
<div class="label">
  <div class="product-name">{name}</div>
  <div class="sku">SKU: {sku}</div>
  <div class="price">{price}</div>
  <div class="barcode"><img src="{barcode}" alt="Barcode {sku}" width="180" height="40"></div>
  <div class="print-info">JustCani POS System</div>
</div>
</body>
</html>
"#,
        barcode = escape_html(barcode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> BarcodeRecord {
        BarcodeRecord {
            sku: "SUSU-UHT".to_string(),
            name: name.to_string(),
            price: 12_500,
            kind: ProductKind::Regular,
            barcode_image: None,
        }
    }

    #[test]
    fn test_label_truncates_and_formats() {
        let html = render_label(
            &record("Susu UHT Full Cream Rasa Coklat 1 Liter"),
            "data:image/png;base64,AAAA",
        );

        assert!(html.contains(">Susu UHT Full Cream Rasa <"));
        assert!(html.contains("SKU: SUSU-UHT"));
        assert!(html.contains("Rp12.500"));
        assert!(html.contains(r#"src="data:image/png;base64,AAAA""#));
    }

    #[test]
    fn test_label_escapes_name() {
        let html = render_label(&record("<b>Teh & Kopi</b>"), "x");
        assert!(html.contains("&lt;b&gt;Teh &amp; Kopi&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }
}
