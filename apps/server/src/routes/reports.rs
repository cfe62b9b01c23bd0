//! History and dashboard routes (admin only).
//!
//! All day boundaries are store-local (`AppState::clock`).

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use justcani_core::period::year_month;
use justcani_core::validation::parse_date;
use justcani_core::{
    DailySummary, DateRange, MonthlyReport, ReportPeriod, SalesReport, Transaction,
};

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Rows shown when the history screen is opened without a date.
const HISTORY_DEFAULT_LIMIT: u32 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/history", get(history))
        .route("/api/admin/history/monthly", get(monthly))
        .route("/api/stats", get(stats))
}

// =============================================================================
// Daily History
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub summary: DailySummary,
    /// Newest first
    pub transactions: Vec<Transaction>,
}

async fn history(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let clock = state.clock;
    let requested = params
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| parse_date("date", d))
        .transpose()?;

    let day = requested.unwrap_or_else(|| clock.local_date(Utc::now()));
    let mut day_rows = state
        .db
        .transactions()
        .list_between(&clock.day_range(day))
        .await?;
    let summary = DailySummary::build(day, &day_rows, &clock);

    let transactions = match requested {
        Some(_) => {
            day_rows.reverse();
            day_rows
        }
        None => {
            state
                .db
                .transactions()
                .recent(HISTORY_DEFAULT_LIMIT)
                .await?
        }
    };

    Ok(Json(HistoryResponse {
        summary,
        transactions,
    }))
}

// =============================================================================
// Monthly History
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

async fn monthly(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<MonthlyQuery>,
) -> ApiResult<Json<MonthlyReport>> {
    let clock = state.clock;
    let (this_year, this_month) = year_month(&clock, Utc::now());
    let year = params.year.unwrap_or(this_year);
    let month = params.month.unwrap_or(this_month);

    let range = clock.month_range(year, month)?;
    let rows = state.db.transactions().list_between(&range).await?;

    Ok(Json(MonthlyReport::build(year, month, &rows, &clock)?))
}

// =============================================================================
// Dashboard Statistics
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    /// `today` / `week` / `month`, or `custom` for an explicit range
    pub period: String,
    pub range: DateRange,
    #[serde(flatten)]
    pub report: SalesReport,
}

/// Resolves the requested range: explicit dates win over a period keyword.
fn resolve_range(
    params: &StatsQuery,
    state: &AppState,
    now: chrono::DateTime<Utc>,
) -> ApiResult<(String, DateRange)> {
    let clock = state.clock;

    match (params.start.as_deref(), params.end.as_deref()) {
        (Some(start), Some(end)) => {
            let first: NaiveDate = parse_date("start", start)?;
            let last: NaiveDate = parse_date("end", end)?;
            if last < first {
                return Err(ApiError::validation("end must not be before start"));
            }
            Ok(("custom".to_string(), clock.date_span(first, last)))
        }
        (None, None) => {
            let period = ReportPeriod::parse(params.period.as_deref().unwrap_or_default());
            Ok((period.as_str().to_string(), period.range(&clock, now)))
        }
        _ => Err(ApiError::validation("start and end must be given together")),
    }
}

async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<StatsQuery>,
) -> ApiResult<Json<StatsResponse>> {
    let now = Utc::now();
    let (period, range) = resolve_range(&params, &state, now)?;
    debug!(period = %period, start = %range.start, end = %range.end, "Building sales report");

    let rows = state.db.transactions().list_between(&range).await?;
    let report = SalesReport::build(&rows, &state.clock, now);

    Ok(Json(StatsResponse {
        success: true,
        period,
        range,
        report,
    }))
}
