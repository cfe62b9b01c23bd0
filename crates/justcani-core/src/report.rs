//! # Sales Reports
//!
//! Aggregates a set of recorded transactions into the figures the admin
//! dashboard and history screens show. Pure: the caller fetches the rows
//! for a [`DateRange`](crate::period::DateRange) and passes `now`.
//!
//! ## Dashboard Report Shape
//! ```text
//! SalesReport
//! ├── summary
//! │   ├── total_revenue         Σ total_amount
//! │   ├── total_transactions    row count
//! │   ├── avg_transaction       revenue / count (0 when count is 0)
//! │   └── total_products_sold   Σ line.qty
//! ├── charts
//! │   ├── sales_trend           revenue per store-local day, oldest first
//! │   └── transaction_types     [Regular, Auction] counts
//! └── tables
//!     ├── top_products          top 5 by units, ties keep first-seen order
//!     └── recent_transactions   latest 10 with "time ago"
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::period::{days_of_month, StoreClock};
use crate::types::{ProductKind, Transaction};
use crate::validation::ValidationResult;
use crate::{RECENT_TRANSACTIONS_LIMIT, TOP_PRODUCTS_LIMIT};

// =============================================================================
// Report Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportSummary {
    pub total_revenue: Money,
    pub total_transactions: u64,
    pub avg_transaction: Money,
    pub total_products_sold: i64,
}

/// Parallel label/value arrays, the shape chart libraries consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesCharts {
    /// Revenue per day, labelled `dd/mm`.
    pub sales_trend: ChartSeries,
    /// Transaction counts labelled `Regular` and `Auction`.
    pub transaction_types: ChartSeries,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    /// Line name, or `SKU:<sku>` when the line carried no name.
    pub name: String,
    pub sold: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecentTransaction {
    pub id: i64,
    pub transaction_code: String,
    pub username: String,
    pub total_amount: Money,
    pub time_ago: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesTables {
    pub top_products: Vec<ProductSales>,
    pub recent_transactions: Vec<RecentTransaction>,
}

/// Dashboard statistics for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub summary: ReportSummary,
    pub charts: SalesCharts,
    pub tables: SalesTables,
}

// =============================================================================
// Running Totals
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    revenue: Money,
    count: u64,
    units: i64,
    regular: u64,
    auction: u64,
}

impl Totals {
    fn add(&mut self, t: &Transaction) {
        self.revenue += t.total_amount;
        self.count += 1;
        self.units = self.units.saturating_add(t.units_sold());
        match t.kind {
            ProductKind::Regular => self.regular += 1,
            ProductKind::Auction => self.auction += 1,
        }
    }

    fn average(&self) -> Money {
        self.revenue.average_over(self.count)
    }
}

/// Chronological copy of the input. Stable, so equal timestamps keep input order.
fn chronological(transactions: &[Transaction]) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|t| t.created_at);
    sorted
}

// =============================================================================
// Sales Report
// =============================================================================

impl SalesReport {
    /// Aggregates `transactions` into the dashboard report.
    ///
    /// ## Arguments
    /// * `transactions` - Rows in the selected period, any order
    /// * `clock` - Store time zone for day buckets
    /// * `now` - Reference instant for "time ago"
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use justcani_core::{SalesReport, StoreClock};
    ///
    /// let report = SalesReport::build(&[], &StoreClock::wib(), Utc::now());
    /// assert!(report.summary.total_revenue.is_zero());
    /// assert!(report.summary.avg_transaction.is_zero());
    /// ```
    pub fn build(transactions: &[Transaction], clock: &StoreClock, now: DateTime<Utc>) -> Self {
        let sorted = chronological(transactions);

        let mut totals = Totals::default();
        let mut by_day: BTreeMap<NaiveDate, Money> = BTreeMap::new();
        let mut products: Vec<ProductSales> = Vec::new();
        let mut product_index: HashMap<String, usize> = HashMap::new();

        for t in &sorted {
            totals.add(t);
            *by_day.entry(clock.local_date(t.created_at)).or_default() += t.total_amount;

            for line in &t.lines {
                let key = if line.name.trim().is_empty() {
                    format!("SKU:{}", line.sku)
                } else {
                    line.name.clone()
                };

                let i = match product_index.get(&key).copied() {
                    Some(i) => i,
                    None => {
                        product_index.insert(key.clone(), products.len());
                        products.push(ProductSales {
                            name: key,
                            sold: 0,
                            revenue: Money::zero(),
                        });
                        products.len() - 1
                    }
                };
                products[i].sold = products[i].sold.saturating_add(line.qty);
                products[i].revenue += line.subtotal;
            }
        }

        // sort_by is stable: equal `sold` keeps first-seen order
        products.sort_by(|a, b| b.sold.cmp(&a.sold));
        products.truncate(TOP_PRODUCTS_LIMIT);

        let recent_transactions = sorted
            .iter()
            .rev()
            .take(RECENT_TRANSACTIONS_LIMIT)
            .map(|t| RecentTransaction {
                id: t.id,
                transaction_code: t.transaction_code.clone(),
                username: t.username.clone(),
                total_amount: t.total_amount,
                time_ago: time_ago(t.created_at, now),
            })
            .collect();

        SalesReport {
            summary: ReportSummary {
                total_revenue: totals.revenue,
                total_transactions: totals.count,
                avg_transaction: totals.average(),
                total_products_sold: totals.units,
            },
            charts: SalesCharts {
                sales_trend: ChartSeries {
                    labels: by_day.keys().map(|d| d.format("%d/%m").to_string()).collect(),
                    data: by_day.values().map(Money::rupiah).collect(),
                },
                transaction_types: ChartSeries {
                    labels: vec![
                        ProductKind::Regular.label().to_string(),
                        ProductKind::Auction.label().to_string(),
                    ],
                    data: vec![totals.regular as i64, totals.auction as i64],
                },
            },
            tables: SalesTables {
                top_products: products,
                recent_transactions,
            },
        }
    }
}

/// Relative age of a timestamp, as shown in the recent-transactions table.
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use justcani_core::report::time_ago;
///
/// let now = Utc::now();
/// assert_eq!(time_ago(now - Duration::seconds(30), now), "just now");
/// assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
/// assert_eq!(time_ago(now - Duration::hours(1) - Duration::minutes(1), now), "1 hour ago");
/// assert_eq!(time_ago(now - Duration::days(3), now), "3 days ago");
/// ```
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();

    let (n, unit) = if secs >= 86_400 {
        (secs / 86_400, "day")
    } else if secs > 3_600 {
        (secs / 3_600, "hour")
    } else if secs > 60 {
        (secs / 60, "minute")
    } else {
        return "just now".to_string();
    };

    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

// =============================================================================
// Daily Summary
// =============================================================================

/// Totals for one store-local day (history screen header).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_transactions: u64,
    pub total_revenue: Money,
    pub avg_transaction: Money,
    pub total_products_sold: i64,
    pub regular_transactions: u64,
    pub auction_transactions: u64,
}

impl DailySummary {
    /// Summarizes the transactions of `date`. Rows from other days are ignored.
    pub fn build(date: NaiveDate, transactions: &[Transaction], clock: &StoreClock) -> Self {
        let mut totals = Totals::default();
        for t in transactions
            .iter()
            .filter(|t| clock.local_date(t.created_at) == date)
        {
            totals.add(t);
        }

        DailySummary {
            date,
            total_transactions: totals.count,
            total_revenue: totals.revenue,
            avg_transaction: totals.average(),
            total_products_sold: totals.units,
            regular_transactions: totals.regular,
            auction_transactions: totals.auction,
        }
    }
}

// =============================================================================
// Monthly Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyTotal {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub transactions: u64,
    pub revenue: Money,
    pub products_sold: i64,
}

/// Per-day totals for a calendar month, including days without sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DailyTotal>,
    pub total_transactions: u64,
    pub total_revenue: Money,
    pub avg_transaction: Money,
    pub total_products_sold: i64,
    /// Highest-revenue day; the earliest wins a tie. `None` for an empty month.
    #[ts(as = "Option<String>")]
    pub best_day: Option<NaiveDate>,
}

impl MonthlyReport {
    /// Buckets `transactions` into the days of `year`-`month`.
    ///
    /// ## Errors
    /// `OutOfRange` for an invalid month.
    pub fn build(
        year: i32,
        month: u32,
        transactions: &[Transaction],
        clock: &StoreClock,
    ) -> ValidationResult<Self> {
        let mut buckets: BTreeMap<NaiveDate, Totals> = days_of_month(year, month)?
            .into_iter()
            .map(|d| (d, Totals::default()))
            .collect();

        let mut totals = Totals::default();
        for t in transactions {
            if let Some(day) = buckets.get_mut(&clock.local_date(t.created_at)) {
                day.add(t);
                totals.add(t);
            }
        }

        let mut best: Option<(NaiveDate, Money)> = None;
        for (date, day) in &buckets {
            if day.count > 0 && best.map_or(true, |(_, rev)| day.revenue > rev) {
                best = Some((*date, day.revenue));
            }
        }

        let days = buckets
            .into_iter()
            .map(|(date, day)| DailyTotal {
                date,
                transactions: day.count,
                revenue: day.revenue,
                products_sold: day.units,
            })
            .collect();

        Ok(MonthlyReport {
            year,
            month,
            days,
            total_transactions: totals.count,
            total_revenue: totals.revenue,
            avg_transaction: totals.average(),
            total_products_sold: totals.units,
            best_day: best.map(|(date, _)| date),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionLine;
    use chrono::{Duration, TimeZone};

    fn line(sku: &str, name: &str, qty: i64, price: i64) -> TransactionLine {
        TransactionLine {
            sku: sku.to_string(),
            name: name.to_string(),
            qty,
            price: Money::from_rupiah(price),
            subtotal: Money::from_rupiah(price * qty),
        }
    }

    fn tx(id: i64, kind: ProductKind, at: DateTime<Utc>, lines: Vec<TransactionLine>) -> Transaction {
        let total = lines.iter().map(|l| l.subtotal).sum();
        Transaction {
            id,
            transaction_code: format!("TRX-{}", id),
            kind,
            user_id: 1,
            username: "kasir".to_string(),
            lines,
            total_amount: total,
            created_at: at,
        }
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_period_reports_zero() {
        let report = SalesReport::build(&[], &StoreClock::wib(), at(14, 5));

        assert!(report.summary.total_revenue.is_zero());
        assert_eq!(report.summary.total_transactions, 0);
        assert!(report.summary.avg_transaction.is_zero());
        assert_eq!(report.summary.total_products_sold, 0);
        assert!(report.charts.sales_trend.labels.is_empty());
        assert_eq!(report.charts.transaction_types.data, vec![0, 0]);
        assert!(report.tables.top_products.is_empty());
        assert!(report.tables.recent_transactions.is_empty());
    }

    #[test]
    fn test_summary_and_types() {
        let txs = vec![
            tx(1, ProductKind::Regular, at(13, 3), vec![line("MIE", "Indomie", 3, 3_500)]),
            tx(2, ProductKind::Auction, at(13, 4), vec![line("LLG", "Rice cooker", 1, 50_000)]),
            tx(3, ProductKind::Regular, at(14, 2), vec![line("TEH", "Teh Botol", 2, 4_000)]),
        ];

        let report = SalesReport::build(&txs, &StoreClock::utc(), at(14, 5));

        assert_eq!(report.summary.total_revenue.rupiah(), 10_500 + 50_000 + 8_000);
        assert_eq!(report.summary.total_transactions, 3);
        assert_eq!(report.summary.avg_transaction.rupiah(), 22_833);
        assert_eq!(report.summary.total_products_sold, 6);
        assert_eq!(report.charts.transaction_types.data, vec![2, 1]);
    }

    #[test]
    fn test_day_buckets_are_chronological_and_local() {
        let txs = vec![
            // 18:00 UTC on the 13th is the 14th in WIB
            tx(1, ProductKind::Regular, at(13, 18), vec![line("A", "A", 1, 1_000)]),
            tx(2, ProductKind::Regular, at(12, 3), vec![line("A", "A", 1, 2_000)]),
            tx(3, ProductKind::Regular, at(14, 3), vec![line("A", "A", 1, 4_000)]),
        ];

        let report = SalesReport::build(&txs, &StoreClock::wib(), at(14, 5));

        assert_eq!(report.charts.sales_trend.labels, vec!["12/01", "14/01"]);
        assert_eq!(report.charts.sales_trend.data, vec![2_000, 5_000]);
    }

    #[test]
    fn test_top_products_limited_sorted_and_stable() {
        let lines = vec![
            line("A", "Alpha", 2, 100),
            line("B", "Bravo", 5, 100),
            line("C", "Charlie", 2, 100),
            line("D", "Delta", 7, 100),
            line("E", "Echo", 2, 100),
            line("F", "Foxtrot", 1, 100),
            line("G", "", 2, 100),
        ];
        let txs = vec![tx(1, ProductKind::Regular, at(14, 1), lines)];

        let report = SalesReport::build(&txs, &StoreClock::utc(), at(14, 5));
        let names: Vec<&str> = report
            .tables
            .top_products
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        // Ties at 2 keep first-seen order: Alpha, Charlie, Echo, then SKU:G is cut
        assert_eq!(names, vec!["Delta", "Bravo", "Alpha", "Charlie", "Echo"]);
        assert_eq!(report.tables.top_products.len(), TOP_PRODUCTS_LIMIT);
    }

    #[test]
    fn test_products_merge_across_transactions() {
        let txs = vec![
            tx(1, ProductKind::Regular, at(14, 1), vec![line("A", "Alpha", 1, 1_000)]),
            tx(2, ProductKind::Regular, at(14, 2), vec![line("B", "", 3, 500)]),
            tx(3, ProductKind::Regular, at(14, 3), vec![line("A", "Alpha", 4, 1_000)]),
        ];

        let report = SalesReport::build(&txs, &StoreClock::utc(), at(14, 5));
        let top = &report.tables.top_products;

        assert_eq!(top[0].name, "Alpha");
        assert_eq!(top[0].sold, 5);
        assert_eq!(top[0].revenue.rupiah(), 5_000);
        assert_eq!(top[1].name, "SKU:B");
        assert_eq!(top[1].sold, 3);
    }

    #[test]
    fn test_recent_transactions_newest_first_and_capped() {
        let txs: Vec<Transaction> = (0..15)
            .map(|i| {
                tx(
                    i,
                    ProductKind::Regular,
                    at(1, 0) + Duration::hours(i),
                    vec![line("A", "A", 1, 1_000)],
                )
            })
            .collect();

        let now = at(1, 0) + Duration::hours(14) + Duration::minutes(10);
        let report = SalesReport::build(&txs, &StoreClock::utc(), now);
        let recent = &report.tables.recent_transactions;

        assert_eq!(recent.len(), RECENT_TRANSACTIONS_LIMIT);
        assert_eq!(recent[0].id, 14);
        assert_eq!(recent[0].time_ago, "10 minutes ago");
        assert_eq!(recent[9].id, 5);
    }

    #[test]
    fn test_time_ago_boundaries() {
        let now = at(14, 12);
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::seconds(60), now), "just now");
        assert_eq!(time_ago(now - Duration::seconds(61), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::seconds(3_600), now), "60 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(1), now), "1 day ago");
        assert_eq!(time_ago(now + Duration::hours(1), now), "just now");
    }

    #[test]
    fn test_daily_summary() {
        let txs = vec![
            tx(1, ProductKind::Regular, at(14, 1), vec![line("A", "A", 2, 1_000)]),
            tx(2, ProductKind::Auction, at(14, 2), vec![line("L", "L", 1, 9_000)]),
            tx(3, ProductKind::Regular, at(15, 1), vec![line("A", "A", 1, 1_000)]),
        ];
        let date = NaiveDate::from_ymd_opt(2026, 1, 14).unwrap();

        let summary = DailySummary::build(date, &txs, &StoreClock::utc());

        assert_eq!(summary.total_transactions, 2);
        assert_eq!(summary.total_revenue.rupiah(), 11_000);
        assert_eq!(summary.avg_transaction.rupiah(), 5_500);
        assert_eq!(summary.total_products_sold, 3);
        assert_eq!(summary.regular_transactions, 1);
        assert_eq!(summary.auction_transactions, 1);
    }

    #[test]
    fn test_monthly_report() {
        let txs = vec![
            tx(1, ProductKind::Regular, at(3, 1), vec![line("A", "A", 2, 1_000)]),
            tx(2, ProductKind::Regular, at(3, 2), vec![line("A", "A", 1, 1_000)]),
            tx(3, ProductKind::Regular, at(20, 1), vec![line("B", "B", 1, 3_000)]),
        ];

        let report = MonthlyReport::build(2026, 1, &txs, &StoreClock::utc()).unwrap();

        assert_eq!(report.days.len(), 31);
        assert_eq!(report.days[2].transactions, 2);
        assert_eq!(report.days[2].revenue.rupiah(), 3_000);
        assert_eq!(report.days[0].transactions, 0);
        assert_eq!(report.total_transactions, 3);
        assert_eq!(report.total_revenue.rupiah(), 6_000);
        assert_eq!(report.total_products_sold, 4);
        // Both days made 3.000; the earlier one wins
        assert_eq!(report.best_day, NaiveDate::from_ymd_opt(2026, 1, 3));
    }

    #[test]
    fn test_monthly_report_empty_and_invalid() {
        let report = MonthlyReport::build(2026, 2, &[], &StoreClock::wib()).unwrap();
        assert_eq!(report.days.len(), 28);
        assert!(report.avg_transaction.is_zero());
        assert_eq!(report.best_day, None);

        assert!(MonthlyReport::build(2026, 13, &[], &StoreClock::wib()).is_err());
    }
}
