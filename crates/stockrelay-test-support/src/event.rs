//! Test fixtures for stock change events.

use chrono::NaiveDate;
use stockrelay_core::stock::StockChangeEvent;

/// Builds an event for `product_id` in `branch_id` with fixed timestamps
/// (2025-07-29T05:17:55.443242 UTC) and a quantity of 10.
///
/// # Panics
///
/// Never in practice; the fixed date is valid.
#[must_use]
pub fn sample_event(product_id: i64, branch_id: i64) -> StockChangeEvent {
    let at = NaiveDate::from_ymd_opt(2025, 7, 29)
        .and_then(|d| d.and_hms_micro_opt(5, 17, 55, 443_242))
        .expect("fixed sample timestamp is valid")
        .and_utc();

    StockChangeEvent {
        id: format!("stock-{product_id}-{branch_id}"),
        product_id,
        branch_id,
        quantity: 10,
        reserved: 0,
        created_at: at,
        updated_at: at,
    }
}
