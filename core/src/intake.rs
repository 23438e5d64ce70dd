//! Barcode-driven adds.
//!
//! The lookup runs without the ledger lock held, so other mutations keep
//! going while a request is in flight. Once it settles the result is applied
//! as an ordinary `add_item`; two scans into the same meal land in the order
//! their lookups finish.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::ledger::{SharedLedger, lock_ledger};
use crate::lookup::LookupGateway;
use crate::models::FoodItem;

/// Look up `barcode` and add the result to (`date`, `meal`).
///
/// Never fails: when the lookup errors for any reason a zero-nutrient
/// placeholder named after the barcode is added instead. Returns the item
/// that was added.
pub async fn add_item_from_barcode(
    ledger: &SharedLedger,
    gateway: &dyn LookupGateway,
    date: NaiveDate,
    meal: &str,
    barcode: &str,
) -> FoodItem {
    let item = match gateway.lookup(barcode).await {
        Ok(hit) => FoodItem::from_lookup(barcode, hit.profile, hit.name),
        Err(e) => {
            warn!(barcode, error = %e, "lookup failed, adding placeholder");
            FoodItem::fallback(barcode)
        }
    };

    info!(%date, meal, barcode, name = %item.name, "barcode item added");
    lock_ledger(ledger).add_item(date, meal, item.clone());
    item
}

/// Fire-and-forget variant of [`add_item_from_barcode`] on the tokio runtime.
/// The add still happens if the handle is dropped.
pub fn spawn_barcode_add(
    ledger: SharedLedger,
    gateway: Arc<dyn LookupGateway>,
    date: NaiveDate,
    meal: String,
    barcode: String,
) -> JoinHandle<FoodItem> {
    tokio::spawn(async move {
        add_item_from_barcode(&ledger, gateway.as_ref(), date, &meal, &barcode).await
    })
}
