//! The day ledger: every logged item, keyed by date and meal.
//!
//! `DayLedger` is the only owner of mutable nutrition state. Each mutation
//! recomputes the affected date's meal and day totals before it returns, and
//! when that date is the selected one a fresh [`LedgerSnapshot`] is pushed to
//! every subscriber. Readers therefore never see totals that lag the items.
//!
//! Dates or meals whose buckets become empty are dropped, so an untouched
//! date and a date whose items were all removed look exactly the same.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::aggregate::{aggregate_day, aggregate_meal};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    DEFAULT_MEALS, DailySummary, DayTotals, FoodItem, ItemId, ItemLine, MealGroup, MealTotals,
    Nutrients, validate_serving,
};

/// Ledger handle shared between the session and in-flight barcode lookups.
pub type SharedLedger = Arc<Mutex<DayLedger>>;

/// Lock a shared ledger. Mutations never leave the ledger half-updated, so a
/// poisoned lock is still safe to use.
pub fn lock_ledger(ledger: &SharedLedger) -> MutexGuard<'_, DayLedger> {
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

type Buckets = BTreeMap<String, Vec<FoodItem>>;

#[derive(Debug, Clone, Default)]
struct CachedTotals {
    meals: BTreeMap<String, MealTotals>,
    day: DayTotals,
}

/// What observers see for the selected date. Every configured meal is listed,
/// empty ones with zero totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub selected_date: NaiveDate,
    pub meals: Vec<MealSnapshot>,
    pub day_totals: DayTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealSnapshot {
    pub meal: String,
    pub items: Vec<FoodItem>,
    pub totals: MealTotals,
}

impl LedgerSnapshot {
    #[must_use]
    pub fn items_for(&self, meal: &str) -> &[FoodItem] {
        self.meals
            .iter()
            .find(|m| m.meal == meal)
            .map(|m| m.items.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn totals_for(&self, meal: &str) -> MealTotals {
        self.meals
            .iter()
            .find(|m| m.meal == meal)
            .map_or(Nutrients::ZERO, |m| m.totals)
    }
}

pub struct DayLedger {
    days: BTreeMap<NaiveDate, Buckets>,
    totals: BTreeMap<NaiveDate, CachedTotals>,
    meals: Vec<String>,
    selected: NaiveDate,
    publisher: watch::Sender<LedgerSnapshot>,
}

impl DayLedger {
    #[must_use]
    pub fn new(selected: NaiveDate) -> Self {
        Self::with_meals(selected, DEFAULT_MEALS.iter().copied())
    }

    /// Ledger that lists `meals` (in order) in snapshots and summaries.
    /// Items may still be logged under any other meal name.
    #[must_use]
    pub fn with_meals<I, S>(selected: NaiveDate, meals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let meals: Vec<String> = meals.into_iter().map(Into::into).collect();
        let (publisher, _) = watch::channel(LedgerSnapshot {
            selected_date: selected,
            meals: Vec::new(),
            day_totals: Nutrients::ZERO,
        });
        let ledger = Self {
            days: BTreeMap::new(),
            totals: BTreeMap::new(),
            meals,
            selected,
            publisher,
        };
        ledger.publish();
        ledger
    }

    #[must_use]
    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn selected_date(&self) -> NaiveDate {
        self.selected
    }

    #[must_use]
    pub fn meals(&self) -> &[String] {
        &self.meals
    }

    /// Dates that currently hold at least one item, oldest first.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.keys().copied().collect()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        self.publisher.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.publisher.borrow().clone()
    }

    // --- Mutations ---

    pub fn select_date(&mut self, date: NaiveDate) {
        debug!(%date, "select date");
        self.selected = date;
        self.publish();
    }

    pub fn add_item(&mut self, date: NaiveDate, meal: &str, item: FoodItem) {
        debug!(%date, meal, item = %item.id, name = %item.name, "add item");
        self.days
            .entry(date)
            .or_default()
            .entry(meal.to_string())
            .or_default()
            .push(item);
        self.recompute(date);
    }

    /// Remove the item with `id` from a bucket. Returns `false` (and changes
    /// nothing) when it is not there.
    pub fn remove_item(&mut self, date: NaiveDate, meal: &str, id: ItemId) -> bool {
        let Some(bucket) = self.bucket_mut(date, meal) else {
            debug!(%date, meal, item = %id, "remove item: no such bucket");
            return false;
        };
        let Some(pos) = bucket.iter().position(|i| i.id == id) else {
            debug!(%date, meal, item = %id, "remove item: not found");
            return false;
        };
        bucket.remove(pos);
        debug!(%date, meal, item = %id, "remove item");
        self.recompute(date);
        true
    }

    /// Change an item's serving size in place, keeping its position.
    pub fn rescale_item(
        &mut self,
        date: NaiveDate,
        meal: &str,
        id: ItemId,
        new_grams: i64,
    ) -> LedgerResult<FoodItem> {
        validate_serving(new_grams)?;
        let slot = self
            .bucket_mut(date, meal)
            .and_then(|bucket| bucket.iter_mut().find(|i| i.id == id))
            .ok_or(LedgerError::ItemNotFound(id))?;
        let rescaled = slot.rescaled(new_grams)?;
        *slot = rescaled.clone();
        debug!(%date, meal, item = %id, grams = new_grams, "rescale item");
        self.recompute(date);
        Ok(rescaled)
    }

    /// Append copies (with fresh ids) of every item in one meal to another.
    /// Returns how many items were copied.
    pub fn copy_meal(
        &mut self,
        from_date: NaiveDate,
        from_meal: &str,
        to_date: NaiveDate,
        to_meal: &str,
    ) -> usize {
        let copies: Vec<FoodItem> = self
            .bucket(from_date, from_meal)
            .iter()
            .map(FoodItem::duplicate)
            .collect();
        let count = copies.len();
        if count == 0 {
            return 0;
        }
        self.days
            .entry(to_date)
            .or_default()
            .entry(to_meal.to_string())
            .or_default()
            .extend(copies);
        debug!(%from_date, from_meal, %to_date, to_meal, count, "copy meal");
        self.recompute(to_date);
        count
    }

    // --- Reads ---

    #[must_use]
    pub fn items_for_meal(&self, date: NaiveDate, meal: &str) -> Vec<FoodItem> {
        self.bucket(date, meal).to_vec()
    }

    #[must_use]
    pub fn meal_totals(&self, date: NaiveDate, meal: &str) -> MealTotals {
        self.totals
            .get(&date)
            .and_then(|t| t.meals.get(meal))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn day_totals(&self, date: NaiveDate) -> DayTotals {
        self.totals.get(&date).map(|t| t.day).unwrap_or_default()
    }

    /// Per-meal breakdown of a date, listing only meals that have items.
    #[must_use]
    pub fn day_summary(&self, date: NaiveDate) -> DailySummary {
        let meals = self
            .meal_order(date)
            .into_iter()
            .filter_map(|meal| {
                let items = self.bucket(date, &meal);
                if items.is_empty() {
                    return None;
                }
                let totals = self.meal_totals(date, &meal);
                Some(MealGroup {
                    items: items.iter().cloned().map(ItemLine::from).collect(),
                    meal,
                    totals,
                })
            })
            .collect();

        DailySummary {
            date: date.format("%Y-%m-%d").to_string(),
            meals,
            totals: self.day_totals(date),
        }
    }

    // --- Internals ---

    fn bucket(&self, date: NaiveDate, meal: &str) -> &[FoodItem] {
        self.days
            .get(&date)
            .and_then(|b| b.get(meal))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn bucket_mut(&mut self, date: NaiveDate, meal: &str) -> Option<&mut Vec<FoodItem>> {
        self.days.get_mut(&date).and_then(|b| b.get_mut(meal))
    }

    /// Configured meals first, then any other meal logged on `date`.
    fn meal_order(&self, date: NaiveDate) -> Vec<String> {
        let mut order = self.meals.clone();
        if let Some(buckets) = self.days.get(&date) {
            for meal in buckets.keys() {
                if !order.contains(meal) {
                    order.push(meal.clone());
                }
            }
        }
        order
    }

    fn recompute(&mut self, date: NaiveDate) {
        if let Some(buckets) = self.days.get_mut(&date) {
            buckets.retain(|_, items| !items.is_empty());
            if buckets.is_empty() {
                self.days.remove(&date);
            }
        }

        match self.days.get(&date) {
            Some(buckets) => {
                let meals: BTreeMap<String, MealTotals> = buckets
                    .iter()
                    .map(|(meal, items)| (meal.clone(), aggregate_meal(items)))
                    .collect();
                let day = aggregate_day(&meals);
                self.totals.insert(date, CachedTotals { meals, day });
            }
            None => {
                self.totals.remove(&date);
            }
        }

        if date == self.selected {
            self.publish();
        }
    }

    fn publish(&self) {
        let date = self.selected;
        let meals = self
            .meal_order(date)
            .into_iter()
            .map(|meal| MealSnapshot {
                items: self.items_for_meal(date, &meal),
                totals: self.meal_totals(date, &meal),
                meal,
            })
            .collect();
        self.publisher.send_replace(LedgerSnapshot {
            selected_date: date,
            meals,
            day_totals: self.day_totals(date),
        });
    }
}
