//! Roll-ups from items to meals to days. Pure functions over displayed
//! nutrients; nothing here holds state.

use std::collections::BTreeMap;

use crate::models::{DayTotals, FoodItem, MealTotals};

#[must_use]
pub fn aggregate_meal<'a, I>(items: I) -> MealTotals
where
    I: IntoIterator<Item = &'a FoodItem>,
{
    items.into_iter().map(FoodItem::displayed).sum()
}

#[must_use]
pub fn aggregate_day(meal_totals: &BTreeMap<String, MealTotals>) -> DayTotals {
    meal_totals.values().sum()
}
