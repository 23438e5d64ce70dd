use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};

/// Meals shown by default. The ledger itself treats meal names as opaque keys.
pub const DEFAULT_MEALS: &[&str] = &["Breakfast", "Lunch", "Dinner", "Snacks", "Drinks"];

/// Serving size given to items that come straight from a lookup.
pub const DEFAULT_SERVING_G: i64 = 100;

/// Name used when the food database has a product but no name for it.
pub const UNKNOWN_PRODUCT: &str = "unknown product";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Nutrient density per 100 g. Immutable once built; every field is finite
/// and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[allow(clippy::struct_field_names)]
pub struct NutrientProfile {
    calories_per_100g: f64,
    protein_per_100g: f64,
    fat_per_100g: f64,
    carbs_per_100g: f64,
}

impl NutrientProfile {
    pub const ZERO: Self = Self {
        calories_per_100g: 0.0,
        protein_per_100g: 0.0,
        fat_per_100g: 0.0,
        carbs_per_100g: 0.0,
    };

    pub fn new(calories: f64, protein: f64, fat: f64, carbs: f64) -> LedgerResult<Self> {
        Ok(Self {
            calories_per_100g: check_nutrient("calories_per_100g", calories)?,
            protein_per_100g: check_nutrient("protein_per_100g", protein)?,
            fat_per_100g: check_nutrient("fat_per_100g", fat)?,
            carbs_per_100g: check_nutrient("carbs_per_100g", carbs)?,
        })
    }

    #[must_use]
    pub fn calories_per_100g(&self) -> f64 {
        self.calories_per_100g
    }

    #[must_use]
    pub fn protein_per_100g(&self) -> f64 {
        self.protein_per_100g
    }

    #[must_use]
    pub fn fat_per_100g(&self) -> f64 {
        self.fat_per_100g
    }

    #[must_use]
    pub fn carbs_per_100g(&self) -> f64 {
        self.carbs_per_100g
    }

    /// Nutrients for a serving of `grams`, truncated toward zero per field.
    #[must_use]
    pub fn scaled(&self, grams: i64) -> Nutrients {
        Nutrients {
            kcal: scale_field(self.calories_per_100g, grams),
            protein: scale_field(self.protein_per_100g, grams),
            fat: scale_field(self.fat_per_100g, grams),
            carbs: scale_field(self.carbs_per_100g, grams),
        }
    }
}

fn check_nutrient(field: &'static str, value: f64) -> LedgerResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(LedgerError::InvalidNutrient { field, value })
    }
}

#[allow(clippy::cast_precision_loss)]
fn scale_field(per_100g: f64, grams: i64) -> i64 {
    let exact = per_100g * grams as f64 / 100.0;
    // The epsilon keeps products like 4.1 * 1000 / 100 from landing just under 41.
    (exact + 1e-9).trunc() as i64
}

/// Whole-number nutrient amounts: one item's displayed values, or a sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nutrients {
    pub kcal: i64,
    pub protein: i64,
    pub fat: i64,
    pub carbs: i64,
}

pub type MealTotals = Nutrients;
pub type DayTotals = Nutrients;

impl Nutrients {
    pub const ZERO: Self = Self {
        kcal: 0,
        protein: 0,
        fat: 0,
        carbs: 0,
    };

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for Nutrients {
    type Output = Self;

    // Saturates: a huge serving scales to i64::MAX and must still sum.
    fn add(self, rhs: Self) -> Self {
        Self {
            kcal: self.kcal.saturating_add(rhs.kcal),
            protein: self.protein.saturating_add(rhs.protein),
            fat: self.fat.saturating_add(rhs.fat),
            carbs: self.carbs.saturating_add(rhs.carbs),
        }
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// A logged food. The profile is fixed at creation; only the serving size
/// changes, and displayed nutrients are always derived from the profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodItem {
    pub id: ItemId,
    pub barcode: String,
    pub name: String,
    pub profile: NutrientProfile,
    pub serving_g: i64,
}

impl FoodItem {
    #[must_use]
    pub fn from_lookup(barcode: &str, profile: NutrientProfile, name: Option<String>) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
        Self {
            id: ItemId::new(),
            barcode: barcode.to_string(),
            name,
            profile,
            serving_g: DEFAULT_SERVING_G,
        }
    }

    /// Placeholder for a barcode the database could not resolve.
    #[must_use]
    pub fn fallback(barcode: &str) -> Self {
        Self {
            id: ItemId::new(),
            barcode: barcode.to_string(),
            name: barcode.to_string(),
            profile: NutrientProfile::ZERO,
            serving_g: DEFAULT_SERVING_G,
        }
    }

    pub fn manual(name: &str, profile: NutrientProfile, serving_g: i64) -> LedgerResult<Self> {
        validate_serving(serving_g)?;
        Ok(Self {
            id: ItemId::new(),
            barcode: String::new(),
            name: name.trim().to_string(),
            profile,
            serving_g,
        })
    }

    /// Same item at a new serving size.
    pub fn rescaled(&self, new_grams: i64) -> LedgerResult<Self> {
        validate_serving(new_grams)?;
        Ok(Self {
            serving_g: new_grams,
            ..self.clone()
        })
    }

    /// Copy with a fresh identity, used when duplicating meals.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: ItemId::new(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn displayed(&self) -> Nutrients {
        self.profile.scaled(self.serving_g)
    }
}

pub fn validate_serving(grams: i64) -> LedgerResult<i64> {
    if grams <= 0 {
        return Err(LedgerError::InvalidServingSize(grams));
    }
    Ok(grams)
}

/// Meal names are opaque, but blank ones are rejected at the edges.
pub fn validate_meal_name(meal: &str) -> anyhow::Result<String> {
    let trimmed = meal.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Meal name must not be empty");
    }
    Ok(trimmed.to_string())
}

// --- Summary types ---

#[derive(Debug, Clone, Serialize)]
pub struct ItemLine {
    #[serde(flatten)]
    pub item: FoodItem,
    pub nutrients: Nutrients,
}

impl From<FoodItem> for ItemLine {
    fn from(item: FoodItem) -> Self {
        let nutrients = item.displayed();
        Self { item, nutrients }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MealGroup {
    pub meal: String,
    pub items: Vec<ItemLine>,
    pub totals: MealTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: String,
    pub meals: Vec<MealGroup>,
    pub totals: DayTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soup() -> NutrientProfile {
        NutrientProfile::new(250.0, 10.0, 5.0, 30.0).unwrap()
    }

    fn totals(kcal: i64, protein: i64, fat: i64, carbs: i64) -> Nutrients {
        Nutrients {
            kcal,
            protein,
            fat,
            carbs,
        }
    }

    #[test]
    fn test_profile_rejects_negative() {
        let err = NutrientProfile::new(-1.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidNutrient {
                field: "calories_per_100g",
                ..
            }
        ));
        assert!(NutrientProfile::new(0.0, 0.0, -0.5, 0.0).is_err());
    }

    #[test]
    fn test_profile_rejects_non_finite() {
        assert!(NutrientProfile::new(f64::NAN, 0.0, 0.0, 0.0).is_err());
        assert!(NutrientProfile::new(0.0, f64::INFINITY, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_from_lookup_defaults_to_100g() {
        let item = FoodItem::from_lookup("4000417025005", soup(), Some("Tomato Soup".into()));
        assert_eq!(item.serving_g, 100);
        assert_eq!(item.name, "Tomato Soup");
        assert_eq!(item.barcode, "4000417025005");
        assert_eq!(item.displayed(), totals(250, 10, 5, 30));
    }

    #[test]
    fn test_from_lookup_missing_name() {
        let item = FoodItem::from_lookup("123", soup(), None);
        assert_eq!(item.name, UNKNOWN_PRODUCT);

        let item = FoodItem::from_lookup("123", soup(), Some("  ".into()));
        assert_eq!(item.name, UNKNOWN_PRODUCT);
    }

    #[test]
    fn test_fallback_is_named_after_barcode() {
        let item = FoodItem::fallback("5449000000996");
        assert_eq!(item.name, "5449000000996");
        assert_eq!(item.profile, NutrientProfile::ZERO);
        assert!(item.displayed().is_zero());
    }

    #[test]
    fn test_rescale_from_original_basis() {
        let item = FoodItem::from_lookup("1", soup(), None);

        let half = item.rescaled(50).unwrap();
        assert_eq!(half.displayed(), totals(125, 5, 2, 15));

        let via_half = half.rescaled(200).unwrap();
        let direct = item.rescaled(200).unwrap();
        assert_eq!(via_half.displayed(), direct.displayed());
        assert_eq!(direct.displayed(), totals(500, 20, 10, 60));
    }

    #[test]
    fn test_rescale_order_independent_at_odd_sizes() {
        let item = FoodItem::from_lookup("1", soup(), None);
        let a = item.rescaled(33).unwrap().rescaled(7).unwrap().rescaled(61).unwrap();
        let b = item.rescaled(61).unwrap();
        assert_eq!(a.displayed(), b.displayed());
        // 250 * 0.61 = 152.5, 10 * 0.61 = 6.1, 5 * 0.61 = 3.05, 30 * 0.61 = 18.3
        assert_eq!(b.displayed(), totals(152, 6, 3, 18));
    }

    #[test]
    fn test_rescale_keeps_identity() {
        let item = FoodItem::from_lookup("1", soup(), Some("Soup".into()));
        let rescaled = item.rescaled(250).unwrap();
        assert_eq!(rescaled.id, item.id);
        assert_eq!(rescaled.name, item.name);
        assert_eq!(rescaled.profile, item.profile);
    }

    #[test]
    fn test_rescale_invalid_sizes() {
        let item = FoodItem::from_lookup("1", soup(), None);
        assert_eq!(
            item.rescaled(0).unwrap_err(),
            LedgerError::InvalidServingSize(0)
        );
        assert_eq!(
            item.rescaled(-20).unwrap_err(),
            LedgerError::InvalidServingSize(-20)
        );
    }

    #[test]
    fn test_tiny_serving_rounds_to_zero() {
        let item = FoodItem::from_lookup("1", soup(), None);
        let one_gram = item.rescaled(1).unwrap();
        assert_eq!(one_gram.displayed(), totals(2, 0, 0, 0));
    }

    #[test]
    fn test_truncation_absorbs_float_error() {
        let profile = NutrientProfile::new(4.1, 2.3, 0.7, 1.1).unwrap();
        let item = FoodItem::manual("Crackers", profile, 1000).unwrap();
        assert_eq!(item.displayed(), totals(41, 23, 7, 11));
    }

    #[test]
    fn test_manual_rejects_zero_serving() {
        assert!(FoodItem::manual("Apple", soup(), 0).is_err());
        let apple = FoodItem::manual(" Apple ", soup(), 150).unwrap();
        assert_eq!(apple.name, "Apple");
        assert!(apple.barcode.is_empty());
    }

    #[test]
    fn test_duplicate_gets_new_id() {
        let item = FoodItem::fallback("1");
        let copy = item.duplicate();
        assert_ne!(copy.id, item.id);
        assert_eq!(copy.name, item.name);
    }

    #[test]
    fn test_nutrients_sum() {
        let all = [totals(1, 2, 3, 4), totals(10, 20, 30, 40)];
        let sum: Nutrients = all.iter().sum();
        assert_eq!(sum, totals(11, 22, 33, 44));
        let empty: Nutrients = std::iter::empty::<Nutrients>().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_nutrients_sum_saturates() {
        let huge = FoodItem::from_lookup("1", soup(), None).rescaled(i64::MAX).unwrap();
        assert_eq!(huge.displayed().kcal, i64::MAX);
        let sum = huge.displayed() + totals(250, 10, 5, 30);
        assert_eq!(sum, totals(i64::MAX, i64::MAX, i64::MAX, i64::MAX));
    }

    #[test]
    fn test_validate_meal_name() {
        assert_eq!(validate_meal_name(" Lunch ").unwrap(), "Lunch");
        assert_eq!(validate_meal_name("second breakfast").unwrap(), "second breakfast");
        assert!(validate_meal_name("   ").is_err());
    }
}
