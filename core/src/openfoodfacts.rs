use serde::Deserialize;

use crate::lookup::{LookupError, LookupHit};
use crate::models::NutrientProfile;

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub status: Option<i32>,
    pub product: Option<ProductData>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product_name: Option<String>,
    pub nutriments: Option<Nutriments>,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<f64>,
    pub proteins_100g: Option<f64>,
    pub carbohydrates_100g: Option<f64>,
    pub fat_100g: Option<f64>,
}

/// Map a product response onto a lookup result.
///
/// Missing macros count as zero. When energy is absent or zero it is
/// estimated with the 4/4/9 kcal-per-gram factors.
pub fn response_to_hit(resp: ProductResponse) -> Result<LookupHit, LookupError> {
    if resp.status != Some(1) {
        return Err(LookupError::NotFound);
    }
    let product = resp.product.ok_or(LookupError::NotFound)?;
    product_to_hit(product)
}

pub fn product_to_hit(p: ProductData) -> Result<LookupHit, LookupError> {
    let n = p.nutriments.unwrap_or_default();

    let protein = n.proteins_100g.unwrap_or(0.0);
    let carbs = n.carbohydrates_100g.unwrap_or(0.0);
    let fat = n.fat_100g.unwrap_or(0.0);
    let calories = match n.energy_kcal_100g {
        Some(kcal) if kcal > 0.0 => kcal,
        _ => 4.0 * carbs + 4.0 * protein + 9.0 * fat,
    };

    let profile = NutrientProfile::new(calories, protein, fat, carbs)
        .map_err(|e| LookupError::MalformedResponse(e.to_string()))?;

    Ok(LookupHit {
        name: p.product_name.filter(|n| !n.trim().is_empty()),
        profile,
    })
}
