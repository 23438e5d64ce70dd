use anyhow::Result;
use serde::Serialize;
use std::process;

use bite_core::lookup::{LookupError, LookupGateway};
use bite_core::models::{FoodItem, NutrientProfile};

use super::helpers::json_error;
use super::summary::format_totals;

#[derive(Serialize)]
struct LookupOutput<'a> {
    barcode: &'a str,
    name: &'a str,
    per_100g: &'a NutrientProfile,
}

/// One-shot barcode query. Exits with status 2 when the product is unknown.
pub(crate) async fn cmd_lookup(gateway: &dyn LookupGateway, barcode: &str, json: bool) -> Result<()> {
    match gateway.lookup(barcode).await {
        Ok(hit) => {
            let item = FoodItem::from_lookup(barcode, hit.profile, hit.name);
            if json {
                let out = LookupOutput {
                    barcode,
                    name: &item.name,
                    per_100g: &item.profile,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let name = &item.name;
                let per_100g = format_totals(&item.displayed());
                println!("{barcode}: {name}");
                println!("  per 100g: {per_100g}");
            }
            Ok(())
        }
        Err(LookupError::NotFound) => {
            let msg = format!("No product found for barcode '{barcode}'");
            if json {
                println!("{}", json_error(&msg));
            } else {
                eprintln!("{msg}");
            }
            process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}
