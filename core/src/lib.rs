pub mod aggregate;
pub mod error;
pub mod intake;
pub mod ledger;
pub mod lookup;
pub mod models;
pub mod openfoodfacts;

pub use error::{LedgerError, LedgerResult};
pub use intake::{add_item_from_barcode, spawn_barcode_add};
pub use ledger::{DayLedger, LedgerSnapshot, SharedLedger, lock_ledger};
pub use lookup::{LookupError, LookupGateway, LookupHit};
pub use models::{DayTotals, FoodItem, ItemId, MealTotals, NutrientProfile, Nutrients};
