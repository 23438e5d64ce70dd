use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use bite_core::ledger::LedgerSnapshot;
use bite_core::models::{DailySummary, Nutrients};

use super::helpers::truncate;
use crate::config::Goals;

pub(crate) fn format_totals(n: &Nutrients) -> String {
    let Nutrients {
        kcal,
        protein,
        fat,
        carbs,
    } = n;
    format!("{kcal} kcal | P:{protein}g F:{fat}g C:{carbs}g")
}

/// Totals against goals, e.g. "539/2000 kcal | P:6/140g F:30/80g C:57/100g".
pub(crate) fn format_progress(n: &Nutrients, goals: &Goals) -> String {
    format!(
        "{}/{} kcal | P:{}/{}g F:{}/{}g C:{}/{}g",
        n.kcal, goals.kcal, n.protein, goals.protein, n.fat, goals.fat, n.carbs, goals.carbs
    )
}

pub(crate) fn status_line(snapshot: &LedgerSnapshot, goals: &Goals) -> String {
    let date = snapshot.selected_date;
    let progress = format_progress(&snapshot.day_totals, goals);
    format!("[{date}] {progress}")
}

fn goal_lines(totals: &Nutrients, goals: &Goals) -> [String; 2] {
    let remaining = Nutrients {
        kcal: goals.kcal.saturating_sub(totals.kcal),
        protein: goals.protein.saturating_sub(totals.protein),
        fat: goals.fat.saturating_sub(totals.fat),
        carbs: goals.carbs.saturating_sub(totals.carbs),
    };
    [
        format!(
            "  GOAL: {} kcal | P:{}g F:{}g C:{}g",
            goals.kcal, goals.protein, goals.fat, goals.carbs
        ),
        format!("  REMAINING: {}", format_totals(&remaining)),
    ]
}

pub(crate) fn print_summary(summary: &DailySummary, goals: &Goals) {
    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Grams")]
        grams: String,
        #[tabled(rename = "kcal")]
        kcal: i64,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
    }

    let date = &summary.date;
    println!("=== {date} ===\n");

    if summary.meals.is_empty() {
        println!("  No entries\n");
    }

    for meal in &summary.meals {
        let label = meal.meal.to_uppercase();
        let sub = format_totals(&meal.totals);
        println!("  {label} ({sub})");

        let rows: Vec<ItemRow> = meal
            .items
            .iter()
            .enumerate()
            .map(|(i, line)| ItemRow {
                idx: i + 1,
                name: truncate(&line.item.name, 35),
                grams: format!("{}g", line.item.serving_g),
                kcal: line.nutrients.kcal,
                protein: format!("{}g", line.nutrients.protein),
                fat: format!("{}g", line.nutrients.fat),
                carbs: format!("{}g", line.nutrients.carbs),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
            .to_string();
        println!("{table}\n");
    }

    let total = format_totals(&summary.totals);
    println!("  TOTAL: {total}");
    for line in goal_lines(&summary.totals, goals) {
        println!("{line}");
    }
}
