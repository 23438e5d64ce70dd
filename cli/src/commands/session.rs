use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use chrono::Days;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use bite_core::intake::spawn_barcode_add;
use bite_core::ledger::{LedgerSnapshot, SharedLedger, lock_ledger};
use bite_core::lookup::LookupGateway;
use bite_core::models::{FoodItem, NutrientProfile};

use super::helpers::{parse_date, parse_grams, parse_meal_ref, resolve_meal, split_line};
use super::summary::{format_totals, print_summary, status_line};
use crate::config::Goals;

const DEFAULT_MEAL: &str = "snacks";

#[derive(Parser)]
#[command(name = "bite", no_binary_name = true, disable_version_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Switch the day being viewed (YYYY-MM-DD, today/yesterday/tomorrow,
    /// or prev/next to step from the selected day)
    Date { date: String },
    /// Look up a barcode and add it; runs in the background
    Scan {
        barcode: String,
        #[arg(short, long, default_value = DEFAULT_MEAL)]
        meal: String,
    },
    /// Add a food by hand (nutrients per 100g)
    Add {
        name: String,
        #[arg(long)]
        kcal: f64,
        #[arg(long, default_value = "0")]
        protein: f64,
        #[arg(long, default_value = "0")]
        fat: f64,
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Serving size in grams
        #[arg(short, long, default_value = "100")]
        grams: String,
        #[arg(short, long, default_value = DEFAULT_MEAL)]
        meal: String,
    },
    /// Remove an item by its position in a meal
    #[command(alias = "rm")]
    Remove {
        index: usize,
        #[arg(short, long, default_value = DEFAULT_MEAL)]
        meal: String,
    },
    /// Change the serving size of an item
    Grams {
        index: usize,
        grams: String,
        #[arg(short, long, default_value = DEFAULT_MEAL)]
        meal: String,
    },
    /// Copy a meal to another date/meal ("date:meal")
    Copy { from: String, to: String },
    /// Show the selected day
    Show {
        #[arg(long)]
        json: bool,
    },
    /// List days that have entries
    Dates,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    Print(String),
    Nothing,
    Quit,
}

/// One interactive session: owns the ledger handle for its lifetime and
/// routes typed commands to it.
pub(crate) struct Session {
    ledger: SharedLedger,
    gateway: Arc<dyn LookupGateway>,
    meals: Vec<String>,
    goals: Goals,
    pending: Vec<JoinHandle<()>>,
}

impl Session {
    pub(crate) fn new(
        ledger: SharedLedger,
        gateway: Arc<dyn LookupGateway>,
        goals: Goals,
    ) -> Self {
        let meals = lock_ledger(&ledger).meals().to_vec();
        Self {
            ledger,
            gateway,
            meals,
            goals,
            pending: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        lock_ledger(&self.ledger).subscribe()
    }

    pub(crate) fn execute(&mut self, line: &str) -> Result<Outcome> {
        let words = split_line(line)?;
        if words.is_empty() {
            return Ok(Outcome::Nothing);
        }

        let parsed = match SessionLine::try_parse_from(&words) {
            Ok(p) => p,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    return Ok(Outcome::Print(e.render().to_string()));
                }
                _ => bail!("{}", e.render().to_string().trim_end()),
            },
        };

        match parsed.command {
            SessionCommand::Date { date } => {
                let mut ledger = lock_ledger(&self.ledger);
                let target = match date.trim() {
                    "prev" => ledger
                        .selected_date()
                        .checked_sub_days(Days::new(1))
                        .context("Date out of range")?,
                    "next" => ledger
                        .selected_date()
                        .checked_add_days(Days::new(1))
                        .context("Date out of range")?,
                    other => parse_date(Some(other))?,
                };
                ledger.select_date(target);
                Ok(Outcome::Nothing)
            }
            SessionCommand::Scan { barcode, meal } => {
                let meal = resolve_meal(&self.meals, &meal)?;
                Ok(Outcome::Print(self.scan(barcode, meal)))
            }
            SessionCommand::Add {
                name,
                kcal,
                protein,
                fat,
                carbs,
                grams,
                meal,
            } => {
                let meal = resolve_meal(&self.meals, &meal)?;
                let grams = parse_grams(&grams)?;
                let profile = NutrientProfile::new(kcal, protein, fat, carbs)?;
                let item = FoodItem::manual(&name, profile, grams)?;
                let msg = added_message(&item, &meal);
                let mut ledger = lock_ledger(&self.ledger);
                let date = ledger.selected_date();
                ledger.add_item(date, &meal, item);
                Ok(Outcome::Print(msg))
            }
            SessionCommand::Remove { index, meal } => {
                let meal = resolve_meal(&self.meals, &meal)?;
                let mut ledger = lock_ledger(&self.ledger);
                let date = ledger.selected_date();
                let target = index
                    .checked_sub(1)
                    .and_then(|i| ledger.items_for_meal(date, &meal).into_iter().nth(i));
                match target {
                    Some(item) => {
                        ledger.remove_item(date, &meal, item.id);
                        Ok(Outcome::Print(format!("Removed {} from {meal}", item.name)))
                    }
                    None => Ok(Outcome::Print(format!("Nothing at {meal} #{index}"))),
                }
            }
            SessionCommand::Grams { index, grams, meal } => {
                let meal = resolve_meal(&self.meals, &meal)?;
                let grams = parse_grams(&grams)?;
                let mut ledger = lock_ledger(&self.ledger);
                let date = ledger.selected_date();
                let item = index
                    .checked_sub(1)
                    .and_then(|i| ledger.items_for_meal(date, &meal).into_iter().nth(i))
                    .with_context(|| format!("No item #{index} in {meal}"))?;
                let rescaled = ledger.rescale_item(date, &meal, item.id, grams)?;
                let kcal = rescaled.displayed().kcal;
                Ok(Outcome::Print(format!(
                    "{} is now {grams}g — {kcal} kcal",
                    rescaled.name
                )))
            }
            SessionCommand::Copy { from, to } => {
                let (from_date, from_meal) = parse_meal_ref(&self.meals, &from)?;
                let (to_date, to_meal) = parse_meal_ref(&self.meals, &to)?;
                let count =
                    lock_ledger(&self.ledger).copy_meal(from_date, &from_meal, to_date, &to_meal);
                if count == 0 {
                    bail!("No entries found for {from_date}:{from_meal}");
                }
                Ok(Outcome::Print(format!(
                    "Copied {count} entries from {from_date}:{from_meal} to {to_date}:{to_meal}"
                )))
            }
            SessionCommand::Show { json } => {
                let summary = {
                    let ledger = lock_ledger(&self.ledger);
                    ledger.day_summary(ledger.selected_date())
                };
                if json {
                    Ok(Outcome::Print(serde_json::to_string_pretty(&summary)?))
                } else {
                    print_summary(&summary, &self.goals);
                    Ok(Outcome::Nothing)
                }
            }
            SessionCommand::Dates => {
                let ledger = lock_ledger(&self.ledger);
                let dates = ledger.dates();
                if dates.is_empty() {
                    return Ok(Outcome::Print("No entries yet".to_string()));
                }
                let lines: Vec<String> = dates
                    .into_iter()
                    .map(|d| format!("{d}  {}", format_totals(&ledger.day_totals(d))))
                    .collect();
                Ok(Outcome::Print(lines.join("\n")))
            }
            SessionCommand::Quit => Ok(Outcome::Quit),
        }
    }

    /// Start a background lookup into the selected date. The add goes through
    /// whether or not anyone waits for it.
    fn scan(&mut self, barcode: String, meal: String) -> String {
        let date = lock_ledger(&self.ledger).selected_date();
        let msg = format!("Looking up {barcode} for {meal}...");
        let handle = spawn_barcode_add(
            self.ledger.clone(),
            self.gateway.clone(),
            date,
            meal.clone(),
            barcode,
        );
        self.pending.retain(|h| !h.is_finished());
        self.pending.push(tokio::spawn(async move {
            match handle.await {
                Ok(item) => println!("{}", added_message(&item, &meal)),
                Err(e) => warn!(error = %e, "barcode add task failed"),
            }
        }));
        msg
    }

    /// Wait for lookups still in flight.
    pub(crate) async fn finish(&mut self) {
        for handle in self.pending.drain(..) {
            let _ = handle.await;
        }
    }
}

fn added_message(item: &FoodItem, meal: &str) -> String {
    let name = &item.name;
    let grams = item.serving_g;
    let kcal = item.displayed().kcal;
    format!("Added: {name} {grams}g to {meal} — {kcal} kcal")
}

/// Print the day's running totals every time the ledger publishes.
async fn watch_totals(mut rx: watch::Receiver<LedgerSnapshot>, goals: Goals) {
    while rx.changed().await.is_ok() {
        let line = status_line(&rx.borrow_and_update(), &goals);
        println!("  {line}");
    }
}

pub(crate) async fn cmd_session(
    ledger: SharedLedger,
    gateway: Arc<dyn LookupGateway>,
    goals: Goals,
) -> Result<()> {
    let mut session = Session::new(ledger, gateway, goals);
    let watcher = tokio::spawn(watch_totals(session.subscribe(), goals));

    eprintln!("bite — type 'help' for commands, 'quit' to leave");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match session.execute(&line) {
            Ok(Outcome::Print(msg)) => println!("{msg}"),
            Ok(Outcome::Nothing) => {}
            Ok(Outcome::Quit) => break,
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }

    session.finish().await;
    watcher.abort();
    Ok(())
}
