use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use bite_core::models::validate_meal_name;

pub(crate) fn parse_date(date_str: Option<&str>) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    match date_str.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("yesterday") => Ok(today - chrono::Duration::days(1)),
        Some("tomorrow") => Ok(today + chrono::Duration::days(1)),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| {
            format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
        }),
    }
}

/// Match a typed meal name against the configured meals, ignoring case.
/// Names that match nothing are kept as typed.
pub(crate) fn resolve_meal(meals: &[String], input: &str) -> Result<String> {
    let meal = validate_meal_name(input)?;
    Ok(meals
        .iter()
        .find(|m| m.eq_ignore_ascii_case(&meal))
        .cloned()
        .unwrap_or(meal))
}

/// Parse "date:meal" (e.g. "today:lunch" or "2024-01-15:Breakfast").
pub(crate) fn parse_meal_ref(meals: &[String], s: &str) -> Result<(NaiveDate, String)> {
    let Some((date, meal)) = s.split_once(':') else {
        bail!("Invalid meal reference '{s}'. Use format 'date:meal' (e.g. 'today:lunch')");
    };
    let date = parse_date(Some(date))?;
    let meal = resolve_meal(meals, meal)?;
    Ok((date, meal))
}

/// Parse a gram amount like "200" or "200g".
pub(crate) fn parse_grams(s: &str) -> Result<i64> {
    let trimmed = s.trim().trim_end_matches('g').trim();
    let value: i64 = trimmed
        .parse()
        .with_context(|| format!("Invalid serving size: '{s}'. Use whole grams like '200' or '200g'"))?;
    if value <= 0 {
        bail!("Serving size must be greater than 0");
    }
    Ok(value)
}

/// Split a session line into words, keeping "double quoted" runs together.
pub(crate) fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }

    if in_quotes {
        bail!("Unclosed quote in '{line}'");
    }
    if has_word {
        words.push(current);
    }
    Ok(words)
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
