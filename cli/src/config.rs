use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use bite_core::models::{DEFAULT_MEALS, validate_meal_name};

const DEFAULT_LOOKUP_URL: &str = "https://world.openfoodfacts.org";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOOKUP_URL.to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Daily goals shown next to the running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Goals {
    pub kcal: i64,
    pub protein: i64,
    pub fat: i64,
    pub carbs: i64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            kcal: 2000,
            protein: 140,
            fat: 80,
            carbs: 100,
        }
    }
}

impl Goals {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("kcal", self.kcal),
            ("protein", self.protein),
            ("fat", self.fat),
            ("carbs", self.carbs),
        ] {
            if value <= 0 {
                bail!("`goals.{field}` must be greater than 0");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    lookup: LookupConfig,
    meals: Option<Vec<String>>,
    goals: Goals,
}

pub struct Config {
    pub config_path: PathBuf,
    pub lookup: LookupConfig,
    pub meals: Vec<String>,
    pub goals: Goals,
}

impl Config {
    /// Load `config.toml` from the platform config directory. A missing file
    /// means defaults; `BITE_LOOKUP_URL` overrides the lookup endpoint.
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "bite").context("Could not determine home directory")?;
        let mut config = Self::load_from(proj_dirs.config_dir())?;

        if let Some(url) = std::env::var("BITE_LOOKUP_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
        {
            config.lookup.base_url = url.trim().trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");

        let file: FileConfig = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str(&raw)
                .with_context(|| format!("Invalid config file: {}", config_path.display()))?
        } else {
            FileConfig::default()
        };

        let meals = match file.meals {
            Some(meals) => {
                if meals.is_empty() {
                    bail!("`meals` must list at least one meal");
                }
                meals
                    .iter()
                    .map(|m| validate_meal_name(m))
                    .collect::<Result<Vec<_>>>()?
            }
            None => DEFAULT_MEALS.iter().map(ToString::to_string).collect(),
        };

        let mut lookup = file.lookup;
        lookup.base_url = lookup.base_url.trim_end_matches('/').to_string();
        if lookup.timeout_secs == 0 {
            bail!("`lookup.timeout_secs` must be greater than 0");
        }

        file.goals.validate()?;

        Ok(Config {
            config_path,
            lookup,
            meals,
            goals: file.goals,
        })
    }
}
