//! Runtime settings read from the environment (and `.env`), plus the on-disk
//! preference store.

use crate::api::{DEFAULT_BASE_URL, DEFAULT_SNAPSHOT_PATH};
use crate::error::{AppError, Result};
use crate::map::{ConfiguredLocation, LatLng};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_PREFS_PATH: &str = ".airmap_prefs.json";

/// Everything the app needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub snapshot_path: PathBuf,
    pub prefs_path: PathBuf,
    pub location: ConfiguredLocation,
    pub fullscreen_supported: bool,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

/// A trimmed, non-empty variable. Non-UTF-8 values are an error rather than "unset".
fn var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) => {
            let value = value.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn flag(name: &str, default: bool) -> Result<bool> {
    Ok(match var(name)?.as_deref() {
        Some("0") | Some("false") | Some("no") | Some("off") => false,
        Some(_) => true,
        None => default,
    })
}

impl Settings {
    /// Loads `.env` (if any) and reads the `AIRMAP_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `AIRMAP_LOCATION` is set but malformed, and
    /// `AppError::Env` when a variable is not valid Unicode.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let location = match var("AIRMAP_LOCATION")? {
            Some(raw) => parse_location(&raw)?,
            None => ConfiguredLocation::Unsupported,
        };

        let settings = Self {
            base_url: var("AIRMAP_BASE_URL")?.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            snapshot_path: PathBuf::from(
                var("AIRMAP_SNAPSHOT_PATH")?.unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string()),
            ),
            prefs_path: PathBuf::from(var("AIRMAP_PREFS_PATH")?.unwrap_or_else(|| DEFAULT_PREFS_PATH.to_string())),
            location,
            fullscreen_supported: flag("AIRMAP_FULLSCREEN", true)?,
            log_json: flag("AIRMAP_LOG_JSON", false)?,
            log_dir: var("AIRMAP_LOG_DIR")?.map(PathBuf::from),
        };
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

/// Parses `"lat,lon"` or `"denied"`.
pub fn parse_location(raw: &str) -> Result<ConfiguredLocation> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("denied") {
        return Ok(ConfiguredLocation::Denied);
    }
    let invalid = || AppError::Config(format!("AIRMAP_LOCATION must be \"lat,lon\", got {:?}", raw));

    let (lat, lon) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid());
    }
    Ok(ConfiguredLocation::At(LatLng::new(lat, lon)))
}

/// Display theme. Older files stored `"enabled"`/`"disabled"` for dark mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[serde(alias = "enabled")]
    Dark,
    #[default]
    #[serde(alias = "disabled")]
    Light,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    theme: Theme,
}

/// JSON file holding user preferences.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored theme. A missing or unreadable file yields `Theme::Light`.
    pub fn theme(&self) -> Theme {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Theme::default(),
        };
        match serde_json::from_str::<Preferences>(&raw) {
            Ok(prefs) => prefs.theme,
            Err(e) => {
                warn!("Ignoring corrupt preference file {}: {}", self.path.display(), e);
                Theme::default()
            },
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        let body = serde_json::to_string_pretty(&Preferences { theme })?;
        std::fs::write(&self.path, body)?;
        debug!("Saved theme {:?} to {}", theme, self.path.display());
        Ok(())
    }
}
