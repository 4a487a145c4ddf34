use crate::api::{Endpoint, Gateway, SnapshotStore};
use crate::cli::{prompts, render};
use crate::config::{PreferenceStore, Settings, Theme};
use crate::error::{AppError, Result};
use crate::map::{
    search_suggestions, DataMode, FilterCriteria, FilterOptions, LatLng, LoadOutcome, MapController, RegionPreset,
    ALL, MIN_SEARCH_LEN, TRANSIENT_MARKER_SECS,
};
use crate::models::AqiCategory;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Terminal client for the air quality dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runs one command and exits; without one, an interactive menu starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the markers for a region
    Map(MapArgs),

    /// Filter markers by continent, country, city, AQI category or free text
    Filter(FilterArgs),

    /// Re-fetch the current selection
    Refresh,

    /// Center the map on your position
    Locate,

    /// Toggle fullscreen display
    Fullscreen,

    /// Search cities and countries, jumping to the first match
    Search {
        /// At least two characters
        term: String,
    },

    /// Show the AQI colour legend
    Legend,

    /// Global summary and the most polluted countries
    Dashboard,

    /// Monthly AQI for one country
    Country { name: String },

    /// Monthly AQI for one city
    City { name: String, state: String },

    /// Compare two countries month by month
    CompareCountries { first: String, second: String },

    /// Compare two cities month by month
    CompareCities {
        city1: String,
        state1: String,
        city2: String,
        state2: String,
    },

    /// Number of cities in each AQI category
    Categories,

    /// Set the display theme
    Theme {
        #[arg(value_enum)]
        theme: Theme,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RegionArg {
    India,
    Global,
}

impl From<RegionArg> for RegionPreset {
    fn from(region: RegionArg) -> Self {
        match region {
            RegionArg::India => RegionPreset::India,
            RegionArg::Global => RegionPreset::Global,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    /// Region preset
    #[arg(short, long, value_enum, default_value_t = RegionArg::India)]
    pub region: RegionArg,

    /// Read the bundled snapshot instead of the live backend
    #[arg(long = "static")]
    pub static_data: bool,

    /// Print every marker's popup below the table
    #[arg(long)]
    pub popups: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    #[arg(long, default_value = ALL)]
    pub continent: String,

    #[arg(long, default_value = ALL)]
    pub country: String,

    #[arg(long, default_value = ALL)]
    pub city: String,

    /// Case-insensitive match on city or country; overrides the other filters
    #[arg(short, long)]
    pub search: Option<String>,

    /// Keep only these AQI categories (repeatable, e.g. --category Good)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Read the bundled snapshot instead of the live backend
    #[arg(long = "static")]
    pub static_data: bool,
}

impl FilterArgs {
    /// Builds filter criteria, rejecting unknown category labels.
    pub fn criteria(&self) -> Result<FilterCriteria> {
        if let Some(unknown) = self
            .categories
            .iter()
            .find(|label| AqiCategory::from_label(label).is_none())
        {
            return Err(AppError::Cli(format!(
                "Unknown AQI category {:?}. Must be one of: {}",
                unknown,
                AqiCategory::ALL.map(AqiCategory::label).join(", ")
            )));
        }
        Ok(FilterCriteria::region(&self.continent, &self.country, &self.city)
            .with_search(self.search.as_deref().unwrap_or(""))
            .with_categories(self.categories.iter().cloned()))
    }
}

/// Runs `future` behind a spinner.
async fn with_spinner<T, F>(message: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = future.await;
    spinner.finish_and_clear();
    result
}

/// CLI application
pub struct App {
    controller: MapController,
    gateway: Gateway,
    prefs: PreferenceStore,
}

impl App {
    /// Create a new CLI application
    pub fn new(settings: &Settings) -> Result<Self> {
        let gateway = Gateway::new(&settings.base_url)?;
        let controller = MapController::new(
            gateway.clone(),
            SnapshotStore::new(&settings.snapshot_path),
            Box::new(settings.location),
            settings.fullscreen_supported,
        );
        Ok(Self {
            controller,
            gateway,
            prefs: PreferenceStore::new(&settings.prefs_path),
        })
    }

    pub fn controller(&self) -> &MapController {
        &self.controller
    }

    fn theme(&self) -> Theme {
        self.prefs.theme()
    }

    /// Run one command
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Map(args) => {
                if args.static_data {
                    self.controller.select_mode(DataMode::Static);
                }
                let outcome =
                    with_spinner("Loading markers...", self.controller.focus_region(args.region.into())).await?;
                self.report(outcome);
                self.show_map(args.popups);
            },
            Commands::Filter(args) => {
                let criteria = args.criteria()?;
                if args.static_data {
                    self.controller.select_mode(DataMode::Static);
                }
                let outcome = with_spinner("Filtering markers...", self.controller.apply_filter(criteria)).await?;
                self.report(outcome);
                self.show_map(false);
            },
            Commands::Refresh => {
                let outcome = with_spinner("Refreshing...", self.controller.refresh()).await?;
                self.report(outcome);
                self.show_map(false);
            },
            Commands::Locate => {
                self.ensure_loaded().await?;
                let marker = self.controller.locate(Utc::now())?;
                println!(
                    "{} {} (marker shown for {}s)",
                    "Centered on".green(),
                    marker.position,
                    TRANSIENT_MARKER_SECS
                );
                self.show_map(false);
            },
            Commands::Fullscreen => {
                let on = self.controller.toggle_fullscreen()?;
                println!("Fullscreen {}", if on { "on".green() } else { "off".yellow() });
            },
            Commands::Search { term } => {
                self.ensure_loaded().await?;
                self.search(&term).await;
            },
            Commands::Legend => {
                println!("{}", render::legend_table(self.theme()));
            },
            Commands::Dashboard => {
                let summary =
                    with_spinner("Fetching dashboard...", self.gateway.fetch_dashboard_summary()).await?;
                println!(
                    "Global average AQI: {}   Countries monitored: {}",
                    summary
                        .global_avg_aqi
                        .map(|v| format!("{:.1}", v))
                        .unwrap_or_else(|| "-".to_string())
                        .bold(),
                    summary.monitored_countries_count
                );
                println!("{}", render::dashboard_table(&summary, self.theme()));
            },
            Commands::Country { name } => {
                let series = with_spinner("Fetching country data...", self.gateway.fetch_country_series(&name)).await?;
                self.print_series_caption(&series.name, series.rank, series.avg_aqi);
                println!("{}", render::series_table(&series, self.theme()));
            },
            Commands::City { name, state } => {
                let series =
                    with_spinner("Fetching city data...", self.gateway.fetch_city_series(&name, &state)).await?;
                self.print_series_caption(&format!("{}, {}", series.name, state), series.rank, series.avg_aqi);
                println!("{}", render::series_table(&series, self.theme()));
            },
            Commands::CompareCountries { first, second } => {
                let comparison = with_spinner(
                    "Comparing countries...",
                    self.gateway.fetch_country_comparison(&first, &second),
                )
                .await?;
                println!("{}", render::comparison_table(&comparison, self.theme()));
            },
            Commands::CompareCities {
                city1,
                state1,
                city2,
                state2,
            } => {
                let comparison = with_spinner(
                    "Comparing cities...",
                    self.gateway
                        .fetch_city_comparison((city1.as_str(), state1.as_str()), (city2.as_str(), state2.as_str())),
                )
                .await?;
                println!("{}", render::comparison_table(&comparison, self.theme()));
            },
            Commands::Categories => {
                let histogram =
                    with_spinner("Fetching category counts...", self.gateway.fetch_category_histogram()).await?;
                println!("Cities classified: {}", histogram.total());
                println!("{}", render::histogram_table(&histogram, self.theme()));
            },
            Commands::Theme { theme } => {
                self.prefs.set_theme(theme)?;
                info!("Theme set to {:?}", theme);
                println!("Theme saved to {}", self.prefs.path().display());
            },
        }

        Ok(())
    }

    /// Switches realtime/static and reloads.
    pub async fn toggle_mode(&self) -> Result<()> {
        let next = match self.controller.mode() {
            DataMode::Realtime => DataMode::Static,
            DataMode::Static => DataMode::Realtime,
        };
        let outcome = with_spinner("Switching data source...", self.controller.set_mode(next)).await?;
        self.report(outcome);
        self.show_map(false);
        Ok(())
    }

    /// Loads the initial India view unless an earlier command already loaded data.
    async fn ensure_loaded(&self) -> Result<()> {
        if !self.controller.has_loaded() {
            let outcome = with_spinner("Loading markers...", self.controller.load_initial()).await?;
            self.report(outcome);
        }
        Ok(())
    }

    fn report(&self, outcome: LoadOutcome) {
        if outcome.stale {
            warn!("Result superseded by a newer request");
            return;
        }
        if outcome.source == DataMode::Static && self.controller.mode() == DataMode::Realtime {
            println!("{}", "Live data unavailable; showing the bundled snapshot.".yellow());
        }
        if outcome.shown == 0 {
            println!("{}", "No locations match the current selection.".yellow());
        }
    }

    fn show_map(&self, popups: bool) {
        let now = Utc::now();
        self.controller.prune_transient(now);
        let view = self.controller.view(now);
        println!("{}", render::status_text(&view, now).dimmed());
        println!("{}", render::map_table(&view, self.theme()));
        println!("{} marker(s) in {} map item(s)", view.markers.len(), view.items.len());
        if popups {
            for marker in &view.markers {
                println!("\n{}", marker.popup);
            }
        }
    }

    /// Searches the loaded records first, then the whole backend dataset.
    async fn search(&self, term: &str) {
        let mut matches = self.controller.search(term);
        if matches.is_empty() && term.trim().chars().count() >= MIN_SEARCH_LEN {
            match with_spinner(
                "Searching all locations...",
                self.gateway.fetch_records(&Endpoint::InteractiveMapData),
            )
            .await
            {
                Ok(records) => matches = search_suggestions(&records, term).into_iter().cloned().collect(),
                Err(e) => warn!("Search beyond the current view failed: {}", e),
            }
        }

        let Some(first) = matches.first() else {
            println!("{}", "No matching city or country (type at least two characters).".yellow());
            return;
        };
        for record in &matches {
            println!("  {}, {} ({:.4}, {:.4})", record.city, record.country, record.latitude, record.longitude);
        }
        self.controller.jump_to(LatLng::new(first.latitude, first.longitude));
        println!(
            "{} {}, {} (zoom {})",
            "Jumped to".green(),
            first.city,
            first.country,
            self.controller.viewport().zoom
        );
    }

    /// Option lists for the filter prompts, from the full map dataset when reachable.
    async fn filter_options(&self) -> FilterOptions {
        match self.gateway.fetch_records(&Endpoint::MapData).await {
            Ok(records) if !records.is_empty() => FilterOptions::from_records(&records),
            Ok(_) => self.controller.filter_options(),
            Err(e) => {
                warn!("Could not load filter options ({}); using the current markers", e);
                self.controller.filter_options()
            },
        }
    }

    /// Prompts for filter criteria and applies them.
    pub async fn interactive_filter(&self) -> Result<()> {
        self.ensure_loaded().await?;
        let options = with_spinner("Loading filter options...", async { Ok(self.filter_options().await) }).await?;
        let criteria = prompts::prompt_filter(&options)?;
        let outcome = with_spinner("Filtering markers...", self.controller.apply_filter(criteria)).await?;
        self.report(outcome);
        self.show_map(false);
        Ok(())
    }

    fn print_series_caption(&self, name: &str, rank: Option<f64>, avg: Option<f64>) {
        let mut caption = name.bold().to_string();
        if let Some(rank) = rank {
            caption.push_str(&format!("   rank #{:.0}", rank));
        }
        if let Some(avg) = avg {
            caption.push_str(&format!("   average AQI {:.1}", avg));
        }
        println!("{}", caption);
    }
}
