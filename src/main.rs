mod api;
mod cli;
mod config;
mod error;
mod map;
mod models;

use clap::Parser;
use cli::{App, Cli, Commands, MapArgs, RegionArg};
use colored::*;
use config::{Settings, Theme};
use dialoguer::{theme::ColorfulTheme, Select};
use error::Result;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Sets up `tracing`. The returned guard must live as long as file logging is needed.
fn init_logging(settings: &Settings) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env();
    match &settings.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "airmap.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if settings.log_json {
                builder.json().init();
            } else {
                builder.init();
            }
            Some(guard)
        },
        None if settings.log_json => {
            tracing_subscriber::fmt().with_env_filter(filter).json().init();
            None
        },
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        },
    }
}

fn map_command(region: RegionArg) -> Commands {
    Commands::Map(MapArgs {
        region,
        static_data: false,
        popups: false,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let _log_guard = init_logging(&settings);

    info!("Starting air quality map client against {}", settings.base_url);

    let app = match App::new(&settings) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            println!("{}", "Error: Failed to initialize application. Check logs.".red());
            return Err(e);
        },
    };

    // One-shot mode
    if let Some(command) = cli.command {
        if let Err(e) = app.run_command(command).await {
            error!("Command execution failed: {:?}", e);
            println!("{} {}", "Error executing command:".red(), e.to_string().red());
            return Err(e);
        }
        return Ok(());
    }

    println!("{}", "Welcome to the Air Quality Map!".cyan().bold());

    if let Err(e) = app.run_command(map_command(RegionArg::India)).await {
        error!("Initial load failed: {:?}", e);
        println!("{} {}", "Error loading the map:".red(), e.to_string().red());
    }

    // Main interactive loop
    loop {
        let options = &[
            "Focus on India",
            "Global view",
            "Filter markers",
            "Search city or country",
            "Refresh",
            "Toggle realtime/static data",
            "Locate me",
            "Toggle fullscreen",
            "AQI legend",
            "Dashboard summary",
            "Country details",
            "City details",
            "Compare countries",
            "Compare cities",
            "AQI category breakdown",
            "Switch theme",
            "Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(options)
            .default(0)
            .interact_opt()?
            .unwrap_or(options.len() - 1); // Ctrl+C exits

        println!("\n---\n");

        let command_result = match selection {
            0 => app.run_command(map_command(RegionArg::India)).await,
            1 => app.run_command(map_command(RegionArg::Global)).await,
            2 => app.interactive_filter().await,
            3 => match cli::prompts::prompt_text("Search") {
                Ok(term) => app.run_command(Commands::Search { term }).await,
                Err(e) => Err(e),
            },
            4 => app.run_command(Commands::Refresh).await,
            5 => app.toggle_mode().await,
            6 => app.run_command(Commands::Locate).await,
            7 => app.run_command(Commands::Fullscreen).await,
            8 => app.run_command(Commands::Legend).await,
            9 => app.run_command(Commands::Dashboard).await,
            10 => match cli::prompts::prompt_text("Country") {
                Ok(name) => app.run_command(Commands::Country { name }).await,
                Err(e) => Err(e),
            },
            11 => {
                let city = match cli::prompts::prompt_text("City") {
                    Ok(c) => c,
                    Err(e) => {
                        println!("{} {}", "Failed to get city:".red(), e);
                        continue;
                    },
                };
                match cli::prompts::prompt_text("State") {
                    Ok(state) => app.run_command(Commands::City { name: city, state }).await,
                    Err(e) => Err(e),
                }
            },
            12 => {
                let first = match cli::prompts::prompt_text("First country") {
                    Ok(c) => c,
                    Err(e) => {
                        println!("{} {}", "Failed to get country:".red(), e);
                        continue;
                    },
                };
                match cli::prompts::prompt_text("Second country") {
                    Ok(second) => app.run_command(Commands::CompareCountries { first, second }).await,
                    Err(e) => Err(e),
                }
            },
            13 => {
                let mut fields = Vec::with_capacity(4);
                for prompt in ["First city", "Its state", "Second city", "Its state"] {
                    match cli::prompts::prompt_text(prompt) {
                        Ok(value) => fields.push(value),
                        Err(e) => {
                            println!("{} {}", "Failed to get input:".red(), e);
                            break;
                        },
                    }
                }
                let [city1, state1, city2, state2]: [String; 4] = match fields.try_into() {
                    Ok(fields) => fields,
                    Err(_) => continue,
                };
                app.run_command(Commands::CompareCities {
                    city1,
                    state1,
                    city2,
                    state2,
                })
                .await
            },
            14 => app.run_command(Commands::Categories).await,
            15 => {
                let themes = [Theme::Light, Theme::Dark];
                let picked = Select::with_theme(&ColorfulTheme::default())
                    .with_prompt("Theme")
                    .items(&["Light", "Dark"])
                    .default(0)
                    .interact_opt()?;
                match picked {
                    Some(i) => app.run_command(Commands::Theme { theme: themes[i] }).await,
                    None => continue,
                }
            },
            16 => {
                println!("{}", "Exiting application. Goodbye!".green());
                break;
            },
            _ => unreachable!(),
        };

        if let Err(e) = command_result {
            error!("Command execution failed: {:?}", e);
            println!("{} {}", "Error executing command:".red(), e.to_string().red());
        }

        println!("\n---\n");
    }

    Ok(())
}
